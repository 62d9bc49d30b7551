// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! JSON bodies of the aggregator's HTTP interface. Bytes travel as standard base64.

use serde::{Deserialize, Serialize};

pub mod b64 {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        STANDARD.decode(s.trim()).map_err(de::Error::custom)
    }
}

pub mod b64_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => super::b64::serialize(bytes, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wrapper(#[serde(with = "super::b64")] Vec<u8>);

        let wrapped: Option<Wrapper> = Deserialize::deserialize(deserializer)?;
        Ok(wrapped.map(|Wrapper(bytes)| bytes))
    }
}

pub mod b64_vec {
    use serde::{ser::SerializeSeq, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        struct Wrapper<'a>(#[serde(with = "super::b64")] &'a [u8]);

        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
            seq.serialize_element(&Wrapper(item))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wrapper(#[serde(with = "super::b64")] Vec<u8>);

        let wrapped: Vec<Wrapper> = Deserialize::deserialize(deserializer)?;
        Ok(wrapped.into_iter().map(|Wrapper(bytes)| bytes).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContextUpload {
    #[serde(with = "b64")]
    pub context: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CiphertextUpload {
    #[serde(with = "b64")]
    pub ciphertext: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaintextUpload {
    pub plaintext_aggregate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributions: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatusMessage {
    pub status: String,
    pub msg: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoredResponse {
    pub status: String,
    pub stored: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PublicContextResponse {
    pub status: String,
    #[serde(with = "b64")]
    pub context: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CiphertextsResponse {
    pub status: String,
    #[serde(with = "b64_opt")]
    pub context: Option<Vec<u8>>,
    #[serde(with = "b64_vec")]
    pub ciphertexts: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaintextResponse {
    pub status: String,
    pub plaintext_aggregate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributions: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AggregateReadyResponse {
    pub status: String,
    pub num_ciphertexts: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PingResponse {
    pub status: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ciphertexts_response_uses_base64_and_null() {
        let response = CiphertextsResponse {
            status: "ok".into(),
            context: None,
            ciphertexts: vec![b"abc".to_vec(), vec![]],
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({"status": "ok", "context": null, "ciphertexts": ["YWJj", ""]})
        );
        let decoded: CiphertextsResponse = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn invalid_base64_is_a_deserialization_error() {
        let result: Result<ContextUpload, _> =
            serde_json::from_value(json!({"context": "not base64!"}));
        assert!(result.is_err());
        let result: Result<CiphertextUpload, _> = serde_json::from_value(json!({}));
        assert!(result.is_err());
    }
}
