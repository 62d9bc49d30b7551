// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{ClientError, Result};
use async_trait::async_trait;
use heagg_aggregator::models::{
    CiphertextUpload, CiphertextsResponse, ContextUpload, PlaintextResponse, PlaintextUpload,
    PublicContextResponse, StoredResponse,
};
use heagg_aggregator::PlaintextAggregate;
use heagg_config::ValidUrl;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

/// What `GET /get_agg_cipher` returns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedCiphertexts {
    pub context: Option<Vec<u8>>,
    pub ciphertexts: Vec<Vec<u8>>,
}

/// The aggregator as seen by the roles
#[async_trait]
pub trait AggregatorApi: Send + Sync {
    async fn put_context(&self, context: &[u8]) -> Result<()>;
    /// `ClientError::NotFound` when no context was uploaded yet
    async fn get_public_context(&self) -> Result<Vec<u8>>;
    /// Returns how many ciphertexts the aggregator now holds
    async fn post_cipher(&self, ciphertext: &[u8], client_id: Option<&str>) -> Result<usize>;
    async fn get_agg_cipher(&self) -> Result<AggregatedCiphertexts>;
    async fn post_plain_aggregate(&self, value: f64, contributions: Option<u32>) -> Result<()>;
    /// `ClientError::NotFound` when no aggregate was posted yet
    async fn get_plain_aggregate(&self) -> Result<PlaintextAggregate>;
}

/// [`AggregatorApi`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpAggregatorClient {
    client: Client,
    base: ValidUrl,
}

impl HttpAggregatorClient {
    pub fn new(base: ValidUrl) -> Self {
        Self::with_client(Client::new(), base)
    }

    pub fn with_client(client: Client, base: ValidUrl) -> Self {
        Self { client, base }
    }

    pub fn base(&self) -> &ValidUrl {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        self.base.endpoint(path)
    }
}

async fn check(response: Response, missing: &str) -> Result<Response> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(missing.to_string()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl AggregatorApi for HttpAggregatorClient {
    async fn put_context(&self, context: &[u8]) -> Result<()> {
        let url = self.url("context");
        debug!(url = %url, bytes = context.len(), "Uploading public context");
        let response = self
            .client
            .put(url)
            .json(&ContextUpload {
                context: context.to_vec(),
            })
            .send()
            .await?;
        check(response, "context endpoint").await?;
        Ok(())
    }

    async fn get_public_context(&self) -> Result<Vec<u8>> {
        let response = self.client.get(self.url("get_public_context")).send().await?;
        let response = check(
            response,
            "public context yet. If you are the first participant, run the keyholder role",
        )
        .await?;
        let PublicContextResponse { context, .. } = read_json(response).await?;
        Ok(context)
    }

    async fn post_cipher(&self, ciphertext: &[u8], client_id: Option<&str>) -> Result<usize> {
        let url = self.url("cipher");
        debug!(url = %url, bytes = ciphertext.len(), "Uploading ciphertext");
        let response = self
            .client
            .post(url)
            .json(&CiphertextUpload {
                ciphertext: ciphertext.to_vec(),
                client_id: client_id.map(str::to_string),
            })
            .send()
            .await?;
        let response = check(response, "cipher endpoint").await?;
        let StoredResponse { stored, .. } = read_json(response).await?;
        Ok(stored)
    }

    async fn get_agg_cipher(&self) -> Result<AggregatedCiphertexts> {
        let response = self.client.get(self.url("get_agg_cipher")).send().await?;
        let response = check(response, "ciphertext endpoint").await?;
        let CiphertextsResponse {
            context,
            ciphertexts,
            ..
        } = read_json(response).await?;
        Ok(AggregatedCiphertexts {
            context,
            ciphertexts,
        })
    }

    async fn post_plain_aggregate(&self, value: f64, contributions: Option<u32>) -> Result<()> {
        let response = self
            .client
            .post(self.url("plain_aggregate"))
            .json(&PlaintextUpload {
                plaintext_aggregate: value,
                contributions,
            })
            .send()
            .await?;
        check(response, "plaintext endpoint").await?;
        Ok(())
    }

    async fn get_plain_aggregate(&self) -> Result<PlaintextAggregate> {
        let response = self.client.get(self.url("get_plain_aggregate")).send().await?;
        let response = check(response, "plaintext aggregate yet. Run the decryptor role first").await?;
        let PlaintextResponse {
            plaintext_aggregate,
            contributions,
            ..
        } = read_json(response).await?;
        Ok(PlaintextAggregate {
            value: plaintext_aggregate,
            contributions,
        })
    }
}
