// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Ciphertext, FheError, PublicContext, Result, SecretContext};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroizing;

pub const MAGIC: [u8; 4] = *b"HEAG";
pub const WIRE_VERSION: u16 = 1;

/// Encryption scheme a context or ciphertext belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemeKind {
    Bfv,
    /// Values travel unencrypted. Only for environments without BFV support.
    Plaintext,
}

impl SchemeKind {
    fn tag(&self) -> &'static [u8] {
        match self {
            SchemeKind::Bfv => b"bfv",
            SchemeKind::Plaintext => b"plaintext",
        }
    }
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemeKind::Bfv => f.write_str("BFV"),
            SchemeKind::Plaintext => f.write_str("plaintext passthrough"),
        }
    }
}

/// What an envelope carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireKind {
    PublicContext,
    SecretContext,
    Ciphertext,
}

impl fmt::Display for WireKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireKind::PublicContext => f.write_str("public context"),
            WireKind::SecretContext => f.write_str("secret context"),
            WireKind::Ciphertext => f.write_str("ciphertext"),
        }
    }
}

/// SHA-256 over the scheme tag and the public body of a context.
///
/// Ciphertexts record the id of the context they were produced under so that sums and
/// decryptions across unrelated contexts are refused before any arithmetic happens.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId([u8; 32]);

impl ContextId {
    pub(crate) fn derive(scheme: SchemeKind, public_body: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(scheme.tag());
        hasher.update(public_body);
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First eight bytes in hex, for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextId({})", self.short())
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    magic: [u8; 4],
    version: u16,
    kind: WireKind,
    scheme: SchemeKind,
    body: &'a [u8],
}

#[derive(Deserialize)]
struct Envelope {
    magic: [u8; 4],
    version: u16,
    kind: WireKind,
    scheme: SchemeKind,
    body: Vec<u8>,
}

pub(crate) fn seal(kind: WireKind, scheme: SchemeKind, body: &[u8]) -> Result<Vec<u8>> {
    bincode::serialize(&EnvelopeRef {
        magic: MAGIC,
        version: WIRE_VERSION,
        kind,
        scheme,
        body,
    })
    .map_err(|e| FheError::Deserialization(format!("could not encode {kind}: {e}")))
}

/// Unwrap an envelope, checking magic, version and kind. Returns the scheme and the body.
pub(crate) fn open(bytes: &[u8], expected: WireKind) -> Result<(SchemeKind, Vec<u8>)> {
    let envelope: Envelope = bincode::deserialize(bytes)
        .map_err(|e| FheError::Deserialization(format!("not a heagg envelope: {e}")))?;

    if envelope.magic != MAGIC {
        return Err(FheError::Deserialization("bad magic".to_string()));
    }
    if envelope.version != WIRE_VERSION {
        return Err(FheError::Deserialization(format!(
            "unsupported wire version {}",
            envelope.version
        )));
    }
    if envelope.kind != expected {
        return Err(FheError::Deserialization(format!(
            "expected a {expected} but found a {}",
            envelope.kind
        )));
    }

    Ok((envelope.scheme, envelope.body))
}

pub(crate) fn encode_body<T: Serialize>(body: &T) -> Result<Vec<u8>> {
    bincode::serialize(body).map_err(|e| FheError::Deserialization(e.to_string()))
}

pub(crate) fn decode_body<T: serde::de::DeserializeOwned>(bytes: &[u8], what: &str) -> Result<T> {
    bincode::deserialize(bytes)
        .map_err(|e| FheError::Deserialization(format!("malformed {what}: {e}")))
}

/// Any object that can travel inside an envelope
#[derive(Debug, Clone)]
pub enum WireObject {
    PublicContext(PublicContext),
    SecretContext(SecretContext),
    Ciphertext(Ciphertext),
}

impl WireObject {
    pub fn kind(&self) -> WireKind {
        match self {
            WireObject::PublicContext(_) => WireKind::PublicContext,
            WireObject::SecretContext(_) => WireKind::SecretContext,
            WireObject::Ciphertext(_) => WireKind::Ciphertext,
        }
    }

    pub fn to_bytes(&self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(match self {
            WireObject::PublicContext(c) => Zeroizing::new(c.to_bytes()?),
            WireObject::SecretContext(c) => c.to_bytes()?,
            WireObject::Ciphertext(c) => Zeroizing::new(c.to_bytes()?),
        })
    }
}

/// Decode `bytes` as an object of the `expected` kind
pub fn deserialize(bytes: &[u8], expected: WireKind) -> Result<WireObject> {
    Ok(match expected {
        WireKind::PublicContext => WireObject::PublicContext(PublicContext::from_bytes(bytes)?),
        WireKind::SecretContext => WireObject::SecretContext(SecretContext::from_bytes(bytes)?),
        WireKind::Ciphertext => WireObject::Ciphertext(Ciphertext::from_bytes(bytes)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_rejects_the_wrong_kind() {
        let bytes = seal(WireKind::Ciphertext, SchemeKind::Plaintext, &[1, 2, 3]).unwrap();
        assert!(matches!(
            open(&bytes, WireKind::PublicContext),
            Err(FheError::Deserialization(_))
        ));
        let (scheme, body) = open(&bytes, WireKind::Ciphertext).unwrap();
        assert_eq!(scheme, SchemeKind::Plaintext);
        assert_eq!(body, vec![1, 2, 3]);
    }

    #[test]
    fn open_rejects_bad_magic_version_and_truncation() {
        let mut bytes = seal(WireKind::Ciphertext, SchemeKind::Bfv, &[9; 16]).unwrap();

        assert!(open(&bytes[..bytes.len() - 1], WireKind::Ciphertext).is_err());
        assert!(open(&[], WireKind::Ciphertext).is_err());

        // bincode lays the magic out first and the little-endian version right after it
        let mut bad_version = bytes.clone();
        bad_version[4] = 2;
        assert!(open(&bad_version, WireKind::Ciphertext).is_err());

        bytes[0] = b'X';
        assert!(open(&bytes, WireKind::Ciphertext).is_err());
    }

    #[test]
    fn context_id_depends_on_scheme_and_body() {
        let a = ContextId::derive(SchemeKind::Bfv, b"body");
        assert_eq!(a, ContextId::derive(SchemeKind::Bfv, b"body"));
        assert_ne!(a, ContextId::derive(SchemeKind::Plaintext, b"body"));
        assert_ne!(a, ContextId::derive(SchemeKind::Bfv, b"other"));
        assert_eq!(a.to_string().len(), 64);
        assert_eq!(a.short().len(), 16);
    }
}
