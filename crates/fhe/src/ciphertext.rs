// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::wire::{decode_body, encode_body, open, seal};
use crate::{ContextId, Result, SchemeKind, WireKind};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize)]
struct CiphertextBody {
    context_id: ContextId,
    contributions: u32,
    payload: Vec<u8>,
}

/// An encrypted value, or a homomorphic sum of several.
#[derive(Clone, PartialEq, Eq)]
pub struct Ciphertext {
    scheme: SchemeKind,
    context_id: ContextId,
    contributions: u32,
    payload: Vec<u8>,
}

impl Ciphertext {
    pub(crate) fn new(
        scheme: SchemeKind,
        context_id: ContextId,
        contributions: u32,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            scheme,
            context_id,
            contributions,
            payload,
        }
    }

    pub fn scheme(&self) -> SchemeKind {
        self.scheme
    }

    pub fn context_id(&self) -> ContextId {
        self.context_id
    }

    /// Number of encrypted values folded into this ciphertext, 1 for a fresh one
    pub fn contributions(&self) -> u32 {
        self.contributions
    }

    pub(crate) fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let body = encode_body(&CiphertextBody {
            context_id: self.context_id,
            contributions: self.contributions,
            payload: self.payload.clone(),
        })?;
        seal(WireKind::Ciphertext, self.scheme, &body)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (scheme, body) = open(bytes, WireKind::Ciphertext)?;
        let CiphertextBody {
            context_id,
            contributions,
            payload,
        } = decode_body(&body, "ciphertext")?;
        Ok(Self::new(scheme, context_id, contributions, payload))
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ciphertext")
            .field("scheme", &self.scheme)
            .field("context_id", &self.context_id)
            .field("contributions", &self.contributions)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ciphertext_round_trip() {
        let id = ContextId::derive(SchemeKind::Bfv, b"ctx");
        let ct = Ciphertext::new(SchemeKind::Bfv, id, 3, vec![4; 40]);
        let decoded = Ciphertext::from_bytes(&ct.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, ct);
        assert_eq!(decoded.contributions(), 3);
        assert_eq!(decoded.context_id(), id);
    }

    #[test]
    fn truncated_ciphertext_is_rejected() {
        let id = ContextId::derive(SchemeKind::Bfv, b"ctx");
        let bytes = Ciphertext::new(SchemeKind::Bfv, id, 1, vec![4; 40])
            .to_bytes()
            .unwrap();
        assert!(Ciphertext::from_bytes(&bytes[..bytes.len() / 2]).is_err());
    }
}
