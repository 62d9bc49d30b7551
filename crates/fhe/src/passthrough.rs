// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::scheme::{check_decrypt_input, check_sum_inputs};
use crate::wire::encode_body;
use crate::{
    Ciphertext, FheError, HomomorphicScheme, PublicContext, Result, SchemeKind, SecretContext,
};
use serde::Serialize;
use tracing::warn;
use zeroize::Zeroizing;

#[derive(Serialize)]
struct PassthroughBody {
    nonce: [u8; 16],
}

/// Degraded mode that carries values in the clear.
///
/// Ciphertexts are the raw little-endian bytes of an `f64` and sums are ordinary additions.
/// A BFV context is accepted for encryption so that a build without BFV support can still
/// take part in a run, but anyone relaying the result can read it.
#[derive(Debug, Default, Clone)]
pub struct PassthroughScheme;

impl PassthroughScheme {
    pub fn new() -> Self {
        Self
    }
}

fn read_value(ct: &Ciphertext) -> Result<f64> {
    let bytes: [u8; 8] = ct.payload().try_into().map_err(|_| {
        FheError::Deserialization(format!(
            "passthrough payload must be 8 bytes, got {}",
            ct.payload().len()
        ))
    })?;
    Ok(f64::from_le_bytes(bytes))
}

impl HomomorphicScheme for PassthroughScheme {
    fn kind(&self) -> SchemeKind {
        SchemeKind::Plaintext
    }

    fn is_secure(&self) -> bool {
        false
    }

    fn create_context(&self) -> Result<(PublicContext, SecretContext)> {
        warn!("Creating an INSECURE plaintext context");
        let body = encode_body(&PassthroughBody {
            nonce: rand::random(),
        })?;
        let public = PublicContext::new(SchemeKind::Plaintext, body);
        let secret = SecretContext::new(public.clone(), Zeroizing::new(Vec::new()));
        Ok((public, secret))
    }

    fn encrypt(&self, context: &PublicContext, value: f64) -> Result<Ciphertext> {
        if !value.is_finite() {
            return Err(FheError::ValueOutOfRange {
                value,
                limit: f64::MAX,
            });
        }
        warn!(
            "Sending value UNENCRYPTED under {} context {}",
            context.scheme(),
            context.id().short()
        );
        Ok(Ciphertext::new(
            SchemeKind::Plaintext,
            context.id(),
            1,
            value.to_le_bytes().to_vec(),
        ))
    }

    fn homomorphic_sum(&self, ciphertexts: &[Ciphertext]) -> Result<Ciphertext> {
        let (first, contributions) = check_sum_inputs(SchemeKind::Plaintext, ciphertexts)?;
        warn!("Summing {} INSECURE plaintext values", ciphertexts.len());
        let mut total = 0.0;
        for ct in ciphertexts {
            total += read_value(ct)?;
        }
        Ok(Ciphertext::new(
            SchemeKind::Plaintext,
            first.context_id(),
            contributions,
            total.to_le_bytes().to_vec(),
        ))
    }

    fn decrypt(&self, secret: &SecretContext, ciphertext: &Ciphertext) -> Result<f64> {
        check_decrypt_input(SchemeKind::Plaintext, secret, ciphertext)?;
        warn!("Reading an INSECURE plaintext aggregate");
        read_value(ciphertext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_and_decrypts_in_the_clear() {
        let scheme = PassthroughScheme::new();
        let (public, secret) = scheme.create_context().unwrap();
        let cts = vec![
            scheme.encrypt(&public, 10.0).unwrap(),
            scheme.encrypt(&public, 20.0).unwrap(),
            scheme.encrypt(&public, -2.5).unwrap(),
        ];
        let sum = scheme.homomorphic_sum(&cts).unwrap();
        assert_eq!(sum.contributions(), 3);
        assert_eq!(scheme.decrypt(&secret, &sum).unwrap(), 27.5);
        assert!(!scheme.is_secure());
    }

    #[test]
    fn fresh_contexts_have_distinct_ids() {
        let scheme = PassthroughScheme::new();
        let (a, _) = scheme.create_context().unwrap();
        let (b, _) = scheme.create_context().unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn decrypting_under_another_context_fails() {
        let scheme = PassthroughScheme::new();
        let (public, _) = scheme.create_context().unwrap();
        let (_, other_secret) = scheme.create_context().unwrap();
        let ct = scheme.encrypt(&public, 1.0).unwrap();
        assert!(matches!(
            scheme.decrypt(&other_secret, &ct),
            Err(FheError::Decryption(_))
        ));
    }

    #[test]
    fn rejects_non_finite_values_and_bad_payloads() {
        let scheme = PassthroughScheme::new();
        let (public, secret) = scheme.create_context().unwrap();
        assert!(matches!(
            scheme.encrypt(&public, f64::NAN),
            Err(FheError::ValueOutOfRange { .. })
        ));
        let broken = Ciphertext::new(SchemeKind::Plaintext, public.id(), 1, vec![0; 3]);
        assert!(matches!(
            scheme.decrypt(&secret, &broken),
            Err(FheError::Deserialization(_))
        ));
    }
}
