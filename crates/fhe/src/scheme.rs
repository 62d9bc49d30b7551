// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    Ciphertext, FheError, PassthroughScheme, PublicContext, Result, SchemeKind, SecretContext,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Additively homomorphic encryption as seen by the aggregation roles.
pub trait HomomorphicScheme: Send + Sync {
    fn kind(&self) -> SchemeKind;

    /// `false` when values are not actually encrypted
    fn is_secure(&self) -> bool;

    /// Generate fresh parameters and a keypair
    fn create_context(&self) -> Result<(PublicContext, SecretContext)>;

    fn encrypt(&self, context: &PublicContext, value: f64) -> Result<Ciphertext>;

    /// Add ciphertexts produced under the same context. The result counts the contributions
    /// of all inputs.
    fn homomorphic_sum(&self, ciphertexts: &[Ciphertext]) -> Result<Ciphertext>;

    fn decrypt(&self, secret: &SecretContext, ciphertext: &Ciphertext) -> Result<f64>;
}

pub type SharedScheme = Arc<dyn HomomorphicScheme>;

pub fn bfv_available() -> bool {
    cfg!(feature = "bfv")
}

/// Pick the strongest scheme this build offers. BFV is used unless it was compiled out or
/// `insecure_passthrough` asks for the plaintext fallback.
pub fn probe_scheme(insecure_passthrough: bool) -> SharedScheme {
    if insecure_passthrough {
        warn!("Plaintext passthrough requested. Values will NOT be encrypted.");
        return Arc::new(PassthroughScheme::new());
    }
    match scheme_for(SchemeKind::Bfv) {
        Ok(scheme) => {
            info!("Using the BFV scheme");
            scheme
        }
        Err(_) => {
            warn!("BFV support is not compiled in. Falling back to INSECURE plaintext passthrough.");
            Arc::new(PassthroughScheme::new())
        }
    }
}

/// The scheme able to handle contexts and ciphertexts of the given kind
pub fn scheme_for(kind: SchemeKind) -> Result<SharedScheme> {
    match kind {
        #[cfg(feature = "bfv")]
        SchemeKind::Bfv => Ok(Arc::new(crate::BfvScheme::default())),
        #[cfg(not(feature = "bfv"))]
        SchemeKind::Bfv => Err(FheError::Unavailable(SchemeKind::Bfv)),
        SchemeKind::Plaintext => Ok(Arc::new(PassthroughScheme::new())),
    }
}

/// Check that `ciphertexts` can be summed by `scheme` and return the first one together
/// with the total contribution count.
pub(crate) fn check_sum_inputs(
    scheme: SchemeKind,
    ciphertexts: &[Ciphertext],
) -> Result<(&Ciphertext, u32)> {
    let first = ciphertexts.first().ok_or(FheError::EmptyInput)?;
    let mut contributions = 0u32;
    for ct in ciphertexts {
        if ct.scheme() != scheme || ct.context_id() != first.context_id() {
            return Err(FheError::ParameterMismatch);
        }
        contributions = contributions.saturating_add(ct.contributions());
    }
    Ok((first, contributions))
}

pub(crate) fn check_decrypt_input(
    scheme: SchemeKind,
    secret: &SecretContext,
    ciphertext: &Ciphertext,
) -> Result<()> {
    if ciphertext.scheme() != scheme {
        return Err(FheError::Decryption(format!(
            "a {} ciphertext cannot be decrypted with {scheme}",
            ciphertext.scheme()
        )));
    }
    if ciphertext.context_id() != secret.id() {
        return Err(FheError::Decryption(format!(
            "ciphertext belongs to context {} but the secret context is {}",
            ciphertext.context_id().short(),
            secret.id().short()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_is_used_on_request() {
        let scheme = probe_scheme(true);
        assert_eq!(scheme.kind(), SchemeKind::Plaintext);
        assert!(!scheme.is_secure());
    }

    #[test]
    fn bfv_is_preferred_when_compiled_in() {
        let scheme = probe_scheme(false);
        if bfv_available() {
            assert_eq!(scheme.kind(), SchemeKind::Bfv);
            assert!(scheme.is_secure());
        } else {
            assert_eq!(scheme.kind(), SchemeKind::Plaintext);
            assert!(matches!(
                scheme_for(SchemeKind::Bfv),
                Err(FheError::Unavailable(SchemeKind::Bfv))
            ));
        }
    }

    #[test]
    fn sum_inputs_are_checked_before_any_arithmetic() {
        let scheme = PassthroughScheme::new();
        let (a, _) = scheme.create_context().unwrap();
        let (b, _) = scheme.create_context().unwrap();
        let ct_a = scheme.encrypt(&a, 1.0).unwrap();
        let ct_b = scheme.encrypt(&b, 2.0).unwrap();

        assert!(matches!(
            check_sum_inputs(SchemeKind::Plaintext, &[]),
            Err(FheError::EmptyInput)
        ));
        assert!(matches!(
            check_sum_inputs(SchemeKind::Plaintext, &[ct_a.clone(), ct_b]),
            Err(FheError::ParameterMismatch)
        ));
        assert!(matches!(
            check_sum_inputs(SchemeKind::Bfv, &[ct_a.clone()]),
            Err(FheError::ParameterMismatch)
        ));
        let (_, total) = check_sum_inputs(SchemeKind::Plaintext, &[ct_a.clone(), ct_a]).unwrap();
        assert_eq!(total, 2);
    }
}
