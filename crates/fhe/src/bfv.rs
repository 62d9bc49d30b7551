// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::scheme::{check_decrypt_input, check_sum_inputs};
use crate::wire::{decode_body, encode_body};
use crate::{
    Ciphertext, FheError, FixedPointEncoder, HomomorphicScheme, PublicContext, Result,
    SchemeKind, SecretContext,
};
use fhe::bfv::{
    BfvParameters, Ciphertext as BfvCiphertext, Encoding, Plaintext, PublicKey, SecretKey,
};
use fhe_traits::{
    Deserialize, DeserializeParametrized, FheDecoder, FheDecrypter, FheEncoder, FheEncrypter,
    Serialize,
};
use heagg_fhe_params::{
    build_bfv_params_from_set_arc, BfvParamSet, BfvPreset, DEFAULT_BFV_PRESET,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};
use zeroize::Zeroizing;

pub type SharedRng = Arc<Mutex<ChaCha20Rng>>;

/// Public half of a BFV context
#[derive(serde::Serialize, serde::Deserialize)]
struct BfvPublicBody {
    params: Vec<u8>,
    public_key: Vec<u8>,
    scale_bits: u32,
    max_contributions: u32,
}

/// BFV ciphertexts carry their parameters so they can be summed without a context.
#[derive(serde::Serialize, serde::Deserialize)]
struct BfvPayload {
    params: Vec<u8>,
    max_contributions: u32,
    ciphertext: Vec<u8>,
}

/// BFV over a fixed-point encoding of real values.
///
/// Each value occupies the constant coefficient of a plaintext polynomial, so ciphertext
/// addition adds the encoded values modulo the plaintext modulus.
#[derive(Debug, Clone)]
pub struct BfvScheme {
    param_set: BfvParamSet,
    rng: SharedRng,
}

impl Default for BfvScheme {
    fn default() -> Self {
        Self::new(DEFAULT_BFV_PRESET)
    }
}

impl BfvScheme {
    pub fn new(preset: BfvPreset) -> Self {
        Self::from_param_set(preset.param_set())
    }

    pub fn from_param_set(param_set: BfvParamSet) -> Self {
        Self::with_rng(param_set, Arc::new(Mutex::new(ChaCha20Rng::from_entropy())))
    }

    pub fn with_rng(param_set: BfvParamSet, rng: SharedRng) -> Self {
        Self { param_set, rng }
    }

    fn rng(&self) -> MutexGuard<'_, ChaCha20Rng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_param_set(&self) -> Result<FixedPointEncoder> {
        let set = &self.param_set;
        if let Some(q) = set.moduli.iter().find(|q| **q <= set.plaintext_modulus) {
            return Err(FheError::Parameter(format!(
                "plaintext modulus {} is not below ciphertext modulus {q:#x}",
                set.plaintext_modulus
            )));
        }
        FixedPointEncoder::new(set.plaintext_modulus, set.scale_bits, set.max_contributions)
    }
}

fn load_params(bytes: &[u8]) -> Result<Arc<BfvParameters>> {
    BfvParameters::try_deserialize(bytes)
        .map(Arc::new)
        .map_err(|e| FheError::Deserialization(format!("BFV parameters: {e}")))
}

fn load_public(
    context: &PublicContext,
) -> Result<(BfvPublicBody, Arc<BfvParameters>, FixedPointEncoder)> {
    if context.scheme() != SchemeKind::Bfv {
        return Err(FheError::Parameter(format!(
            "a {} context cannot be used with BFV",
            context.scheme()
        )));
    }
    let body: BfvPublicBody = decode_body(context.body(), "BFV public context")?;
    let params = load_params(&body.params)?;
    let encoder =
        FixedPointEncoder::new(params.plaintext(), body.scale_bits, body.max_contributions)?;
    Ok((body, params, encoder))
}

fn load_ciphertext(bytes: &[u8], params: &Arc<BfvParameters>) -> Result<BfvCiphertext> {
    BfvCiphertext::from_bytes(bytes, params)
        .map_err(|e| FheError::Deserialization(format!("BFV ciphertext: {e}")))
}

struct SecretKeySerializer;

#[derive(serde::Serialize)]
struct SecretKeyDataRef<'a> {
    coeffs: &'a [i64],
}

#[derive(serde::Deserialize)]
struct SecretKeyData {
    coeffs: Vec<i64>,
}

impl SecretKeySerializer {
    fn to_bytes(inner: &SecretKey) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new(encode_body(&SecretKeyDataRef {
            coeffs: &inner.coeffs,
        })?))
    }

    fn from_bytes(bytes: &[u8], params: &Arc<BfvParameters>) -> Result<SecretKey> {
        let SecretKeyData { coeffs } = decode_body(bytes, "BFV secret key")?;
        if coeffs.len() != params.degree() {
            return Err(FheError::Deserialization(format!(
                "secret key has {} coefficients, expected {}",
                coeffs.len(),
                params.degree()
            )));
        }
        Ok(SecretKey::new(coeffs, params))
    }
}

impl HomomorphicScheme for BfvScheme {
    fn kind(&self) -> SchemeKind {
        SchemeKind::Bfv
    }

    fn is_secure(&self) -> bool {
        true
    }

    fn create_context(&self) -> Result<(PublicContext, SecretContext)> {
        let encoder = self.check_param_set()?;
        let params = build_bfv_params_from_set_arc(self.param_set)
            .map_err(|e| FheError::Parameter(e.to_string()))?;

        let (sk, pk) = {
            let mut rng = self.rng();
            let sk = SecretKey::random(&params, &mut *rng);
            let pk = PublicKey::new(&sk, &mut *rng);
            (sk, pk)
        };

        let body = encode_body(&BfvPublicBody {
            params: params.to_bytes(),
            public_key: pk.to_bytes(),
            scale_bits: encoder.scale_bits(),
            max_contributions: encoder.max_contributions(),
        })?;
        let public = PublicContext::new(SchemeKind::Bfv, body);
        let secret = SecretContext::new(public.clone(), SecretKeySerializer::to_bytes(&sk)?);

        info!(
            "Created BFV context {} (degree {}, {} fractional bits, up to {} contributions of ±{})",
            public.id().short(),
            params.degree(),
            encoder.scale_bits(),
            encoder.max_contributions(),
            encoder.max_value()
        );
        Ok((public, secret))
    }

    fn encrypt(&self, context: &PublicContext, value: f64) -> Result<Ciphertext> {
        let (body, params, encoder) = load_public(context)?;
        let residue = encoder.encode(value)?;

        let pk = PublicKey::from_bytes(&body.public_key, &params)
            .map_err(|e| FheError::Deserialization(format!("BFV public key: {e}")))?;
        let coeffs = [residue];
        let pt = Plaintext::try_encode(&coeffs[..], Encoding::poly(), &params)
            .map_err(|e| FheError::Parameter(format!("could not encode plaintext: {e}")))?;
        let ct = pk
            .try_encrypt(&pt, &mut *self.rng())
            .map_err(|e| FheError::Parameter(format!("could not encrypt: {e}")))?;

        let payload = encode_body(&BfvPayload {
            params: body.params,
            max_contributions: body.max_contributions,
            ciphertext: ct.to_bytes(),
        })?;
        Ok(Ciphertext::new(SchemeKind::Bfv, context.id(), 1, payload))
    }

    fn homomorphic_sum(&self, ciphertexts: &[Ciphertext]) -> Result<Ciphertext> {
        let (first, contributions) = check_sum_inputs(SchemeKind::Bfv, ciphertexts)?;
        let first_payload: BfvPayload = decode_body(first.payload(), "BFV payload")?;
        // Past this count the constant coefficient may wrap around the plaintext modulus
        if contributions > first_payload.max_contributions {
            return Err(FheError::CapacityExceeded {
                contributions,
                limit: first_payload.max_contributions,
            });
        }
        let params = load_params(&first_payload.params)?;

        let mut acc = load_ciphertext(&first_payload.ciphertext, &params)?;
        for ct in &ciphertexts[1..] {
            let payload: BfvPayload = decode_body(ct.payload(), "BFV payload")?;
            // Adding ciphertexts under different parameters panics inside the library
            if payload.params != first_payload.params
                || payload.max_contributions != first_payload.max_contributions
            {
                return Err(FheError::ParameterMismatch);
            }
            let next = load_ciphertext(&payload.ciphertext, &params)?;
            acc = &acc + &next;
        }
        debug!(
            "Summed {} ciphertexts ({} contributions) under context {}",
            ciphertexts.len(),
            contributions,
            first.context_id().short()
        );

        let payload = encode_body(&BfvPayload {
            params: first_payload.params,
            max_contributions: first_payload.max_contributions,
            ciphertext: acc.to_bytes(),
        })?;
        Ok(Ciphertext::new(
            SchemeKind::Bfv,
            first.context_id(),
            contributions,
            payload,
        ))
    }

    fn decrypt(&self, secret: &SecretContext, ciphertext: &Ciphertext) -> Result<f64> {
        check_decrypt_input(SchemeKind::Bfv, secret, ciphertext)?;
        let (body, params, encoder) =
            load_public(secret.public()).map_err(|e| FheError::Decryption(e.to_string()))?;
        let sk = SecretKeySerializer::from_bytes(secret.secret(), &params)?;

        let payload: BfvPayload = decode_body(ciphertext.payload(), "BFV payload")?;
        if payload.params != body.params || payload.max_contributions != body.max_contributions {
            return Err(FheError::Decryption(format!(
                "ciphertext labelled {} was produced under different parameters",
                ciphertext.context_id().short()
            )));
        }
        encoder.check_contributions(ciphertext.contributions())?;
        let ct = load_ciphertext(&payload.ciphertext, &params)?;
        let pt = sk
            .try_decrypt(&ct)
            .map_err(|e| FheError::Decryption(e.to_string()))?;
        let coeffs = Vec::<u64>::try_decode(&pt, Encoding::poly())
            .map_err(|e| FheError::Decryption(e.to_string()))?;

        Ok(encoder.decode(coeffs.first().copied().unwrap_or_default()))
    }
}
