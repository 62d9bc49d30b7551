// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::constants::{aggregation_4096, aggregation_8192};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error as ThisError;

/// BFV preset configurations for encrypted aggregation.
///
/// Each preset fixes the ring degree, the ciphertext moduli, the plaintext modulus and the
/// number of fractional bits used when real numbers are carried as fixed-point integers.
///
/// Neither preset has been through a parameter audit. They are sized for a handful of
/// additions of fresh ciphertexts, which is all the aggregation protocol performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BfvPreset {
    /// Degree 4096, 109-bit ciphertext modulus, 30-bit plaintext space.
    Aggregation4096,
    /// Degree 8192, 112-bit ciphertext modulus, 40-bit plaintext space.
    #[default]
    Aggregation8192,
}

pub const DEFAULT_BFV_PRESET: BfvPreset = BfvPreset::Aggregation8192;

#[derive(ThisError, Debug)]
pub enum PresetError {
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),
}

/// A complete BFV parameter set definition
///
/// This struct contains all the values needed to construct a `BfvParameters` instance and
/// the fixed-point encoder that goes with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BfvParamSet {
    /// Degree of the polynomial ring, must be a power of 2
    pub degree: usize,
    /// Plaintext modulus t. Fixed-point values live in the centered range of Z_t.
    pub plaintext_modulus: u64,
    /// Ciphertext moduli (q_i), NTT-friendly primes for the given degree
    pub moduli: &'static [u64],
    /// Number of fractional bits of the fixed-point encoding
    pub scale_bits: u32,
    /// Most contributions a single sum may hold without leaving the centered range
    pub max_contributions: u32,
}

impl BfvPreset {
    pub const ALL: [BfvPreset; 2] = [BfvPreset::Aggregation4096, BfvPreset::Aggregation8192];

    pub fn from_name(name: &str) -> Result<Self, PresetError> {
        let normalized = name.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "AGGREGATION_4096" => Ok(Self::Aggregation4096),
            "AGGREGATION_8192" => Ok(Self::Aggregation8192),
            _ => Err(PresetError::UnknownPreset(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BfvPreset::Aggregation4096 => "AGGREGATION_4096",
            BfvPreset::Aggregation8192 => "AGGREGATION_8192",
        }
    }

    pub fn list() -> Vec<&'static str> {
        Self::ALL.iter().map(BfvPreset::name).collect()
    }

    pub fn param_set(&self) -> BfvParamSet {
        (*self).into()
    }
}

impl fmt::Display for BfvPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BfvPreset {
    type Err = PresetError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl From<BfvPreset> for BfvParamSet {
    fn from(value: BfvPreset) -> Self {
        match value {
            BfvPreset::Aggregation4096 => BfvParamSet {
                degree: aggregation_4096::DEGREE,
                plaintext_modulus: aggregation_4096::PLAINTEXT_MODULUS,
                moduli: aggregation_4096::MODULI,
                scale_bits: aggregation_4096::SCALE_BITS,
                max_contributions: aggregation_4096::MAX_CONTRIBUTIONS,
            },
            BfvPreset::Aggregation8192 => BfvParamSet {
                degree: aggregation_8192::DEGREE,
                plaintext_modulus: aggregation_8192::PLAINTEXT_MODULUS,
                moduli: aggregation_8192::MODULI,
                scale_bits: aggregation_8192::SCALE_BITS,
                max_contributions: aggregation_8192::MAX_CONTRIBUTIONS,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_accepts_all_presets() {
        for preset in BfvPreset::ALL {
            let parsed = BfvPreset::from_name(preset.name()).expect("preset should parse");
            assert_eq!(parsed, preset);
        }
        assert_eq!(
            "aggregation_4096".parse::<BfvPreset>().unwrap(),
            BfvPreset::Aggregation4096
        );
        assert!(BfvPreset::from_name("SECURE_THRESHOLD_BFV_8192").is_err());
    }

    #[test]
    fn plaintext_modulus_fits_below_every_ciphertext_modulus() {
        for preset in BfvPreset::ALL {
            let set = preset.param_set();
            assert!(set.degree.is_power_of_two());
            for q in set.moduli {
                assert!(set.plaintext_modulus < *q, "{preset}: t >= {q:#x}");
                assert_eq!(q % (2 * set.degree as u64), 1, "{preset}: {q:#x} not NTT-friendly");
            }
            assert!(set.scale_bits + 1 < set.plaintext_modulus.trailing_zeros());
            // Every contribution keeps at least one integer unit
            let per_value = (set.plaintext_modulus / 2 - 1) / set.max_contributions as u64;
            assert!(per_value >> set.scale_bits >= 1, "{preset}: no room per value");
        }
    }
}
