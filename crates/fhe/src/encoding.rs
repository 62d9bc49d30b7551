// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Fixed-point encoding of real numbers into the plaintext ring Z_t.
//!
//! A value `v` is carried as `round(v * 2^scale_bits)` reduced into Z_t, negative numbers
//! wrapping to the upper half of the ring. Addition in Z_t then matches addition of the
//! encoded reals for as long as the running sum stays inside the centered range.
//!
//! An encoder is sized for a fixed number of contributions. Single values are limited to
//! that share of the centered range, so any sum of at most `max_contributions` encoded
//! values decodes to the real sum.

use crate::{FheError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedPointEncoder {
    modulus: u64,
    scale_bits: u32,
    max_contributions: u32,
}

impl FixedPointEncoder {
    /// Create an encoder for plaintext modulus `modulus` with `scale_bits` fractional bits
    /// whose values may be summed up to `max_contributions` times.
    ///
    /// At least two bits of the plaintext space must remain above the fractional part: one
    /// for the sign and one for the integer part. Every contribution must still be able to
    /// carry one unit.
    pub fn new(modulus: u64, scale_bits: u32, max_contributions: u32) -> Result<Self> {
        let modulus_bits = 64 - modulus.leading_zeros();
        if modulus < 4 || scale_bits + 2 > modulus_bits {
            return Err(FheError::Parameter(format!(
                "a scale of {scale_bits} bits does not fit a {modulus_bits}-bit plaintext space"
            )));
        }
        if max_contributions == 0 || (modulus / 2 - 1) / (max_contributions as u64) < 1 << scale_bits
        {
            return Err(FheError::Parameter(format!(
                "a {modulus_bits}-bit plaintext space with {scale_bits} fractional bits cannot hold {max_contributions} contributions"
            )));
        }
        Ok(Self {
            modulus,
            scale_bits,
            max_contributions,
        })
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    pub fn scale_bits(&self) -> u32 {
        self.scale_bits
    }

    pub fn max_contributions(&self) -> u32 {
        self.max_contributions
    }

    fn scale(&self) -> f64 {
        (1u64 << self.scale_bits) as f64
    }

    /// Smallest difference between two distinct encodable values
    pub fn resolution(&self) -> f64 {
        1.0 / self.scale()
    }

    /// Largest magnitude a running sum may reach before it wraps
    pub fn max_magnitude(&self) -> f64 {
        (self.modulus / 2 - 1) as f64 / self.scale()
    }

    fn max_scaled_value(&self) -> u64 {
        (self.modulus / 2 - 1) / self.max_contributions as u64
    }

    /// Largest magnitude of a single encoded value
    pub fn max_value(&self) -> f64 {
        self.max_scaled_value() as f64 / self.scale()
    }

    pub fn encode(&self, value: f64) -> Result<u64> {
        let out_of_range = || FheError::ValueOutOfRange {
            value,
            limit: self.max_value(),
        };
        if !value.is_finite() {
            return Err(out_of_range());
        }

        let scaled = (value * self.scale()).round();
        if scaled.abs() > self.max_scaled_value() as f64 {
            return Err(out_of_range());
        }

        let scaled = scaled as i64;
        Ok(if scaled >= 0 {
            scaled as u64
        } else {
            self.modulus - scaled.unsigned_abs()
        })
    }

    /// Fails once a sum would count more contributions than the encoder was sized for
    pub fn check_contributions(&self, contributions: u32) -> Result<()> {
        if contributions > self.max_contributions {
            return Err(FheError::CapacityExceeded {
                contributions,
                limit: self.max_contributions,
            });
        }
        Ok(())
    }

    pub fn decode(&self, residue: u64) -> f64 {
        let residue = residue % self.modulus;
        let signed = if residue > self.modulus / 2 {
            residue as i128 - self.modulus as i128
        } else {
            residue as i128
        };
        signed as f64 / self.scale()
    }
}
