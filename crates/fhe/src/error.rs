// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::SchemeKind;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum FheError {
    #[error("Invalid encryption parameters: {0}")]
    Parameter(String),
    #[error("Malformed wire bytes: {0}")]
    Deserialization(String),
    #[error("Cannot decrypt: {0}")]
    Decryption(String),
    #[error("Ciphertexts were produced under different public contexts")]
    ParameterMismatch,
    #[error("Cannot sum an empty list of ciphertexts")]
    EmptyInput,
    #[error("Value {value} cannot be encoded (representable range is ±{limit})")]
    ValueOutOfRange { value: f64, limit: f64 },
    #[error("{contributions} contributions exceed the capacity of {limit} for this context")]
    CapacityExceeded { contributions: u32, limit: u32 },
    #[error("The {0} scheme is not available in this build")]
    Unavailable(SchemeKind),
}

/// Result that returns a type T or a FheError
pub type Result<T> = std::result::Result<T, FheError>;
