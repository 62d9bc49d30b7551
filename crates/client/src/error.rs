// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use heagg_fhe::FheError;
use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum ClientError {
    #[error("No local secret context at {0}. Run the keyholder role on this machine first.")]
    LocalContextMissing(PathBuf),
    #[error("The aggregator has no {0}")]
    NotFound(String),
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Aggregator answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Fhe(#[from] FheError),
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

/// Result that returns a type T or a ClientError
pub type Result<T> = std::result::Result<T, ClientError>;
