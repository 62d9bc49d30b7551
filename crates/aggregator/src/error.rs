// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::models::StatusMessage;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum AggregatorError {
    #[error("{0}")]
    BadRequest(String),
    #[error("No public context has been uploaded yet")]
    NoContext,
    #[error("No plaintext aggregate has been posted yet")]
    NoPlaintext,
    #[error("No ciphertexts have been uploaded yet")]
    NoCiphertexts,
    #[error("Could not write the public context to {path}: {source}")]
    ContextWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AggregatorError {
    /// Value of the `status` field in the error body
    pub fn status(&self) -> &'static str {
        match self {
            AggregatorError::BadRequest(_) | AggregatorError::ContextWrite { .. } => "error",
            AggregatorError::NoContext => "no_context",
            AggregatorError::NoPlaintext => "no_plaintext",
            AggregatorError::NoCiphertexts => "no_ciphertexts",
        }
    }
}

impl ResponseError for AggregatorError {
    fn status_code(&self) -> StatusCode {
        match self {
            AggregatorError::BadRequest(_) | AggregatorError::NoCiphertexts => {
                StatusCode::BAD_REQUEST
            }
            AggregatorError::NoContext | AggregatorError::NoPlaintext => StatusCode::NOT_FOUND,
            AggregatorError::ContextWrite { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(StatusMessage {
            status: self.status().to_string(),
            msg: self.to_string(),
        })
    }
}
