// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! The untrusted relay of the aggregation protocol.
//!
//! The service stores one public context, the ciphertexts contributors upload and the
//! plaintext aggregate the keyholder publishes. It never holds a secret key and performs no
//! arithmetic on what it stores.

mod app_data;
mod error;
pub mod models;
mod public_context_writer;
mod routes;
mod server;
mod store;

pub use app_data::AppData;
pub use error::AggregatorError;
pub use public_context_writer::PublicContextWriter;
pub use routes::setup_routes;
pub use server::{
    json_config, AggregatorServer, AggregatorServerBuilder, BoundServer, DEFAULT_HOST,
    DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT,
};
pub use store::{AggregatorState, AggregatorStore, PlaintextAggregate, StoredCiphertext};
