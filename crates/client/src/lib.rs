// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! The participants of an aggregation run.
//!
//! Every role is a one-shot function over its collaborators ([`AggregatorApi`],
//! [`SummarySource`], [`SecretStore`]) so runs can be driven without a network.

mod api;
mod error;
mod roles;
mod secret_store;
mod summary;
pub mod update;

pub use api::{AggregatedCiphertexts, AggregatorApi, HttpAggregatorClient};
pub use error::{ClientError, Result};
pub use heagg_config::AggregationMode;
pub use roles::*;
pub use secret_store::{FileSecretStore, MemorySecretStore, SecretStore};
pub use summary::{HttpSummarySource, SummaryRecord, SummarySource, SyntheticSummarySource};
