// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Encryption contexts, ciphertexts and homomorphic summation.
//!
//! Callers pick a [`HomomorphicScheme`] through [`probe_scheme`] or [`scheme_for`] and never
//! touch the underlying library directly.

#[cfg(feature = "bfv")]
mod bfv;
mod ciphertext;
mod context;
mod encoding;
mod error;
mod passthrough;
mod scheme;
mod wire;

#[cfg(feature = "bfv")]
pub use bfv::{BfvScheme, SharedRng};
pub use ciphertext::Ciphertext;
pub use context::{PublicContext, SecretContext};
pub use encoding::FixedPointEncoder;
pub use error::{FheError, Result};
pub use passthrough::PassthroughScheme;
pub use scheme::{bfv_available, probe_scheme, scheme_for, HomomorphicScheme, SharedScheme};
pub use wire::{deserialize, ContextId, SchemeKind, WireKind, WireObject, MAGIC, WIRE_VERSION};

// Re-export presets so dependents can pick one without depending on heagg-fhe-params.
pub use heagg_fhe_params::{BfvPreset, PresetError, DEFAULT_BFV_PRESET};
