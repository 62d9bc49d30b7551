// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::presets::BfvParamSet;
use fhe::bfv::{BfvParameters, BfvParametersBuilder};
use std::sync::Arc;

pub fn build_bfv_params_from_set_arc(
    param_set: BfvParamSet,
) -> Result<Arc<BfvParameters>, fhe::Error> {
    build_bfv_params_arc(
        param_set.degree,
        param_set.plaintext_modulus,
        param_set.moduli,
    )
}

pub fn build_bfv_params_arc(
    degree: usize,
    plaintext_modulus: u64,
    moduli: &[u64],
) -> Result<Arc<BfvParameters>, fhe::Error> {
    BfvParametersBuilder::new()
        .set_degree(degree)
        .set_plaintext_modulus(plaintext_modulus)
        .set_moduli(moduli)
        .build_arc()
}
