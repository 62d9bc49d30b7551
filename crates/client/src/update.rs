// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! The numeric update a contributor submits: a one-dimensional least-squares slope.

use crate::SummaryRecord;
use rand::Rng;
use tracing::debug;

/// Below this many records the synthetic dataset is used instead
pub const MIN_RECORDS: usize = 5;

const SYNTHETIC_LEN: usize = 10;
const SYNTHETIC_SLOPE: f64 = 0.5;
const SYNTHETIC_INTERCEPT: f64 = 2.0;
const SYNTHETIC_NOISE: f64 = 0.1;

/// Slope of the least-squares line through the origin, `Σxy / Σx²`. 0 when `Σx² = 0`.
pub fn least_squares_coefficient(records: &[SummaryRecord]) -> f64 {
    let (xy, xx) = records
        .iter()
        .fold((0.0, 0.0), |(xy, xx), r| (xy + r.x * r.y, xx + r.x * r.x));
    if xx == 0.0 {
        0.0
    } else {
        xy / xx
    }
}

/// `x = 0..9`, `y = 0.5x + 2` plus noise uniform in `[-0.1, 0.1]`
pub fn synthetic_records<R: Rng + ?Sized>(rng: &mut R) -> Vec<SummaryRecord> {
    (0..SYNTHETIC_LEN)
        .map(|i| {
            let x = i as f64;
            let noise = rng.gen_range(-SYNTHETIC_NOISE..=SYNTHETIC_NOISE);
            SummaryRecord::new(x, SYNTHETIC_SLOPE * x + SYNTHETIC_INTERCEPT + noise)
        })
        .collect()
}

/// Derive the update from fetched records, substituting the synthetic dataset when there
/// are too few of them.
pub fn compute_update<R: Rng + ?Sized>(records: &[SummaryRecord], rng: &mut R) -> f64 {
    if records.len() < MIN_RECORDS {
        debug!(
            records = records.len(),
            "Too few summary records, using the synthetic dataset"
        );
        return least_squares_coefficient(&synthetic_records(rng));
    }
    least_squares_coefficient(records)
}
