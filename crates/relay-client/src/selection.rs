// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Offset filtering and consensus selection.
//!
//! Outlier rejection is a single sanity threshold on the absolute offset. The
//! consensus is the lower median of the sorted survivors: the middle element
//! for odd counts and the lower of the two middle elements for even counts.

/// Default sanity bound on an upstream offset, in seconds.
pub const DEFAULT_MAX_OFFSET: f64 = 1000.0;

/// Split `offsets` into those within `max_abs` seconds of zero and a count of the rest.
///
/// Non-finite offsets are always rejected.
pub fn filter_outliers(offsets: &[f64], max_abs: f64) -> (Vec<f64>, usize) {
    let kept: Vec<f64> = offsets
        .iter()
        .copied()
        .filter(|o| o.abs() <= max_abs)
        .collect();
    let rejected = offsets.len() - kept.len();
    (kept, rejected)
}

/// Sort `offsets` ascending and return the lower median, at index `(len - 1) / 2`.
///
/// Returns `None` for an empty input.
pub fn select_consensus(mut offsets: Vec<f64>) -> Option<f64> {
    if offsets.is_empty() {
        return None;
    }
    offsets.sort_by(f64::total_cmp);
    Some(offsets[(offsets.len() - 1) / 2])
}
