// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Wall-clock reads and epoch conversions.
//!
//! Relay packets carry Unix-epoch timestamps. Upstream NTP packets carry
//! 1900-epoch timestamps whose 32-bit seconds field wraps every era (about 136
//! years), so converting them back needs a pivot near the expected time.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::protocol::TimestampFormat;

/// The number of seconds from 1st January 1900 UTC to the start of the Unix epoch.
pub const EPOCH_DELTA: i64 = 2_208_988_800;

/// The number of seconds in one NTP era (2^32 seconds).
pub const ERA_SECONDS: i64 = 1 << 32;

/// Current system time as floating-point seconds since the Unix epoch.
///
/// Times before the epoch come back negative.
pub fn now_secs() -> f64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_secs_f64(),
        Err(err) => -err.duration().as_secs_f64(),
    }
}

/// Convert Unix seconds to an on-wire NTP (1900 epoch) timestamp, dropping the era.
pub fn unix_to_ntp(unix_secs: f64) -> TimestampFormat {
    TimestampFormat::from_secs_f64(unix_secs + EPOCH_DELTA as f64)
}

/// Convert an on-wire NTP timestamp back to Unix seconds, picking the era that lands
/// within half an era of `pivot_unix_secs`.
pub fn ntp_to_unix(ts: TimestampFormat, pivot_unix_secs: f64) -> f64 {
    let pivot_ntp = pivot_unix_secs.floor() as i64 + EPOCH_DELTA;
    let pivot_era = pivot_ntp.div_euclid(ERA_SECONDS);
    let mut ntp_secs = pivot_era * ERA_SECONDS + ts.seconds as i64;
    let diff = ntp_secs - pivot_ntp;
    if diff > ERA_SECONDS / 2 {
        ntp_secs -= ERA_SECONDS;
    } else if diff < -(ERA_SECONDS / 2) {
        ntp_secs += ERA_SECONDS;
    }
    let fraction = ts.fraction as f64 / ERA_SECONDS as f64;
    (ntp_secs - EPOCH_DELTA) as f64 + fraction
}
