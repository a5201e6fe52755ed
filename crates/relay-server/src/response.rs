// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Response construction.
//!
//! Every valid request gets a server-mode reply whose four timestamps all come
//! from the corrected clock. The remaining header fields are fixed by a
//! [`ResponseTemplate`]. Nothing from the request is echoed back.

use serde::{Deserialize, Deserializer};

use crate::OffsetState;
use crate::protocol::{
    LeapIndicator, Mode, ReferenceId, ShortFormat, Stratum, TimePacket, TimestampFormat, Version,
};

/// Header fields copied into every response.
///
/// The defaults produce a first byte of `0x1C` (no leap warning, version 3,
/// server mode), stratum 0, poll 4, precision `0xFA`, root delay and
/// dispersion of one second, and reference ID `NTP1`.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ResponseTemplate {
    /// Version number placed in the first byte.
    #[serde(deserialize_with = "de_version")]
    pub version: Version,
    /// Stratum byte.
    #[serde(deserialize_with = "de_stratum")]
    pub stratum: Stratum,
    /// Poll exponent.
    pub poll: i8,
    /// Precision exponent.
    pub precision: i8,
    /// Root delay, in seconds.
    pub root_delay: f64,
    /// Root dispersion, in seconds.
    pub root_dispersion: f64,
    /// Reference identifier; up to four ASCII characters in configuration.
    #[serde(deserialize_with = "de_reference_id")]
    pub reference_id: ReferenceId,
}

impl Default for ResponseTemplate {
    fn default() -> Self {
        ResponseTemplate {
            version: Version::V3,
            stratum: Stratum::UNSPECIFIED,
            poll: 4,
            precision: -6,
            root_delay: 1.0,
            root_dispersion: 1.0,
            reference_id: ReferenceId::NTP1,
        }
    }
}

impl ResponseTemplate {
    /// Build a response stamped from `offset`.
    ///
    /// The reference and origin timestamps share one corrected read. The
    /// receive and transmit timestamps are each read separately afterwards,
    /// so `reference <= receive <= transmit` while the offset is unchanged.
    pub fn respond(&self, offset: &OffsetState) -> TimePacket {
        let stamp = |t: f64| TimestampFormat::from_secs_f64(t);

        let reference = stamp(offset.corrected_now());
        let receive = stamp(offset.corrected_now());
        let transmit = stamp(offset.corrected_now());

        TimePacket {
            leap_indicator: LeapIndicator::NoWarning,
            version: self.version,
            mode: Mode::Server,
            stratum: self.stratum,
            poll: self.poll,
            precision: self.precision,
            root_delay: ShortFormat::from_secs_f64(self.root_delay),
            root_dispersion: ShortFormat::from_secs_f64(self.root_dispersion),
            reference_id: self.reference_id,
            reference_timestamp: reference,
            origin_timestamp: reference,
            receive_timestamp: receive,
            transmit_timestamp: transmit,
        }
    }
}

fn de_version<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Version, D::Error> {
    let v = u8::deserialize(deserializer)?;
    if !(1..=4).contains(&v) {
        return Err(serde::de::Error::custom(format!(
            "version must be between 1 and 4, got {v}"
        )));
    }
    Ok(Version::from_bits(v))
}

fn de_stratum<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Stratum, D::Error> {
    u8::deserialize(deserializer).map(Stratum)
}

fn de_reference_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ReferenceId, D::Error> {
    let text = String::deserialize(deserializer)?;
    if text.len() > 4 || !text.is_ascii() {
        return Err(serde::de::Error::custom(format!(
            "reference_id must be at most 4 ASCII characters, got {text:?}"
        )));
    }
    let mut id = [0u8; 4];
    id[..text.len()].copy_from_slice(text.as_bytes());
    Ok(ReferenceId(id))
}
