// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Packet types and the fixed-size codec shared by the relay server and its clients.
//!
//! The relay speaks a 48-byte request/response packet whose header follows the
//! NTP layout (RFC 5905 Section 7.3) but whose timestamps are counted from the
//! Unix epoch. Upstream NTP queries use the standard 1900 epoch; [`unix_time`]
//! converts between the two.

#![warn(missing_docs)]

/// Error types for packet decoding.
pub mod error;

/// Packet types, fixed-point formats and the byte-level codec.
pub mod protocol;

/// Wall-clock helpers and epoch conversions.
pub mod unix_time;
