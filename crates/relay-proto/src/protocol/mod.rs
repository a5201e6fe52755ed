// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Packet types and the 48-byte codec.
//!
//! [`TimePacket::encode`] and [`TimePacket::decode`] work on byte slices;
//! callers own the buffers and the transport.
//!
//! Header field meanings follow RFC 5905 Section 7.3.

/// Default port for upstream NTP queries.
pub const NTP_PORT: u16 = 123;

/// Largest request the relay reads from a connection in one call.
pub const MAX_REQUEST_BYTES: usize = 1024;

mod bytes;
mod types;

pub use self::types::*;
