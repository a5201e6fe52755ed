// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Custom error types for packet decoding.
//!
//! [`ParseError`] converts into [`std::io::Error`] so codec callers working in
//! `io::Result` can propagate it with `?` and still downcast it later.

use std::fmt;
use std::io;

use crate::protocol::{ConstPackedSizeBytes, TimePacket};

/// Errors that can occur while decoding a [`TimePacket`](crate::protocol::TimePacket).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The input is shorter than a full packet.
    NotAPacket {
        /// Number of bytes that were available.
        received: usize,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::NotAPacket { received } => {
                write!(
                    f,
                    "not a packet: needed {} bytes, got {}",
                    TimePacket::PACKED_SIZE_BYTES,
                    received
                )
            }
        }
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for io::Error {
    fn from(err: ParseError) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}
