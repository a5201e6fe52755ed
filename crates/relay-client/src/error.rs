// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Custom error types for upstream queries and sync rounds.
//!
//! Query functions return `io::Result<T>`. Internally, failures are built as
//! [`QueryError`] variants and converted with `From<QueryError> for io::Error`,
//! so callers can recover the variant through `io::Error::get_ref()`:
//!
//! ```no_run
//! use relay_client::error::QueryError;
//!
//! # async fn example() {
//! match relay_client::request::request("ntp.aliyun.com:123").await {
//!     Ok(result) => println!("offset: {:.6}s", result.offset_seconds),
//!     Err(e) => {
//!         if let Some(QueryError::KissOfDeath(code)) = e
//!             .get_ref()
//!             .and_then(|inner| inner.downcast_ref::<QueryError>())
//!         {
//!             eprintln!("refused with kiss code {code:?}");
//!         }
//!     }
//! }
//! # }
//! ```

// Re-export proto error types for convenience.
pub use relay_proto::error::ParseError;

use std::fmt;
use std::io;

use relay_proto::protocol::KissOfDeath;

/// Reasons an upstream reply is refused.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryError {
    /// Reply shorter than a packet.
    ResponseTooShort {
        /// Number of bytes received.
        received: usize,
    },
    /// Reply came from an address we did not query.
    UnexpectedSource,
    /// Reply mode is not server.
    UnexpectedMode,
    /// Reply does not echo our transmit timestamp.
    OriginTimestampMismatch,
    /// Server transmit timestamp is zero.
    ZeroTransmitTimestamp,
    /// Server reports an unsynchronized clock.
    UnsynchronizedServer,
    /// Server sent a Kiss-o'-Death code.
    KissOfDeath(KissOfDeath),
    /// Host name resolved to nothing.
    NoAddresses {
        /// The address that failed to resolve.
        address: String,
    },
    /// No reply within the query timeout.
    Timeout,
}

/// Reasons a sync round leaves the offset untouched.
#[derive(Clone, Debug, PartialEq)]
pub enum SyncError {
    /// No source produced a reply.
    NoResponses {
        /// Number of sources that failed.
        failed: usize,
    },
    /// Sources replied but every offset was outside the sanity bound.
    AllRejected {
        /// Number of offsets discarded.
        rejected: usize,
        /// Number of sources that failed.
        failed: usize,
    },
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::ResponseTooShort { received } => {
                write!(f, "NTP response too short ({received} bytes)")
            }
            QueryError::UnexpectedSource => write!(f, "response from unexpected source address"),
            QueryError::UnexpectedMode => {
                write!(f, "unexpected response mode (expected Server)")
            }
            QueryError::OriginTimestampMismatch => {
                write!(
                    f,
                    "origin timestamp mismatch: response does not match our request"
                )
            }
            QueryError::ZeroTransmitTimestamp => write!(f, "server transmit timestamp is zero"),
            QueryError::UnsynchronizedServer => write!(f, "server reports unsynchronized clock"),
            QueryError::KissOfDeath(code) => {
                write!(f, "server sent Kiss-o'-Death {code:?}")
            }
            QueryError::NoAddresses { address } => {
                write!(f, "address resolved to no socket addresses: {address}")
            }
            QueryError::Timeout => write!(f, "NTP request timed out"),
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::NoResponses { failed } => {
                write!(f, "no upstream responded ({failed} failed)")
            }
            SyncError::AllRejected { rejected, failed } => {
                write!(
                    f,
                    "all {rejected} upstream offsets exceeded the sanity bound ({failed} failed)"
                )
            }
        }
    }
}

impl std::error::Error for QueryError {}
impl std::error::Error for SyncError {}

impl From<QueryError> for io::Error {
    fn from(err: QueryError) -> io::Error {
        let kind = match &err {
            QueryError::KissOfDeath(_) => io::ErrorKind::ConnectionRefused,
            QueryError::NoAddresses { .. } => io::ErrorKind::InvalidInput,
            QueryError::Timeout => io::ErrorKind::TimedOut,
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}

impl From<SyncError> for io::Error {
    fn from(err: SyncError) -> io::Error {
        io::Error::other(err)
    }
}
