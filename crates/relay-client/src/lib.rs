// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Upstream synchronization for the ntp_relay time relay.
//!
//! The [`engine::SyncEngine`] queries every configured [`source::TimeSource`]
//! concurrently, discards implausible offsets, takes the lower median of what
//! remains and publishes it to the shared [`offset::OffsetState`]. The relay
//! server reads that state for every response it builds.
//!
//! # Examples
//!
//! ```no_run
//! # async fn example() {
//! use std::sync::Arc;
//! use relay_client::engine::SyncEngine;
//! use relay_client::offset::OffsetState;
//! use relay_client::source::NtpSource;
//!
//! let state = Arc::new(OffsetState::new());
//! let engine = SyncEngine::new(state.clone())
//!     .source(NtpSource::new("ntp.aliyun.com"))
//!     .source(NtpSource::new("cn.pool.ntp.org"));
//!
//! match engine.sync().await {
//!     Ok(report) => println!("offset {:+.6}s", report.offset),
//!     Err(e) => eprintln!("sync failed: {e}"),
//! }
//! println!("corrected time: {:.6}", state.corrected_now());
//! # }
//! ```

#![warn(missing_docs)]

// Re-export protocol types from relay_proto for convenience.
pub use relay_proto::{protocol, unix_time};

/// Error types for upstream queries and sync rounds.
pub mod error;

/// The shared clock correction.
pub mod offset;

/// Query helper for a running relay.
pub mod relay;

/// One-shot upstream NTP requests over UDP.
pub mod request;

/// Offset filtering and consensus selection.
pub mod selection;

/// The [`TimeSource`](source::TimeSource) trait and the NTP implementation.
pub mod source;

/// The upstream sync engine.
pub mod engine;

pub use request::NtpResult;
