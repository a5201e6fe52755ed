// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Time relay server using the Tokio runtime.
//!
//! The relay keeps a clock correction fresh by periodically synchronizing
//! against upstream NTP servers, and answers 48-byte requests on TCP with
//! timestamps taken from the corrected clock.
//!
//! # Architecture
//!
//! A [`server::RelayServer`] owns two independently locked state blocks, the
//! clock correction ([`OffsetState`]) and the connection counters
//! ([`stats::ClientStats`]). Starting the server spawns one accept loop and
//! one sync scheduler; every accepted connection gets its own session task.
//! All of them watch a per-run flag that [`server::RelayServer::stop`] clears.
//!
//! # Examples
//!
//! ```no_run
//! # async fn example() -> std::io::Result<()> {
//! use relay_server::server::RelayServer;
//!
//! let server = RelayServer::builder()
//!     .listen("0.0.0.0")
//!     .port(1123)
//!     .upstream("ntp.aliyun.com")
//!     .upstream("cn.pool.ntp.org")
//!     .build()?;
//!
//! let addr = server.start().await?;
//! println!("relay listening on {addr}");
//! println!("{}", server.status());
//! server.stop().await
//! # }
//! ```

#![warn(missing_docs)]

// Re-export shared types for convenience.
pub use relay_client::offset::OffsetState;
pub use relay_client::source::{NtpSource, TimeSource};
pub use relay_proto::{protocol, unix_time};

/// Builder for [`server::RelayServer`].
pub mod builder;

/// Relay configuration and TOML loading.
pub mod config;

/// Error types for configuration and the control interface.
pub mod error;

/// Response construction from the corrected clock.
pub mod response;

/// Per-connection request handling.
pub mod session;

/// Connection counters.
pub mod stats;

/// Status snapshots for dashboards and logs.
pub mod status;

/// The relay server context and its control interface.
pub mod server;

mod acceptor;
mod scheduler;
