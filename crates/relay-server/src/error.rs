// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Custom error types for the relay server.
//!
//! All public APIs return `io::Result<T>`. Internally, errors are built as
//! [`RelayError`] variants and converted with `From<RelayError> for io::Error`.
//! Callers that need to tell a control refusal from a socket failure can
//! downcast via `io::Error::get_ref()`:
//!
//! ```no_run
//! use relay_server::error::{ControlError, RelayError};
//!
//! # async fn example(server: relay_server::server::RelayServer) {
//! if let Err(e) = server.start().await {
//!     match e.get_ref().and_then(|inner| inner.downcast_ref::<RelayError>()) {
//!         Some(RelayError::Control(ControlError::AlreadyRunning)) => {}
//!         _ => eprintln!("start failed: {e}"),
//!     }
//! }
//! # }
//! ```

// Re-export proto error types for convenience.
pub use relay_proto::error::ParseError;

use std::fmt;
use std::io;

/// Errors that can occur during relay server operations.
#[derive(Debug)]
pub enum RelayError {
    /// A control request that does not fit the current state.
    Control(ControlError),
    /// Invalid or unreadable configuration.
    Config(ConfigError),
    /// Underlying I/O error (bind, accept, etc.).
    Io(io::Error),
}

/// Control requests refused because of the server's state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ControlError {
    /// `start` while already running.
    AlreadyRunning,
    /// `stop` while not running.
    NotRunning,
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Read(io::Error),
    /// The configuration file is not valid TOML for this schema.
    Parse(toml::de::Error),
    /// No upstream servers and no custom time sources.
    NoUpstreams,
    /// The listen host resolved to no address.
    NoListenAddress {
        /// The configured `host:port`.
        address: String,
    },
    /// A value is outside its allowed range.
    InvalidValue {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

// ── Display implementations ─────────────────────────────────────────

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::Control(e) => write!(f, "{e}"),
            RelayError::Config(e) => write!(f, "relay config error: {e}"),
            RelayError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::AlreadyRunning => write!(f, "relay server is already running"),
            ControlError::NotRunning => write!(f, "relay server is not running"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read(e) => write!(f, "couldn't read config: {e}"),
            ConfigError::Parse(e) => write!(f, "couldn't parse config: {e}"),
            ConfigError::NoUpstreams => write!(f, "at least one upstream server is required"),
            ConfigError::NoListenAddress { address } => {
                write!(f, "listen address resolved to no socket addresses: {address}")
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for {field}: {reason}")
            }
        }
    }
}

// ── Error trait implementations ─────────────────────────────────────

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelayError::Control(e) => Some(e),
            RelayError::Config(e) => Some(e),
            RelayError::Io(e) => Some(e),
        }
    }
}

impl std::error::Error for ControlError {}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

// ── From conversions ────────────────────────────────────────────────

impl From<RelayError> for io::Error {
    fn from(err: RelayError) -> io::Error {
        let kind = match &err {
            RelayError::Control(ControlError::AlreadyRunning) => io::ErrorKind::AlreadyExists,
            RelayError::Control(ControlError::NotRunning) => io::ErrorKind::NotConnected,
            RelayError::Config(_) => io::ErrorKind::InvalidInput,
            RelayError::Io(e) => e.kind(),
        };
        // Preserve the original io::Error directly for the Io variant.
        if let RelayError::Io(e) = err {
            return e;
        }
        io::Error::new(kind, err)
    }
}

impl From<ControlError> for io::Error {
    fn from(err: ControlError) -> io::Error {
        RelayError::Control(err).into()
    }
}

impl From<ConfigError> for io::Error {
    fn from(err: ConfigError) -> io::Error {
        RelayError::Config(err).into()
    }
}

impl From<io::Error> for RelayError {
    fn from(err: io::Error) -> RelayError {
        RelayError::Io(err)
    }
}

impl From<ConfigError> for RelayError {
    fn from(err: ConfigError) -> RelayError {
        RelayError::Config(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> ConfigError {
        ConfigError::Parse(err)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
