// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Relay configuration.
//!
//! Every field has a default, so an empty file is a valid configuration.
//! Durations are written as seconds and may be fractional:
//!
//! ```toml
//! [network]
//! host = "0.0.0.0"
//! port = 123
//! backlog = 5
//! max_sessions = 1024
//! accept_poll_interval = 1.0
//! read_timeout = 1.0
//!
//! [sync]
//! interval = 300
//! error_backoff = 60
//! query_timeout = 10
//! max_offset = 1000.0
//! upstream_servers = ["ntp.aliyun.com", "cn.pool.ntp.org"]
//!
//! [response]
//! stratum = 0
//! reference_id = "NTP1"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;
use crate::response::ResponseTemplate;

/// Upstream servers used when none are configured.
pub const DEFAULT_UPSTREAM_SERVERS: [&str; 4] = [
    "ntp.aliyun.com",
    "cn.pool.ntp.org",
    "ntp1.aliyun.com",
    "ntp2.aliyun.com",
];

/// Complete relay configuration.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// Listener settings.
    pub network: NetworkConfig,
    /// Upstream synchronization settings.
    pub sync: SyncConfig,
    /// Fixed fields of every response.
    pub response: ResponseTemplate,
}

/// Listener and session settings.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    /// Host or address to bind.
    pub host: String,
    /// TCP port; 0 picks an ephemeral port.
    pub port: u16,
    /// Listen backlog.
    pub backlog: u32,
    /// Sessions served at once; further connections are closed on accept.
    pub max_sessions: usize,
    /// Longest the accept loop waits before re-checking the running flag.
    #[serde(deserialize_with = "de_secs")]
    pub accept_poll_interval: Duration,
    /// Longest a session waits on a read before re-checking the running flag.
    /// A reply that takes longer than this to write ends the session.
    #[serde(deserialize_with = "de_secs")]
    pub read_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            host: "0.0.0.0".to_owned(),
            port: crate::protocol::NTP_PORT,
            backlog: 5,
            max_sessions: 1024,
            accept_poll_interval: Duration::from_secs(1),
            read_timeout: Duration::from_secs(1),
        }
    }
}

/// Upstream synchronization settings.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Pause after a completed round.
    #[serde(deserialize_with = "de_secs")]
    pub interval: Duration,
    /// Pause after a round that faulted.
    #[serde(deserialize_with = "de_secs")]
    pub error_backoff: Duration,
    /// Per-source query timeout.
    #[serde(deserialize_with = "de_secs")]
    pub query_timeout: Duration,
    /// Offsets with a larger magnitude, in seconds, are discarded.
    pub max_offset: f64,
    /// Upstream NTP servers, as `host` or `host:port`.
    pub upstream_servers: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            interval: Duration::from_secs(300),
            error_backoff: Duration::from_secs(60),
            query_timeout: relay_client::engine::DEFAULT_QUERY_TIMEOUT,
            max_offset: relay_client::selection::DEFAULT_MAX_OFFSET,
            upstream_servers: DEFAULT_UPSTREAM_SERVERS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        }
    }
}

impl RelayConfig {
    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Self::from_toml_str(&text)
    }

    /// `host:port` as given to the resolver.
    pub fn listen_addr(&self) -> String {
        let host = &self.network.host;
        if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]:{}", self.network.port)
        } else {
            format!("{host}:{}", self.network.port)
        }
    }

    /// Check ranges that the type system does not.
    ///
    /// The upstream list is not checked here; a server built with custom
    /// time sources does not need one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::InvalidValue { field, reason });
        if self.network.host.is_empty() {
            return invalid("network.host", "must not be empty");
        }
        if self.network.backlog == 0 {
            return invalid("network.backlog", "must be at least 1");
        }
        if self.network.max_sessions == 0 {
            return invalid("network.max_sessions", "must be at least 1");
        }
        if self.network.accept_poll_interval.is_zero() {
            return invalid("network.accept_poll_interval", "must be positive");
        }
        if self.network.read_timeout.is_zero() {
            return invalid("network.read_timeout", "must be positive");
        }
        if self.sync.interval.is_zero() {
            return invalid("sync.interval", "must be positive");
        }
        if self.sync.error_backoff.is_zero() {
            return invalid("sync.error_backoff", "must be positive");
        }
        if self.sync.query_timeout.is_zero() {
            return invalid("sync.query_timeout", "must be positive");
        }
        if self.sync.max_offset.is_nan() || self.sync.max_offset <= 0.0 {
            return invalid("sync.max_offset", "must be a positive number of seconds");
        }
        if self.sync.upstream_servers.iter().any(|s| s.trim().is_empty()) {
            return invalid("sync.upstream_servers", "entries must not be empty");
        }
        Ok(())
    }
}

fn de_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}
