// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Builder for configuring and creating a [`RelayServer`].
//!
//! The builder starts from [`RelayConfig::default()`] and can either be fed a
//! whole configuration (for example one loaded from TOML) or adjusted field by
//! field. Upstreams are NTP servers unless custom [`TimeSource`]s are given,
//! in which case those replace the configured server list.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use relay_client::engine::SyncEngine;

use crate::config::RelayConfig;
use crate::error::ConfigError;
use crate::protocol::{ReferenceId, Stratum};
use crate::response::ResponseTemplate;
use crate::server::RelayServer;
use crate::{NtpSource, OffsetState, TimeSource};

/// Builder for configuring and creating a [`RelayServer`].
pub struct RelayServerBuilder {
    config: RelayConfig,
    sources: Vec<Arc<dyn TimeSource>>,
    upstreams_set: bool,
}

impl RelayServerBuilder {
    pub(crate) fn new() -> Self {
        RelayServerBuilder {
            config: RelayConfig::default(),
            sources: Vec::new(),
            upstreams_set: false,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self.upstreams_set = true;
        self
    }

    /// Set the listen host (default: `"0.0.0.0"`).
    pub fn listen(mut self, host: impl Into<String>) -> Self {
        self.config.network.host = host.into();
        self
    }

    /// Set the listen port (default: 123). Port 0 binds an ephemeral port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.network.port = port;
        self
    }

    /// Set the listen backlog (default: 5).
    pub fn backlog(mut self, backlog: u32) -> Self {
        self.config.network.backlog = backlog;
        self
    }

    /// Set how many sessions may be open at once (default: 1024).
    pub fn max_sessions(mut self, max: usize) -> Self {
        self.config.network.max_sessions = max;
        self
    }

    /// Set how often the accept loop and scheduler re-check for shutdown (default: 1 s).
    pub fn accept_poll_interval(mut self, interval: Duration) -> Self {
        self.config.network.accept_poll_interval = interval;
        self
    }

    /// Set how long a session waits on a read before re-checking for shutdown, and
    /// how long a reply may take to write (default: 1 s).
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.network.read_timeout = timeout;
        self
    }

    /// Add an upstream NTP server.
    ///
    /// The first call replaces the default server list.
    pub fn upstream(mut self, host: impl Into<String>) -> Self {
        if !self.upstreams_set {
            self.config.sync.upstream_servers.clear();
            self.upstreams_set = true;
        }
        self.config.sync.upstream_servers.push(host.into());
        self
    }

    /// Add a custom time source. When any are given, the NTP server list is ignored.
    pub fn time_source(mut self, source: impl TimeSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Set the pause between sync rounds (default: 300 s).
    pub fn sync_interval(mut self, interval: Duration) -> Self {
        self.config.sync.interval = interval;
        self
    }

    /// Set the pause after a faulted sync round (default: 60 s).
    pub fn error_backoff(mut self, backoff: Duration) -> Self {
        self.config.sync.error_backoff = backoff;
        self
    }

    /// Set the per-source query timeout (default: 10 s).
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.config.sync.query_timeout = timeout;
        self
    }

    /// Set the largest offset magnitude, in seconds, accepted from a source (default: 1000).
    pub fn max_offset(mut self, max_offset: f64) -> Self {
        self.config.sync.max_offset = max_offset;
        self
    }

    /// Set all fixed response fields.
    pub fn response(mut self, template: ResponseTemplate) -> Self {
        self.config.response = template;
        self
    }

    /// Set the stratum reported in responses (default: 0).
    pub fn stratum(mut self, stratum: Stratum) -> Self {
        self.config.response.stratum = stratum;
        self
    }

    /// Set the reference ID reported in responses (default: `NTP1`).
    pub fn reference_id(mut self, id: ReferenceId) -> Self {
        self.config.response.reference_id = id;
        self
    }

    /// Validate the configuration and create the server. Nothing is bound until
    /// [`RelayServer::start`].
    pub fn build(self) -> io::Result<RelayServer> {
        self.config.validate()?;

        let sources: Vec<Arc<dyn TimeSource>> = if self.sources.is_empty() {
            if self.config.sync.upstream_servers.is_empty() {
                return Err(ConfigError::NoUpstreams.into());
            }
            self.config
                .sync
                .upstream_servers
                .iter()
                .map(|host| Arc::new(NtpSource::new(host.as_str())) as Arc<dyn TimeSource>)
                .collect()
        } else {
            self.sources
        };

        let engine = sources.into_iter().fold(
            SyncEngine::new(Arc::new(OffsetState::new()))
                .query_timeout(self.config.sync.query_timeout)
                .max_offset(self.config.sync.max_offset),
            SyncEngine::shared_source,
        );

        Ok(RelayServer::from_parts(self.config, engine))
    }
}
