// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Upstream time sources.
//!
//! The engine only needs an offset per source per round, so anything that can
//! estimate one (an NTP server, a test double, a local reference) can take
//! part in synchronization by implementing [`TimeSource`].

use async_trait::async_trait;
use std::io;
use std::time::Duration;

use crate::protocol::NTP_PORT;
use crate::request;

/// A source the sync engine can ask for a clock offset.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use relay_client::source::TimeSource;
/// use std::io;
/// use std::time::Duration;
///
/// struct Fixed(f64);
///
/// #[async_trait]
/// impl TimeSource for Fixed {
///     fn name(&self) -> &str {
///         "fixed"
///     }
///
///     async fn query_offset(&self, _timeout: Duration) -> io::Result<f64> {
///         Ok(self.0)
///     }
/// }
/// ```
#[async_trait]
pub trait TimeSource: Send + Sync {
    /// Name used in logs and status output.
    fn name(&self) -> &str;

    /// Estimate `source time - local time` in seconds.
    ///
    /// Implementations should give up after `timeout`; the engine enforces it as well.
    async fn query_offset(&self, timeout: Duration) -> io::Result<f64>;
}

/// An upstream NTP server queried over UDP.
#[derive(Clone, Debug)]
pub struct NtpSource {
    host: String,
    addr: String,
}

impl NtpSource {
    /// Create a source for `host`, which may be `name`, `name:port`, `ipv4:port` or
    /// `[ipv6]:port`. Port 123 is assumed when none is given.
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into();
        let addr = with_default_port(&host);
        NtpSource { host, addr }
    }

    /// The address that will be resolved and queried.
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl TimeSource for NtpSource {
    fn name(&self) -> &str {
        &self.host
    }

    async fn query_offset(&self, timeout: Duration) -> io::Result<f64> {
        let result = request::request_with_timeout(&self.addr, timeout).await?;
        tracing::debug!(
            source = %self.host,
            offset = result.offset_seconds,
            delay = result.delay_seconds,
            stratum = result.stratum.0,
            "upstream replied"
        );
        Ok(result.offset_seconds)
    }
}

fn with_default_port(host: &str) -> String {
    let has_port = if let Some(rest) = host.strip_prefix('[') {
        rest.contains("]:")
    } else {
        // A bare IPv6 literal has several colons and no port.
        host.matches(':').count() == 1
    };
    if has_port {
        host.to_owned()
    } else if host.starts_with('[') {
        format!("{host}:{NTP_PORT}")
    } else if host.contains(':') {
        format!("[{host}]:{NTP_PORT}")
    } else {
        format!("{host}:{NTP_PORT}")
    }
}
