// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Test doubles for upstream time sources.

use async_trait::async_trait;
use relay_client::source::TimeSource;
use std::io;
use std::time::Duration;

/// Always reports the same offset.
pub(crate) struct FixedSource {
    pub(crate) name: String,
    pub(crate) offset: f64,
}

/// Shorthand for a list of fixed sources named `fixed-<index>`.
pub(crate) fn fixed_sources(offsets: &[f64]) -> Vec<FixedSource> {
    offsets
        .iter()
        .enumerate()
        .map(|(i, &offset)| FixedSource {
            name: format!("fixed-{i}"),
            offset,
        })
        .collect()
}

#[async_trait]
impl TimeSource for FixedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query_offset(&self, _timeout: Duration) -> io::Result<f64> {
        Ok(self.offset)
    }
}

/// Always fails like an unreachable host.
pub(crate) struct FailingSource;

#[async_trait]
impl TimeSource for FailingSource {
    fn name(&self) -> &str {
        "failing"
    }

    async fn query_offset(&self, _timeout: Duration) -> io::Result<f64> {
        Err(io::Error::new(
            io::ErrorKind::HostUnreachable,
            "no route to host",
        ))
    }
}

/// Replies only after `delay`, ignoring the timeout it is given.
pub(crate) struct SlowSource {
    pub(crate) delay: Duration,
    pub(crate) offset: f64,
}

#[async_trait]
impl TimeSource for SlowSource {
    fn name(&self) -> &str {
        "slow"
    }

    async fn query_offset(&self, _timeout: Duration) -> io::Result<f64> {
        tokio::time::sleep(self.delay).await;
        Ok(self.offset)
    }
}

/// Panics inside its query.
pub(crate) struct PanickingSource;

#[async_trait]
impl TimeSource for PanickingSource {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn query_offset(&self, _timeout: Duration) -> io::Result<f64> {
        panic!("source exploded");
    }
}
