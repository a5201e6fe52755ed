// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for relay server integration tests.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use relay_server::TimeSource;
use relay_server::builder::RelayServerBuilder;
use relay_server::server::RelayServer;

/// How long tests wait for background tasks to catch up.
#[allow(dead_code)]
pub(crate) const SETTLE: Duration = Duration::from_secs(3);

/// Always reports the same offset.
pub(crate) struct FixedSource(pub(crate) f64);

#[async_trait]
impl TimeSource for FixedSource {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn query_offset(&self, _timeout: Duration) -> io::Result<f64> {
        Ok(self.0)
    }
}

/// A builder for a loopback relay on an ephemeral port with fast shutdown checks.
pub(crate) fn test_builder(offset: f64) -> RelayServerBuilder {
    RelayServer::builder()
        .listen("127.0.0.1")
        .port(0)
        .accept_poll_interval(Duration::from_millis(50))
        .read_timeout(Duration::from_millis(50))
        .time_source(FixedSource(offset))
}

/// Build and start a test relay, returning it with its bound address.
pub(crate) async fn spawn_test_server(builder: RelayServerBuilder) -> (RelayServer, SocketAddr) {
    let server = builder.build().expect("failed to build test server");
    let addr = server.start().await.expect("failed to start test server");
    (server, addr)
}

/// Poll `cond` until it holds or [`SETTLE`] elapses.
#[allow(dead_code)]
pub(crate) async fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + SETTLE;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
