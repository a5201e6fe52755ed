// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The accept loop.
//!
//! Accepting is bounded by the poll interval so the loop re-checks the running
//! flag at least that often. A failed accept is retried after one poll
//! interval. Each admitted connection is served on its own
//! task; once `max_sessions` are open, further connections are closed right
//! after accept and counted as rejected.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::session::{self, SessionContext};
use crate::stats::ClientStats;

/// Bind a reusable listening socket with the given backlog.
pub(crate) fn bind(addr: SocketAddr, backlog: u32) -> io::Result<TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(backlog)
}

pub(crate) struct Acceptor {
    pub(crate) listener: TcpListener,
    pub(crate) session: SessionContext,
    pub(crate) stats: Arc<ClientStats>,
    pub(crate) capacity: Arc<Semaphore>,
    pub(crate) poll_interval: Duration,
    pub(crate) running: Arc<AtomicBool>,
}

impl Acceptor {
    /// Accept until the running flag is cleared. The listener closes on return.
    pub(crate) async fn run(self) {
        let local = self.listener.local_addr().ok();
        info!(addr = ?local, "accepting connections");

        while self.running.load(Ordering::Acquire) {
            match tokio::time::timeout(self.poll_interval, self.listener.accept()).await {
                Err(_) => continue,
                Ok(Ok((stream, peer))) => self.admit(stream, peer),
                Ok(Err(e)) => self.accept_failed(&e).await,
            }
        }

        info!(addr = ?local, "accept loop stopped");
    }

    /// Errors such as descriptor exhaustion persist, so wait one poll interval
    /// before accepting again.
    async fn accept_failed(&self, e: &io::Error) {
        if !self.running.load(Ordering::Acquire) {
            return;
        }
        error!(error = %e, retry_in = ?self.poll_interval, "accept failed");
        tokio::time::sleep(self.poll_interval).await;
    }

    fn admit(&self, stream: TcpStream, peer: SocketAddr) {
        let Ok(permit) = self.capacity.clone().try_acquire_owned() else {
            self.stats.record_rejected();
            warn!(%peer, "session limit reached, closing connection");
            return;
        };

        let guard = self.stats.open(peer);
        debug!(%peer, "connection accepted");

        let ctx = self.session.clone();
        let running = self.running.clone();
        tokio::spawn(async move {
            session::serve(stream, guard.peer(), &ctx, &running).await;
            drop(permit);
            drop(guard);
        });
    }
}
