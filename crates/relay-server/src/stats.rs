// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Connection counters.
//!
//! The counters are shared between the accept loop, which opens sessions, and
//! the session tasks, which close them. A session is counted as active for
//! exactly as long as its [`SessionGuard`] lives, so every exit path of a
//! session (peer close, I/O error, shutdown, panic) decrements it once.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::unix_time;

/// Mutex-guarded connection counters.
#[derive(Debug, Default)]
pub struct ClientStats {
    inner: Mutex<StatsSnapshot>,
}

/// A point-in-time copy of the counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Connections admitted since the server was created.
    pub total_connections: u64,
    /// Sessions currently open.
    pub active_connections: u64,
    /// Unix time of the most recent admitted connection.
    pub last_client_time: Option<f64>,
    /// Connections closed on accept because the session limit was reached.
    pub rejected_connections: u64,
}

impl ClientStats {
    /// All counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        *self.lock()
    }

    /// Count a newly admitted connection and return the guard that closes it.
    pub fn open(self: &Arc<Self>, peer: SocketAddr) -> SessionGuard {
        {
            let mut stats = self.lock();
            stats.total_connections += 1;
            stats.active_connections += 1;
            stats.last_client_time = Some(unix_time::now_secs());
        }
        SessionGuard {
            stats: Arc::clone(self),
            peer,
        }
    }

    /// Count a connection refused for lack of session capacity.
    pub fn record_rejected(&self) {
        self.lock().rejected_connections += 1;
    }

    fn close(&self) {
        let mut stats = self.lock();
        stats.active_connections = stats.active_connections.saturating_sub(1);
    }

    fn lock(&self) -> MutexGuard<'_, StatsSnapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks one session as active until dropped.
#[derive(Debug)]
pub struct SessionGuard {
    stats: Arc<ClientStats>,
    peer: SocketAddr,
}

impl SessionGuard {
    /// The client this session serves.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.stats.close();
    }
}
