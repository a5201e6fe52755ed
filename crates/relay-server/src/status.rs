// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Status snapshots.
//!
//! A [`StatusSnapshot`] is assembled from short, independent lock
//! acquisitions, so its parts may come from slightly different instants. The
//! offset and last sync time are always read together.

use std::fmt;
use std::net::SocketAddr;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::stats::StatsSnapshot;

/// The server's state as reported to dashboards and logs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// Whether a run is in progress.
    pub running: bool,
    /// Configured listen host.
    pub host: String,
    /// Configured listen port.
    pub port: u16,
    /// Address actually bound, while running.
    pub local_addr: Option<SocketAddr>,
    /// Current correction, in seconds.
    pub time_offset: f64,
    /// Unix time of the last successful sync, `None` when never synced.
    pub last_sync_time: Option<f64>,
    /// Corrected Unix time when the snapshot was taken.
    pub current_time: f64,
    /// Connection counters.
    pub client_stats: StatsSnapshot,
    /// Upstream sources, in configuration order.
    pub upstream_servers: Vec<String>,
}

impl StatusSnapshot {
    /// The snapshot as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

fn local_time(unix_secs: f64) -> String {
    let secs = unix_secs.floor();
    let nanos = ((unix_secs - secs) * 1e9) as u32;
    match DateTime::from_timestamp(secs as i64, nanos) {
        Some(t) => t
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S%.3f")
            .to_string(),
        None => format!("{unix_secs:.3}"),
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.running { "running" } else { "stopped" };
        write!(f, "{state} on {}:{}", self.host, self.port)?;
        if let Some(addr) = self.local_addr {
            write!(f, " (bound {addr})")?;
        }
        write!(
            f,
            ", time {}, offset {:+.6} s, last sync ",
            local_time(self.current_time),
            self.time_offset
        )?;
        match self.last_sync_time {
            Some(t) => write!(f, "{}", local_time(t))?,
            None => write!(f, "never")?,
        }
        let stats = &self.client_stats;
        write!(
            f,
            ", clients {} active / {} total",
            stats.active_connections, stats.total_connections
        )?;
        if stats.rejected_connections > 0 {
            write!(f, " / {} rejected", stats.rejected_connections)?;
        }
        Ok(())
    }
}
