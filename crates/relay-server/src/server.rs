// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The relay server and its control interface.
//!
//! A [`RelayServer`] is created once and may be started and stopped any
//! number of times. Each run gets a fresh running flag shared by that run's
//! accept loop, sync scheduler and sessions, so tasks left over from an
//! earlier run never observe a later one as their own.
//!
//! The clock correction and the connection counters outlive runs: a restarted
//! server keeps its last offset and keeps counting from where it left off.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use relay_client::engine::SyncEngine;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::OffsetState;
use crate::acceptor::{self, Acceptor};
use crate::builder::RelayServerBuilder;
use crate::config::RelayConfig;
use crate::error::{ConfigError, ControlError};
use crate::scheduler::Scheduler;
use crate::session::SessionContext;
use crate::stats::ClientStats;
use crate::status::StatusSnapshot;

/// A time relay that serves upstream-corrected time over TCP.
///
/// Created via [`RelayServer::builder()`]. All control methods take `&self`,
/// so the server can be shared behind an `Arc` between a control surface and
/// a signal handler.
pub struct RelayServer {
    config: RelayConfig,
    engine: Arc<SyncEngine>,
    offset: Arc<OffsetState>,
    stats: Arc<ClientStats>,
    upstreams: Vec<String>,
    // Serializes start and stop; held across their awaits.
    control: tokio::sync::Mutex<Option<RunHandle>>,
    // Read synchronously by `status()`.
    current: Mutex<Option<SocketAddr>>,
}

struct RunHandle {
    running: Arc<AtomicBool>,
    acceptor: JoinHandle<()>,
    scheduler: JoinHandle<()>,
}

impl RelayServer {
    /// Create a builder for configuring the server.
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }

    pub(crate) fn from_parts(config: RelayConfig, engine: SyncEngine) -> Self {
        let offset = engine.state().clone();
        let upstreams = engine.source_names();
        RelayServer {
            config,
            engine: Arc::new(engine),
            offset,
            stats: Arc::new(ClientStats::new()),
            upstreams,
            control: tokio::sync::Mutex::new(None),
            current: Mutex::new(None),
        }
    }

    /// Bind the listener and start serving and synchronizing.
    ///
    /// Returns the bound address, which differs from the configured one when
    /// port 0 was requested. The first sync round starts immediately but is
    /// not awaited; until it completes, responses carry the uncorrected clock.
    ///
    /// # Errors
    ///
    /// [`ControlError::AlreadyRunning`] if a run is in progress, or the
    /// resolve or bind error. A failed start leaves the server stopped.
    pub async fn start(&self) -> io::Result<SocketAddr> {
        let mut control = self.control.lock().await;
        if control.is_some() {
            return Err(ControlError::AlreadyRunning.into());
        }

        let listen = self.config.listen_addr();
        let addr = tokio::net::lookup_host(&listen)
            .await?
            .next()
            .ok_or_else(|| ConfigError::NoListenAddress {
                address: listen.clone(),
            })?;
        let listener = acceptor::bind(addr, self.config.network.backlog)?;
        let local_addr = listener.local_addr()?;

        let running = Arc::new(AtomicBool::new(true));
        let acceptor = Acceptor {
            listener,
            session: SessionContext {
                offset: self.offset.clone(),
                template: self.config.response,
                read_timeout: self.config.network.read_timeout,
            },
            stats: self.stats.clone(),
            capacity: Arc::new(Semaphore::new(self.config.network.max_sessions)),
            poll_interval: self.config.network.accept_poll_interval,
            running: running.clone(),
        };
        let scheduler = Scheduler {
            engine: self.engine.clone(),
            interval: self.config.sync.interval,
            error_backoff: self.config.sync.error_backoff,
            poll_interval: self.config.network.accept_poll_interval,
            running: running.clone(),
        };

        *control = Some(RunHandle {
            running,
            acceptor: tokio::spawn(acceptor.run()),
            scheduler: tokio::spawn(scheduler.run()),
        });
        *self.current() = Some(local_addr);

        info!(
            %local_addr,
            upstreams = ?self.upstreams,
            sync_interval = ?self.config.sync.interval,
            "relay server started"
        );
        Ok(local_addr)
    }

    /// Stop accepting, close the listener and signal all tasks of this run.
    ///
    /// Returns once the listener is closed. Open sessions end within one read
    /// timeout. A sync round already in flight finishes in the background
    /// and its result is still applied.
    ///
    /// # Errors
    ///
    /// [`ControlError::NotRunning`] if no run is in progress.
    pub async fn stop(&self) -> io::Result<()> {
        let mut control = self.control.lock().await;
        let Some(run) = control.take() else {
            return Err(ControlError::NotRunning.into());
        };

        run.running.store(false, Ordering::Release);
        *self.current() = None;

        if let Err(e) = run.acceptor.await {
            error!(error = %e, "accept loop ended abnormally");
        }
        // The scheduler exits on its own at its next check of the flag.
        drop(run.scheduler);

        info!("relay server stopped");
        Ok(())
    }

    /// Run one sync round now and report whether it updated the offset.
    ///
    /// Works whether or not the server is running.
    pub async fn trigger_sync(&self) -> bool {
        info!("manual sync requested");
        self.engine.sync_ok().await
    }

    /// A snapshot of the server's state.
    pub fn status(&self) -> StatusSnapshot {
        let local_addr = *self.current();
        let (offset, now) = self.offset.read_with_time();
        StatusSnapshot {
            running: local_addr.is_some(),
            host: self.config.network.host.clone(),
            port: self.config.network.port,
            local_addr,
            time_offset: offset.offset,
            last_sync_time: offset.last_sync(),
            current_time: now,
            client_stats: self.stats.snapshot(),
            upstream_servers: self.upstreams.clone(),
        }
    }

    /// Whether a run is in progress.
    pub fn is_running(&self) -> bool {
        self.current().is_some()
    }

    /// The bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.current()
    }

    /// The configuration the server was built with.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// The shared clock correction.
    pub fn offset_state(&self) -> &Arc<OffsetState> {
        &self.offset
    }

    /// The connection counters.
    pub fn stats(&self) -> &Arc<ClientStats> {
        &self.stats
    }

    /// The sync engine behind [`trigger_sync`](Self::trigger_sync).
    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    fn current(&self) -> MutexGuard<'_, Option<SocketAddr>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for RelayServer {
    fn drop(&mut self) {
        if let Some(run) = self.control.get_mut().take() {
            run.running.store(false, Ordering::Release);
        }
    }
}

impl std::fmt::Debug for RelayServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayServer")
            .field("listen", &self.config.listen_addr())
            .field("local_addr", &self.local_addr())
            .field("upstreams", &self.upstreams)
            .finish()
    }
}
