// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Periodic synchronization.
//!
//! Rounds run back to back with a pause between them: the normal interval
//! after a round that completed (successfully or not), the shorter error
//! backoff after a round that faulted. Pauses are sliced so the scheduler
//! leaves promptly once the running flag is cleared.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use relay_client::engine::SyncEngine;
use tokio::time::Instant;
use tracing::{error, info};

pub(crate) struct Scheduler {
    pub(crate) engine: Arc<SyncEngine>,
    pub(crate) interval: Duration,
    pub(crate) error_backoff: Duration,
    pub(crate) poll_interval: Duration,
    pub(crate) running: Arc<AtomicBool>,
}

impl Scheduler {
    pub(crate) async fn run(self) {
        info!(interval = ?self.interval, "sync scheduler started");

        while self.running.load(Ordering::Acquire) {
            let engine = self.engine.clone();
            let round = tokio::spawn(async move { engine.sync().await });
            let pause = match round.await {
                Ok(_) => self.interval,
                Err(e) => {
                    error!(error = %e, backoff = ?self.error_backoff, "sync round faulted");
                    self.error_backoff
                }
            };
            self.pause(pause).await;
        }

        info!("sync scheduler stopped");
    }

    /// Sleep for `total`, or until the running flag clears. A pause too long
    /// to represent as an instant lasts until stop.
    async fn pause(&self, total: Duration) {
        let deadline = Instant::now().checked_add(total);
        while self.running.load(Ordering::Acquire) {
            let step = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => self.poll_interval,
            };
            if step.is_zero() {
                break;
            }
            tokio::time::sleep(step.min(self.poll_interval)).await;
        }
    }
}
