// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The shared clock correction.
//!
//! One [`OffsetState`] is written by the sync engine and read by every relay
//! session. The offset and the time it was set always change together under a
//! single lock, so readers never see a new offset paired with an old sync time.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::unix_time;

/// A consistent copy of the correction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OffsetSnapshot {
    /// Seconds to add to the local clock.
    pub offset: f64,
    /// Unix time of the last successful sync, or 0 when never synced.
    pub last_sync: f64,
}

impl OffsetSnapshot {
    /// Last sync time, or `None` when no round has succeeded yet.
    pub fn last_sync(&self) -> Option<f64> {
        (self.last_sync > 0.0).then_some(self.last_sync)
    }

    /// `wall + offset`.
    pub fn corrected(&self, wall: f64) -> f64 {
        wall + self.offset
    }
}

/// Mutex-guarded offset and last sync time, initially zero.
#[derive(Debug, Default)]
pub struct OffsetState {
    inner: Mutex<OffsetSnapshot>,
}

impl OffsetState {
    /// A never-synced state with zero offset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read offset and last sync time together.
    pub fn snapshot(&self) -> OffsetSnapshot {
        *self.lock()
    }

    /// The current offset in seconds.
    pub fn offset(&self) -> f64 {
        self.lock().offset
    }

    /// The local clock corrected by the current offset.
    pub fn corrected_now(&self) -> f64 {
        self.read_with_time().1
    }

    /// Snapshot plus the corrected time, both taken under one lock acquisition.
    pub fn read_with_time(&self) -> (OffsetSnapshot, f64) {
        let snap = *self.lock();
        (snap, snap.corrected(unix_time::now_secs()))
    }

    /// Replace the offset and stamp the sync time, atomically.
    pub fn apply(&self, offset: f64, synced_at: f64) {
        let mut guard = self.lock();
        guard.offset = offset;
        guard.last_sync = synced_at;
    }

    // Poison is ignored: both fields are plain floats stored together.
    fn lock(&self) -> MutexGuard<'_, OffsetSnapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
