// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The upstream sync engine.
//!
//! A round asks every source for an offset at once, each bounded by the query
//! timeout. A failing, timed-out or panicking source only drops out of that
//! round. Surviving offsets are sanity-filtered and reduced to their lower
//! median, which replaces the shared offset. When nothing survives, the
//! previous offset and sync time stay in place.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::SyncError;
use crate::offset::OffsetState;
use crate::selection::{self, DEFAULT_MAX_OFFSET};
use crate::source::TimeSource;
use crate::unix_time;

/// Default per-source query timeout.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a successful round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SyncReport {
    /// The offset now in effect.
    pub offset: f64,
    /// Unix time the offset was applied.
    pub synced_at: f64,
    /// Offsets that passed the sanity bound.
    pub accepted: usize,
    /// Offsets discarded by the sanity bound.
    pub rejected: usize,
    /// Sources that produced no offset.
    pub failed: usize,
}

/// Queries upstream sources and maintains the shared [`OffsetState`].
pub struct SyncEngine {
    sources: Vec<Arc<dyn TimeSource>>,
    query_timeout: Duration,
    max_offset: f64,
    state: Arc<OffsetState>,
}

impl SyncEngine {
    /// An engine with no sources, a 10 s query timeout and a 1000 s sanity bound.
    pub fn new(state: Arc<OffsetState>) -> Self {
        SyncEngine {
            sources: Vec::new(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            max_offset: DEFAULT_MAX_OFFSET,
            state,
        }
    }

    /// Add an upstream source.
    pub fn source(mut self, source: impl TimeSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Add an already shared upstream source.
    pub fn shared_source(mut self, source: Arc<dyn TimeSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Set the per-source query timeout.
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Set the largest absolute offset, in seconds, a source may report and still count.
    pub fn max_offset(mut self, max_offset: f64) -> Self {
        self.max_offset = max_offset;
        self
    }

    /// The state this engine writes.
    pub fn state(&self) -> &Arc<OffsetState> {
        &self.state
    }

    /// Names of the configured sources, in configuration order.
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_owned()).collect()
    }

    /// Run one round and update the shared offset on success.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        let names = self.source_names();
        let timeout = self.query_timeout;

        let mut queries = JoinSet::new();
        for (index, source) in self.sources.iter().enumerate() {
            let source = source.clone();
            queries.spawn(async move {
                let result = tokio::time::timeout(timeout, source.query_offset(timeout)).await;
                (index, result)
            });
        }

        let mut offsets = Vec::with_capacity(names.len());
        let mut failed = 0;
        while let Some(joined) = queries.join_next().await {
            match joined {
                Ok((index, Ok(Ok(offset)))) => {
                    debug!(source = %names[index], offset, "upstream offset");
                    offsets.push(offset);
                }
                Ok((index, Ok(Err(e)))) => {
                    warn!(source = %names[index], error = %e, "upstream query failed");
                    failed += 1;
                }
                Ok((index, Err(_))) => {
                    warn!(source = %names[index], timeout = ?timeout, "upstream query timed out");
                    failed += 1;
                }
                Err(e) => {
                    warn!(error = %e, "upstream query task aborted");
                    failed += 1;
                }
            }
        }

        let (kept, rejected) = selection::filter_outliers(&offsets, self.max_offset);
        if rejected > 0 {
            warn!(
                rejected,
                max_offset = self.max_offset,
                "discarded implausible upstream offsets"
            );
        }

        let Some(offset) = selection::select_consensus(kept.clone()) else {
            return Err(if offsets.is_empty() {
                error!(failed, "sync failed: no upstream responded");
                SyncError::NoResponses { failed }
            } else {
                warn!(rejected, failed, "sync failed: every upstream offset was rejected");
                SyncError::AllRejected { rejected, failed }
            });
        };

        let synced_at = unix_time::now_secs();
        self.state.apply(offset, synced_at);
        info!(
            offset,
            accepted = kept.len(),
            rejected,
            failed,
            "time synchronized"
        );

        Ok(SyncReport {
            offset,
            synced_at,
            accepted: kept.len(),
            rejected,
            failed,
        })
    }

    /// Run one round and report only whether it succeeded.
    pub async fn sync_ok(&self) -> bool {
        self.sync().await.is_ok()
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("sources", &self.source_names())
            .field("query_timeout", &self.query_timeout)
            .field("max_offset", &self.max_offset)
            .finish()
    }
}
