// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

mod common;

use common::{FailingSource, FixedSource, PanickingSource, SlowSource, fixed_sources};
use relay_client::engine::SyncEngine;
use relay_client::error::SyncError;
use relay_client::offset::OffsetState;
use std::sync::Arc;
use std::time::Duration;

fn engine_with(offsets: &[f64]) -> SyncEngine {
    fixed_sources(offsets)
        .into_iter()
        .fold(SyncEngine::new(Arc::new(OffsetState::new())), |engine, s| {
            engine.source(s)
        })
}

#[tokio::test]
async fn odd_count_selects_median() {
    let engine = engine_with(&[3.0, -2.0, 0.0]);
    let report = engine.sync().await.unwrap();
    assert_eq!(report.offset, 0.0);
    assert_eq!(report.accepted, 3);
    assert_eq!(engine.state().snapshot().offset, 0.0);
    assert_eq!(engine.state().snapshot().last_sync(), Some(report.synced_at));
}

#[tokio::test]
async fn even_count_selects_lower_middle_not_mean() {
    let engine = engine_with(&[-2.0, 0.0, 3.0, 5.0]);
    let report = engine.sync().await.unwrap();
    assert_eq!(report.offset, 0.0);
    assert_eq!(engine.state().offset(), 0.0);
}

#[tokio::test]
async fn outlier_is_excluded() {
    let engine = engine_with(&[0.5, 2000.0]);
    let report = engine.sync().await.unwrap();
    assert_eq!(report.offset, 0.5);
    assert_eq!(report.accepted, 1);
    assert_eq!(report.rejected, 1);
}

#[tokio::test]
async fn lone_outlier_fails_round_and_keeps_offset() {
    let engine = engine_with(&[2000.0]);
    engine.state().apply(0.25, 1_000.0);

    let err = engine.sync().await.unwrap_err();
    assert_eq!(
        err,
        SyncError::AllRejected {
            rejected: 1,
            failed: 0
        }
    );
    let snap = engine.state().snapshot();
    assert_eq!(snap.offset, 0.25);
    assert_eq!(snap.last_sync, 1_000.0);
}

#[tokio::test]
async fn all_sources_failing_keeps_last_sync() {
    let engine = SyncEngine::new(Arc::new(OffsetState::new()))
        .source(FailingSource)
        .source(FailingSource);
    engine.state().apply(-1.0, 42.0);

    assert_eq!(
        engine.sync().await.unwrap_err(),
        SyncError::NoResponses { failed: 2 }
    );
    assert!(!engine.sync_ok().await);
    assert_eq!(engine.state().snapshot().last_sync, 42.0);
    assert_eq!(engine.state().offset(), -1.0);
}

#[tokio::test]
async fn no_sources_is_a_failed_round() {
    let engine = SyncEngine::new(Arc::new(OffsetState::new()));
    assert_eq!(
        engine.sync().await.unwrap_err(),
        SyncError::NoResponses { failed: 0 }
    );
    assert_eq!(engine.state().snapshot().last_sync(), None);
}

#[tokio::test(start_paused = true)]
async fn slow_source_is_dropped_after_timeout() {
    let engine = SyncEngine::new(Arc::new(OffsetState::new()))
        .query_timeout(Duration::from_secs(10))
        .source(SlowSource {
            delay: Duration::from_secs(30),
            offset: 7.0,
        })
        .source(FixedSource {
            name: "fast".into(),
            offset: 1.0,
        });

    let report = engine.sync().await.unwrap();
    assert_eq!(report.offset, 1.0);
    assert_eq!(report.failed, 1);
}

#[tokio::test(start_paused = true)]
async fn slow_source_within_timeout_counts() {
    let engine = SyncEngine::new(Arc::new(OffsetState::new()))
        .query_timeout(Duration::from_secs(10))
        .source(SlowSource {
            delay: Duration::from_secs(3),
            offset: 7.0,
        });

    assert_eq!(engine.sync().await.unwrap().offset, 7.0);
}

#[tokio::test]
async fn panicking_source_only_drops_itself() {
    let engine = SyncEngine::new(Arc::new(OffsetState::new()))
        .source(PanickingSource)
        .source(FixedSource {
            name: "steady".into(),
            offset: -0.5,
        });

    let report = engine.sync().await.unwrap();
    assert_eq!(report.offset, -0.5);
    assert_eq!(report.failed, 1);
}

#[tokio::test]
async fn later_round_replaces_offset() {
    let state = Arc::new(OffsetState::new());
    let first = SyncEngine::new(state.clone()).source(FixedSource {
        name: "a".into(),
        offset: 1.0,
    });
    let second = SyncEngine::new(state.clone()).source(FixedSource {
        name: "b".into(),
        offset: 2.0,
    });

    first.sync().await.unwrap();
    assert_eq!(state.offset(), 1.0);
    second.sync().await.unwrap();
    assert_eq!(state.offset(), 2.0);
}

#[test]
fn source_names_keep_configuration_order() {
    let engine = engine_with(&[1.0, 2.0]).source(FailingSource);
    assert_eq!(engine.source_names(), ["fixed-0", "fixed-1", "failing"]);
}
