// ABOUTME: Tests for resume-after-kill semantics via the recovery snapshot
// ABOUTME: Exit-time persistence, launch-time restoration, snapshot round-trip fidelity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

use geo_session_engine::constants::storage;
use geo_session_engine::engine::LifecycleEvent;
use geo_session_engine::models::{Session, SessionState};
use geo_session_engine::providers::SimulatedProvider;
use geo_session_engine::store::{KeyValueStore, MemoryStore};

use common::{fix, harness, harness_with, settle};

/// A paused session with realistic accumulated metrics
fn paused_session() -> Session {
    let start = Utc.timestamp_millis_opt(1_700_000_000_000).single().expect("valid timestamp");
    let mut session = Session::new(start);
    session.state = SessionState::Paused;
    session.current_distance = 1523.75;
    session.current_speed = 12.4;
    session.average_speed = 11.0;
    session.altitude_gain = 87.0;
    session.altitude_loss = 42.0;
    session.pause_duration_ms = 5_000;
    session.last_pause_time = Some(start + Duration::milliseconds(60_000));
    session
}

#[tokio::test]
async fn test_snapshot_round_trip_restores_identical_fields() {
    let snapshot = paused_session();
    let store = Arc::new(MemoryStore::new());
    store
        .set(
            storage::PAUSED_SESSION_KEY,
            &serde_json::to_string(&snapshot).expect("serializes"),
        )
        .expect("stored");

    let h = harness_with(Arc::new(SimulatedProvider::new()), store);
    h.engine.handle_lifecycle(LifecycleEvent::Launch);

    let restored = h.engine.current_session().expect("session restored");
    assert_eq!(restored.state, SessionState::Paused);
    assert_eq!(restored.current_distance, snapshot.current_distance);
    assert_eq!(restored.current_speed, snapshot.current_speed);
    assert_eq!(restored.average_speed, snapshot.average_speed);
    assert_eq!(restored.altitude_gain, snapshot.altitude_gain);
    assert_eq!(restored.altitude_loss, snapshot.altitude_loss);
    assert_eq!(restored.pause_duration_ms, snapshot.pause_duration_ms);
    assert_eq!(restored.start_time, snapshot.start_time);
    assert_eq!(restored.last_pause_time, snapshot.last_pause_time);
    assert!(h.engine.is_session_paused());
}

#[tokio::test]
async fn test_restored_chrono_is_frozen_at_pause_point() {
    let snapshot = paused_session();
    let store = Arc::new(MemoryStore::new());
    store
        .set(
            storage::PAUSED_SESSION_KEY,
            &serde_json::to_string(&snapshot).expect("serializes"),
        )
        .expect("stored");

    let h = harness_with(Arc::new(SimulatedProvider::new()), store);
    h.engine.handle_lifecycle(LifecycleEvent::Launch);

    // paused 60 s in, with 5 s of accumulated pauses
    assert_eq!(h.engine.current_session_chrono(), 55_000);
}

#[tokio::test]
async fn test_exit_with_distance_persists_snapshot_not_history() {
    let h = harness();
    h.engine.handle_lifecycle(LifecycleEvent::Launch);
    h.engine.start_session(None).await.expect("start");

    let now = Utc::now();
    h.provider.push_fix(fix(0.0, 0.0, now, 5.0));
    h.provider
        .push_fix(fix(0.0005, 0.0, now + Duration::milliseconds(2000), 5.0));
    settle().await;

    h.engine.handle_lifecycle(LifecycleEvent::Exit);

    let raw = h
        .store
        .get(storage::PAUSED_SESSION_KEY)
        .expect("snapshot persisted");
    let snapshot: Session = serde_json::from_str(&raw).expect("snapshot parses");
    assert_eq!(snapshot.state, SessionState::Paused);
    assert!(snapshot.current_distance > 0.0);
    assert!(snapshot.last_pause_time.is_some());

    assert!(!h.engine.is_session_running());
    assert!(h.engine.sessions_history().is_empty());
    assert_eq!(h.provider.active_watches(), 0);
}

#[tokio::test]
async fn test_exit_without_distance_leaves_no_snapshot() {
    let h = harness();
    h.engine.handle_lifecycle(LifecycleEvent::Launch);
    h.engine.start_session(None).await.expect("start");

    h.engine.handle_lifecycle(LifecycleEvent::Exit);
    assert!(h.store.get(storage::PAUSED_SESSION_KEY).is_none());
    assert!(h.engine.sessions_history().is_empty());
    assert!(!h.engine.is_session_running());
}

#[tokio::test]
async fn test_exit_then_launch_resumes_tracking() {
    let h = harness();
    h.engine.handle_lifecycle(LifecycleEvent::Launch);
    h.engine.start_session(None).await.expect("start");

    let now = Utc::now();
    h.provider.push_fix(fix(0.0, 0.0, now, 5.0));
    h.provider
        .push_fix(fix(0.0005, 0.0, now + Duration::milliseconds(2000), 5.0));
    settle().await;
    let distance_before = h
        .engine
        .current_session()
        .map(|s| s.current_distance)
        .expect("session current");

    h.engine.handle_lifecycle(LifecycleEvent::Exit);

    // simulated relaunch over the same store
    let restarted = harness_with(h.provider.clone(), h.store.clone());
    restarted.engine.handle_lifecycle(LifecycleEvent::Launch);
    assert!(restarted.engine.is_session_paused());
    assert_eq!(
        restarted
            .engine
            .current_session()
            .map(|s| s.current_distance),
        Some(distance_before)
    );

    restarted.engine.resume_session().expect("resume restored session");
    assert!(restarted.engine.is_session_running());
    assert_eq!(restarted.provider.active_watches(), 1);
}

#[tokio::test]
async fn test_launch_is_idempotent() {
    let snapshot = paused_session();
    let store = Arc::new(MemoryStore::new());
    store
        .set(
            storage::PAUSED_SESSION_KEY,
            &serde_json::to_string(&snapshot).expect("serializes"),
        )
        .expect("stored");

    let h = harness_with(Arc::new(SimulatedProvider::new()), store);
    h.engine.handle_lifecycle(LifecycleEvent::Launch);
    let first = h.engine.current_session().expect("restored");
    h.engine.handle_lifecycle(LifecycleEvent::Launch);
    let second = h.engine.current_session().expect("still restored");
    assert_eq!(first.pause_duration_ms, second.pause_duration_ms);
    assert_eq!(first.start_time, second.start_time);
}

#[tokio::test]
async fn test_corrupt_snapshot_discarded_on_launch() {
    let store = Arc::new(MemoryStore::new());
    store
        .set(storage::PAUSED_SESSION_KEY, "{not valid json")
        .expect("stored");

    let h = harness_with(Arc::new(SimulatedProvider::new()), store);
    h.engine.handle_lifecycle(LifecycleEvent::Launch);

    assert!(!h.engine.is_session_running());
    assert!(h.store.get(storage::PAUSED_SESSION_KEY).is_none());
}

#[tokio::test]
async fn test_starting_fresh_session_clears_stale_snapshot() {
    let snapshot = paused_session();
    let store = Arc::new(MemoryStore::new());
    store
        .set(
            storage::PAUSED_SESSION_KEY,
            &serde_json::to_string(&snapshot).expect("serializes"),
        )
        .expect("stored");

    // launch is never delivered, so the snapshot is stale by the next start
    let h = harness_with(Arc::new(SimulatedProvider::new()), store);
    h.engine.start_session(None).await.expect("start");
    assert!(h.store.get(storage::PAUSED_SESSION_KEY).is_none());
}
