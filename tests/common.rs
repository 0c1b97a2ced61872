// ABOUTME: Shared helpers for geo session engine integration tests
// ABOUTME: Fix builders, engine construction with simulated doubles, event draining
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
#![allow(missing_docs, dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::broadcast;

use geo_session_engine::config::TrackerConfig;
use geo_session_engine::engine::GeoSessionEngine;
use geo_session_engine::events::GeoEvent;
use geo_session_engine::models::GeoFix;
use geo_session_engine::providers::{SimulatedProvider, StaticPrompt};
use geo_session_engine::store::MemoryStore;

/// Fixed reference instant for pure pipeline tests
pub fn base_time() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000).single().expect("valid timestamp")
}

pub fn fix(latitude: f64, longitude: f64, timestamp: DateTime<Utc>, accuracy: f64) -> GeoFix {
    GeoFix {
        latitude,
        longitude,
        altitude: None,
        horizontal_accuracy: accuracy,
        speed: None,
        timestamp,
    }
}

pub fn fix_with(
    latitude: f64,
    longitude: f64,
    timestamp: DateTime<Utc>,
    accuracy: f64,
    altitude: Option<f64>,
    speed: Option<f64>,
) -> GeoFix {
    GeoFix {
        latitude,
        longitude,
        altitude,
        horizontal_accuracy: accuracy,
        speed,
        timestamp,
    }
}

pub struct TestHarness {
    pub engine: GeoSessionEngine,
    pub provider: Arc<SimulatedProvider>,
    pub store: Arc<MemoryStore>,
}

/// Engine wired to an authorized, enabled simulated provider and an empty
/// in-memory store. The declining prompt never fires on this happy path.
pub fn harness() -> TestHarness {
    harness_with(Arc::new(SimulatedProvider::new()), Arc::new(MemoryStore::new()))
}

/// Route engine diagnostics to the test writer, honoring `RUST_LOG`.
/// Subsequent calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn harness_with(provider: Arc<SimulatedProvider>, store: Arc<MemoryStore>) -> TestHarness {
    init_tracing();
    let engine = GeoSessionEngine::new(
        provider.clone(),
        store.clone(),
        Arc::new(StaticPrompt::declining()),
        TrackerConfig::default(),
    );
    TestHarness {
        engine,
        provider,
        store,
    }
}

/// Let spawned drain/timer tasks run
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(40)).await;
}

/// Collect every event currently buffered on the receiver
pub fn drain_events(rx: &mut broadcast::Receiver<GeoEvent>) -> Vec<GeoEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(_)) => {}
            Err(_) => break,
        }
    }
    events
}
