// ABOUTME: Library entry point for the geo session engine
// ABOUTME: Location session tracking: fix filtering, incremental metrics, resumable state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # Geo Session Engine
//!
//! Client-side location session tracker: consumes a stream of raw GPS fixes,
//! filters noise, derives distance/speed/altitude metrics incrementally,
//! manages a stopped/running/paused session state machine with
//! resume-after-kill semantics, and persists session history.
//!
//! The engine owns no platform integration. A [`providers::LocationProvider`]
//! delivers fixes, a [`store::KeyValueStore`] persists history and recovery
//! snapshots, and a [`providers::SettingsPrompt`] asks the user about
//! settings redirects; all three are injected at construction. Everything the
//! engine does is observable through a single typed event channel
//! ([`events::GeoEvent`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use geo_session_engine::config::TrackerConfig;
//! use geo_session_engine::engine::GeoSessionEngine;
//! use geo_session_engine::providers::{SimulatedProvider, StaticPrompt};
//! use geo_session_engine::store::MemoryStore;
//!
//! # async fn example() -> Result<(), geo_session_engine::errors::EngineError> {
//! let engine = GeoSessionEngine::new(
//!     Arc::new(SimulatedProvider::new()),
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(StaticPrompt::declining()),
//!     TrackerConfig::default(),
//! );
//!
//! let _events = engine.subscribe();
//! engine.start_session(None).await?;
//! // ... fixes flow in through the provider watch ...
//! let _stored = engine.stop_session();
//! # Ok(())
//! # }
//! ```

/// Engine configuration with production defaults
pub mod config;
/// Application constants organized by domain
pub mod constants;
/// Session state machine, fix pipeline wiring and persistence
pub mod engine;
/// Unified error handling with structured provider, store and engine errors
pub mod errors;
/// Typed engine notifications over a broadcast channel
pub mod events;
/// Great-circle distance and rounding helpers
pub mod geodesy;
/// Core data models (`GeoFix`, `Session`, `SessionState`)
pub mod models;
/// Location provider contract and the simulated backend
pub mod providers;
/// Key-value persistence abstraction
pub mod store;

pub use config::TrackerConfig;
pub use engine::{GeoSessionEngine, LifecycleEvent, SessionUpdateCallback};
pub use errors::{EngineError, EngineResult, ProviderError, StoreError};
pub use events::{EventBus, GeoEvent};
pub use models::{GeoFix, Session, SessionState};
