// ABOUTME: Typed engine notifications over a tokio broadcast channel
// ABOUTME: Tagged-union GeoEvent replaces observable-base inheritance with explicit pub/sub
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Engine Events
//!
//! All engine notifications flow through a single tagged-union channel.
//! Subscribers call [`EventBus::subscribe`] and receive every event emitted
//! after that point; slow subscribers may observe
//! `broadcast::error::RecvError::Lagged` and should resynchronize from the
//! engine accessors.

use tokio::sync::broadcast;

use crate::constants::events::EVENT_CHANNEL_SIZE;
use crate::errors::ProviderError;
use crate::models::{GeoFix, Session};

/// Engine notification payloads
#[derive(Debug, Clone)]
pub enum GeoEvent {
    /// The session state machine transitioned; carries the current session
    SessionState(Session),
    /// An accepted fix updated the current session's metrics
    SessionUpdated(Session),
    /// First fix accepted against an empty baseline (session start or post-resume)
    FirstPosition(GeoFix),
    /// Elapsed active duration in milliseconds, ticked every second while running
    ChronoTick(i64),
    /// Provider enablement changed
    ProviderStatus {
        /// Whether location services are currently enabled
        enabled: bool,
    },
    /// Outcome of a one-shot location request
    UserLocation(Result<GeoFix, ProviderError>),
}

/// Broadcast fan-out for [`GeoEvent`]s.
///
/// Emitting with no subscribers is not an error; events are simply dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GeoEvent>,
}

impl EventBus {
    /// New bus with the default channel capacity
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self { tx }
    }

    /// Subscribe to all events emitted from this point on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<GeoEvent> {
        self.tx.subscribe()
    }

    pub(crate) fn emit(&self, event: GeoEvent) {
        // send only fails when there are no receivers
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
