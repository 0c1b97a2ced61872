// ABOUTME: Chrono timer task emitting elapsed active duration while running
// ABOUTME: One-second tokio interval with a channel-based shutdown, immediate first tick
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;

use super::EngineState;
use crate::events::{EventBus, GeoEvent};

/// Handle to the spawned chrono task.
///
/// The task ticks once immediately, then every interval, emitting
/// `ChronoTick` with the active elapsed duration. It exits on shutdown or
/// when the current session disappears.
#[derive(Debug)]
pub(super) struct ChronoTimer {
    shutdown: mpsc::Sender<()>,
}

impl ChronoTimer {
    pub(super) fn spawn(
        interval: Duration,
        state: Arc<Mutex<EngineState>>,
        events: EventBus,
    ) -> Self {
        let (shutdown, mut shutdown_rx) = mpsc::channel::<()>(1);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let elapsed = {
                            let guard = state
                                .lock()
                                .unwrap_or_else(std::sync::PoisonError::into_inner);
                            guard.current_chrono(Utc::now())
                        };
                        match elapsed {
                            Some(ms) => events.emit(GeoEvent::ChronoTick(ms)),
                            None => break,
                        }
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });
        Self { shutdown }
    }

    pub(super) fn stop(self) {
        // task may already have exited; a full buffer means a signal is pending
        let _ = self.shutdown.try_send(());
    }
}
