// ABOUTME: Session model and state machine states for tracked activities
// ABOUTME: Holds incrementally derived distance/speed/altitude metrics and accepted fixes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fix::GeoFix;

/// Lifecycle state of a tracked session.
///
/// Transitions: `Stopped -> Running <-> Paused -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Initial and terminal state; no tracking in progress
    Stopped,
    /// Actively watching the location provider and deriving metrics
    Running,
    /// Tracking suspended; watch and chrono timer torn down
    Paused,
}

/// The unit of tracked activity.
///
/// Created by `start_session`, mutated by every accepted fix and by
/// pause/resume/stop transitions. `current_distance`, `altitude_gain` and
/// `altitude_loss` never decrease while the session is current; `fixes` is
/// append-only in acceptance order; `end_time` is stamped exactly once, at
/// stop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Last accepted fix, cleared on finalize so history stays compact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fix: Option<GeoFix>,
    /// Latest speed in km/h, rounded to 3 decimals
    pub current_speed: f64,
    /// Average moving speed in km/h, rounded to the nearest integer
    pub average_speed: f64,
    /// Accumulated positive altitude change in meters
    pub altitude_gain: f64,
    /// Accumulated negative altitude change in meters, stored as a positive value
    pub altitude_loss: f64,
    /// Total accepted distance in meters
    pub current_distance: f64,
    /// Wall-clock time the session was started
    pub start_time: DateTime<Utc>,
    /// When the current pause began, `None` while running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_pause_time: Option<DateTime<Utc>>,
    /// Stamped once when the session is stopped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Accumulated milliseconds spent paused
    pub pause_duration_ms: i64,
    /// Current state machine position
    pub state: SessionState,
    /// Accepted fixes in acceptance order
    pub fixes: Vec<GeoFix>,
}

impl Session {
    /// New session with zeroed metrics, entering `Running`.
    #[must_use]
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            last_fix: None,
            current_speed: 0.0,
            average_speed: 0.0,
            altitude_gain: 0.0,
            altitude_loss: 0.0,
            current_distance: 0.0,
            start_time,
            last_pause_time: None,
            end_time: None,
            pause_duration_ms: 0,
            state: SessionState::Running,
            fixes: Vec::new(),
        }
    }

    /// Milliseconds of active (non-paused) tracking up to `now`.
    #[must_use]
    pub fn active_duration_ms(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp_millis() - self.start_time.timestamp_millis() - self.pause_duration_ms
    }

    /// Prepare the session for storage in history.
    ///
    /// Drops the last fix, stamps `end_time`, folds any open pause into
    /// `pause_duration_ms` and recomputes the final average speed over the
    /// active duration. The state transition to `Stopped` is the engine's
    /// responsibility, not part of finalization.
    pub fn finalize(&mut self, end_time: DateTime<Utc>) {
        self.last_fix = None;
        self.end_time = Some(end_time);
        if let Some(paused_at) = self.last_pause_time.take() {
            self.pause_duration_ms += end_time.timestamp_millis() - paused_at.timestamp_millis();
        }
        let active_ms = self.active_duration_ms(end_time);
        if active_ms > 0 {
            // 1 m/ms == 3600 km/h
            self.average_speed = (self.current_distance / active_ms as f64 * 3600.0).round();
        }
    }
}
