// ABOUTME: Tracker configuration with defaults drawn from the constants module
// ABOUTME: Every pipeline threshold and watch parameter is adjustable here
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::time::Duration;

use crate::constants::{chrono_timer, filtering};
use crate::providers::WatchOptions;

/// Engine configuration.
///
/// Defaults reproduce the production thresholds; tests and embedders with
/// unusual GPS hardware can tighten or relax them.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Reject fixes with horizontal accuracy at or above this radius (meters)
    pub accuracy_reject_threshold_m: f64,
    /// Treat the previous fix as stale beyond this age (milliseconds)
    pub max_fix_age_ms: i64,
    /// Distance delta that always accumulates into the session (meters)
    pub distance_notify_threshold_m: f64,
    /// Minimum active duration before average speed is derived (milliseconds)
    pub average_speed_min_duration_ms: i64,
    /// Minimum accumulated distance before average speed is derived (meters)
    pub average_speed_min_distance_m: f64,
    /// Interval between chrono ticks while running
    pub chrono_tick_interval: Duration,
    /// Options applied to watches and one-shot fix requests
    pub watch: WatchOptions,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            accuracy_reject_threshold_m: filtering::ACCURACY_REJECT_THRESHOLD_M,
            max_fix_age_ms: filtering::MAX_FIX_AGE_MS,
            distance_notify_threshold_m: filtering::DISTANCE_NOTIFY_THRESHOLD_M,
            average_speed_min_duration_ms: filtering::AVERAGE_SPEED_MIN_DURATION_MS,
            average_speed_min_distance_m: filtering::AVERAGE_SPEED_MIN_DISTANCE_M,
            chrono_tick_interval: Duration::from_millis(chrono_timer::TICK_INTERVAL_MS),
            watch: WatchOptions::default(),
        }
    }
}
