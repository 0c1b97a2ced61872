// ABOUTME: Application-wide constants for the geo session engine
// ABOUTME: Filtering thresholds, watch defaults, storage keys and channel sizes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Constants organized by domain. `TrackerConfig` defaults draw from these;
//! every threshold the fix pipeline applies lives here rather than inline.

/// Fix filtering and metrics derivation thresholds
pub mod filtering {
    /// Fixes with a horizontal accuracy at or above this radius are rejected
    pub const ACCURACY_REJECT_THRESHOLD_M: f64 = 40.0;

    /// Elapsed time beyond which the previous fix is considered stale and the
    /// new fix re-baselines the session
    pub const MAX_FIX_AGE_MS: i64 = 3000;

    /// Distance delta above which a fix always accumulates into the session
    pub const DISTANCE_NOTIFY_THRESHOLD_M: f64 = 2.0;

    /// Average speed is not derived before this much active session time
    pub const AVERAGE_SPEED_MIN_DURATION_MS: i64 = 3000;

    /// Average speed is not derived before this much accumulated distance
    pub const AVERAGE_SPEED_MIN_DISTANCE_M: f64 = 10.0;

    /// Conversion factor from meters/second to km/h
    pub const MPS_TO_KMH: f64 = 3.6;
}

/// Location watch defaults
pub mod watch {
    /// Desired horizontal accuracy requested from the provider, meters
    pub const DESIRED_ACCURACY_M: f64 = 3.0;

    /// Minimum interval between provider fix deliveries, milliseconds
    pub const MINIMUM_UPDATE_INTERVAL_MS: u64 = 1000;

    /// One-shot fix acquisition timeout, milliseconds
    pub const FIX_TIMEOUT_MS: u64 = 20_000;
}

/// Chrono timer configuration
pub mod chrono_timer {
    /// Interval between elapsed-time ticks while a session is running, milliseconds
    pub const TICK_INTERVAL_MS: u64 = 1000;
}

/// Key-value store keys
pub mod storage {
    /// Serialized history of finalized sessions (JSON array)
    pub const SESSIONS_HISTORY_KEY: &str = "sessions_history";

    /// Recovery snapshot of an in-flight session (JSON object, or absent)
    pub const PAUSED_SESSION_KEY: &str = "paused_session";
}

/// Event channel configuration
pub mod events {
    /// Broadcast channel capacity for engine notifications
    pub const EVENT_CHANNEL_SIZE: usize = 64;
}
