// ABOUTME: GeoFix model representing a single raw GPS sample
// ABOUTME: Immutable once received; serde-serializable for session persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single location sample as delivered by a location provider.
///
/// Fixes are immutable once received: the fix pipeline never mutates a fix,
/// it only decides whether to accept it and what session metrics to derive
/// from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFix {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Altitude above sea level in meters, when the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    /// Horizontal accuracy radius in meters (smaller is better)
    pub horizontal_accuracy: f64,
    /// Native speed in meters per second, when the provider reports one.
    /// Providers that cannot measure speed report `None` or a negative value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Provider timestamp of the sample
    pub timestamp: DateTime<Utc>,
}

impl GeoFix {
    /// Timestamp as milliseconds since the Unix epoch
    #[must_use]
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Native speed when present and non-negative
    #[must_use]
    pub fn reported_speed(&self) -> Option<f64> {
        self.speed.filter(|s| *s >= 0.0)
    }
}
