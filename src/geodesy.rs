// ABOUTME: Great-circle distance and rounding helpers for metric derivation
// ABOUTME: Haversine on a spherical earth, plus the 3-decimal rounding used by the pipeline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::models::GeoFix;

/// Mean earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two fixes in meters (haversine formula).
///
/// Spherical-earth approximation; accurate to well under the 40 m accuracy
/// cutoff the pipeline applies to incoming fixes.
#[must_use]
pub fn haversine_distance_m(a: &GeoFix, b: &GeoFix) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Round to 3 decimal places.
///
/// Applied to distance deltas (millimeter resolution) and to current speed
/// so insignificant jitter does not register as change.
#[must_use]
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
