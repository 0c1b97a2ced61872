// ABOUTME: Fix filtering and incremental metrics derivation
// ABOUTME: Pure pipeline over (previous fix, new fix) with an explicit clock for testability
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Fix Pipeline
//!
//! One raw fix goes in, one decision comes out: ignore it, or accept it and
//! fold its deltas into the session metrics. The pipeline holds the
//! comparison baseline (last accepted fix, tracked reference altitude) that
//! spans individual calls but never leaks outside the engine.
//!
//! Rejection rules, in order:
//! - horizontal accuracy at or above the configured cutoff,
//! - unchanged latitude and longitude, or unchanged timestamp,
//! - negative elapsed time since the previous fix (clock anomaly),
//! - a session-first fix older than the max fix age.
//!
//! A fix arriving more than the max fix age after the previous one
//! re-baselines the session: it is accepted unconditionally, as if it were
//! the first, without touching the accumulated metrics.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::TrackerConfig;
use crate::constants::filtering::MPS_TO_KMH;
use crate::geodesy::round3;
use crate::models::{GeoFix, Session};

/// Outcome of feeding one fix through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixOutcome {
    /// The fix was dropped; session state is unchanged
    Ignored,
    /// The fix was appended to the session and subscribers should be notified
    Accepted {
        /// The fix was accepted against an empty baseline (session start or
        /// first fix after a resume)
        first_position: bool,
    },
}

/// Stateful filter deriving session metrics from consecutive fixes.
///
/// The engine owns one pipeline per session; [`reset_baseline`] clears the
/// comparison fix on pause so the first fix after a resume is never compared
/// across the pause gap. The tracked reference altitude survives pauses.
///
/// [`reset_baseline`]: FixPipeline::reset_baseline
#[derive(Debug)]
pub struct FixPipeline {
    accuracy_reject_threshold_m: f64,
    max_fix_age_ms: i64,
    distance_notify_threshold_m: f64,
    average_speed_min_duration_ms: i64,
    average_speed_min_distance_m: f64,
    last_fix: Option<GeoFix>,
    tracked_altitude: Option<f64>,
}

impl FixPipeline {
    /// New pipeline with an empty baseline
    #[must_use]
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            accuracy_reject_threshold_m: config.accuracy_reject_threshold_m,
            max_fix_age_ms: config.max_fix_age_ms,
            distance_notify_threshold_m: config.distance_notify_threshold_m,
            average_speed_min_duration_ms: config.average_speed_min_duration_ms,
            average_speed_min_distance_m: config.average_speed_min_distance_m,
            last_fix: None,
            tracked_altitude: None,
        }
    }

    /// Last accepted fix, if any
    #[must_use]
    pub fn baseline(&self) -> Option<&GeoFix> {
        self.last_fix.as_ref()
    }

    /// Clear the comparison fix so the next accepted fix is treated as fresh
    pub fn reset_baseline(&mut self) {
        self.last_fix = None;
    }

    /// Feed one fix through the filter, updating `session` on acceptance.
    ///
    /// `now` is the engine's wall clock, used only for the session-first
    /// staleness check; `distance` measures meters between two fixes
    /// (normally the provider's implementation).
    pub fn apply<F>(
        &mut self,
        session: &mut Session,
        fix: &GeoFix,
        now: DateTime<Utc>,
        distance: F,
    ) -> FixOutcome
    where
        F: Fn(&GeoFix, &GeoFix) -> f64,
    {
        if fix.horizontal_accuracy >= self.accuracy_reject_threshold_m {
            debug!(
                accuracy = fix.horizontal_accuracy,
                "fix rejected: accuracy above cutoff"
            );
            return FixOutcome::Ignored;
        }

        let Some(prev) = self.last_fix.clone() else {
            // session-first fix: reject if it is already stale
            let age_ms = now.timestamp_millis() - fix.timestamp_ms();
            if age_ms > self.max_fix_age_ms {
                debug!(age_ms, "session-first fix rejected: stale");
                return FixOutcome::Ignored;
            }
            self.accept(session, fix);
            return FixOutcome::Accepted {
                first_position: true,
            };
        };

        if (prev.latitude == fix.latitude && prev.longitude == fix.longitude)
            || prev.timestamp == fix.timestamp
        {
            return FixOutcome::Ignored;
        }

        let delta_time_ms = fix.timestamp_ms() - prev.timestamp_ms();
        if delta_time_ms < 0 {
            // observed on some platforms despite monotonic provider claims
            debug!(delta_time_ms, "fix rejected: clock anomaly");
            return FixOutcome::Ignored;
        }
        if delta_time_ms > self.max_fix_age_ms {
            debug!(delta_time_ms, "previous fix stale, re-baselining");
            self.accept(session, fix);
            return FixOutcome::Accepted {
                first_position: false,
            };
        }

        let delta_distance = round3(distance(&prev, fix));
        let mut notify = false;

        // altitude: only meaningful when both a reference and a non-negative
        // new altitude exist; small negative readings near sea level are noise
        if let (Some(tracked), Some(altitude)) = (self.tracked_altitude, fix.altitude) {
            if altitude >= 0.0 {
                let new_altitude = altitude.round();
                let delta_alt = new_altitude - tracked;
                if delta_alt > 0.0 {
                    session.altitude_gain = (session.altitude_gain + delta_alt).round();
                    self.tracked_altitude = Some(new_altitude);
                    notify = true;
                } else if delta_alt < 0.0 {
                    session.altitude_loss = (session.altitude_loss - delta_alt).round();
                    self.tracked_altitude = Some(new_altitude);
                }
            }
        }

        // speed: prefer the provider's measurement, derive from movement otherwise
        let speed_kmh = fix.reported_speed().map_or_else(
            || {
                // 1 m/ms == 3600 km/h
                round3(delta_distance / delta_time_ms as f64 * 3600.0)
            },
            |mps| round3(mps * MPS_TO_KMH),
        );
        if speed_kmh != session.current_speed {
            session.current_speed = speed_kmh;
            notify = true;
        }

        if delta_distance > self.distance_notify_threshold_m || notify {
            session.current_distance += delta_distance;
            notify = true;
        }

        // average speed needs a little data before it stops jumping around
        let active_ms = fix.timestamp_ms()
            - session.start_time.timestamp_millis()
            - session.pause_duration_ms;
        if active_ms > self.average_speed_min_duration_ms
            && session.current_distance > self.average_speed_min_distance_m
            && notify
        {
            let average = (session.current_distance / active_ms as f64 * 3600.0).round();
            if average != session.average_speed {
                session.average_speed = average;
            }
        }

        debug!(
            delta_distance,
            delta_time_ms,
            speed_kmh,
            distance = session.current_distance,
            notify,
            "fix processed"
        );

        if notify {
            self.accept(session, fix);
            FixOutcome::Accepted {
                first_position: false,
            }
        } else {
            FixOutcome::Ignored
        }
    }

    fn accept(&mut self, session: &mut Session, fix: &GeoFix) {
        self.last_fix = Some(fix.clone());
        if self.tracked_altitude.is_none() {
            self.tracked_altitude = fix.altitude;
        }
        session.last_fix = Some(fix.clone());
        session.fixes.push(fix.clone());
    }
}
