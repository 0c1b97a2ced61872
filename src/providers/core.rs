// ABOUTME: Core location provider trait and watch options
// ABOUTME: Defines the contract platform location backends must implement
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Location Provider Contract
//!
//! The engine consumes location data exclusively through [`LocationProvider`].
//! Fixes from an active watch are delivered as `Result<GeoFix, ProviderError>`
//! values through an unbounded channel sink; the engine drains that channel
//! from a single task, which preserves the guarantee that fix handling never
//! runs concurrently with itself.
//!
//! Providers are injected explicitly at construction and shared via `Arc`;
//! there is no implicit global provider instance.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::constants::watch;
use crate::errors::{ProviderError, ProviderResult};
use crate::geodesy;
use crate::models::GeoFix;

/// One delivery from an active watch: a fix, or a provider error forwarded
/// verbatim. Errors do not terminate the watch.
pub type FixUpdate = Result<GeoFix, ProviderError>;

/// Sink end of a watch's delivery channel
pub type FixSink = mpsc::UnboundedSender<FixUpdate>;

/// Handle identifying an active watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

impl WatchId {
    /// Wrap a provider-assigned watch identifier
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Provider-assigned identifier
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Options applied when starting a watch or requesting a one-shot fix
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Desired horizontal accuracy in meters
    pub desired_accuracy_m: f64,
    /// Minimum interval between fix deliveries
    pub minimum_update_interval: Duration,
    /// One-shot fix acquisition timeout
    pub fix_timeout: Duration,
    /// Request background delivery (providers may defer updates differently
    /// while the application is backgrounded)
    pub background_delivery: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            desired_accuracy_m: watch::DESIRED_ACCURACY_M,
            minimum_update_interval: Duration::from_millis(watch::MINIMUM_UPDATE_INTERVAL_MS),
            fix_timeout: Duration::from_millis(watch::FIX_TIMEOUT_MS),
            background_delivery: false,
        }
    }
}

/// Platform location backend.
///
/// Implementations must report authorization denial as
/// [`ProviderError::AuthorizationDenied`] so callers never have to inspect
/// error messages.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Whether the application currently holds location authorization
    async fn is_authorized(&self) -> ProviderResult<bool>;

    /// Request location authorization.
    ///
    /// `persist` asks for authorization that survives application restarts.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::AuthorizationDenied`] when the user declines.
    async fn authorize(&self, persist: bool) -> ProviderResult<()>;

    /// Whether location services are enabled system-wide
    fn is_enabled(&self) -> bool;

    /// Open the system location settings screen
    ///
    /// # Errors
    ///
    /// Returns an error if the settings screen cannot be opened.
    async fn open_settings(&self) -> ProviderResult<()>;

    /// Acquire a single fix
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Timeout`] when no fix arrives within
    /// `options.fix_timeout`.
    async fn current_fix(&self, options: &WatchOptions) -> ProviderResult<GeoFix>;

    /// Start delivering fixes into `sink` until the watch is cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if the watch cannot be established.
    fn watch(&self, sink: FixSink, options: &WatchOptions) -> ProviderResult<WatchId>;

    /// Stop a watch, severing all future delivery. Clearing an unknown or
    /// already-cleared watch is a no-op.
    fn clear_watch(&self, id: WatchId);

    /// Distance between two fixes in meters
    fn distance_m(&self, a: &GeoFix, b: &GeoFix) -> f64 {
        geodesy::haversine_distance_m(a, b)
    }
}

/// Reason a settings redirect is being offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsPromptReason {
    /// Location services are disabled system-wide
    LocationDisabled,
    /// The user previously denied location authorization
    AuthorizationDenied,
}

/// User-facing confirmation seam for the authorization gate.
///
/// The engine never renders UI; the composition root supplies an
/// implementation that asks the user whether to open system settings.
#[async_trait]
pub trait SettingsPrompt: Send + Sync {
    /// Ask whether to forward the user to the system location settings
    async fn confirm_open_settings(&self, reason: SettingsPromptReason) -> bool;
}

/// Fixed-answer prompt, useful for headless embedders and tests
#[derive(Debug, Clone, Copy)]
pub struct StaticPrompt {
    accept: bool,
}

impl StaticPrompt {
    /// Prompt that always accepts the settings redirect
    #[must_use]
    pub const fn accepting() -> Self {
        Self { accept: true }
    }

    /// Prompt that always declines the settings redirect
    #[must_use]
    pub const fn declining() -> Self {
        Self { accept: false }
    }
}

#[async_trait]
impl SettingsPrompt for StaticPrompt {
    async fn confirm_open_settings(&self, _reason: SettingsPromptReason) -> bool {
        self.accept
    }
}
