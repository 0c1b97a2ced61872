// ABOUTME: Scriptable in-process location provider
// ABOUTME: Drives the engine with synthetic fixes for tests and offline replay
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::core::{FixSink, FixUpdate, LocationProvider, WatchId, WatchOptions};
use crate::errors::{ProviderError, ProviderResult};
use crate::models::GeoFix;

/// In-process provider that delivers whatever fixes it is fed.
///
/// Authorization and enablement are plain flags, so every branch of the
/// engine's gate can be exercised without a platform backend. Pushed fixes
/// fan out to all active watches.
pub struct SimulatedProvider {
    authorized: AtomicBool,
    enabled: AtomicBool,
    deny_authorization: AtomicBool,
    settings_opened: AtomicUsize,
    next_watch_id: AtomicU64,
    watches: Mutex<HashMap<u64, FixSink>>,
    one_shot: Mutex<Option<GeoFix>>,
}

impl SimulatedProvider {
    /// Provider that is authorized and enabled
    #[must_use]
    pub fn new() -> Self {
        Self::with_access(true, true)
    }

    /// Provider with explicit initial authorization and enablement
    #[must_use]
    pub fn with_access(authorized: bool, enabled: bool) -> Self {
        Self {
            authorized: AtomicBool::new(authorized),
            enabled: AtomicBool::new(enabled),
            deny_authorization: AtomicBool::new(false),
            settings_opened: AtomicUsize::new(0),
            next_watch_id: AtomicU64::new(1),
            watches: Mutex::new(HashMap::new()),
            one_shot: Mutex::new(None),
        }
    }

    /// Make subsequent `authorize` calls fail with `AuthorizationDenied`
    pub fn deny_authorization(&self) {
        self.deny_authorization.store(true, Ordering::SeqCst);
    }

    /// Flip system-wide enablement
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Fix returned by the next `current_fix` call
    pub fn set_one_shot_fix(&self, fix: GeoFix) {
        *self.lock_one_shot() = Some(fix);
    }

    /// Deliver a fix to every active watch
    pub fn push_fix(&self, fix: GeoFix) {
        self.push_update(Ok(fix));
    }

    /// Deliver a provider error to every active watch
    pub fn push_error(&self, error: ProviderError) {
        self.push_update(Err(error));
    }

    /// Number of currently active watches
    pub fn active_watches(&self) -> usize {
        self.lock_watches().len()
    }

    /// How many times `open_settings` was called
    pub fn settings_open_count(&self) -> usize {
        self.settings_opened.load(Ordering::SeqCst)
    }

    fn push_update(&self, update: FixUpdate) {
        let mut watches = self.lock_watches();
        // drop sinks whose receiving task has gone away
        watches.retain(|_, sink| sink.send(update.clone()).is_ok());
    }

    fn lock_watches(&self) -> std::sync::MutexGuard<'_, HashMap<u64, FixSink>> {
        self.watches
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_one_shot(&self) -> std::sync::MutexGuard<'_, Option<GeoFix>> {
        self.one_shot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationProvider for SimulatedProvider {
    async fn is_authorized(&self) -> ProviderResult<bool> {
        Ok(self.authorized.load(Ordering::SeqCst))
    }

    async fn authorize(&self, _persist: bool) -> ProviderResult<()> {
        if self.deny_authorization.load(Ordering::SeqCst) {
            return Err(ProviderError::AuthorizationDenied);
        }
        self.authorized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    async fn open_settings(&self) -> ProviderResult<()> {
        self.settings_opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn current_fix(&self, options: &WatchOptions) -> ProviderResult<GeoFix> {
        self.lock_one_shot()
            .take()
            .ok_or(ProviderError::Timeout {
                waited_ms: options.fix_timeout.as_millis() as u64,
            })
    }

    fn watch(&self, sink: FixSink, _options: &WatchOptions) -> ProviderResult<WatchId> {
        let id = self.next_watch_id.fetch_add(1, Ordering::SeqCst);
        self.lock_watches().insert(id, sink);
        Ok(WatchId::new(id))
    }

    fn clear_watch(&self, id: WatchId) {
        self.lock_watches().remove(&id.raw());
    }
}
