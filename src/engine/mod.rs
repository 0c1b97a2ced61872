// ABOUTME: Geo session engine: state machine, fix pipeline wiring and persistence
// ABOUTME: Owns the single current session, the provider watch and the chrono timer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Session Engine
//!
//! [`GeoSessionEngine`] owns at most one current session at a time. It
//! subscribes to an injected [`LocationProvider`], feeds incoming fixes
//! through the [`FixPipeline`], drives the `Stopped -> Running <-> Paused ->
//! Stopped` state machine, and persists completed sessions to history and
//! in-flight sessions to a recovery snapshot.
//!
//! All mutable state lives behind one mutex that is never held across an
//! await point. Fixes arrive through a single drain task per watch, so fix
//! handling is serialized; chrono ticks interleave through the same lock.

/// Fix filtering and metrics derivation
pub mod filter;
mod timer;

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::constants::storage;
use crate::errors::{EngineError, EngineResult, ProviderError};
use crate::events::{EventBus, GeoEvent};
use crate::models::{GeoFix, Session, SessionState};
use crate::providers::core::{
    FixUpdate, LocationProvider, SettingsPrompt, SettingsPromptReason, WatchId,
};
use crate::store::KeyValueStore;

use filter::{FixOutcome, FixPipeline};
use timer::ChronoTimer;

/// Per-session update callback registered at `start_session`
pub type SessionUpdateCallback = Box<dyn FnMut(&Session) + Send>;

/// Application lifecycle signals forwarded by the composition root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Process launched; restores a recovery snapshot if one exists
    Launch,
    /// Application moved to the foreground
    Foreground,
    /// Application moved to the background
    Background,
    /// Process is exiting; snapshots an in-flight session
    Exit,
}

struct ActiveWatch {
    id: WatchId,
    seq: u64,
}

struct EngineState {
    session: Option<Session>,
    session_state: SessionState,
    pipeline: FixPipeline,
    history: Vec<Session>,
    watch: Option<ActiveWatch>,
    watch_seq: u64,
    chrono: Option<ChronoTimer>,
    background_mode: bool,
    launched: bool,
    on_update: Option<SessionUpdateCallback>,
}

impl EngineState {
    /// Elapsed active duration: `now - start - pauses` while running, frozen
    /// at the pause point while paused. `None` without a current session.
    fn current_chrono(&self, now: DateTime<Utc>) -> Option<i64> {
        let session = self.session.as_ref()?;
        let reference = match session.state {
            SessionState::Paused => session.last_pause_time.unwrap_or(now),
            SessionState::Running | SessionState::Stopped => now,
        };
        Some(
            reference.timestamp_millis()
                - session.start_time.timestamp_millis()
                - session.pause_duration_ms,
        )
    }
}

/// Location session tracker.
///
/// Cheap to clone; clones share the same state, provider, store and event
/// bus. Collaborators are injected once by the composition root - the engine
/// never reaches for implicit global instances.
#[derive(Clone)]
pub struct GeoSessionEngine {
    provider: Arc<dyn LocationProvider>,
    store: Arc<dyn KeyValueStore>,
    prompt: Arc<dyn SettingsPrompt>,
    config: TrackerConfig,
    events: EventBus,
    state: Arc<Mutex<EngineState>>,
}

impl GeoSessionEngine {
    /// Build an engine, loading the persisted session history once.
    ///
    /// An unreadable history value is discarded with a warning rather than
    /// failing construction.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        store: Arc<dyn KeyValueStore>,
        prompt: Arc<dyn SettingsPrompt>,
        config: TrackerConfig,
    ) -> Self {
        let history = store.get(storage::SESSIONS_HISTORY_KEY).map_or_else(Vec::new, |raw| {
            serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(error = %err, "discarding unreadable session history");
                Vec::new()
            })
        });
        let pipeline = FixPipeline::new(&config);
        Self {
            provider,
            store,
            prompt,
            config,
            events: EventBus::new(),
            state: Arc::new(Mutex::new(EngineState {
                session: None,
                session_state: SessionState::Stopped,
                pipeline,
                history,
                watch: None,
                watch_seq: 0,
                chrono: None,
                background_mode: false,
                launched: false,
                on_update: None,
            })),
        }
    }

    /// Subscribe to engine notifications
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<GeoEvent> {
        self.events.subscribe()
    }

    /// Start a new session.
    ///
    /// Clears any stale recovery snapshot, runs the authorization and
    /// enablement gate, creates a zeroed session, starts the provider watch
    /// and the chrono timer, and emits `SessionState`. The optional
    /// `on_update` callback fires after every accepted fix, in addition to
    /// the broadcast `SessionUpdated` event. The callback is invoked without
    /// the engine lock held, so it may call back into the engine.
    ///
    /// # Errors
    ///
    /// - [`EngineError::AlreadyRunning`] when a session is already current
    /// - [`EngineError::AuthorizationDenied`] / [`EngineError::LocationDisabled`]
    ///   when the gate rejects
    /// - provider errors from establishing the watch
    pub async fn start_session(
        &self,
        on_update: Option<SessionUpdateCallback>,
    ) -> EngineResult<Session> {
        if self.lock_state().session.is_some() {
            return Err(EngineError::AlreadyRunning);
        }
        self.store.remove(storage::PAUSED_SESSION_KEY);
        self.ensure_location_access(true).await?;

        let mut guard = self.lock_state();
        let state = &mut *guard;
        if state.session.is_some() {
            return Err(EngineError::AlreadyRunning);
        }
        let session = Session::new(Utc::now());
        state.session = Some(session.clone());
        state.pipeline = FixPipeline::new(&self.config);
        state.on_update = on_update;
        if let Err(err) = self.start_watch(state) {
            state.session = None;
            state.on_update = None;
            return Err(err);
        }
        self.transition(state, SessionState::Running);
        self.start_chrono(state);
        info!("session started");
        Ok(session)
    }

    /// Pause the current session: no-op without a current session or when
    /// already paused. Tears down the watch and the chrono timer and clears
    /// the fix baseline so the next fix after a resume is a fresh reference.
    pub fn pause_session(&self) {
        let mut guard = self.lock_state();
        let state = &mut *guard;
        let pausable = state
            .session
            .as_ref()
            .is_some_and(|s| s.state != SessionState::Paused);
        if pausable {
            if let Some(session) = state.session.as_mut() {
                session.last_pause_time = Some(Utc::now());
            }
            self.stop_watch(state);
            state.pipeline.reset_baseline();
            self.transition(state, SessionState::Paused);
            info!("session paused");
        }
        self.stop_chrono(state);
    }

    /// Resume a paused session: no-op unless the current session is paused.
    /// Folds the completed pause into `pause_duration_ms` and re-establishes
    /// the watch and chrono timer.
    ///
    /// # Errors
    ///
    /// Returns a provider error if the watch cannot be re-established; the
    /// session stays paused.
    pub fn resume_session(&self) -> EngineResult<()> {
        let mut guard = self.lock_state();
        let state = &mut *guard;
        let paused = state
            .session
            .as_ref()
            .is_some_and(|s| s.state == SessionState::Paused);
        if !paused {
            return Ok(());
        }
        if let Some(session) = state.session.as_mut() {
            if let Some(paused_at) = session.last_pause_time.take() {
                session.pause_duration_ms +=
                    Utc::now().timestamp_millis() - paused_at.timestamp_millis();
            }
        }
        if let Err(err) = self.start_watch(state) {
            if let Some(session) = state.session.as_mut() {
                session.last_pause_time = Some(Utc::now());
            }
            return Err(err);
        }
        self.transition(state, SessionState::Running);
        self.start_chrono(state);
        info!("session resumed");
        Ok(())
    }

    /// Stop the current session: no-op without one. A session that
    /// accumulated distance is finalized, appended to history and persisted;
    /// a zero-distance session is discarded. Returns the finalized session
    /// when it was stored.
    pub fn stop_session(&self) -> Option<Session> {
        let mut guard = self.lock_state();
        let state = &mut *guard;
        let Some(mut session) = state.session.take() else {
            self.stop_chrono(state);
            return None;
        };
        self.store.remove(storage::PAUSED_SESSION_KEY);
        self.stop_watch(state);
        self.stop_chrono(state);

        let stored = session.current_distance > 0.0;
        session.state = SessionState::Stopped;
        if stored {
            session.finalize(Utc::now());
            state.history.push(session.clone());
            if let Err(err) = self.persist_history(&state.history) {
                // the session stays in the in-memory history either way
                warn!(error = %err, "failed to persist session history");
            }
            info!(
                distance_m = session.current_distance,
                average_kmh = session.average_speed,
                "session stored to history"
            );
        } else {
            debug!("session discarded: no distance accumulated");
        }
        state.session_state = SessionState::Stopped;
        state.on_update = None;
        self.events.emit(GeoEvent::SessionState(session.clone()));
        stored.then_some(session)
    }

    /// Forward an application lifecycle signal
    pub fn handle_lifecycle(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Launch => self.handle_launch(),
            LifecycleEvent::Foreground => self.set_background_mode(false),
            LifecycleEvent::Background => self.set_background_mode(true),
            LifecycleEvent::Exit => self.handle_exit(),
        }
    }

    /// Forward a provider enablement change. Losing enablement stops the
    /// current session; the change is re-broadcast as `ProviderStatus`.
    pub fn handle_provider_status(&self, enabled: bool) {
        if !enabled {
            self.stop_session();
        }
        self.events.emit(GeoEvent::ProviderStatus { enabled });
    }

    /// One-shot location request, independent of any active session.
    ///
    /// Emits `UserLocation` with the fix or the error in addition to
    /// returning it.
    ///
    /// # Errors
    ///
    /// Propagates the provider's acquisition failure.
    pub async fn request_location(&self) -> EngineResult<GeoFix> {
        match self.provider.current_fix(&self.config.watch).await {
            Ok(fix) => {
                self.events.emit(GeoEvent::UserLocation(Ok(fix.clone())));
                Ok(fix)
            }
            Err(err) => {
                self.events.emit(GeoEvent::UserLocation(Err(err.clone())));
                Err(err.into())
            }
        }
    }

    /// Whether a session is current (running or paused)
    #[must_use]
    pub fn is_session_running(&self) -> bool {
        self.lock_state().session.is_some()
    }

    /// Whether the current session is paused
    #[must_use]
    pub fn is_session_paused(&self) -> bool {
        self.lock_state()
            .session
            .as_ref()
            .is_some_and(|s| s.state == SessionState::Paused)
    }

    /// Whether a session is current but no fix has been accepted yet
    #[must_use]
    pub fn waiting_for_first_fix(&self) -> bool {
        self.lock_state()
            .session
            .as_ref()
            .is_some_and(|s| s.last_fix.is_none())
    }

    /// Snapshot of the current session, if any
    #[must_use]
    pub fn current_session(&self) -> Option<Session> {
        self.lock_state().session.clone()
    }

    /// Snapshot of the finalized session history
    #[must_use]
    pub fn sessions_history(&self) -> Vec<Session> {
        self.lock_state().history.clone()
    }

    /// Elapsed active duration of the current session in milliseconds, 0
    /// without one
    #[must_use]
    pub fn current_session_chrono(&self) -> i64 {
        self.lock_state().current_chrono(Utc::now()).unwrap_or(0)
    }

    /// Authorization and enablement gate, run before any watch starts.
    ///
    /// Denied authorization offers a settings redirect but always rejects;
    /// disabled location services reject unless the user accepts the
    /// redirect. Neither branch retries automatically.
    async fn ensure_location_access(&self, persist: bool) -> EngineResult<()> {
        let authorized = self.provider.is_authorized().await?;
        if !authorized {
            match self.provider.authorize(persist).await {
                Ok(()) => {}
                Err(ProviderError::AuthorizationDenied) => {
                    if self
                        .prompt
                        .confirm_open_settings(SettingsPromptReason::AuthorizationDenied)
                        .await
                    {
                        if let Err(err) = self.provider.open_settings().await {
                            debug!(error = %err, "settings redirect failed");
                        }
                    }
                    return Err(EngineError::AuthorizationDenied);
                }
                Err(err) => return Err(err.into()),
            }
        }
        if !self.provider.is_enabled() {
            if self
                .prompt
                .confirm_open_settings(SettingsPromptReason::LocationDisabled)
                .await
            {
                self.provider.open_settings().await?;
            } else {
                return Err(EngineError::LocationDisabled);
            }
        }
        Ok(())
    }

    /// Process one watch delivery. `seq` identifies the watch generation the
    /// delivery belongs to; deliveries buffered from a cleared watch are
    /// discarded.
    fn handle_fix_update(&self, seq: u64, update: FixUpdate) {
        let fix = match update {
            Ok(fix) => fix,
            Err(err) => {
                // transient noise: dropped without surfacing, watch stays up
                debug!(error = %err, "provider error during watch");
                return;
            }
        };
        let (snapshot, callback) = {
            let mut guard = self.lock_state();
            let EngineState {
                session,
                pipeline,
                watch,
                on_update,
                ..
            } = &mut *guard;
            if watch.as_ref().map(|w| w.seq) != Some(seq) {
                return;
            }
            let Some(session) = session.as_mut() else {
                return;
            };
            let provider = Arc::clone(&self.provider);
            let outcome =
                pipeline.apply(session, &fix, Utc::now(), |a, b| provider.distance_m(a, b));
            let FixOutcome::Accepted { first_position } = outcome else {
                return;
            };
            let snapshot = session.clone();
            if first_position {
                self.events.emit(GeoEvent::FirstPosition(fix));
            }
            self.events.emit(GeoEvent::SessionUpdated(snapshot.clone()));
            (snapshot, on_update.take())
        };
        // the callback runs without the state lock held so it may reenter the
        // engine; reinstall it afterwards unless the session changed meanwhile
        if let Some(mut callback) = callback {
            callback(&snapshot);
            let mut guard = self.lock_state();
            if guard.on_update.is_none() && guard.watch.as_ref().map(|w| w.seq) == Some(seq) {
                guard.on_update = Some(callback);
            }
        }
    }

    fn handle_launch(&self) {
        let mut guard = self.lock_state();
        let state = &mut *guard;
        if state.launched {
            return;
        }
        state.launched = true;
        let Some(raw) = self.store.get(storage::PAUSED_SESSION_KEY) else {
            return;
        };
        match serde_json::from_str::<Session>(&raw) {
            Ok(mut session) => {
                session.state = SessionState::Paused;
                state.session_state = SessionState::Paused;
                state.session = Some(session);
                info!("recovered paused session from snapshot");
                if let Some(elapsed) = state.current_chrono(Utc::now()) {
                    self.events.emit(GeoEvent::ChronoTick(elapsed));
                }
            }
            Err(err) => {
                warn!(error = %err, "discarding unreadable session snapshot");
                self.store.remove(storage::PAUSED_SESSION_KEY);
            }
        }
    }

    fn handle_exit(&self) {
        if !self.lock_state().launched {
            return;
        }
        let snapshot_needed = self
            .lock_state()
            .session
            .as_ref()
            .is_some_and(|s| s.state != SessionState::Stopped && s.current_distance > 0.0);
        if snapshot_needed {
            self.pause_session();
            let mut guard = self.lock_state();
            if let Some(session) = guard.session.take() {
                match serde_json::to_string(&session) {
                    Ok(json) => {
                        if let Err(err) = self.store.set(storage::PAUSED_SESSION_KEY, &json) {
                            warn!(error = %err, "failed to persist recovery snapshot");
                        }
                    }
                    Err(err) => warn!(error = %err, "failed to serialize recovery snapshot"),
                }
                guard.session_state = SessionState::Stopped;
            }
        }
        self.stop_session();
        self.lock_state().launched = false;
    }

    /// Flip background delivery mode. An active watch is torn down fully and
    /// re-established under the lock so no fix from the old watch interleaves
    /// with the new one.
    fn set_background_mode(&self, background: bool) {
        let mut guard = self.lock_state();
        let state = &mut *guard;
        state.background_mode = background;
        if state.watch.is_some() {
            self.stop_watch(state);
            if let Err(err) = self.start_watch(state) {
                warn!(error = %err, "failed to re-establish watch after background change");
            }
        }
    }

    fn start_watch(&self, state: &mut EngineState) -> EngineResult<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut options = self.config.watch.clone();
        options.background_delivery = state.background_mode;
        let id = self.provider.watch(tx, &options)?;
        state.watch_seq += 1;
        let seq = state.watch_seq;
        state.watch = Some(ActiveWatch { id, seq });
        let engine = self.clone();
        tokio::spawn(async move {
            // single drain task per watch: fix handling never overlaps
            while let Some(update) = rx.recv().await {
                engine.handle_fix_update(seq, update);
            }
        });
        Ok(())
    }

    fn stop_watch(&self, state: &mut EngineState) {
        if let Some(watch) = state.watch.take() {
            self.provider.clear_watch(watch.id);
        }
    }

    fn start_chrono(&self, state: &mut EngineState) {
        if state.chrono.is_none() {
            state.chrono = Some(ChronoTimer::spawn(
                self.config.chrono_tick_interval,
                Arc::clone(&self.state),
                self.events.clone(),
            ));
        }
    }

    fn stop_chrono(&self, state: &mut EngineState) {
        if let Some(timer) = state.chrono.take() {
            timer.stop();
        }
    }

    fn transition(&self, state: &mut EngineState, new_state: SessionState) {
        state.session_state = new_state;
        if let Some(session) = state.session.as_mut() {
            session.state = new_state;
            self.events.emit(GeoEvent::SessionState(session.clone()));
        }
    }

    fn persist_history(&self, history: &[Session]) -> EngineResult<()> {
        let json =
            serde_json::to_string(history).map_err(|source| EngineError::Serialization {
                context: "session history",
                source,
            })?;
        self.store.set(storage::SESSIONS_HISTORY_KEY, &json)?;
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
