// ABOUTME: Location provider abstractions and implementations
// ABOUTME: Trait contract, watch options, settings prompt seam and the simulated backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// Core provider trait, watch options and the settings prompt seam
pub mod core;
/// Scriptable in-process provider for tests and replay
pub mod simulated;

pub use self::core::{
    FixSink, FixUpdate, LocationProvider, SettingsPrompt, SettingsPromptReason, StaticPrompt,
    WatchId, WatchOptions,
};
pub use simulated::SimulatedProvider;
