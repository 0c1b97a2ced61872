// ABOUTME: Core data models for the geo session engine
// ABOUTME: Re-exports GeoFix, Session and SessionState
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Data Models
//!
//! Core data structures shared across the engine: the raw location sample
//! (`GeoFix`) and the tracked activity (`Session`). Both serialize to JSON so
//! sessions round-trip through the key-value store unchanged, including their
//! date fields.

mod fix;
mod session;

pub use fix::GeoFix;
pub use session::{Session, SessionState};
