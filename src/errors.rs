// ABOUTME: Unified error types for the geo session engine
// ABOUTME: Structured provider, store and engine errors with thiserror
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Error Handling
//!
//! Three error families, matching the failure taxonomy of the engine:
//!
//! - [`ProviderError`]: failures reported by a location provider. `Clone` so
//!   errors can ride the broadcast event channel alongside fixes.
//! - [`StoreError`]: key-value persistence failures. Surfaced as a distinct
//!   kind, but the stop/exit paths log and continue rather than propagate so
//!   a failed write never strands the state machine.
//! - [`EngineError`]: everything a caller of the engine can observe,
//!   including the `AlreadyRunning` double-start sentinel.
//!
//! Authorization denial is a structured variant, not a message substring:
//! providers must report [`ProviderError::AuthorizationDenied`] explicitly.

/// Result alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Result alias for location provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors reported by a location provider
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// The user denied location authorization
    #[error("location authorization denied")]
    AuthorizationDenied,

    /// Fix acquisition did not complete in time
    #[error("fix acquisition timed out after {waited_ms}ms")]
    Timeout {
        /// Milliseconds waited before giving up
        waited_ms: u64,
    },

    /// The provider could not deliver a fix or perform the operation
    #[error("location provider unavailable: {reason}")]
    Unavailable {
        /// Provider-specific failure description
        reason: String,
    },
}

/// Errors from the key-value persistence store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store rejected the operation
    #[error("key-value store operation failed: {reason}")]
    Backend {
        /// Store-specific failure description
        reason: String,
    },
}

/// Errors surfaced by the session engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A session is already running or paused; stop it first
    #[error("a session is already running")]
    AlreadyRunning,

    /// The user denied location authorization; never retried automatically
    #[error("location authorization denied")]
    AuthorizationDenied,

    /// Location services are disabled and the user declined the settings redirect
    #[error("location services are disabled")]
    LocationDisabled,

    /// A location provider operation failed
    #[error("location provider error")]
    Provider {
        /// Underlying provider error
        #[from]
        source: ProviderError,
    },

    /// Session serialization failed
    #[error("failed to serialize {context}")]
    Serialization {
        /// What was being serialized
        context: &'static str,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Key-value store operation failed
    #[error("persistence store error")]
    Store {
        /// Underlying store error
        #[from]
        source: StoreError,
    },
}
