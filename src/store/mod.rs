// ABOUTME: Key-value persistence abstraction for session history and snapshots
// ABOUTME: String-keyed get/set/remove with a pluggable backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Persistence Store
//!
//! The engine persists two values: the serialized session history and the
//! recovery snapshot of an in-flight session. Both go through this
//! string-keyed contract. Writes are synchronous and assumed atomic at the
//! storage layer; there is no partial-write recovery.

use crate::errors::StoreError;

/// In-memory store implementation
pub mod memory;

pub use memory::MemoryStore;

/// String-keyed persistence backend
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove the value stored under `key`; absent keys are a no-op
    fn remove(&self, key: &str);
}
