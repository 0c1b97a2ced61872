// ABOUTME: Unit tests for the in-memory key-value store
// ABOUTME: Get/set/remove semantics and overwrite behavior
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
#![allow(missing_docs)]

use geo_session_engine::store::{KeyValueStore, MemoryStore};

#[test]
fn test_get_missing_key_returns_none() {
    let store = MemoryStore::new();
    assert!(store.get("absent").is_none());
    assert!(store.is_empty());
}

#[test]
fn test_set_then_get_round_trips() {
    let store = MemoryStore::new();
    store.set("key", "value").expect("set succeeds");
    assert_eq!(store.get("key").as_deref(), Some("value"));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_set_overwrites_previous_value() {
    let store = MemoryStore::new();
    store.set("key", "old").expect("set");
    store.set("key", "new").expect("overwrite");
    assert_eq!(store.get("key").as_deref(), Some("new"));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_remove_deletes_and_tolerates_absent_keys() {
    let store = MemoryStore::new();
    store.set("key", "value").expect("set");
    store.remove("key");
    assert!(store.get("key").is_none());
    // removing again is a no-op
    store.remove("key");
    assert!(store.is_empty());
}
