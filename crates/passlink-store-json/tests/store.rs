// crates/passlink-store-json/tests/store.rs
// ============================================================================
// Module: JSON Ledger Store Tests
// Description: Round-trip, legacy migration, and corruption handling.
// ============================================================================
//! ## Overview
//! Exercises the file-backed store against real temporary files, including
//! the one-time migration of legacy flat-map documents.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;

use passlink_core::LedgerState;
use passlink_core::LedgerStore;
use passlink_core::LocalId;
use passlink_core::RedemptionCode;
use passlink_core::RemoteId;
use passlink_core::StoreError;
use passlink_core::Timestamp;
use passlink_store_json::JsonLedgerStore;
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> JsonLedgerStore {
    JsonLedgerStore::new(dir.path().join("ledger.json"))
}

fn populated_state() -> LedgerState {
    let mut state = LedgerState::new();
    state.insert_link(LocalId::new("alice"), RemoteId::new(7));
    state.insert_link(LocalId::new("bob"), RemoteId::new(8));
    state.force_linked.insert(LocalId::new("bob"));
    state.codes.insert(LocalId::new("alice"), RedemptionCode {
        code: "ABCDEFGH2345".to_string(),
        created_at: Timestamp::from_unix_millis(1_000),
        expires_at: Timestamp::from_unix_millis(601_000),
        last_generated_at: Timestamp::from_unix_millis(1_000),
        redeemed_by: Some(LocalId::new("carol")),
        cookie_expires_at: Some(Timestamp::from_unix_millis(700_000)),
    });
    state
}

#[test]
fn missing_file_loads_as_absent() {
    let dir = TempDir::new().expect("temp dir");
    let store = store_in(&dir);
    assert!(store.load().expect("load").is_none());
}

#[test]
fn saved_state_loads_back_identically() {
    let dir = TempDir::new().expect("temp dir");
    let store = store_in(&dir);
    let state = populated_state();

    store.save(&state).expect("save");
    let loaded = store.load().expect("load").expect("document");
    assert_eq!(loaded, state);
    assert!(loaded.is_consistent());
}

#[test]
fn saved_document_is_pretty_printed() {
    let dir = TempDir::new().expect("temp dir");
    let store = store_in(&dir);
    store.save(&populated_state()).expect("save");

    let text = fs::read_to_string(store.path()).expect("read document");
    assert!(text.contains('\n'));
    assert!(text.contains("\"local_to_remote\""));
    assert!(text.contains("\"force_linked\""));
}

#[test]
fn legacy_flat_map_migrates_on_load() {
    let dir = TempDir::new().expect("temp dir");
    let store = store_in(&dir);
    fs::write(store.path(), r#"{"alice": 7, "bob": 8}"#).expect("seed legacy document");

    let state = store.load().expect("load").expect("document");
    assert!(state.is_consistent());
    assert_eq!(state.remote_for(&LocalId::new("alice")), Some(RemoteId::new(7)));
    assert_eq!(state.local_for(RemoteId::new(8)), Some(&LocalId::new("bob")));
    assert!(state.force_linked.is_empty());
    assert!(state.codes.is_empty());
}

#[test]
fn migrated_state_saves_in_canonical_shape() {
    let dir = TempDir::new().expect("temp dir");
    let store = store_in(&dir);
    fs::write(store.path(), r#"{"alice": 7}"#).expect("seed legacy document");

    let state = store.load().expect("load").expect("document");
    store.save(&state).expect("save");

    let text = fs::read_to_string(store.path()).expect("read document");
    assert!(text.contains("\"local_to_remote\""));
    assert!(text.contains("\"remote_to_local\""));
}

#[test]
fn empty_legacy_document_migrates_to_empty_state() {
    let dir = TempDir::new().expect("temp dir");
    let store = store_in(&dir);
    fs::write(store.path(), "{}").expect("seed empty document");

    let state = store.load().expect("load").expect("document");
    assert_eq!(state, LedgerState::new());
}

#[test]
fn canonical_document_with_missing_sections_defaults_them() {
    let dir = TempDir::new().expect("temp dir");
    let store = store_in(&dir);
    fs::write(
        store.path(),
        r#"{"local_to_remote": {"alice": 7}, "remote_to_local": {"7": "alice"}}"#,
    )
    .expect("seed partial document");

    let state = store.load().expect("load").expect("document");
    assert!(state.is_consistent());
    assert!(state.force_linked.is_empty());
    assert!(state.codes.is_empty());
}

#[test]
fn unparseable_content_fails_as_corrupt() {
    let dir = TempDir::new().expect("temp dir");
    let store = store_in(&dir);
    fs::write(store.path(), "not json at all {").expect("seed corrupt document");

    let err = store.load().expect_err("corrupt load");
    assert!(matches!(err, StoreError::Corrupt(_)));
}

#[test]
fn non_object_document_fails_as_corrupt() {
    let dir = TempDir::new().expect("temp dir");
    let store = store_in(&dir);
    fs::write(store.path(), "[1, 2, 3]").expect("seed array document");

    let err = store.load().expect_err("corrupt load");
    assert!(matches!(err, StoreError::Corrupt(_)));
}

#[test]
fn unwritable_path_fails_as_io() {
    let store = JsonLedgerStore::new("/nonexistent-root/ledger.json");
    let err = store.save(&LedgerState::new()).expect_err("io failure");
    assert!(matches!(err, StoreError::Io(_)));
}
