// crates/passlink-store-json/src/store.rs
// ============================================================================
// Module: JSON Ledger Store
// Description: Whole-document JSON persistence for the ledger state.
// Purpose: Load-on-start and rewrite-on-mutation of one pretty-printed file.
// Dependencies: passlink-core, serde_json
// ============================================================================

//! ## Overview
//! Each save rewrites the full document; each load parses the full document.
//! Documents carrying the canonical four-key shape parse directly, with
//! missing `force_linked`/`codes` sections defaulting to empty. Anything
//! else that parses as a flat `{local: remote}` object is migrated into the
//! canonical shape as a one-time upgrade; the legacy shape is never written
//! back. Unparseable content fails closed as corruption.
//!
//! Security posture: file contents are untrusted on load; shape checks run
//! before the document reaches the runtime.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use passlink_core::LedgerState;
use passlink_core::LedgerStore;
use passlink_core::LocalId;
use passlink_core::RemoteId;
use passlink_core::StoreError;
use serde_json::Value;

// ============================================================================
// SECTION: Store Implementation
// ============================================================================

/// Durable [`LedgerStore`] backed by one JSON file.
///
/// # Invariants
/// - `save` rewrites the complete document, pretty-printed.
/// - `load` returns `Ok(None)` only when the file does not exist.
/// - Legacy flat-map documents migrate on load and are never written back.
#[derive(Debug, Clone)]
pub struct JsonLedgerStore {
    /// Path of the persisted document.
    path: PathBuf,
}

impl JsonLedgerStore {
    /// Creates a store for the given document path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// Returns the path of the persisted document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for JsonLedgerStore {
    fn load(&self) -> Result<Option<LedgerState>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::Io(err.to_string())),
        };
        parse_document(&text).map(Some)
    }

    fn save(&self, state: &LedgerState) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(state)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        fs::write(&self.path, text).map_err(|err| StoreError::Io(err.to_string()))
    }
}

// ============================================================================
// SECTION: Document Parsing
// ============================================================================

/// Parses a persisted document, migrating the legacy shape when needed.
fn parse_document(text: &str) -> Result<LedgerState, StoreError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| StoreError::Corrupt(err.to_string()))?;
    let Value::Object(map) = &value else {
        return Err(StoreError::Corrupt("ledger document must be an object".to_string()));
    };
    if map.contains_key("local_to_remote") || map.contains_key("remote_to_local") {
        return serde_json::from_value(value).map_err(|err| StoreError::Corrupt(err.to_string()));
    }
    migrate_legacy(value)
}

/// Migrates a legacy flat `{local: remote}` document.
fn migrate_legacy(value: Value) -> Result<LedgerState, StoreError> {
    let flat: BTreeMap<String, u64> = serde_json::from_value(value)
        .map_err(|err| StoreError::Corrupt(format!("legacy document: {err}")))?;
    let mut state = LedgerState::new();
    for (local, remote) in flat {
        state.insert_link(LocalId::new(local), RemoteId::new(remote));
    }
    Ok(state)
}
