// crates/passlink-core/src/runtime/store.rs
// ============================================================================
// Module: In-Memory Ledger Store
// Description: Mutex-shared ledger store for tests and ephemeral hosts.
// Purpose: Provide a LedgerStore without filesystem dependencies.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The in-memory store keeps the last saved document behind a shared mutex.
//! Clones observe the same document, letting tests assert on persisted state
//! and on the save count after driving the service.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::core::state::LedgerState;
use crate::interfaces::LedgerStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory [`LedgerStore`] shared across clones.
///
/// # Invariants
/// - `load` returns a clone of the last saved document.
/// - `save_count` counts successful saves across all clones.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    /// Last saved document, if any.
    document: Arc<Mutex<Option<LedgerState>>>,
    /// Number of successful saves.
    saves: Arc<AtomicU64>,
}

impl InMemoryLedgerStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with a persisted document.
    #[must_use]
    pub fn with_state(state: LedgerState) -> Self {
        Self {
            document: Arc::new(Mutex::new(Some(state))),
            saves: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns a clone of the last saved document, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<LedgerState> {
        self.document.lock().ok().and_then(|guard| guard.clone())
    }

    /// Returns the number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn load(&self) -> Result<Option<LedgerState>, StoreError> {
        let guard =
            self.document.lock().map_err(|_| StoreError::Io("store lock poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, state: &LedgerState) -> Result<(), StoreError> {
        let mut guard =
            self.document.lock().map_err(|_| StoreError::Io("store lock poisoned".to_string()))?;
        *guard = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
