// crates/passlink-core/src/interfaces/mod.rs
// ============================================================================
// Module: Passlink Interfaces
// Description: Backend-agnostic interfaces for inventory, grants, and storage.
// Purpose: Define the contract surfaces used by the Passlink runtime.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how Passlink integrates with external systems without
//! embedding backend-specific details. The inventory lookup deliberately
//! swallows transport failures: network errors and timeouts normalize to an
//! absent/false result, so callers cannot distinguish "confirmed no" from
//! "could not check". This precision loss is part of the contract and is
//! preserved in tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::EntitlementId;
use crate::core::identifiers::GrantId;
use crate::core::identifiers::LocalId;
use crate::core::identifiers::RemoteId;
use crate::core::state::LedgerState;

// ============================================================================
// SECTION: Inventory Lookup
// ============================================================================

/// Read-only lookup surface of the remote inventory platform.
///
/// Implementations own their throttle, cache, and retry policy. Expected
/// transport failures never surface through this trait.
pub trait InventoryLookup {
    /// Resolves a display name to a remote identity.
    ///
    /// Returns `None` when the name does not exist on the platform or when
    /// the lookup could not be completed (fail-closed).
    fn resolve_user(&self, display_name: &str) -> Option<RemoteId>;

    /// Reports whether a remote identity owns an entitlement.
    ///
    /// Returns `false` when ownership is absent or when the check could not
    /// be completed (fail-closed).
    fn has_entitlement(&self, remote: RemoteId, entitlement: EntitlementId) -> bool;
}

// ============================================================================
// SECTION: Grant Sink
// ============================================================================

/// Grant sink errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum GrantError {
    /// Grant sink reported an error.
    #[error("grant sink error: {0}")]
    Sink(String),
}

/// Front-end surface that applies and revokes grants.
///
/// The core only decides which grants apply; the sink performs the actual
/// membership mutation on the front-end platform.
pub trait GrantSink {
    /// Returns true when the identity currently holds the grant.
    fn holds(&self, local: &LocalId, grant: GrantId) -> bool;

    /// Applies a grant to the identity.
    ///
    /// # Errors
    ///
    /// Returns [`GrantError`] when the front-end mutation fails.
    fn apply(&self, local: &LocalId, grant: GrantId) -> Result<(), GrantError>;

    /// Revokes a grant from the identity.
    ///
    /// # Errors
    ///
    /// Returns [`GrantError`] when the front-end mutation fails.
    fn revoke(&self, local: &LocalId, grant: GrantId) -> Result<(), GrantError>;
}

// ============================================================================
// SECTION: Ledger Store
// ============================================================================

/// Ledger store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("ledger store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails shape checks.
    #[error("ledger store corruption: {0}")]
    Corrupt(String),
    /// Store data is invalid.
    #[error("ledger store invalid data: {0}")]
    Invalid(String),
}

/// Durable store for the complete ledger state.
///
/// The runtime loads the full document once at startup and rewrites it on
/// every mutation; stores never see partial updates.
pub trait LedgerStore {
    /// Loads the persisted ledger state.
    ///
    /// Returns `Ok(None)` when no state has been persisted yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn load(&self) -> Result<Option<LedgerState>, StoreError>;

    /// Persists the complete ledger state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when saving fails.
    fn save(&self, state: &LedgerState) -> Result<(), StoreError>;
}
