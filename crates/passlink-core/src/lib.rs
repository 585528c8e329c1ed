// crates/passlink-core/src/lib.rs
// ============================================================================
// Module: Passlink Core
// Description: Identity-link ledger, entitlement resolution, and code ledger.
// Purpose: Define the data model, interfaces, and runtime service for Passlink.
// Dependencies: serde, thiserror, rand
// ============================================================================

//! ## Overview
//! Passlink links local front-end identities to remote inventory-platform
//! identities, decides which grants follow from purchasable-item ownership,
//! and manages short-lived single-use redemption codes. This crate carries
//! the data model (`core`), the backend-agnostic interfaces (`interfaces`),
//! and the runtime service that realizes the ledgers (`runtime`).
//!
//! The core never reads wall-clock time; hosts supply [`Timestamp`] values
//! on every time-dependent operation so behavior stays deterministic and
//! replayable in tests.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::grants::GrantMapping;
pub use crate::core::identifiers::EntitlementId;
pub use crate::core::identifiers::GrantId;
pub use crate::core::identifiers::LocalId;
pub use crate::core::identifiers::RemoteId;
pub use crate::core::state::LedgerState;
pub use crate::core::state::RedemptionCode;
pub use crate::core::time::Timestamp;
pub use interfaces::GrantError;
pub use interfaces::GrantSink;
pub use interfaces::InventoryLookup;
pub use interfaces::LedgerStore;
pub use interfaces::StoreError;
