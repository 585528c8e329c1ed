// crates/passlink-core/src/core/mod.rs
// ============================================================================
// Module: Passlink Core Model
// Description: Identifiers, timestamps, grant mappings, and ledger state.
// Purpose: Group the canonical data model consumed by interfaces and runtime.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The core model defines the serialized shapes shared by the runtime
//! service, the persistence adapters, and the inventory client. All types
//! here are plain data; behavior lives in [`crate::runtime`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod grants;
pub mod identifiers;
pub mod state;
pub mod time;
