// crates/passlink-store-json/src/lib.rs
// ============================================================================
// Module: Passlink JSON Store
// Description: Durable LedgerStore backed by one JSON document.
// Purpose: Persist the complete ledger state with legacy-format migration.
// Dependencies: passlink-core, serde_json
// ============================================================================

//! ## Overview
//! This crate implements the core [`passlink_core::LedgerStore`] trait over
//! a single pretty-printed JSON file. Loads tolerate the legacy flat-map
//! format by migrating it into the canonical four-key shape; writes always
//! produce the canonical shape.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::JsonLedgerStore;
