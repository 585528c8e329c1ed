// crates/passlink-core/src/runtime/mod.rs
// ============================================================================
// Module: Passlink Runtime
// Description: Link service runtime and in-memory store for tests.
// Purpose: Group the runtime surfaces built on the core model and interfaces.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The runtime realizes the identity-link ledger, the entitlement resolver,
//! and the redemption-code ledger behind a single service with one mutual
//! exclusion guard around mutate-and-persist.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod service;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use service::AdminUnlinkOutcome;
pub use service::ClaimOutcome;
pub use service::ForceLinkOutcome;
pub use service::GenerateOutcome;
pub use service::LinkOutcome;
pub use service::LinkService;
pub use service::RedeemOutcome;
pub use service::ServiceError;
pub use service::UnlinkOutcome;
pub use store::InMemoryLedgerStore;
