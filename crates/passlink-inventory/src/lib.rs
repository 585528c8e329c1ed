// crates/passlink-inventory/src/lib.rs
// ============================================================================
// Module: Passlink Inventory
// Description: Rate-limited, caching client for the remote inventory platform.
// Purpose: Implement the core InventoryLookup over HTTP with pacing and retry.
// Dependencies: passlink-core, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! This crate ships the blocking HTTP client for the remote inventory
//! platform. Outbound traffic flows through a single pacer that enforces a
//! global minimum request interval and a time-to-live response cache, so
//! repeated lookups within the cache window never touch the network.
//! Rate-limit responses are retried iteratively with server-directed backoff
//! up to a configured cap; transport failures normalize to absent/false per
//! the [`passlink_core::InventoryLookup`] contract.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod pacer;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::InventoryClient;
pub use client::InventoryClientConfig;
pub use client::InventoryClientError;
pub use pacer::CachedValue;
pub use pacer::ResponsePacer;
pub use pacer::SystemTimeSource;
pub use pacer::TimeSource;
