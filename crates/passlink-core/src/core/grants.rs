// crates/passlink-core/src/core/grants.rs
// ============================================================================
// Module: Passlink Grant Mappings
// Description: Configured entitlement-to-grant mapping entries.
// Purpose: Define the read-only mapping list evaluated by the resolver.
// Dependencies: serde, crate::core::identifiers
// ============================================================================

//! ## Overview
//! Grant mappings tie a purchasable entitlement on the inventory platform to
//! a revocable grant on the front-end platform. The list is supplied by
//! external configuration and read-only at runtime. List order defines the
//! evaluation order; duplicate `grant_id` entries are not deduplicated and
//! simply re-check ownership.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::EntitlementId;
use crate::core::identifiers::GrantId;

// ============================================================================
// SECTION: Grant Mapping
// ============================================================================

/// Configured mapping from an entitlement to a grant.
///
/// # Invariants
/// - `label` is a non-empty human-readable description surfaced to callers.
/// - Entries are immutable once loaded; ordering is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantMapping {
    /// Entitlement identifier whose ownership gates the grant.
    pub entitlement_id: EntitlementId,
    /// Grant identifier applied when the entitlement is owned.
    pub grant_id: GrantId,
    /// Human-readable label reported when the grant is newly applied.
    pub label: String,
}
