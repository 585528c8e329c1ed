// crates/passlink-core/src/core/state.rs
// ============================================================================
// Module: Passlink Ledger State
// Description: Identity-link bijection, force-link set, and code records.
// Purpose: Capture the single persisted document mutated by the runtime service.
// Dependencies: serde, crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! `LedgerState` is the complete persisted state: the two mappings realizing
//! the local/remote bijection, the set of force-linked local identities, and
//! the redemption-code records keyed by owner. Mutation helpers here keep the
//! two mappings mutually consistent; each helper is a single atomic update of
//! both sides.
//!
//! Security posture: persisted state is untrusted on load; stores validate
//! shape before handing a document to the runtime.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::LocalId;
use crate::core::identifiers::RemoteId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Redemption Codes
// ============================================================================

/// Redemption-code record owned by a local identity.
///
/// # Invariants
/// - `expires_at` is derived from `created_at` at generation time.
/// - Records are overwritten by later generations and mutated once on
///   redemption; they are never explicitly deleted.
/// - The generation-limit check reads only `last_generated_at`, never the
///   redemption fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionCode {
    /// The code string handed to the owner.
    pub code: String,
    /// Timestamp when the code was generated.
    pub created_at: Timestamp,
    /// Timestamp after which the code can no longer be redeemed.
    pub expires_at: Timestamp,
    /// Timestamp of the owner's most recent generation.
    pub last_generated_at: Timestamp,
    /// Local identity that redeemed the code, when redeemed.
    #[serde(default)]
    pub redeemed_by: Option<LocalId>,
    /// Extended session-validity deadline derived at redemption time.
    #[serde(default)]
    pub cookie_expires_at: Option<Timestamp>,
}

// ============================================================================
// SECTION: Ledger State
// ============================================================================

/// Complete persisted Passlink state.
///
/// # Invariants
/// - `local_to_remote` and `remote_to_local` are mutually consistent: every
///   entry on one side has its exact counterpart on the other.
/// - `force_linked` only holds identities present in `local_to_remote`.
/// - `codes` retains expired and redeemed records as history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Local-to-remote identity mapping.
    #[serde(default)]
    pub local_to_remote: BTreeMap<LocalId, RemoteId>,
    /// Remote-to-local identity mapping.
    #[serde(default)]
    pub remote_to_local: BTreeMap<RemoteId, LocalId>,
    /// Local identities linked by an admin and exempt from self-unlink.
    #[serde(default)]
    pub force_linked: BTreeSet<LocalId>,
    /// Redemption-code records keyed by owner.
    #[serde(default)]
    pub codes: BTreeMap<LocalId, RedemptionCode>,
}

impl LedgerState {
    /// Creates an empty ledger state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the remote identity linked to a local identity, if any.
    #[must_use]
    pub fn remote_for(&self, local: &LocalId) -> Option<RemoteId> {
        self.local_to_remote.get(local).copied()
    }

    /// Returns the local identity linked to a remote identity, if any.
    #[must_use]
    pub fn local_for(&self, remote: RemoteId) -> Option<&LocalId> {
        self.remote_to_local.get(&remote)
    }

    /// Inserts a link in both directions.
    ///
    /// Callers must have verified that neither side is already linked; this
    /// helper performs the insertion as one atomic update.
    pub fn insert_link(&mut self, local: LocalId, remote: RemoteId) {
        self.local_to_remote.insert(local.clone(), remote);
        self.remote_to_local.insert(remote, local);
    }

    /// Inserts a link in both directions, evicting any stale pairings.
    ///
    /// Used by admin force-link: an existing mapping on either side is
    /// removed together with its counterpart so the bijection holds after
    /// the overwrite.
    pub fn insert_link_forced(&mut self, local: LocalId, remote: RemoteId) {
        if let Some(previous_remote) = self.local_to_remote.remove(&local) {
            self.remote_to_local.remove(&previous_remote);
        }
        if let Some(previous_local) = self.remote_to_local.remove(&remote) {
            self.local_to_remote.remove(&previous_local);
            self.force_linked.remove(&previous_local);
        }
        self.insert_link(local, remote);
    }

    /// Removes the link for a local identity from both directions.
    ///
    /// Returns the remote identity that was linked, or `None` when the local
    /// identity had no link. The force-linked flag is left untouched; callers
    /// decide whether to clear it.
    pub fn remove_link(&mut self, local: &LocalId) -> Option<RemoteId> {
        let remote = self.local_to_remote.remove(local)?;
        self.remote_to_local.remove(&remote);
        Some(remote)
    }

    /// Returns true when the two mappings are mutually consistent.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        if self.local_to_remote.len() != self.remote_to_local.len() {
            return false;
        }
        self.local_to_remote
            .iter()
            .all(|(local, remote)| self.remote_to_local.get(remote) == Some(local))
    }

    /// Returns a snapshot of all links in map iteration order.
    #[must_use]
    pub fn links(&self) -> Vec<(LocalId, RemoteId)> {
        self.local_to_remote.iter().map(|(local, remote)| (local.clone(), *remote)).collect()
    }
}
