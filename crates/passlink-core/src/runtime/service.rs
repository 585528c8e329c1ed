// crates/passlink-core/src/runtime/service.rs
// ============================================================================
// Module: Passlink Link Service
// Description: Identity linking, entitlement claims, and redemption codes.
// Purpose: Serialize ledger mutation and persistence behind one guard.
// Dependencies: crate::core, crate::interfaces, rand, thiserror
// ============================================================================

//! ## Overview
//! `LinkService` owns the ledger state and performs every mutating operation
//! as lock, mutate, persist, unlock. Link, unlink, force-link, admin-unlink,
//! generate, and redeem are therefore atomic with respect to each other even
//! when the host dispatches commands concurrently.
//!
//! Expected outcomes are returned as explicit enum variants; only store and
//! grant-sink failures propagate as errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::sync::MutexGuard;

use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;

use crate::core::grants::GrantMapping;
use crate::core::identifiers::LocalId;
use crate::core::identifiers::RemoteId;
use crate::core::state::LedgerState;
use crate::core::state::RedemptionCode;
use crate::core::time::Timestamp;
use crate::interfaces::GrantError;
use crate::interfaces::GrantSink;
use crate::interfaces::InventoryLookup;
use crate::interfaces::LedgerStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Redemption window for a generated code.
pub const CODE_TTL_MS: i64 = 10 * 60 * 1_000;
/// Minimum interval between generations for one owner.
pub const GENERATION_WINDOW_MS: i64 = 24 * 60 * 60 * 1_000;
/// Extended session validity derived at redemption time.
pub const SESSION_EXTENSION_MS: i64 = 48 * 60 * 60 * 1_000;
/// Length of generated codes in characters.
const CODE_LENGTH: usize = 12;
/// URL-safe uppercase alphabet for generated codes (32 symbols).
const CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Outcome of a self-service link attempt.
///
/// # Invariants
/// - Variants are stable for front-end messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The link was created in both directions.
    Linked,
    /// The local identity already has a remote mapping.
    AlreadyLinkedLocal,
    /// The remote identity is already mapped to another local identity.
    AlreadyLinkedRemote,
}

/// Outcome of an admin force-link attempt.
///
/// # Invariants
/// - Variants are stable for front-end messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceLinkOutcome {
    /// The link was created, overwriting any prior mapping on either side.
    Linked,
    /// The display name did not resolve to a remote identity.
    RemoteNotFound,
}

/// Outcome of a self-service unlink attempt.
///
/// # Invariants
/// - Variants are stable for front-end messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlinkOutcome {
    /// The link was removed and configured grants were revoked.
    Unlinked,
    /// The local identity has no link.
    NotLinked,
    /// The identity was force-linked by an admin and cannot self-unlink.
    ForceLinked,
}

/// Outcome of an admin unlink.
///
/// # Invariants
/// - Variants are stable for front-end messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminUnlinkOutcome {
    /// The link and any force-linked flag were removed.
    Unlinked,
    /// The local identity has no link.
    NotLinked,
}

/// Outcome of an entitlement claim.
///
/// # Invariants
/// - An empty label list is success ("no new grants"), not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Labels of grants newly applied, in configured evaluation order.
    Granted(Vec<String>),
    /// The caller has no linked remote identity.
    NotLinked,
}

/// Outcome of a code generation attempt.
///
/// # Invariants
/// - Variants are stable for front-end messaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// A fresh code, replacing any prior record for the owner.
    Generated(String),
    /// The caller lacks the required capability.
    NotEligible,
    /// The owner generated a code within the last 24 hours.
    RateLimited,
}

/// Outcome of a code redemption attempt.
///
/// # Invariants
/// - `Expired` leaves the matched record unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// The code was valid; the record now carries the redeemer.
    Redeemed,
    /// The code matched a record past its redemption window.
    Expired,
    /// No record carries this code.
    Invalid,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Link service errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Expected conditions are outcomes, never errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Ledger store failure.
    #[error("ledger store failure: {0}")]
    Store(#[from] StoreError),
    /// Grant sink failure.
    #[error("grant sink failure: {0}")]
    Grant(#[from] GrantError),
    /// The ledger state lock was poisoned by a panicking holder.
    #[error("ledger state lock poisoned")]
    LockPoisoned,
}

// ============================================================================
// SECTION: Link Service
// ============================================================================

/// Runtime service owning the ledger state and its persistence.
///
/// # Invariants
/// - Every mutating operation persists synchronously before returning.
/// - The two link mappings remain mutually consistent outside the lock.
/// - Grant mappings are read-only after construction.
pub struct LinkService<S, I> {
    /// Complete ledger state behind the single mutation guard.
    state: Mutex<LedgerState>,
    /// Durable store rewritten on every mutation.
    store: S,
    /// Remote inventory lookup surface.
    inventory: I,
    /// Configured entitlement-to-grant mappings in evaluation order.
    mappings: Vec<GrantMapping>,
}

impl<S, I> LinkService<S, I>
where
    S: LedgerStore,
    I: InventoryLookup,
{
    /// Creates a service by loading persisted state from the store.
    ///
    /// A store with no persisted document starts from an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the initial load fails.
    pub fn new(store: S, inventory: I, mappings: Vec<GrantMapping>) -> Result<Self, ServiceError> {
        let state = store.load()?.unwrap_or_default();
        Ok(Self {
            state: Mutex::new(state),
            store,
            inventory,
            mappings,
        })
    }

    /// Locks the ledger state, surfacing poisoning as an error.
    fn state(&self) -> Result<MutexGuard<'_, LedgerState>, ServiceError> {
        self.state.lock().map_err(|_| ServiceError::LockPoisoned)
    }

    /// Persists the complete ledger state.
    fn persist(&self, state: &LedgerState) -> Result<(), ServiceError> {
        self.store.save(state).map_err(ServiceError::from)
    }

    // ------------------------------------------------------------------
    // Identity link ledger
    // ------------------------------------------------------------------

    /// Links a local identity to a remote identity.
    ///
    /// The local-side check takes precedence when both sides are taken.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when persistence fails.
    pub fn link(&self, local: LocalId, remote: RemoteId) -> Result<LinkOutcome, ServiceError> {
        let mut state = self.state()?;
        if state.remote_for(&local).is_some() {
            return Ok(LinkOutcome::AlreadyLinkedLocal);
        }
        if state.local_for(remote).is_some() {
            return Ok(LinkOutcome::AlreadyLinkedRemote);
        }
        state.insert_link(local, remote);
        self.persist(&state)?;
        Ok(LinkOutcome::Linked)
    }

    /// Removes a self-service link, revoking configured grants first.
    ///
    /// Force-linked identities are refused; the revocation runs before the
    /// mapping is removed so the sink can still observe the link.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when revocation or persistence fails.
    pub fn unlink(
        &self,
        local: &LocalId,
        sink: &dyn GrantSink,
    ) -> Result<UnlinkOutcome, ServiceError> {
        let mut state = self.state()?;
        if state.force_linked.contains(local) {
            return Ok(UnlinkOutcome::ForceLinked);
        }
        if state.remote_for(local).is_none() {
            return Ok(UnlinkOutcome::NotLinked);
        }
        self.revoke_all(local, sink)?;
        state.remove_link(local);
        self.persist(&state)?;
        Ok(UnlinkOutcome::Unlinked)
    }

    /// Force-links a local identity to a resolved display name.
    ///
    /// Any existing mapping on either side is overwritten unconditionally
    /// and the identity joins the force-linked set (idempotent).
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when persistence fails.
    pub fn force_link(
        &self,
        local: LocalId,
        display_name: &str,
    ) -> Result<ForceLinkOutcome, ServiceError> {
        let Some(remote) = self.inventory.resolve_user(display_name) else {
            return Ok(ForceLinkOutcome::RemoteNotFound);
        };
        let mut state = self.state()?;
        state.insert_link_forced(local.clone(), remote);
        state.force_linked.insert(local);
        self.persist(&state)?;
        Ok(ForceLinkOutcome::Linked)
    }

    /// Removes a link as an admin, clearing the force-linked flag.
    ///
    /// Grants are deliberately not revoked on the admin path.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when persistence fails.
    pub fn admin_unlink(&self, local: &LocalId) -> Result<AdminUnlinkOutcome, ServiceError> {
        let mut state = self.state()?;
        if state.remove_link(local).is_none() {
            return Ok(AdminUnlinkOutcome::NotLinked);
        }
        state.force_linked.remove(local);
        self.persist(&state)?;
        Ok(AdminUnlinkOutcome::Unlinked)
    }

    /// Returns a snapshot of all links in ledger iteration order.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the state lock is poisoned.
    pub fn links(&self) -> Result<Vec<(LocalId, RemoteId)>, ServiceError> {
        Ok(self.state()?.links())
    }

    // ------------------------------------------------------------------
    // Entitlement resolver
    // ------------------------------------------------------------------

    /// Applies newly owed grants for a linked identity.
    ///
    /// Mappings are evaluated in configured order: already-held grants are
    /// skipped, ownership is checked through the inventory lookup, and the
    /// labels of newly applied grants are returned. An empty list is success.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the grant sink fails to apply a grant.
    pub fn claim(
        &self,
        local: &LocalId,
        sink: &dyn GrantSink,
    ) -> Result<ClaimOutcome, ServiceError> {
        let remote = {
            let state = self.state()?;
            state.remote_for(local)
        };
        let Some(remote) = remote else {
            return Ok(ClaimOutcome::NotLinked);
        };
        let mut applied = Vec::new();
        for mapping in &self.mappings {
            if sink.holds(local, mapping.grant_id) {
                continue;
            }
            if !self.inventory.has_entitlement(remote, mapping.entitlement_id) {
                continue;
            }
            sink.apply(local, mapping.grant_id)?;
            applied.push(mapping.label.clone());
        }
        Ok(ClaimOutcome::Granted(applied))
    }

    /// Revokes every configured grant for an identity.
    ///
    /// Runs regardless of current holdings; the sink decides what removal
    /// actually means. Used during self-service unlink.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the grant sink fails to revoke a grant.
    pub fn revoke_all(&self, local: &LocalId, sink: &dyn GrantSink) -> Result<(), ServiceError> {
        for mapping in &self.mappings {
            sink.revoke(local, mapping.grant_id)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Redemption code ledger
    // ------------------------------------------------------------------

    /// Generates a fresh redemption code for an owner.
    ///
    /// At most one code per owner per 24 hours, measured against
    /// `last_generated_at` only. A successful generation overwrites any
    /// prior record for the owner; an unredeemed prior code is lost
    /// silently, which is documented behavior.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when persistence fails.
    pub fn generate(
        &self,
        owner: LocalId,
        eligible: bool,
        now: Timestamp,
    ) -> Result<GenerateOutcome, ServiceError> {
        if !eligible {
            return Ok(GenerateOutcome::NotEligible);
        }
        let mut state = self.state()?;
        if let Some(record) = state.codes.get(&owner)
            && now.millis_since(record.last_generated_at) < GENERATION_WINDOW_MS
        {
            return Ok(GenerateOutcome::RateLimited);
        }
        let code = random_code();
        state.codes.insert(owner, RedemptionCode {
            code: code.clone(),
            created_at: now,
            expires_at: now.saturating_add_millis(CODE_TTL_MS),
            last_generated_at: now,
            redeemed_by: None,
            cookie_expires_at: None,
        });
        self.persist(&state)?;
        Ok(GenerateOutcome::Generated(code))
    }

    /// Redeems a code on behalf of a redeeming identity.
    ///
    /// Records are scanned in ledger iteration order and the first match
    /// wins; duplicate codes across owners are not checked. An expired match
    /// is reported without mutation. A valid match records the redeemer and
    /// an extended session deadline 48 hours out. Re-redeeming a still-valid
    /// code overwrites the redeemer rather than rejecting.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when persistence fails.
    pub fn redeem(
        &self,
        code: &str,
        redeemer: LocalId,
        now: Timestamp,
    ) -> Result<RedeemOutcome, ServiceError> {
        let mut state = self.state()?;
        let owner = state
            .codes
            .iter()
            .find(|(_, record)| record.code == code)
            .map(|(owner, _)| owner.clone());
        let Some(owner) = owner else {
            return Ok(RedeemOutcome::Invalid);
        };
        let Some(record) = state.codes.get_mut(&owner) else {
            return Ok(RedeemOutcome::Invalid);
        };
        if now > record.expires_at {
            return Ok(RedeemOutcome::Expired);
        }
        record.redeemed_by = Some(redeemer);
        record.cookie_expires_at = Some(now.saturating_add_millis(SESSION_EXTENSION_MS));
        self.persist(&state)?;
        Ok(RedeemOutcome::Redeemed)
    }

    /// Returns the code record for an owner, if one exists.
    ///
    /// Expired and redeemed records remain retrievable as history.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the state lock is poisoned.
    pub fn code_record(&self, owner: &LocalId) -> Result<Option<RedemptionCode>, ServiceError> {
        Ok(self.state()?.codes.get(owner).cloned())
    }
}

// ============================================================================
// SECTION: Code Generation
// ============================================================================

/// Generates a cryptographically random, URL-safe, uppercase code.
///
/// Each character carries 5 bits from the OS random source, giving 60 bits
/// of entropy per code. Collisions across owners are not checked by the
/// ledger; the alphabet size makes them negligible in practice.
fn random_code() -> String {
    let mut bytes = [0_u8; CODE_LENGTH];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|byte| char::from(CODE_ALPHABET[usize::from(byte & 0x1f)])).collect()
}
