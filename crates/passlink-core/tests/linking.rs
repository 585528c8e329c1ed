// crates/passlink-core/tests/linking.rs
// ============================================================================
// Module: Identity Link Ledger Tests
// Description: Link, unlink, force-link, and admin-unlink semantics.
// ============================================================================
//! ## Overview
//! Validates bijection maintenance and the force-link exemption rules.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

use passlink_core::EntitlementId;
use passlink_core::GrantError;
use passlink_core::GrantId;
use passlink_core::GrantMapping;
use passlink_core::GrantSink;
use passlink_core::InventoryLookup;
use passlink_core::LocalId;
use passlink_core::RemoteId;
use passlink_core::runtime::AdminUnlinkOutcome;
use passlink_core::runtime::ForceLinkOutcome;
use passlink_core::runtime::InMemoryLedgerStore;
use passlink_core::runtime::LinkOutcome;
use passlink_core::runtime::LinkService;
use passlink_core::runtime::UnlinkOutcome;

struct StaticInventory {
    users: BTreeMap<String, RemoteId>,
    owned: BTreeSet<(u64, u64)>,
}

impl StaticInventory {
    fn empty() -> Self {
        Self {
            users: BTreeMap::new(),
            owned: BTreeSet::new(),
        }
    }

    fn with_user(name: &str, remote: RemoteId) -> Self {
        let mut inventory = Self::empty();
        inventory.users.insert(name.to_string(), remote);
        inventory
    }
}

impl InventoryLookup for StaticInventory {
    fn resolve_user(&self, display_name: &str) -> Option<RemoteId> {
        self.users.get(display_name).copied()
    }

    fn has_entitlement(&self, remote: RemoteId, entitlement: EntitlementId) -> bool {
        self.owned.contains(&(remote.get(), entitlement.get()))
    }
}

#[derive(Default)]
struct RecordingSink {
    held: RefCell<BTreeSet<(String, u64)>>,
    applied: RefCell<Vec<(String, u64)>>,
    revoked: RefCell<Vec<(String, u64)>>,
}

impl GrantSink for RecordingSink {
    fn holds(&self, local: &LocalId, grant: GrantId) -> bool {
        self.held.borrow().contains(&(local.to_string(), grant.get()))
    }

    fn apply(&self, local: &LocalId, grant: GrantId) -> Result<(), GrantError> {
        self.held.borrow_mut().insert((local.to_string(), grant.get()));
        self.applied.borrow_mut().push((local.to_string(), grant.get()));
        Ok(())
    }

    fn revoke(&self, local: &LocalId, grant: GrantId) -> Result<(), GrantError> {
        self.held.borrow_mut().remove(&(local.to_string(), grant.get()));
        self.revoked.borrow_mut().push((local.to_string(), grant.get()));
        Ok(())
    }
}

fn mapping(entitlement: u64, grant: u64, label: &str) -> GrantMapping {
    GrantMapping {
        entitlement_id: EntitlementId::from_raw(entitlement).expect("nonzero entitlement"),
        grant_id: GrantId::from_raw(grant).expect("nonzero grant"),
        label: label.to_string(),
    }
}

fn service(
    store: InMemoryLedgerStore,
    inventory: StaticInventory,
    mappings: Vec<GrantMapping>,
) -> LinkService<InMemoryLedgerStore, StaticInventory> {
    LinkService::new(store, inventory, mappings).expect("service construction")
}

#[test]
fn linking_twice_yields_already_linked_local() {
    let svc = service(InMemoryLedgerStore::new(), StaticInventory::empty(), Vec::new());
    let outcome = svc.link(LocalId::new("alice"), RemoteId::new(7)).unwrap();
    assert_eq!(outcome, LinkOutcome::Linked);

    let outcome = svc.link(LocalId::new("alice"), RemoteId::new(8)).unwrap();
    assert_eq!(outcome, LinkOutcome::AlreadyLinkedLocal);
}

#[test]
fn linking_taken_remote_yields_already_linked_remote() {
    let svc = service(InMemoryLedgerStore::new(), StaticInventory::empty(), Vec::new());
    svc.link(LocalId::new("alice"), RemoteId::new(7)).unwrap();

    let outcome = svc.link(LocalId::new("bob"), RemoteId::new(7)).unwrap();
    assert_eq!(outcome, LinkOutcome::AlreadyLinkedRemote);
}

#[test]
fn local_side_check_takes_precedence_over_remote_side() {
    let svc = service(InMemoryLedgerStore::new(), StaticInventory::empty(), Vec::new());
    svc.link(LocalId::new("alice"), RemoteId::new(7)).unwrap();

    // Both sides are taken; the local answer wins.
    let outcome = svc.link(LocalId::new("alice"), RemoteId::new(7)).unwrap();
    assert_eq!(outcome, LinkOutcome::AlreadyLinkedLocal);
}

#[test]
fn unlink_without_link_reports_not_linked() {
    let svc = service(InMemoryLedgerStore::new(), StaticInventory::empty(), Vec::new());
    let sink = RecordingSink::default();
    let outcome = svc.unlink(&LocalId::new("alice"), &sink).unwrap();
    assert_eq!(outcome, UnlinkOutcome::NotLinked);
}

#[test]
fn unlink_revokes_configured_grants_and_removes_both_directions() {
    let store = InMemoryLedgerStore::new();
    let mappings = vec![mapping(10, 100, "Bronze"), mapping(11, 101, "Silver")];
    let svc = service(store.clone(), StaticInventory::empty(), mappings);
    let sink = RecordingSink::default();

    svc.link(LocalId::new("alice"), RemoteId::new(7)).unwrap();
    let outcome = svc.unlink(&LocalId::new("alice"), &sink).unwrap();
    assert_eq!(outcome, UnlinkOutcome::Unlinked);

    let revoked = sink.revoked.borrow();
    assert_eq!(*revoked, vec![("alice".to_string(), 100), ("alice".to_string(), 101)]);

    let state = store.snapshot().expect("persisted state");
    assert!(state.is_consistent());
    assert!(state.local_to_remote.is_empty());
    assert!(state.remote_to_local.is_empty());
}

#[test]
fn force_linked_identity_cannot_self_unlink() {
    let inventory = StaticInventory::with_user("builder", RemoteId::new(9));
    let svc = service(InMemoryLedgerStore::new(), inventory, Vec::new());
    let sink = RecordingSink::default();

    let outcome = svc.force_link(LocalId::new("bob"), "builder").unwrap();
    assert_eq!(outcome, ForceLinkOutcome::Linked);

    let outcome = svc.unlink(&LocalId::new("bob"), &sink).unwrap();
    assert_eq!(outcome, UnlinkOutcome::ForceLinked);
    assert!(sink.revoked.borrow().is_empty());
}

#[test]
fn force_link_unknown_name_reports_remote_not_found() {
    let svc = service(InMemoryLedgerStore::new(), StaticInventory::empty(), Vec::new());
    let outcome = svc.force_link(LocalId::new("bob"), "nobody").unwrap();
    assert_eq!(outcome, ForceLinkOutcome::RemoteNotFound);
}

#[test]
fn force_link_overwrites_both_sides_and_keeps_bijection() {
    let store = InMemoryLedgerStore::new();
    let inventory = StaticInventory::with_user("builder", RemoteId::new(7));
    let svc = service(store.clone(), inventory, Vec::new());

    svc.link(LocalId::new("alice"), RemoteId::new(7)).unwrap();
    svc.link(LocalId::new("bob"), RemoteId::new(8)).unwrap();

    // "builder" resolves to remote 7, currently held by alice; bob keeps
    // remote 8 until the overwrite evicts it.
    let outcome = svc.force_link(LocalId::new("bob"), "builder").unwrap();
    assert_eq!(outcome, ForceLinkOutcome::Linked);

    let state = store.snapshot().expect("persisted state");
    assert!(state.is_consistent());
    assert_eq!(state.remote_for(&LocalId::new("bob")), Some(RemoteId::new(7)));
    assert_eq!(state.remote_for(&LocalId::new("alice")), None);
    assert!(state.force_linked.contains(&LocalId::new("bob")));
}

#[test]
fn force_link_is_idempotent_on_the_force_flag() {
    let inventory = StaticInventory::with_user("builder", RemoteId::new(9));
    let store = InMemoryLedgerStore::new();
    let svc = service(store.clone(), inventory, Vec::new());

    svc.force_link(LocalId::new("bob"), "builder").unwrap();
    svc.force_link(LocalId::new("bob"), "builder").unwrap();

    let state = store.snapshot().expect("persisted state");
    assert_eq!(state.force_linked.len(), 1);
    assert!(state.is_consistent());
}

#[test]
fn admin_unlink_clears_force_flag_without_revoking() {
    let inventory = StaticInventory::with_user("builder", RemoteId::new(9));
    let store = InMemoryLedgerStore::new();
    let mappings = vec![mapping(10, 100, "Bronze")];
    let svc = service(store.clone(), inventory, mappings);
    let sink = RecordingSink::default();

    svc.force_link(LocalId::new("bob"), "builder").unwrap();
    let outcome = svc.admin_unlink(&LocalId::new("bob")).unwrap();
    assert_eq!(outcome, AdminUnlinkOutcome::Unlinked);
    assert!(sink.revoked.borrow().is_empty());

    let state = store.snapshot().expect("persisted state");
    assert!(state.force_linked.is_empty());
    assert!(state.local_to_remote.is_empty());

    let outcome = svc.admin_unlink(&LocalId::new("bob")).unwrap();
    assert_eq!(outcome, AdminUnlinkOutcome::NotLinked);
}

#[test]
fn links_snapshot_follows_ledger_iteration_order() {
    let svc = service(InMemoryLedgerStore::new(), StaticInventory::empty(), Vec::new());
    svc.link(LocalId::new("carol"), RemoteId::new(3)).unwrap();
    svc.link(LocalId::new("alice"), RemoteId::new(1)).unwrap();
    svc.link(LocalId::new("bob"), RemoteId::new(2)).unwrap();

    let links = svc.links().unwrap();
    assert_eq!(links, vec![
        (LocalId::new("alice"), RemoteId::new(1)),
        (LocalId::new("bob"), RemoteId::new(2)),
        (LocalId::new("carol"), RemoteId::new(3)),
    ]);
}

#[test]
fn every_mutation_persists_synchronously() {
    let store = InMemoryLedgerStore::new();
    let inventory = StaticInventory::with_user("builder", RemoteId::new(9));
    let svc = service(store.clone(), inventory, Vec::new());
    let sink = RecordingSink::default();

    svc.link(LocalId::new("alice"), RemoteId::new(1)).unwrap();
    assert_eq!(store.save_count(), 1);

    svc.unlink(&LocalId::new("alice"), &sink).unwrap();
    assert_eq!(store.save_count(), 2);

    svc.force_link(LocalId::new("bob"), "builder").unwrap();
    assert_eq!(store.save_count(), 3);

    svc.admin_unlink(&LocalId::new("bob")).unwrap();
    assert_eq!(store.save_count(), 4);

    // Refused outcomes do not persist.
    svc.unlink(&LocalId::new("bob"), &sink).unwrap();
    assert_eq!(store.save_count(), 4);
}
