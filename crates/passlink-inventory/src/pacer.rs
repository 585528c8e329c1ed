// crates/passlink-inventory/src/pacer.rs
// ============================================================================
// Module: Response Pacer
// Description: Global request throttle and time-to-live response cache.
// Purpose: Serialize outbound requests and absorb repeated lookups.
// Dependencies: passlink-core
// ============================================================================

//! ## Overview
//! The pacer is the injected throttle-and-cache component owned by the
//! inventory client. It tracks the timestamp of the last outbound request
//! and a string-keyed response cache. Time flows through the [`TimeSource`]
//! trait so tests construct isolated instances with deterministic clocks.
//!
//! Cache contract: a read is a hit iff the entry is younger than the
//! configured time-to-live. Expired entries behave exactly like misses and
//! are overwritten lazily by the next write to the same key, never purged
//! eagerly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use passlink_core::RemoteId;

// ============================================================================
// SECTION: Time Source
// ============================================================================

/// Clock and sleep surface used by the pacer and client.
///
/// Production code uses [`SystemTimeSource`]; tests supply manual
/// implementations that advance time instead of blocking.
pub trait TimeSource {
    /// Returns the current time as unix epoch milliseconds.
    fn now_ms(&self) -> u64;

    /// Blocks (or simulates blocking) for the given milliseconds.
    fn sleep(&self, millis: u64);
}

/// Wall-clock [`TimeSource`] backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
    }

    fn sleep(&self, millis: u64) {
        thread::sleep(Duration::from_millis(millis));
    }
}

// ============================================================================
// SECTION: Cached Values
// ============================================================================

/// Response values held by the cache.
///
/// # Invariants
/// - Key namespaces (`user_`, `ent_`) keep variants from colliding; reads
///   still match on the variant to stay fail-closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachedValue {
    /// Resolved remote identity for a display-name lookup.
    User(RemoteId),
    /// Ownership answer for an entitlement check.
    Entitlement(bool),
}

/// Cache entry with its write timestamp.
#[derive(Debug, Clone, Copy)]
struct CacheSlot {
    /// Cached response value.
    value: CachedValue,
    /// Unix milliseconds when the value was stored.
    stored_at_ms: u64,
}

// ============================================================================
// SECTION: Pacer
// ============================================================================

/// Global request throttle and response cache.
///
/// # Invariants
/// - `last_request_ms` is stamped on every outbound request across all
///   endpoints; the minimum interval is a single process-wide gate.
/// - Entries older than `ttl_ms` are treated as absent, not removed.
#[derive(Debug)]
pub struct ResponsePacer {
    /// Minimum milliseconds between outbound requests.
    min_interval_ms: u64,
    /// Cache time-to-live in milliseconds.
    ttl_ms: u64,
    /// Timestamp of the most recent outbound request.
    last_request_ms: Option<u64>,
    /// Response cache keyed by composite lookup key.
    cache: BTreeMap<String, CacheSlot>,
}

impl ResponsePacer {
    /// Creates a pacer with the given interval and time-to-live.
    #[must_use]
    pub const fn new(min_interval_ms: u64, ttl_ms: u64) -> Self {
        Self {
            min_interval_ms,
            ttl_ms,
            last_request_ms: None,
            cache: BTreeMap::new(),
        }
    }

    /// Returns the cached value for a key when it is still fresh.
    #[must_use]
    pub fn cached(&self, key: &str, now_ms: u64) -> Option<CachedValue> {
        let slot = self.cache.get(key)?;
        if now_ms.saturating_sub(slot.stored_at_ms) < self.ttl_ms {
            return Some(slot.value);
        }
        None
    }

    /// Stores a response value, overwriting any stale entry for the key.
    pub fn store(&mut self, key: impl Into<String>, value: CachedValue, now_ms: u64) {
        self.cache.insert(key.into(), CacheSlot {
            value,
            stored_at_ms: now_ms,
        });
    }

    /// Returns the milliseconds to wait before the next request may go out.
    #[must_use]
    pub fn wait_ms(&self, now_ms: u64) -> u64 {
        let Some(last) = self.last_request_ms else {
            return 0;
        };
        self.min_interval_ms.saturating_sub(now_ms.saturating_sub(last))
    }

    /// Stamps the time of an outbound request.
    pub const fn mark_request(&mut self, now_ms: u64) {
        self.last_request_ms = Some(now_ms);
    }
}
