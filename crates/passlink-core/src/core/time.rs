// crates/passlink-core/src/core/time.rs
// ============================================================================
// Module: Passlink Time Model
// Description: Canonical timestamp representation for ledger records.
// Purpose: Provide deterministic, host-supplied time values across Passlink records.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Passlink embeds explicit time values in ledger records to keep behavior
//! deterministic. The core never reads wall-clock time directly; hosts must
//! supply timestamps on every time-dependent operation. Tests exercise the
//! code ledger by advancing supplied timestamps, not by sleeping.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Canonical timestamp used in Passlink ledger records.
///
/// # Invariants
/// - Values are unix epoch milliseconds explicitly provided by callers.
/// - No validation is performed; monotonicity is a caller responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Returns this timestamp shifted forward by the given milliseconds.
    #[must_use]
    pub const fn saturating_add_millis(self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Returns the milliseconds elapsed since an earlier timestamp.
    ///
    /// The result is negative when `earlier` lies in the future of `self`;
    /// callers compare against windows without clamping.
    #[must_use]
    pub const fn millis_since(self, earlier: Self) -> i64 {
        self.0.saturating_sub(earlier.0)
    }
}
