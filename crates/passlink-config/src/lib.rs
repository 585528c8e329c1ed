// crates/passlink-config/src/lib.rs
// ============================================================================
// Module: Passlink Config
// Description: Grant-mapping configuration loading and validation.
// Purpose: Turn the external TOML mapping file into validated GrantMappings.
// Dependencies: passlink-core, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! The grant-mapping file lists entitlement-to-grant pairs in evaluation
//! order:
//!
//! ```toml
//! [[grant]]
//! entitlement_id = 123
//! grant_id = 456
//! label = "VIP"
//! ```
//!
//! A missing file yields the empty mapping list; a present file must parse
//! and validate completely or loading fails. Duplicate `grant_id` entries
//! are permitted — the resolver re-checks them in order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use passlink_core::EntitlementId;
use passlink_core::GrantId;
use passlink_core::GrantMapping;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("grant config io error: {0}")]
    Io(String),
    /// Configuration file is not valid TOML.
    #[error("grant config parse error: {0}")]
    Parse(String),
    /// Configuration content failed validation.
    #[error("grant config invalid: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Document Model
// ============================================================================

/// Top-level grant configuration document.
#[derive(Debug, Deserialize)]
struct GrantConfigDoc {
    /// Grant mapping entries in evaluation order.
    #[serde(default, rename = "grant")]
    grants: Vec<GrantEntry>,
}

/// Raw grant mapping entry before identifier validation.
#[derive(Debug, Deserialize)]
struct GrantEntry {
    /// Raw entitlement identifier (must be non-zero).
    entitlement_id: u64,
    /// Raw grant identifier (must be non-zero).
    grant_id: u64,
    /// Human-readable label (must be non-empty).
    label: String,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Loads and validates the grant-mapping file.
///
/// A missing file is not an error; it yields the empty mapping list so a
/// fresh deployment starts with no grants configured.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file cannot be read, parsed, or
/// validated.
pub fn load_grant_config(path: &Path) -> Result<Vec<GrantMapping>, ConfigError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path).map_err(|err| ConfigError::Io(err.to_string()))?;
    parse_grant_config(&text)
}

/// Parses and validates grant-mapping TOML content.
///
/// # Errors
///
/// Returns [`ConfigError`] when parsing or validation fails.
pub fn parse_grant_config(text: &str) -> Result<Vec<GrantMapping>, ConfigError> {
    let doc: GrantConfigDoc =
        toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
    doc.grants.into_iter().enumerate().map(|(index, entry)| validate_entry(index, entry)).collect()
}

/// Validates one raw entry into a [`GrantMapping`].
fn validate_entry(index: usize, entry: GrantEntry) -> Result<GrantMapping, ConfigError> {
    let entitlement_id = EntitlementId::from_raw(entry.entitlement_id)
        .ok_or_else(|| ConfigError::Invalid(format!("grant {index}: entitlement_id must be >= 1")))?;
    let grant_id = GrantId::from_raw(entry.grant_id)
        .ok_or_else(|| ConfigError::Invalid(format!("grant {index}: grant_id must be >= 1")))?;
    if entry.label.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("grant {index}: label must be non-empty")));
    }
    Ok(GrantMapping {
        entitlement_id,
        grant_id,
        label: entry.label,
    })
}
