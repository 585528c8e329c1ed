// crates/passlink-inventory/src/client.rs
// ============================================================================
// Module: Inventory Client
// Description: Blocking HTTP client for identity and entitlement lookups.
// Purpose: Resolve display names and entitlement ownership with pacing and retry.
// Dependencies: passlink-core, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! The inventory client implements [`InventoryLookup`] over two remote
//! endpoints: a display-name lookup (POST) and an entitlement ownership
//! check (GET). Cache misses wait out the global minimum interval before the
//! request goes out; 429 responses sleep the server-supplied retry delay and
//! retry iteratively up to a configured cap. All transport failures and
//! exhausted retries normalize to absent/false without caching, so negative
//! transport outcomes can be re-queried immediately.
//!
//! A successful ownership check is cached even when the answer is `false`;
//! an empty display-name lookup is not cached at all.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use passlink_core::EntitlementId;
use passlink_core::InventoryLookup;
use passlink_core::RemoteId;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::pacer::CachedValue;
use crate::pacer::ResponsePacer;
use crate::pacer::SystemTimeSource;
use crate::pacer::TimeSource;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the inventory client.
///
/// # Invariants
/// - `timeout_ms` applies to the full lifecycle of each request.
/// - `min_request_interval_ms` gates all outbound requests globally.
/// - `max_retries` bounds 429 retries per lookup; exceeding the cap is a
///   transient failure, never an error surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InventoryClientConfig {
    /// Endpoint for display-name lookups (POST).
    pub users_url: String,
    /// Base URL of the entitlement inventory service.
    pub inventory_url: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// User agent string for outbound requests.
    pub user_agent: String,
    /// Minimum milliseconds between outbound requests.
    pub min_request_interval_ms: u64,
    /// Cache time-to-live in milliseconds.
    pub cache_ttl_ms: u64,
    /// Maximum 429 retries per lookup.
    pub max_retries: u32,
    /// Backoff used when a 429 response carries no retry delay.
    pub default_retry_after_ms: u64,
}

impl InventoryClientConfig {
    /// Creates a config for the given endpoints with default limits.
    #[must_use]
    pub fn new(users_url: impl Into<String>, inventory_url: impl Into<String>) -> Self {
        Self {
            users_url: users_url.into(),
            inventory_url: inventory_url.into(),
            timeout_ms: 10_000,
            user_agent: "passlink/0.1".to_string(),
            min_request_interval_ms: 1_000,
            cache_ttl_ms: 300_000,
            max_retries: 3,
            default_retry_after_ms: 5_000,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Inventory client construction errors.
///
/// # Invariants
/// - Lookup-time failures never surface here; they normalize to
///   absent/false per the [`InventoryLookup`] contract.
#[derive(Debug, Error)]
pub enum InventoryClientError {
    /// The underlying HTTP client could not be built.
    #[error("inventory http client build failed")]
    Build,
}

// ============================================================================
// SECTION: Wire Shapes
// ============================================================================

/// Request body for display-name lookups.
#[derive(Debug, Serialize)]
struct UserLookupRequest {
    /// Display names to resolve; the client always sends exactly one.
    usernames: Vec<String>,
}

/// Response body for display-name lookups.
#[derive(Debug, Deserialize)]
struct UserLookupResponse {
    /// Resolved user records; empty when the name does not exist.
    #[serde(default)]
    data: Vec<UserRecord>,
}

/// Resolved user record.
#[derive(Debug, Deserialize)]
struct UserRecord {
    /// Numeric remote identity.
    id: u64,
}

/// Response body for entitlement ownership checks.
#[derive(Debug, Deserialize)]
struct EntitlementResponse {
    /// Owned item records; non-empty means the entitlement is held.
    #[serde(default)]
    data: Vec<Value>,
}

// ============================================================================
// SECTION: Client Implementation
// ============================================================================

/// Blocking inventory client with a global pacer and response cache.
///
/// # Invariants
/// - The pacer mutex is held across wait, send, and cache store, so
///   outbound traffic is serialized into one global gate.
/// - Only confirmed responses are cached; transport failures are not.
pub struct InventoryClient<T = SystemTimeSource> {
    /// Client configuration, including endpoints and limits.
    config: InventoryClientConfig,
    /// HTTP client used for outbound requests.
    http: Client,
    /// Shared throttle and response cache.
    pacer: Mutex<ResponsePacer>,
    /// Clock and sleep surface.
    time: T,
}

impl InventoryClient<SystemTimeSource> {
    /// Creates a client backed by the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryClientError`] when the HTTP client cannot be built.
    pub fn new(config: InventoryClientConfig) -> Result<Self, InventoryClientError> {
        Self::with_time_source(config, SystemTimeSource)
    }
}

impl<T: TimeSource> InventoryClient<T> {
    /// Creates a client with an explicit time source.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryClientError`] when the HTTP client cannot be built.
    pub fn with_time_source(
        config: InventoryClientConfig,
        time: T,
    ) -> Result<Self, InventoryClientError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|_| InventoryClientError::Build)?;
        let pacer = ResponsePacer::new(config.min_request_interval_ms, config.cache_ttl_ms);
        Ok(Self {
            config,
            http,
            pacer: Mutex::new(pacer),
            time,
        })
    }

    /// Waits out the global interval and stamps the request time.
    fn pace(&self, pacer: &mut MutexGuard<'_, ResponsePacer>) {
        let wait = pacer.wait_ms(self.time.now_ms());
        if wait > 0 {
            self.time.sleep(wait);
        }
        pacer.mark_request(self.time.now_ms());
    }

    /// Extracts the retry delay from a 429 response.
    fn retry_after_ms(&self, response: &Response) -> u64 {
        response
            .headers()
            .get("Retry-After")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok())
            .map_or(self.config.default_retry_after_ms, |seconds| seconds.saturating_mul(1_000))
    }

    /// Builds the entitlement ownership URL for a remote identity.
    fn entitlement_url(&self, remote: RemoteId, entitlement: EntitlementId) -> String {
        let base = self.config.inventory_url.trim_end_matches('/');
        format!("{base}/v1/users/{remote}/items/GamePass/{entitlement}")
    }
}

impl<T: TimeSource> InventoryLookup for InventoryClient<T> {
    fn resolve_user(&self, display_name: &str) -> Option<RemoteId> {
        let key = format!("user_{display_name}");
        let mut pacer = self.pacer.lock().ok()?;
        if let Some(CachedValue::User(remote)) = pacer.cached(&key, self.time.now_ms()) {
            return Some(remote);
        }
        let request = UserLookupRequest {
            usernames: vec![display_name.to_string()],
        };
        let mut attempts = 0_u32;
        loop {
            self.pace(&mut pacer);
            let Ok(response) = self.http.post(&self.config.users_url).json(&request).send() else {
                return None;
            };
            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                if attempts >= self.config.max_retries {
                    return None;
                }
                attempts += 1;
                self.time.sleep(self.retry_after_ms(&response));
                continue;
            }
            if !response.status().is_success() {
                return None;
            }
            let Ok(body) = response.json::<UserLookupResponse>() else {
                return None;
            };
            // An empty result is not cached: the name may appear shortly.
            let remote = RemoteId::new(body.data.first()?.id);
            pacer.store(key, CachedValue::User(remote), self.time.now_ms());
            return Some(remote);
        }
    }

    fn has_entitlement(&self, remote: RemoteId, entitlement: EntitlementId) -> bool {
        let key = format!("ent_{remote}_{entitlement}");
        let Ok(mut pacer) = self.pacer.lock() else {
            return false;
        };
        if let Some(CachedValue::Entitlement(owned)) = pacer.cached(&key, self.time.now_ms()) {
            return owned;
        }
        let url = self.entitlement_url(remote, entitlement);
        let mut attempts = 0_u32;
        loop {
            self.pace(&mut pacer);
            let Ok(response) = self.http.get(&url).send() else {
                return false;
            };
            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                if attempts >= self.config.max_retries {
                    return false;
                }
                attempts += 1;
                self.time.sleep(self.retry_after_ms(&response));
                continue;
            }
            if !response.status().is_success() {
                return false;
            }
            let Ok(body) = response.json::<EntitlementResponse>() else {
                return false;
            };
            // A confirmed "not owned" is cached; only transport failures
            // stay uncached.
            let owned = !body.data.is_empty();
            pacer.store(key, CachedValue::Entitlement(owned), self.time.now_ms());
            return owned;
        }
    }
}
