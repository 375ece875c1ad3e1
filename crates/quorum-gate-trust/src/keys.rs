// crates/quorum-gate-trust/src/keys.rs
// ============================================================================
// Module: Key Material Store
// Description: TTL-cached signing key store with pluggable sources.
// Purpose: Serve rotation-aware key material without in-place mutation.
// Dependencies: serde, serde_json, base64, hex
// ============================================================================

//! ## Overview
//! The key store loads signing keys (id, secret, lifecycle state) from a
//! pluggable [`KeySource`], caches them for a short time-to-live, and serves
//! lookup-by-id plus "pick one active key". Every refresh rebuilds the whole
//! key set and swaps it wholesale under the store mutex, so readers never
//! observe a partially rebuilt set. A malformed source yields an empty set
//! rather than an error; callers treat "no active key" as a first-class
//! condition.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Key Material
// ============================================================================

/// Lifecycle state of a signing key.
///
/// # Invariants
/// - States are stable wire values for key source documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyState {
    /// Preferred key for new signatures; verifies.
    Active,
    /// Rotated-out key inside its grace window; verifies but does not sign.
    Grace,
    /// Revoked key; vetoed even on a matching signature.
    Retired,
}

impl Default for KeyState {
    fn default() -> Self {
        Self::Active
    }
}

/// Decoded signing key material.
///
/// # Invariants
/// - Immutable once constructed; refreshes build new values, never patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    /// Stable key identifier carried on the wire as `X-Key-Id`.
    pub key_id: String,
    /// Raw secret bytes used as the MAC key.
    pub secret: Vec<u8>,
    /// Lifecycle state of the key.
    pub state: KeyState,
}

/// One key entry as it appears in a key source document.
///
/// Secret strings accept `hex:` and `b64:` prefixes; anything else is taken
/// as raw UTF-8 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDescriptor {
    /// Stable key identifier.
    pub key_id: String,
    /// Encoded secret string.
    pub secret: String,
    /// Lifecycle state; defaults to active.
    #[serde(default)]
    pub state: KeyState,
}

/// Decodes a descriptor secret string into raw bytes.
///
/// Returns `None` when a `hex:`/`b64:` payload does not decode; the store
/// treats that as a malformed source and fails closed to an empty key set.
fn decode_secret(secret: &str) -> Option<Vec<u8>> {
    if let Some(encoded) = secret.strip_prefix("hex:") {
        return hex::decode(encoded).ok();
    }
    if let Some(encoded) = secret.strip_prefix("b64:") {
        return BASE64.decode(encoded).ok();
    }
    Some(secret.as_bytes().to_vec())
}

// ============================================================================
// SECTION: Key Sources
// ============================================================================

/// Pluggable origin of key descriptors.
pub trait KeySource: Send + Sync {
    /// Loads the current key descriptors, in precedence order.
    ///
    /// A malformed underlying document yields an empty list; sources never
    /// fail loudly.
    fn load(&self) -> Vec<KeyDescriptor>;
}

/// Fixed in-memory key source.
///
/// # Invariants
/// - Descriptors are returned in construction order on every load.
#[derive(Debug, Clone)]
pub struct StaticKeySource {
    /// Descriptors served on every load.
    descriptors: Vec<KeyDescriptor>,
}

impl StaticKeySource {
    /// Builds a source serving the provided descriptors.
    #[must_use]
    pub const fn new(descriptors: Vec<KeyDescriptor>) -> Self {
        Self {
            descriptors,
        }
    }
}

impl KeySource for StaticKeySource {
    fn load(&self) -> Vec<KeyDescriptor> {
        self.descriptors.clone()
    }
}

/// Environment variable holding the structured JSON key list.
pub const KEYS_ENV: &str = "QUORUM_GATE_KEYS";
/// Environment variable naming a JSON file with the structured key list.
pub const KEYS_FILE_ENV: &str = "QUORUM_GATE_KEYS_FILE";
/// Environment variable holding the legacy single shared secret.
pub const LEGACY_KEY_ENV: &str = "QUORUM_GATE_HMAC_KEY";
/// Key identifier assigned to the legacy fallback secret.
pub const LEGACY_KEY_ID: &str = "legacy";

/// Environment-backed key source.
///
/// Merges, in order: the file named by `QUORUM_GATE_KEYS_FILE` (when present)
/// and the JSON list in `QUORUM_GATE_KEYS`. When both are absent or empty,
/// the legacy `QUORUM_GATE_HMAC_KEY` secret becomes one implicit active key.
///
/// # Invariants
/// - Unreadable or malformed pieces contribute nothing; they never abort the
///   load.
/// - `overrides` take precedence over process environment reads.
#[derive(Debug, Clone, Default)]
pub struct EnvKeySource {
    /// Optional override map used for deterministic lookups.
    overrides: Option<BTreeMap<String, String>>,
}

impl EnvKeySource {
    /// Builds the environment-backed source.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            overrides: None,
        }
    }

    /// Builds a source resolving variables from an override map only.
    #[must_use]
    pub const fn with_overrides(overrides: BTreeMap<String, String>) -> Self {
        Self {
            overrides: Some(overrides),
        }
    }

    /// Resolves one variable from overrides or the process environment.
    fn lookup(&self, key: &str) -> Option<String> {
        if let Some(overrides) = &self.overrides {
            return overrides.get(key).cloned();
        }
        std::env::var(key).ok()
    }

    /// Parses a JSON descriptor list, tolerating malformed input.
    fn parse_list(raw: &str) -> Vec<KeyDescriptor> {
        serde_json::from_str::<Vec<KeyDescriptor>>(raw).unwrap_or_default()
    }
}

impl KeySource for EnvKeySource {
    fn load(&self) -> Vec<KeyDescriptor> {
        let mut descriptors = Vec::new();
        if let Some(path) = self.lookup(KEYS_FILE_ENV) {
            if let Ok(raw) = std::fs::read_to_string(Path::new(&path)) {
                descriptors.extend(Self::parse_list(&raw));
            }
        }
        if let Some(raw) = self.lookup(KEYS_ENV) {
            descriptors.extend(Self::parse_list(&raw));
        }
        if descriptors.is_empty() {
            if let Some(secret) = self.lookup(LEGACY_KEY_ENV) {
                if !secret.is_empty() {
                    descriptors.push(KeyDescriptor {
                        key_id: LEGACY_KEY_ID.to_string(),
                        secret,
                        state: KeyState::Active,
                    });
                }
            }
        }
        descriptors
    }
}

// ============================================================================
// SECTION: Key Store
// ============================================================================

/// Default cache time-to-live for loaded key material.
pub const DEFAULT_KEY_TTL: Duration = Duration::from_secs(5);

/// Cached key set plus load diagnostics.
///
/// # Invariants
/// - `keys` preserves source load order (first occurrence wins position,
///   last occurrence wins value).
struct CachedKeys {
    /// Decoded key material in load order.
    keys: Vec<KeyMaterial>,
    /// Monotonic instant of the last refresh attempt.
    refreshed_at: Option<Instant>,
    /// Wall-clock time of the last successful load.
    loaded_at: Option<SystemTime>,
    /// Description of the last load failure, if any.
    last_error: Option<String>,
}

/// Diagnostics snapshot for operators and readiness probes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyStoreInfo {
    /// Number of keys currently cached.
    pub key_count: usize,
    /// Unix epoch seconds of the last successful load.
    pub loaded_at_epoch: Option<u64>,
    /// Seconds since the last successful load.
    pub age_seconds: Option<f64>,
    /// Description of the last load failure, if any.
    pub last_error: Option<String>,
}

/// TTL-cached store of signing key material.
///
/// The store is an explicitly constructed, owned instance passed by handle
/// into the components that need it. Concurrent refreshes swap the whole key
/// set under the store mutex; the set is never patched in place.
pub struct KeyStore {
    /// Origin of key descriptors.
    source: Box<dyn KeySource>,
    /// Cache time-to-live before a reload is attempted.
    ttl: Duration,
    /// Cached key material and diagnostics.
    cache: Mutex<CachedKeys>,
}

impl KeyStore {
    /// Builds a store over the given source with the default 5-second TTL.
    #[must_use]
    pub fn new(source: impl KeySource + 'static) -> Self {
        Self::with_ttl(source, DEFAULT_KEY_TTL)
    }

    /// Builds a store with an explicit cache time-to-live.
    #[must_use]
    pub fn with_ttl(source: impl KeySource + 'static, ttl: Duration) -> Self {
        Self {
            source: Box::new(source),
            ttl,
            cache: Mutex::new(CachedKeys {
                keys: Vec::new(),
                refreshed_at: None,
                loaded_at: None,
                last_error: None,
            }),
        }
    }

    /// Looks a key up by identifier, refreshing the cache when stale.
    #[must_use]
    pub fn get(&self, key_id: &str) -> Option<KeyMaterial> {
        self.with_fresh_cache(|cache| {
            cache.keys.iter().find(|km| km.key_id == key_id).cloned()
        })
    }

    /// Returns the first active key in load order, if any.
    ///
    /// Callers treat the first active key found as canonical; the store does
    /// not enforce uniqueness of active keys.
    #[must_use]
    pub fn choose_active(&self) -> Option<KeyMaterial> {
        self.with_fresh_cache(|cache| {
            cache.keys.iter().find(|km| km.state == KeyState::Active).cloned()
        })
    }

    /// Returns a diagnostics snapshot, refreshing the cache when stale.
    #[must_use]
    pub fn info(&self) -> KeyStoreInfo {
        self.with_fresh_cache(|cache| {
            let now = SystemTime::now();
            let loaded_at_epoch = cache
                .loaded_at
                .and_then(|at| at.duration_since(UNIX_EPOCH).ok())
                .map(|since| since.as_secs());
            let age_seconds = cache
                .loaded_at
                .and_then(|at| now.duration_since(at).ok())
                .map(|age| age.as_secs_f64());
            KeyStoreInfo {
                key_count: cache.keys.len(),
                loaded_at_epoch,
                age_seconds,
                last_error: cache.last_error.clone(),
            }
        })
    }

    /// Drops the cache and reloads from the source immediately.
    pub fn force_reload(&self) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        Self::rebuild(&mut cache, self.source.as_ref());
    }

    /// Runs `read` against a cache refreshed within the TTL.
    fn with_fresh_cache<T>(&self, read: impl FnOnce(&CachedKeys) -> T) -> T {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let stale = cache.refreshed_at.is_none_or(|at| at.elapsed() >= self.ttl);
        if stale {
            Self::rebuild(&mut cache, self.source.as_ref());
        }
        read(&cache)
    }

    /// Rebuilds the whole key set from the source and swaps it in.
    fn rebuild(cache: &mut CachedKeys, source: &dyn KeySource) {
        let descriptors = source.load();
        let mut keys: Vec<KeyMaterial> = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let Some(secret) = decode_secret(&descriptor.secret) else {
                // Fail closed: one undecodable secret poisons the whole load.
                cache.keys = Vec::new();
                cache.refreshed_at = Some(Instant::now());
                cache.loaded_at = None;
                cache.last_error =
                    Some(format!("undecodable secret for key {}", descriptor.key_id));
                return;
            };
            let material = KeyMaterial {
                key_id: descriptor.key_id,
                secret,
                state: descriptor.state,
            };
            if let Some(existing) = keys.iter_mut().find(|km| km.key_id == material.key_id) {
                *existing = material;
            } else {
                keys.push(material);
            }
        }
        cache.keys = keys;
        cache.refreshed_at = Some(Instant::now());
        cache.loaded_at = Some(SystemTime::now());
        cache.last_error = None;
    }
}
