// crates/quorum-gate-config/src/providers.rs
// ============================================================================
// Module: Provider Descriptors
// Description: Serde model for the operator-supplied provider list.
// Purpose: Load and validate judge provider configuration files.
// Dependencies: serde, serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! A provider file lists judge providers under a `providers:` key. Each
//! entry names an `id` and a `type` (`local` or `http`); HTTP entries carry
//! transport tunables with documented defaults. YAML is the primary format;
//! JSON parses through the same path since YAML is a superset.
//!
//! Invariants:
//! - Provider identifiers are non-empty and unique within one file.
//! - Unknown provider types fail parsing rather than being skipped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default per-attempt timeout for HTTP judges, in milliseconds.
const fn default_timeout_ms() -> u64 {
    2_000
}

/// Default number of additional retry attempts for HTTP judges.
const fn default_retries() -> u32 {
    2
}

/// Signatures are required unless explicitly disabled.
const fn default_require_signature() -> bool {
    true
}

/// Default signing key identifier.
fn default_key_id() -> String {
    "k1".to_string()
}

/// Default consecutive-failure threshold before the breaker opens.
const fn default_breaker_max_failures() -> u32 {
    10
}

/// Default open-circuit duration, in seconds.
const fn default_breaker_reset_seconds() -> f64 {
    60.0
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("config read failed: {0}")]
    Io(String),
    /// The configuration document could not be parsed.
    #[error("config parse failed: {0}")]
    Parse(String),
    /// The configuration parsed but violates an invariant.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// The quorum expression is not of the form `k/n`.
    #[error("invalid quorum expression: {0}")]
    InvalidQuorumExpr(String),
}

// ============================================================================
// SECTION: Descriptors
// ============================================================================

/// Descriptor for a local judge provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocalProviderSpec {
    /// Stable provider identifier within the quorum configuration.
    pub id: String,
}

/// Descriptor for a remote HTTP judge provider.
///
/// # Invariants
/// - `url` is non-empty; transport tunables fall back to documented defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HttpProviderSpec {
    /// Stable provider identifier within the quorum configuration.
    pub id: String,
    /// Remote judge endpoint URL.
    pub url: String,
    /// Per-attempt timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Additional retry attempts after the first call.
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Whether requests are signed.
    #[serde(default = "default_require_signature")]
    pub require_signature: bool,
    /// Signing key identifier.
    #[serde(default = "default_key_id")]
    pub key_id: String,
    /// Consecutive failures before the circuit opens.
    #[serde(default = "default_breaker_max_failures")]
    pub breaker_max_failures: u32,
    /// Seconds the circuit stays open before admitting trial calls.
    #[serde(default = "default_breaker_reset_seconds")]
    pub breaker_reset_seconds: f64,
    /// Disables TLS certificate verification.
    #[serde(default)]
    pub insecure: bool,
}

/// One provider entry, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderSpec {
    /// Local judge delegating to the in-process rule evaluator.
    Local(LocalProviderSpec),
    /// Remote judge reached over an authenticated HTTP channel.
    Http(HttpProviderSpec),
}

impl ProviderSpec {
    /// Returns the provider identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Local(spec) => &spec.id,
            Self::Http(spec) => &spec.id,
        }
    }
}

/// Top-level provider file document.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
struct ProviderFile {
    /// Listed providers, in quorum-submission order.
    #[serde(default)]
    providers: Vec<ProviderSpec>,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Parses a provider document from YAML or JSON text.
///
/// # Errors
///
/// Returns [`ConfigError`] when the document fails to parse or violates the
/// identifier invariants.
pub fn parse_provider_document(raw: &str) -> Result<Vec<ProviderSpec>, ConfigError> {
    let file: ProviderFile =
        serde_yaml::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
    validate_specs(&file.providers)?;
    Ok(file.providers)
}

/// Loads and validates a provider file from disk.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file cannot be read, fails to parse, or
/// violates the identifier invariants.
pub fn load_provider_file(path: &Path) -> Result<Vec<ProviderSpec>, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
    parse_provider_document(&raw)
}

/// Validates identifier and URL invariants across the provider list.
fn validate_specs(specs: &[ProviderSpec]) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for spec in specs {
        let id = spec.id();
        if id.is_empty() {
            return Err(ConfigError::Invalid("provider id must not be empty".to_string()));
        }
        if !seen.insert(id.to_string()) {
            return Err(ConfigError::Invalid(format!("duplicate provider id: {id}")));
        }
        if let ProviderSpec::Http(http) = spec {
            if http.url.is_empty() {
                return Err(ConfigError::Invalid(format!("provider {id} is missing a url")));
            }
        }
    }
    Ok(())
}
