// crates/quorum-gate-providers/src/registry.rs
// ============================================================================
// Module: Provider Builder
// Description: Materializes judge providers from validated descriptors.
// Purpose: Bind operator configuration to concrete provider instances.
// Dependencies: quorum-gate-config, quorum-gate-core, quorum-gate-trust
// ============================================================================

//! ## Overview
//! Turns the validated descriptor list from `quorum-gate-config` into boxed
//! [`JudgeProvider`] trait objects, preserving list order so quorum votes
//! correlate with configuration. Local descriptors bind to the supplied rule
//! evaluator; HTTP descriptors bind to the shared key store and receive the
//! default rate-limit tunables.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use quorum_gate_config::ProviderSpec;
use quorum_gate_core::JudgeProvider;
use quorum_gate_trust::KeyStore;

use crate::http::HttpJudgeConfig;
use crate::http::HttpJudgeProvider;
use crate::http::ProviderBuildError;
use crate::local::LocalEvaluator;
use crate::local::LocalJudgeProvider;

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds judge providers from descriptors, in descriptor order.
///
/// # Errors
///
/// Returns [`ProviderBuildError`] when an HTTP provider's client cannot be
/// constructed.
pub fn build_providers(
    specs: &[ProviderSpec],
    key_store: &Arc<KeyStore>,
    evaluator: &Arc<dyn LocalEvaluator>,
) -> Result<Vec<Arc<dyn JudgeProvider>>, ProviderBuildError> {
    specs
        .iter()
        .map(|spec| match spec {
            ProviderSpec::Local(local) => {
                let provider = LocalJudgeProvider::new(&local.id, Arc::clone(evaluator));
                Ok(Arc::new(provider) as Arc<dyn JudgeProvider>)
            }
            ProviderSpec::Http(http) => {
                let mut config = HttpJudgeConfig::new(&http.url);
                config.timeout_ms = http.timeout_ms;
                config.retries = http.retries;
                config.require_signature = http.require_signature;
                config.key_id.clone_from(&http.key_id);
                config.breaker_max_failures = http.breaker_max_failures;
                config.breaker_reset_seconds = http.breaker_reset_seconds;
                config.insecure = http.insecure;
                let provider = HttpJudgeProvider::new(&http.id, config, Arc::clone(key_store))?;
                Ok(Arc::new(provider) as Arc<dyn JudgeProvider>)
            }
        })
        .collect()
}
