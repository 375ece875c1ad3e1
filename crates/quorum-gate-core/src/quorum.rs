// crates/quorum-gate-core/src/quorum.rs
// ============================================================================
// Module: Quorum Decision Engine
// Description: Concurrent fan-out, ordered tally, and fail-closed policy.
// Purpose: Combine independent judge votes into one accept/reject decision.
// Dependencies: serde_json, thiserror, tokio, tracing
// ============================================================================

//! ## Overview
//! [`decide`] schedules every provider's evaluation concurrently, then joins
//! the results in provider-submission order so callers can deterministically
//! correlate configuration with output. A provider that errors (or panics)
//! yields a synthesized fail vote and marks the decision degraded; it never
//! aborts the batch. Wall-clock cost is bounded by the slowest provider, not
//! the sum, because scheduling is parallel even though collection is ordered.
//!
//! Invariants:
//! - Only configuration validation errors escape; provider unreliability is
//!   absorbed into the result.
//! - With fail-closed behavior requested, any degradation forces a fail
//!   verdict regardless of the pass count.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use thiserror::Error;

use crate::provider::JudgeProvider;
use crate::vote::Decision;
use crate::vote::QuorumResult;
use crate::vote::Vote;

// ============================================================================
// SECTION: Validation Errors
// ============================================================================

/// Quorum configuration errors.
///
/// These represent programmer or configuration mistakes, not provider
/// unreliability, and are the only errors [`decide`] propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuorumConfigError {
    /// The provider list length does not match the configured `n`.
    #[error("provider count {actual} does not match quorum n {expected}")]
    ProviderCountMismatch {
        /// Number of providers supplied.
        actual: usize,
        /// Configured quorum width `n`.
        expected: usize,
    },
    /// The quorum threshold violates `0 < k <= n`.
    #[error("invalid quorum k={k}, n={n}")]
    InvalidQuorum {
        /// Configured threshold `k`.
        k: usize,
        /// Configured quorum width `n`.
        n: usize,
    },
}

// ============================================================================
// SECTION: Decision Engine
// ============================================================================

/// Fans one evaluation out to every provider and tallies a k-of-n quorum.
///
/// Every provider runs to completion; slower providers are never cancelled
/// when others finish or fail. There is no engine-level deadline — callers
/// needing one must wrap the whole call externally.
///
/// # Errors
///
/// Returns [`QuorumConfigError`] when `providers.len() != n` or the
/// threshold violates `0 < k <= n`.
pub async fn decide(
    providers: &[Arc<dyn JudgeProvider>],
    evidence: &Value,
    objective: &Value,
    k: usize,
    n: usize,
    fail_closed_on_degrade: bool,
) -> Result<QuorumResult, QuorumConfigError> {
    if providers.len() != n {
        return Err(QuorumConfigError::ProviderCountMismatch {
            actual: providers.len(),
            expected: n,
        });
    }
    if k == 0 || k > n {
        return Err(QuorumConfigError::InvalidQuorum {
            k,
            n,
        });
    }

    let evidence = Arc::new(evidence.clone());
    let objective = Arc::new(objective.clone());

    let mut handles = Vec::with_capacity(providers.len());
    for provider in providers {
        let provider = Arc::clone(provider);
        let evidence = Arc::clone(&evidence);
        let objective = Arc::clone(&objective);
        handles.push(tokio::spawn(async move {
            let started = Instant::now();
            let outcome = provider.evaluate(&evidence, &objective).await;
            (outcome, started.elapsed())
        }));
    }

    let mut votes = Vec::with_capacity(providers.len());
    let mut pass_count = 0_usize;
    let mut degraded = false;

    for (handle, provider) in handles.into_iter().zip(providers) {
        match handle.await {
            Ok((Ok(mut vote), elapsed)) => {
                vote.ensure_latency_ms(elapsed.as_secs_f64() * 1000.0);
                if vote.decision.is_pass() {
                    pass_count += 1;
                }
                votes.push(vote);
            }
            Ok((Err(err), _)) => {
                degraded = true;
                tracing::warn!(
                    provider_id = provider.provider_id(),
                    kind = err.kind(),
                    "judge provider failed"
                );
                votes.push(Vote::from_error(provider.provider_id(), err.kind(), err.to_string()));
            }
            Err(join_err) => {
                degraded = true;
                tracing::warn!(
                    provider_id = provider.provider_id(),
                    "judge provider task aborted"
                );
                votes.push(Vote::from_error(
                    provider.provider_id(),
                    "panic",
                    join_err.to_string(),
                ));
            }
        }
    }

    let mut final_decision = if pass_count >= k {
        Decision::Pass
    } else {
        Decision::Fail
    };
    if degraded && fail_closed_on_degrade {
        // Availability is sacrificed for safety: a degraded quorum never passes.
        final_decision = Decision::Fail;
    }

    Ok(QuorumResult {
        final_decision,
        k,
        n,
        pass_count,
        votes,
        degraded,
    })
}
