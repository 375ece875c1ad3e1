// crates/quorum-gate-providers/src/local.rs
// ============================================================================
// Module: Local Judge Provider
// Description: Judge provider delegating to an in-process rule evaluator.
// Purpose: Run CPU-bound local evaluation off the async scheduler.
// Dependencies: quorum-gate-core, async-trait, tokio
// ============================================================================

//! ## Overview
//! The local provider wraps an external rule evaluator behind the
//! [`LocalEvaluator`] capability and runs it on a blocking worker thread so
//! the calling context is never blocked by CPU-bound logic while network
//! providers in the same decision are in flight. The evaluator itself is a
//! collaborator; this crate only adapts its verdict into a [`Vote`] with
//! measured latency.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use quorum_gate_core::Decision;
use quorum_gate_core::JudgeError;
use quorum_gate_core::JudgeProvider;
use quorum_gate_core::Vote;
use serde_json::Value;

// ============================================================================
// SECTION: Evaluator Capability
// ============================================================================

/// Default identifier for local judge providers.
pub const DEFAULT_LOCAL_PROVIDER_ID: &str = "local";

/// Verdict produced by the external rule evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEvaluation {
    /// The evaluator's verdict.
    pub decision: Decision,
    /// Ordered reasons supporting the verdict.
    pub reasons: Vec<String>,
}

/// External rule evaluation capability consumed by the local provider.
pub trait LocalEvaluator: Send + Sync {
    /// Evaluates evidence against an objective.
    fn evaluate(&self, evidence: &Value, objective: &Value) -> LocalEvaluation;
}

// ============================================================================
// SECTION: Provider Implementation
// ============================================================================

/// Judge provider backed by an in-process rule evaluator.
///
/// # Invariants
/// - Evaluation runs on a blocking worker, never on the async scheduler.
pub struct LocalJudgeProvider {
    /// Stable provider identifier.
    provider_id: String,
    /// External rule evaluator.
    evaluator: Arc<dyn LocalEvaluator>,
}

impl LocalJudgeProvider {
    /// Builds a local provider with an explicit identifier.
    #[must_use]
    pub fn new(provider_id: impl Into<String>, evaluator: Arc<dyn LocalEvaluator>) -> Self {
        Self {
            provider_id: provider_id.into(),
            evaluator,
        }
    }

    /// Builds a local provider with the default `local` identifier.
    #[must_use]
    pub fn with_default_id(evaluator: Arc<dyn LocalEvaluator>) -> Self {
        Self::new(DEFAULT_LOCAL_PROVIDER_ID, evaluator)
    }
}

#[async_trait]
impl JudgeProvider for LocalJudgeProvider {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    async fn evaluate(&self, evidence: &Value, objective: &Value) -> Result<Vote, JudgeError> {
        let evaluator = Arc::clone(&self.evaluator);
        let evidence = evidence.clone();
        let objective = objective.clone();
        let started = Instant::now();
        let evaluation = tokio::task::spawn_blocking(move || {
            evaluator.evaluate(&evidence, &objective)
        })
        .await
        .map_err(|err| JudgeError::Http {
            status: 500,
            message: format!("local evaluation aborted: {err}"),
        })?;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        let mut vote = Vote::new(&self.provider_id, evaluation.decision);
        vote.reasons = evaluation.reasons;
        vote.ensure_latency_ms(latency_ms);
        Ok(vote)
    }
}
