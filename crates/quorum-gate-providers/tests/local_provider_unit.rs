// crates/quorum-gate-providers/tests/local_provider_unit.rs
// ============================================================================
// Module: Local Judge Provider Unit Tests
// Description: Worker offload and vote adaptation for local evaluation.
// Purpose: Prove the local transport wraps evaluator verdicts faithfully.
// ============================================================================

//! ## Overview
//! Covers the local provider's vote adaptation (decision, reasons, measured
//! latency), the default provider identifier, and the handling of an
//! evaluator that aborts.

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

use std::sync::Arc;

use quorum_gate_core::Decision;
use quorum_gate_core::JudgeError;
use quorum_gate_core::JudgeProvider;
use quorum_gate_providers::LocalEvaluation;
use quorum_gate_providers::LocalEvaluator;
use quorum_gate_providers::LocalJudgeProvider;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Scripted Evaluators
// ============================================================================

/// Evaluator passing iff the evidence carries `ready: true`.
struct ReadyEvaluator;

impl LocalEvaluator for ReadyEvaluator {
    fn evaluate(&self, evidence: &Value, _objective: &Value) -> LocalEvaluation {
        if evidence.get("ready").and_then(Value::as_bool) == Some(true) {
            LocalEvaluation {
                decision: Decision::Pass,
                reasons: Vec::new(),
            }
        } else {
            LocalEvaluation {
                decision: Decision::Fail,
                reasons: vec!["evidence.not_ready".to_string()],
            }
        }
    }
}

/// Evaluator that aborts instead of producing a verdict.
struct AbortingEvaluator;

impl LocalEvaluator for AbortingEvaluator {
    fn evaluate(&self, _evidence: &Value, _objective: &Value) -> LocalEvaluation {
        panic!("rule engine crashed")
    }
}

// ============================================================================
// SECTION: Vote Adaptation
// ============================================================================

#[tokio::test]
async fn passing_evaluation_becomes_a_pass_vote() {
    let provider = LocalJudgeProvider::with_default_id(Arc::new(ReadyEvaluator));
    let vote = provider.evaluate(&json!({"ready": true}), &json!({})).await.unwrap();

    assert_eq!(vote.provider_id, "local");
    assert_eq!(vote.decision, Decision::Pass);
    assert!(vote.reasons.is_empty());
    assert!(vote.meta.get("latency_ms").and_then(Value::as_f64).is_some());
}

#[tokio::test]
async fn failing_evaluation_keeps_its_reasons() {
    let provider = LocalJudgeProvider::new("gate-local", Arc::new(ReadyEvaluator));
    let vote = provider.evaluate(&json!({"ready": false}), &json!({})).await.unwrap();

    assert_eq!(vote.provider_id, "gate-local");
    assert_eq!(vote.decision, Decision::Fail);
    assert_eq!(vote.reasons, vec!["evidence.not_ready".to_string()]);
}

#[tokio::test]
async fn aborted_evaluation_surfaces_a_judge_error() {
    let provider = LocalJudgeProvider::with_default_id(Arc::new(AbortingEvaluator));
    let err = provider.evaluate(&json!({}), &json!({})).await.unwrap_err();
    assert!(matches!(err, JudgeError::Http { status: 500, .. }));
}
