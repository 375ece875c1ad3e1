// crates/quorum-gate-cli/src/slo.rs
// ============================================================================
// Module: Objective Threshold Evaluator
// Description: Local rule evaluation of evidence against an objective.
// Purpose: Give the local judge provider a runnable rule engine.
// Dependencies: quorum-gate-core, quorum-gate-providers, serde_json
// ============================================================================

//! ## Overview
//! Compares an evidence document against objective thresholds and produces a
//! pass/fail verdict with machine-readable reasons. Checks cover required
//! blocks, witness digests, the integrity signature, budget levels and
//! spend, quota enforcement actions, anomaly spikes, and latency/error
//! performance gates. Every violated rule appends one reason; the verdict
//! fails when any reason exists.

// ============================================================================
// SECTION: Imports
// ============================================================================

use quorum_gate_core::Decision;
use quorum_gate_providers::LocalEvaluation;
use quorum_gate_providers::LocalEvaluator;
use serde_json::Value;

use crate::evidence::integrity_signature;

// ============================================================================
// SECTION: Evaluator
// ============================================================================

/// Evidence blocks that must be present before any threshold is checked.
const REQUIRED_BLOCKS: [&str; 8] =
    ["meta", "witness", "usage", "rating", "quota", "budget", "anomaly", "integrity"];

/// Threshold-based rule evaluator for the local judge provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectiveEvaluator;

impl LocalEvaluator for ObjectiveEvaluator {
    fn evaluate(&self, evidence: &Value, objective: &Value) -> LocalEvaluation {
        let mut reasons = Vec::new();

        for block in REQUIRED_BLOCKS {
            if evidence.get(block).is_none() {
                reasons.push(format!("evidence.missing:{block}"));
            }
        }
        if !reasons.is_empty() {
            return LocalEvaluation {
                decision: Decision::Fail,
                reasons,
            };
        }

        check_witness(evidence, objective, &mut reasons);
        check_integrity(evidence, objective, &mut reasons);
        check_budget(evidence, objective, &mut reasons);
        check_quota(evidence, objective, &mut reasons);
        check_anomaly(evidence, objective, &mut reasons);
        check_perf(evidence, objective, &mut reasons);

        let decision = if reasons.is_empty() {
            Decision::Pass
        } else {
            Decision::Fail
        };
        LocalEvaluation {
            decision,
            reasons,
        }
    }
}

// ============================================================================
// SECTION: Rule Checks
// ============================================================================

/// Requires a witness CSV digest when the objective demands one.
fn check_witness(evidence: &Value, objective: &Value, reasons: &mut Vec<String>) {
    let required = objective
        .pointer("/witness/require_csv_sha256")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !required {
        return;
    }
    let present = evidence
        .pointer("/witness/csv_sha256")
        .and_then(Value::as_str)
        .is_some_and(|digest| !digest.is_empty());
    if !present {
        reasons.push("witness.no_csv_sha256".to_string());
    }
}

/// Verifies the document integrity signature when the objective demands it.
fn check_integrity(evidence: &Value, objective: &Value, reasons: &mut Vec<String>) {
    let required = objective
        .pointer("/integrity/require_signature")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !required {
        return;
    }
    let expected = evidence.pointer("/integrity/signature_sha256").and_then(Value::as_str);
    let actual = integrity_signature(evidence);
    if expected.is_none() || actual.as_deref() != expected {
        reasons.push("integrity.signature_mismatch".to_string());
    }
}

/// Checks the budget level allowlist and spend ceiling.
fn check_budget(evidence: &Value, objective: &Value, reasons: &mut Vec<String>) {
    let level = evidence.pointer("/budget/level").and_then(Value::as_str).unwrap_or_default();
    if let Some(allowed) = objective.pointer("/budget/allow_levels").and_then(Value::as_array) {
        let permitted = allowed.iter().filter_map(Value::as_str).any(|entry| entry == level);
        if !permitted {
            reasons.push(format!("budget.level_forbidden:{level}"));
        }
    }
    if let Some(max_spent) = objective.pointer("/budget/max_spent").and_then(Value::as_f64) {
        let spent = evidence.pointer("/budget/spent").and_then(Value::as_f64).unwrap_or(0.0);
        if spent > max_spent {
            reasons.push(format!("budget.spent_over:{spent}>{max_spent}"));
        }
    }
}

/// Rejects evidence whose quota decisions took forbidden actions.
fn check_quota(evidence: &Value, objective: &Value, reasons: &mut Vec<String>) {
    let Some(forbids) = objective.pointer("/quota/forbid_actions").and_then(Value::as_object)
    else {
        return;
    };
    for (metric, forbidden) in forbids {
        let Some(forbidden) = forbidden.as_array() else {
            continue;
        };
        let action = evidence
            .pointer(&format!("/quota/decisions/{metric}/action"))
            .and_then(Value::as_str);
        if let Some(action) = action {
            if forbidden.iter().filter_map(Value::as_str).any(|entry| entry == action) {
                reasons.push(format!("quota.forbid:{metric}:{action}"));
            }
        }
    }
}

/// Rejects anomaly spikes unless the objective allows them.
fn check_anomaly(evidence: &Value, objective: &Value, reasons: &mut Vec<String>) {
    let allowed = objective
        .pointer("/anomaly/allow_spike")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let spiking = evidence
        .pointer("/anomaly/is_spike")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !allowed && spiking {
        reasons.push("anomaly.spike_forbidden".to_string());
    }
}

/// Checks latency percentiles and the error rate when gates are configured.
fn check_perf(evidence: &Value, objective: &Value, reasons: &mut Vec<String>) {
    let max_p95 = objective.pointer("/latency/max_p95_ms").and_then(Value::as_f64);
    let max_p99 = objective.pointer("/latency/max_p99_ms").and_then(Value::as_f64);
    let max_error_rate = objective.pointer("/error/max_error_rate").and_then(Value::as_f64);
    if max_p95.is_none() && max_p99.is_none() && max_error_rate.is_none() {
        return;
    }

    let perf = evidence.get("perf");
    if perf.is_none_or(Value::is_null) {
        reasons.push("perf.missing".to_string());
        return;
    }

    if let Some(max_p95) = max_p95 {
        let p95 = evidence.pointer("/perf/latency_ms/p95").and_then(Value::as_f64).unwrap_or(0.0);
        if p95 > max_p95 {
            reasons.push(format!("latency.p95_over:{p95}>{max_p95}"));
        }
    }
    if let Some(max_p99) = max_p99 {
        let p99 = evidence.pointer("/perf/latency_ms/p99").and_then(Value::as_f64).unwrap_or(0.0);
        if p99 > max_p99 {
            reasons.push(format!("latency.p99_over:{p99}>{max_p99}"));
        }
    }
    if let Some(max_error_rate) = max_error_rate {
        let rate = evidence.pointer("/perf/error_rate").and_then(Value::as_f64).unwrap_or(0.0);
        if rate > max_error_rate {
            reasons.push(format!("error.rate_over:{rate}>{max_error_rate}"));
        }
    }
}
