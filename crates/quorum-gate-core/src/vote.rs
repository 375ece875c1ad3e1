// crates/quorum-gate-core/src/vote.rs
// ============================================================================
// Module: Vote Data Model
// Description: Decision, vote, and quorum result records.
// Purpose: Provide immutable, explicitly typed decision payloads.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Votes and quorum results are tagged records with a closed pass/fail enum
//! rather than free-form strings. A [`Vote`] is created once per evaluation
//! attempt and never mutated after it is appended to a [`QuorumResult`]; the
//! result itself is constructed once per decide call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Binary verdict issued by a judge or by the quorum as a whole.
///
/// # Invariants
/// - The set of decisions is closed; unknown wire values fail deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// The evidence satisfies the objective.
    Pass,
    /// The evidence does not satisfy the objective.
    Fail,
}

impl Decision {
    /// Returns true for a passing decision.
    #[must_use]
    pub const fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Stable wire label for the decision.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }
}

// ============================================================================
// SECTION: Vote
// ============================================================================

/// Key under which per-vote latency is recorded in vote metadata.
pub const LATENCY_MS_KEY: &str = "latency_ms";

/// Key under which a synthesized failure vote records the error kind.
pub const ERROR_KIND_KEY: &str = "error";

/// One judge's verdict for a single evaluation attempt.
///
/// # Invariants
/// - `meta` contains at least `latency_ms` for votes produced by a provider.
/// - Votes are never mutated after being appended to a quorum result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    /// Identifier of the provider that produced this vote.
    pub provider_id: String,
    /// The provider's verdict.
    pub decision: Decision,
    /// Ordered human-readable reasons supporting the verdict.
    pub reasons: Vec<String>,
    /// Free-form vote metadata; contains at least `latency_ms`.
    pub meta: Map<String, Value>,
    /// Optional judge implementation version.
    pub version: Option<String>,
}

impl Vote {
    /// Builds a vote with empty reasons and metadata.
    #[must_use]
    pub fn new(provider_id: impl Into<String>, decision: Decision) -> Self {
        Self {
            provider_id: provider_id.into(),
            decision,
            reasons: Vec::new(),
            meta: Map::new(),
            version: None,
        }
    }

    /// Builds the fail vote synthesized for a provider error.
    ///
    /// The error kind lands in `meta.error` and the message becomes the sole
    /// reason, so callers can still correlate configuration with output.
    #[must_use]
    pub fn from_error(provider_id: impl Into<String>, kind: &str, message: String) -> Self {
        let mut meta = Map::new();
        meta.insert(ERROR_KIND_KEY.to_string(), Value::String(kind.to_string()));
        Self {
            provider_id: provider_id.into(),
            decision: Decision::Fail,
            reasons: vec![message],
            meta,
            version: None,
        }
    }

    /// Records `latency_ms` in the vote metadata unless already present.
    ///
    /// Remote judges may report their own latency; a locally measured value
    /// never overwrites it.
    pub fn ensure_latency_ms(&mut self, latency_ms: f64) {
        if self.meta.contains_key(LATENCY_MS_KEY) {
            return;
        }
        let rounded = (latency_ms * 100.0).round() / 100.0;
        if let Some(number) = Number::from_f64(rounded) {
            self.meta.insert(LATENCY_MS_KEY.to_string(), Value::Number(number));
        }
    }
}

// ============================================================================
// SECTION: Quorum Result
// ============================================================================

/// Outcome of one quorum decision.
///
/// # Invariants
/// - `votes` has length `n` and is in provider-submission order.
/// - `pass_count` equals the number of passing votes.
/// - Constructed once per decide call; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuorumResult {
    /// The overall verdict after quorum tally and fail-closed policy.
    #[serde(rename = "final")]
    pub final_decision: Decision,
    /// Minimum number of passing votes required.
    pub k: usize,
    /// Number of configured providers.
    pub n: usize,
    /// Number of passing votes observed.
    pub pass_count: usize,
    /// All votes, in provider-submission order.
    pub votes: Vec<Vote>,
    /// True when at least one provider failed to produce a vote.
    pub degraded: bool,
}
