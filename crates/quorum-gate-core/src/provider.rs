// crates/quorum-gate-core/src/provider.rs
// ============================================================================
// Module: Judge Provider Capability
// Description: Provider trait and judge error taxonomy.
// Purpose: Define the single seam every judge transport implements.
// Dependencies: async-trait, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A judge provider offers exactly one capability: evaluate a piece of
//! evidence against an objective and return a [`Vote`]. Local and remote
//! transports implement the same trait; callers hold a slice of trait
//! objects, never a union of concrete types.
//!
//! Provider failures are explicit error-kind-carrying results, which the
//! quorum engine pattern-matches into synthesized fail votes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::vote::Vote;

// ============================================================================
// SECTION: Judge Errors
// ============================================================================

/// Errors a judge provider can surface from one evaluation.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Rate-limit refusals carry status 429; an open breaker carries 503.
#[derive(Debug, Error)]
pub enum JudgeError {
    /// The judge did not answer within its per-call deadline.
    #[error("judge timeout: {0}")]
    Timeout(String),
    /// The remote judge rejected the request signature or nonce.
    #[error("judge signature rejected: {0}")]
    BadSignature(String),
    /// The remote judge answered with a non-success HTTP status.
    #[error("judge http error {status}: {message}")]
    Http {
        /// HTTP status code carried by the failure.
        status: u16,
        /// Human-readable failure description.
        message: String,
    },
}

impl JudgeError {
    /// Stable short name for the error kind, used in synthesized vote metadata.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::BadSignature(_) => "bad_signature",
            Self::Http {
                ..
            } => "http",
        }
    }
}

// ============================================================================
// SECTION: Provider Trait
// ============================================================================

/// Capability offered by every judge transport.
#[async_trait]
pub trait JudgeProvider: Send + Sync {
    /// Stable identifier of this provider within a quorum configuration.
    fn provider_id(&self) -> &str;

    /// Evaluates evidence against an objective and returns one vote.
    ///
    /// # Errors
    ///
    /// Returns [`JudgeError`] when the judge cannot produce a vote; the
    /// quorum engine converts such errors into synthesized fail votes.
    async fn evaluate(&self, evidence: &Value, objective: &Value) -> Result<Vote, JudgeError>;
}
