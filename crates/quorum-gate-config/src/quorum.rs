// crates/quorum-gate-config/src/quorum.rs
// ============================================================================
// Module: Quorum Expression
// Description: Parsing for the operator-supplied `k/n` quorum rule.
// Purpose: Turn the CLI quorum expression into validated thresholds.
// Dependencies: thiserror (via crate::providers::ConfigError)
// ============================================================================

//! ## Overview
//! Operators express the quorum rule as `k/n` (for example `2/3`). Parsing
//! enforces the full threshold invariant `0 < k <= n` up front so malformed
//! expressions are reported as configuration errors before any provider is
//! contacted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::providers::ConfigError;

// ============================================================================
// SECTION: Quorum Expression
// ============================================================================

/// Parsed quorum rule.
///
/// # Invariants
/// - `0 < k <= n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuorumExpr {
    /// Minimum number of passing votes required.
    pub k: usize,
    /// Number of providers expected to vote.
    pub n: usize,
}

/// Parses a `k/n` quorum expression.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidQuorumExpr`] when the expression is not two
/// positive integers separated by a slash or violates `0 < k <= n`.
pub fn parse_quorum_expr(expr: &str) -> Result<QuorumExpr, ConfigError> {
    let Some((k_str, n_str)) = expr.split_once('/') else {
        return Err(ConfigError::InvalidQuorumExpr(expr.to_string()));
    };
    let k = k_str
        .trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidQuorumExpr(expr.to_string()))?;
    let n = n_str
        .trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidQuorumExpr(expr.to_string()))?;
    if k == 0 || k > n {
        return Err(ConfigError::InvalidQuorumExpr(expr.to_string()));
    }
    Ok(QuorumExpr {
        k,
        n,
    })
}
