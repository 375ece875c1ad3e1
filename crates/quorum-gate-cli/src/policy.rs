// crates/quorum-gate-cli/src/policy.rs
// ============================================================================
// Module: Scope Permission Gate
// Description: Default-deny scope enforcement for CLI actions.
// Purpose: Require an explicit grant before running a quorum decision.
// Dependencies: std
// ============================================================================

//! ## Overview
//! CLI actions are gated on scopes granted via `QUORUM_GATE_ALLOW_SCOPES`
//! (comma-separated). Without any configured grant the gate denies, on the
//! principle of explicit least privilege. Grants support `*` (everything)
//! and `prefix:*` wildcards, so `judge:*` covers `judge:run`.

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable listing granted scopes.
pub const ALLOW_SCOPES_ENV: &str = "QUORUM_GATE_ALLOW_SCOPES";
/// Scope required to run a quorum decision.
pub const JUDGE_RUN_SCOPE: &str = "judge:run";

// ============================================================================
// SECTION: Enforcement
// ============================================================================

/// Returns true when the process environment grants the scope.
#[must_use]
pub fn enforce(scope: &str) -> bool {
    let raw = std::env::var(ALLOW_SCOPES_ENV).ok();
    enforce_with(raw.as_deref(), scope)
}

/// Returns true when the grant list covers the scope.
///
/// An absent or empty grant list denies everything.
#[must_use]
pub fn enforce_with(raw_grants: Option<&str>, scope: &str) -> bool {
    let Some(raw) = raw_grants else {
        return false;
    };
    raw.split(',')
        .map(str::trim)
        .filter(|grant| !grant.is_empty())
        .any(|grant| grant_matches(grant, scope))
}

/// Returns true when one grant covers the requested scope.
fn grant_matches(granted: &str, requested: &str) -> bool {
    if granted == "*" {
        return true;
    }
    if let Some(prefix) = granted.strip_suffix(":*") {
        return requested
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with(':'));
    }
    granted == requested
}
