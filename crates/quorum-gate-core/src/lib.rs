// crates/quorum-gate-core/src/lib.rs
// ============================================================================
// Module: Quorum Gate Core
// Description: Vote data model, judge provider capability, and quorum engine.
// Purpose: Define the decision contract shared by all judge transports.
// Dependencies: serde, serde_json, thiserror, async-trait, tokio
// ============================================================================

//! ## Overview
//! This crate carries the quorum decision engine and the contract it shares
//! with judge providers: the closed [`Decision`] enum, the immutable [`Vote`]
//! and [`QuorumResult`] records, the [`JudgeProvider`] capability, and the
//! [`decide`] orchestrator that fans an evaluation out to every configured
//! provider and tallies the votes under a k-of-n rule.
//!
//! Invariants:
//! - Per-provider failures never abort a decision; they degrade it.
//! - A degraded decision is forced to fail when the caller requests
//!   fail-closed behavior.
//!
//! Security posture: evidence and objective documents are untrusted inputs;
//! providers must validate everything they consume.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod provider;
pub mod quorum;
pub mod vote;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use provider::JudgeError;
pub use provider::JudgeProvider;
pub use quorum::QuorumConfigError;
pub use quorum::decide;
pub use vote::Decision;
pub use vote::QuorumResult;
pub use vote::Vote;
