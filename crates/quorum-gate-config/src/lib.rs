// crates/quorum-gate-config/src/lib.rs
// ============================================================================
// Module: Quorum Gate Config
// Description: Provider descriptor model and quorum expression parsing.
// Purpose: Validate operator-supplied configuration before any judge runs.
// Dependencies: serde, serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! This crate parses and validates the operator-facing configuration
//! surfaces: the provider list file (YAML or JSON) and the `k/n` quorum
//! expression. The decision core never parses files itself; it consumes the
//! validated descriptors produced here.
//!
//! Security posture: configuration files are untrusted input and fail closed
//! on any malformed entry.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod providers;
pub mod quorum;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use providers::ConfigError;
pub use providers::HttpProviderSpec;
pub use providers::LocalProviderSpec;
pub use providers::ProviderSpec;
pub use providers::load_provider_file;
pub use providers::parse_provider_document;
pub use quorum::QuorumExpr;
pub use quorum::parse_quorum_expr;
