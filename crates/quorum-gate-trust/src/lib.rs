// crates/quorum-gate-trust/src/lib.rs
// ============================================================================
// Module: Quorum Gate Trust
// Description: Signing key management and canonical HMAC authentication.
// Purpose: Authenticate remote judge traffic across zero-downtime key rotation.
// Dependencies: serde, serde_jcs, hmac, sha2, subtle, base64, hex, rand
// ============================================================================

//! ## Overview
//! The trust crate owns the multi-key material store and the canonical
//! signer used to authenticate remote judge requests. Signing operates over
//! a canonical (sorted-key, whitespace-free) serialization so semantically
//! equal payloads always produce byte-identical input to the MAC.
//! Verification separates "does the bit pattern match" from "is this key
//! still trusted": a retiring key keeps verifying through a grace window
//! before being fully revoked, which lets rotation happen without service
//! interruption.
//!
//! Security posture: signatures, key identifiers, and payloads arrive from
//! untrusted peers; comparisons are constant-time and missing keys are a
//! first-class outcome, not an error.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod keys;
pub mod signing;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use keys::EnvKeySource;
pub use keys::KeyDescriptor;
pub use keys::KeyMaterial;
pub use keys::KeySource;
pub use keys::KeyState;
pub use keys::KeyStore;
pub use keys::KeyStoreInfo;
pub use keys::StaticKeySource;
pub use signing::KeyStateVerification;
pub use signing::SigningError;
pub use signing::VerifyReason;
pub use signing::canonical_bytes;
pub use signing::generate_nonce;
pub use signing::sign;
pub use signing::verify;
pub use signing::verify_with_key_state;
