// crates/quorum-gate-trust/src/signing.rs
// ============================================================================
// Module: Canonical Signer
// Description: Deterministic HMAC-SHA-256 signing over canonical JSON.
// Purpose: Authenticate structured payloads across key rotation states.
// Dependencies: serde_jcs, hmac, sha2, subtle, hex, rand
// ============================================================================

//! ## Overview
//! Payloads are serialized into RFC 8785 canonical JSON (lexicographically
//! sorted keys, no extraneous whitespace) before MAC computation, so
//! semantically equal structures always sign identically. Verification uses
//! constant-time comparison, never direct equality. The multi-key entry point
//! additionally consults the key store: retired keys are vetoed even on a
//! matching signature, and grace keys are accepted unless the caller demands
//! strict freshness.

// ============================================================================
// SECTION: Imports
// ============================================================================

use hmac::Hmac;
use hmac::Mac;
use rand::RngCore;
use serde::Serialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::keys::KeyState;
use crate::keys::KeyStore;

// ============================================================================
// SECTION: Types
// ============================================================================

/// HMAC-SHA-256 instantiation used for all judge signatures.
type HmacSha256 = Hmac<Sha256>;

/// Errors raised while producing a signature.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SigningError {
    /// The payload could not be canonically serialized.
    #[error("payload canonicalization failed: {0}")]
    Canonicalize(String),
    /// The secret was rejected by the MAC implementation.
    #[error("signing key rejected: {0}")]
    InvalidKey(String),
}

// ============================================================================
// SECTION: Canonicalization and MAC
// ============================================================================

/// Serializes a payload into canonical JSON bytes.
///
/// Semantically equal structures always produce byte-identical output.
///
/// # Errors
///
/// Returns [`SigningError::Canonicalize`] when the payload cannot be
/// serialized (for example non-string map keys).
pub fn canonical_bytes<T: Serialize>(payload: &T) -> Result<Vec<u8>, SigningError> {
    serde_jcs::to_vec(payload).map_err(|err| SigningError::Canonicalize(err.to_string()))
}

/// Signs a payload with HMAC-SHA-256 over its canonical bytes.
///
/// # Errors
///
/// Returns [`SigningError`] when canonicalization fails or the secret is
/// rejected by the MAC implementation.
pub fn sign<T: Serialize>(payload: &T, secret: &[u8]) -> Result<String, SigningError> {
    let bytes = canonical_bytes(payload)?;
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|err| SigningError::InvalidKey(err.to_string()))?;
    mac.update(&bytes);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a hex signature against a payload and secret.
///
/// Comparison is constant-time; malformed hex or an unserializable payload
/// verifies as false rather than erroring.
#[must_use]
pub fn verify<T: Serialize>(payload: &T, secret: &[u8], signature_hex: &str) -> bool {
    let Ok(provided) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(expected_hex) = sign(payload, secret) else {
        return false;
    };
    let Ok(expected) = hex::decode(expected_hex) else {
        return false;
    };
    if expected.len() != provided.len() {
        return false;
    }
    bool::from(expected.ct_eq(&provided))
}

// ============================================================================
// SECTION: Multi-Key Verification
// ============================================================================

/// Reason attached to a multi-key verification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyReason {
    /// The key identifier is unknown to the store.
    KeyMissing,
    /// The signature does not match the payload under the named key.
    SigMismatch,
    /// The key is retired; matching signatures are vetoed.
    KeyRetired,
    /// The key is in its rotation grace window.
    KeyGrace,
    /// The signature matches under a trusted active key.
    Ok,
}

impl VerifyReason {
    /// Stable wire label for the reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::KeyMissing => "key.missing",
            Self::SigMismatch => "sig.mismatch",
            Self::KeyRetired => "key.retired",
            Self::KeyGrace => "key.grace",
            Self::Ok => "ok",
        }
    }
}

/// Outcome of a state-aware signature verification.
///
/// # Invariants
/// - `accepted` is true only for `Ok` and (when grace is allowed) `KeyGrace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStateVerification {
    /// Whether the signature is accepted.
    pub accepted: bool,
    /// Why the verification resolved the way it did.
    pub reason: VerifyReason,
}

/// Verifies a signature and the lifecycle state of the key that produced it.
///
/// Separating "does the bit pattern match" from "is this key still trusted"
/// lets rotation happen without service interruption: a retiring key keeps
/// verifying for a grace window before being fully revoked. Callers that
/// require strict freshness pass `allow_grace = false` to reject grace keys
/// as well.
#[must_use]
pub fn verify_with_key_state<T: Serialize>(
    payload: &T,
    signature_hex: &str,
    key_id: &str,
    store: &KeyStore,
    allow_grace: bool,
) -> KeyStateVerification {
    let Some(material) = store.get(key_id) else {
        return KeyStateVerification {
            accepted: false,
            reason: VerifyReason::KeyMissing,
        };
    };
    if !verify(payload, &material.secret, signature_hex) {
        return KeyStateVerification {
            accepted: false,
            reason: VerifyReason::SigMismatch,
        };
    }
    match material.state {
        KeyState::Retired => KeyStateVerification {
            accepted: false,
            reason: VerifyReason::KeyRetired,
        },
        KeyState::Grace => KeyStateVerification {
            accepted: allow_grace,
            reason: VerifyReason::KeyGrace,
        },
        KeyState::Active => KeyStateVerification {
            accepted: true,
            reason: VerifyReason::Ok,
        },
    }
}

// ============================================================================
// SECTION: Nonces
// ============================================================================

/// Number of random bytes in a request nonce.
const NONCE_BYTES: usize = 16;

/// Generates a 16-byte random nonce rendered as 32 hex characters.
///
/// Nonces are single-use values included in signed requests so the remote
/// judge can detect replays.
#[must_use]
pub fn generate_nonce() -> String {
    let mut bytes = [0_u8; NONCE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
