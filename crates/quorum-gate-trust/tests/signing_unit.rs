// crates/quorum-gate-trust/tests/signing_unit.rs
// ============================================================================
// Module: Canonical Signer Unit Tests
// Description: Determinism, tamper detection, and key-state verification.
// Purpose: Prove the signing contract across rotation states.
// ============================================================================

//! ## Overview
//! Covers signer determinism, canonical-form equivalence, tamper detection,
//! and the state-aware multi-key verification contract including retired-key
//! vetoes and the grace-window flag.

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

use quorum_gate_trust::KeyDescriptor;
use quorum_gate_trust::KeyState;
use quorum_gate_trust::KeyStore;
use quorum_gate_trust::StaticKeySource;
use quorum_gate_trust::VerifyReason;
use quorum_gate_trust::generate_nonce;
use quorum_gate_trust::sign;
use quorum_gate_trust::verify;
use quorum_gate_trust::verify_with_key_state;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const SECRET: &[u8] = b"test-secret";

fn payload() -> Value {
    json!({
        "evidence": {"meta": {"run": "r-1"}, "budget": {"level": "ok"}},
        "objective": {"latency": {"max_p95_ms": 250}},
        "ts": 1_700_000_000,
        "nonce": "00112233445566778899aabbccddeeff",
    })
}

fn store_with(state: KeyState) -> KeyStore {
    KeyStore::new(StaticKeySource::new(vec![KeyDescriptor {
        key_id: "k1".to_string(),
        secret: "test-secret".to_string(),
        state,
    }]))
}

// ============================================================================
// SECTION: Determinism and Canonical Form
// ============================================================================

#[test]
fn signing_is_deterministic() {
    let first = sign(&payload(), SECRET).unwrap();
    let second = sign(&payload(), SECRET).unwrap();
    assert_eq!(first, second);
}

#[test]
fn payload_change_changes_signature() {
    let base = sign(&payload(), SECRET).unwrap();
    let mut altered = payload();
    altered["ts"] = json!(1_700_000_001);
    assert_ne!(base, sign(&altered, SECRET).unwrap());
}

#[test]
fn secret_change_changes_signature() {
    let base = sign(&payload(), SECRET).unwrap();
    assert_ne!(base, sign(&payload(), b"other-secret").unwrap());
}

#[test]
fn semantically_equal_documents_sign_identically() {
    let reordered: Value =
        serde_json::from_str(r#"{ "b" : 2, "a" : 1, "nested": {"y": [1, 2], "x": true} }"#)
            .unwrap();
    let compact: Value = serde_json::from_str(r#"{"a":1,"nested":{"x":true,"y":[1,2]},"b":2}"#)
        .unwrap();
    assert_eq!(sign(&reordered, SECRET).unwrap(), sign(&compact, SECRET).unwrap());
}

// ============================================================================
// SECTION: Verification
// ============================================================================

#[test]
fn verify_accepts_matching_signature() {
    let signature = sign(&payload(), SECRET).unwrap();
    assert!(verify(&payload(), SECRET, &signature));
}

#[test]
fn verify_rejects_tampered_payload() {
    let signature = sign(&payload(), SECRET).unwrap();
    let mut tampered = payload();
    tampered["evidence"]["budget"]["level"] = json!("critical");
    assert!(!verify(&tampered, SECRET, &signature));
}

#[test]
fn verify_rejects_wrong_secret() {
    let signature = sign(&payload(), SECRET).unwrap();
    assert!(!verify(&payload(), b"other-secret", &signature));
}

#[test]
fn verify_rejects_malformed_hex() {
    assert!(!verify(&payload(), SECRET, "not hex at all"));
    assert!(!verify(&payload(), SECRET, "abcd"));
    assert!(!verify(&payload(), SECRET, ""));
}

// ============================================================================
// SECTION: Key-State Verification
// ============================================================================

#[test]
fn unknown_key_is_reported_missing() {
    let store = store_with(KeyState::Active);
    let signature = sign(&payload(), SECRET).unwrap();
    let outcome = verify_with_key_state(&payload(), &signature, "k9", &store, true);
    assert!(!outcome.accepted);
    assert_eq!(outcome.reason, VerifyReason::KeyMissing);
    assert_eq!(outcome.reason.as_str(), "key.missing");
}

#[test]
fn mismatched_signature_is_reported() {
    let store = store_with(KeyState::Active);
    let signature = sign(&payload(), b"other-secret").unwrap();
    let outcome = verify_with_key_state(&payload(), &signature, "k1", &store, true);
    assert!(!outcome.accepted);
    assert_eq!(outcome.reason, VerifyReason::SigMismatch);
}

#[test]
fn retired_key_is_vetoed_despite_matching_signature() {
    let store = store_with(KeyState::Retired);
    let signature = sign(&payload(), SECRET).unwrap();
    let outcome = verify_with_key_state(&payload(), &signature, "k1", &store, true);
    assert!(!outcome.accepted);
    assert_eq!(outcome.reason, VerifyReason::KeyRetired);
}

#[test]
fn grace_key_is_accepted_by_default() {
    let store = store_with(KeyState::Grace);
    let signature = sign(&payload(), SECRET).unwrap();
    let outcome = verify_with_key_state(&payload(), &signature, "k1", &store, true);
    assert!(outcome.accepted);
    assert_eq!(outcome.reason, VerifyReason::KeyGrace);
}

#[test]
fn grace_key_is_rejected_under_strict_freshness() {
    let store = store_with(KeyState::Grace);
    let signature = sign(&payload(), SECRET).unwrap();
    let outcome = verify_with_key_state(&payload(), &signature, "k1", &store, false);
    assert!(!outcome.accepted);
    assert_eq!(outcome.reason, VerifyReason::KeyGrace);
}

#[test]
fn active_key_verifies_ok() {
    let store = store_with(KeyState::Active);
    let signature = sign(&payload(), SECRET).unwrap();
    let outcome = verify_with_key_state(&payload(), &signature, "k1", &store, false);
    assert!(outcome.accepted);
    assert_eq!(outcome.reason, VerifyReason::Ok);
}

// ============================================================================
// SECTION: Secret Encodings and Nonces
// ============================================================================

#[test]
fn hex_and_b64_secrets_denote_the_same_key() {
    let raw = KeyStore::new(StaticKeySource::new(vec![KeyDescriptor {
        key_id: "raw".to_string(),
        secret: "abc".to_string(),
        state: KeyState::Active,
    }]));
    let hex_encoded = KeyStore::new(StaticKeySource::new(vec![KeyDescriptor {
        key_id: "hex".to_string(),
        secret: "hex:616263".to_string(),
        state: KeyState::Active,
    }]));
    let b64_encoded = KeyStore::new(StaticKeySource::new(vec![KeyDescriptor {
        key_id: "b64".to_string(),
        secret: "b64:YWJj".to_string(),
        state: KeyState::Active,
    }]));

    let signature = sign(&payload(), b"abc").unwrap();
    for (store, key_id) in [(&raw, "raw"), (&hex_encoded, "hex"), (&b64_encoded, "b64")] {
        let material = store.get(key_id).unwrap();
        assert_eq!(material.secret, b"abc".to_vec());
        assert!(verify(&payload(), &material.secret, &signature));
    }
}

#[test]
fn nonces_are_hex_and_unique() {
    let first = generate_nonce();
    let second = generate_nonce();
    assert_eq!(first.len(), 32);
    assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(first, second);
}
