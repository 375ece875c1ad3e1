// crates/quorum-gate-cli/src/evidence.rs
// ============================================================================
// Module: Evidence Document Helpers
// Description: Judges-block merge and integrity signature recompute.
// Purpose: Write quorum results back into the evidence document.
// Dependencies: quorum-gate-core, quorum-gate-trust, sha2, hex
// ============================================================================

//! ## Overview
//! When the operator asks for it, the quorum result is merged into the
//! evidence document as a `judges` block and the document's integrity
//! signature is recomputed: SHA-256 over the canonical JSON of the seven
//! core evidence blocks. Canonical serialization keeps the signature stable
//! across key-order permutations of the document.

// ============================================================================
// SECTION: Imports
// ============================================================================

use quorum_gate_core::QuorumResult;
use quorum_gate_trust::canonical_bytes;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Integrity
// ============================================================================

/// Core evidence blocks covered by the integrity signature.
pub const CORE_BLOCKS: [&str; 7] =
    ["meta", "witness", "usage", "rating", "quota", "budget", "anomaly"];

/// Computes the integrity signature over the document's core blocks.
///
/// Returns `None` when the document cannot be canonically serialized.
#[must_use]
pub fn integrity_signature(evidence: &Value) -> Option<String> {
    let mut core = Map::new();
    for block in CORE_BLOCKS {
        if let Some(value) = evidence.get(block) {
            core.insert(block.to_string(), value.clone());
        }
    }
    let bytes = canonical_bytes(&Value::Object(core)).ok()?;
    Some(hex::encode(Sha256::digest(&bytes)))
}

/// Recomputes and stores `integrity.signature_sha256` in the document.
pub fn recompute_integrity(evidence: &mut Value) {
    let Some(signature) = integrity_signature(evidence) else {
        return;
    };
    let Value::Object(document) = evidence else {
        return;
    };
    let integrity = document.entry("integrity".to_string()).or_insert_with(|| json!({}));
    if let Value::Object(block) = integrity {
        block.insert("signature_sha256".to_string(), Value::String(signature));
    } else {
        // A non-object integrity field is replaced wholesale.
        *integrity = json!({"signature_sha256": signature});
    }
}

// ============================================================================
// SECTION: Judges Block
// ============================================================================

/// Merges the quorum result into the evidence document and re-signs it.
pub fn attach_judges(evidence: &mut Value, result: &QuorumResult) {
    let Value::Object(document) = evidence else {
        return;
    };
    document.insert(
        "judges".to_string(),
        json!({
            "k": result.k,
            "n": result.n,
            "final": result.final_decision,
            "votes": result.votes,
        }),
    );
    recompute_integrity(evidence);
}
