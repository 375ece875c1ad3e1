// crates/quorum-gate-config/tests/load_validation.rs
// ============================================================================
// Module: Config Loading Unit Tests
// Description: Provider file parsing, defaults, and quorum expressions.
// Purpose: Prove operator configuration fails closed on malformed input.
// ============================================================================

//! ## Overview
//! Covers the provider file model (YAML and JSON forms, HTTP defaults,
//! identifier invariants) and the `k/n` quorum expression parser.

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

use std::io::Write;

use quorum_gate_config::ConfigError;
use quorum_gate_config::ProviderSpec;
use quorum_gate_config::load_provider_file;
use quorum_gate_config::parse_provider_document;
use quorum_gate_config::parse_quorum_expr;

// ============================================================================
// SECTION: Provider Files
// ============================================================================

#[test]
fn yaml_document_parses_with_http_defaults() {
    let raw = r"
providers:
  - id: local
    type: local
  - id: remote-a
    type: http
    url: https://judge-a.example.com/evaluate
";
    let specs = parse_provider_document(raw).unwrap();
    assert_eq!(specs.len(), 2);
    assert_eq!(specs[0].id(), "local");

    let ProviderSpec::Http(http) = &specs[1] else {
        panic!("expected http provider");
    };
    assert_eq!(http.url, "https://judge-a.example.com/evaluate");
    assert_eq!(http.timeout_ms, 2_000);
    assert_eq!(http.retries, 2);
    assert!(http.require_signature);
    assert_eq!(http.key_id, "k1");
    assert_eq!(http.breaker_max_failures, 10);
    assert!((http.breaker_reset_seconds - 60.0).abs() < f64::EPSILON);
    assert!(!http.insecure);
}

#[test]
fn explicit_tunables_override_defaults() {
    let raw = r"
providers:
  - id: remote-a
    type: http
    url: https://judge-a.example.com/evaluate
    timeout_ms: 500
    retries: 0
    require_signature: false
    key_id: k7
    breaker_max_failures: 3
    breaker_reset_seconds: 0.5
    insecure: true
";
    let specs = parse_provider_document(raw).unwrap();
    let ProviderSpec::Http(http) = &specs[0] else {
        panic!("expected http provider");
    };
    assert_eq!(http.timeout_ms, 500);
    assert_eq!(http.retries, 0);
    assert!(!http.require_signature);
    assert_eq!(http.key_id, "k7");
    assert_eq!(http.breaker_max_failures, 3);
    assert!(http.insecure);
}

#[test]
fn json_document_parses_through_the_same_path() {
    let raw = r#"{"providers": [{"id": "local", "type": "local"}]}"#;
    let specs = parse_provider_document(raw).unwrap();
    assert_eq!(specs.len(), 1);
}

#[test]
fn unknown_provider_type_is_rejected() {
    let raw = "providers:\n  - id: x\n    type: grpc\n";
    assert!(matches!(parse_provider_document(raw), Err(ConfigError::Parse(_))));
}

#[test]
fn missing_url_is_rejected() {
    let raw = "providers:\n  - id: x\n    type: http\n";
    assert!(matches!(parse_provider_document(raw), Err(ConfigError::Parse(_))));
}

#[test]
fn empty_url_is_rejected() {
    let raw = "providers:\n  - id: x\n    type: http\n    url: \"\"\n";
    assert!(matches!(parse_provider_document(raw), Err(ConfigError::Invalid(_))));
}

#[test]
fn duplicate_ids_are_rejected() {
    let raw = "providers:\n  - id: x\n    type: local\n  - id: x\n    type: local\n";
    let err = parse_provider_document(raw).unwrap_err();
    assert!(err.to_string().contains("duplicate provider id"));
}

#[test]
fn empty_document_yields_no_providers() {
    assert!(parse_provider_document("{}").unwrap().is_empty());
}

#[test]
fn provider_file_loads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "providers:\n  - id: local\n    type: local\n").unwrap();
    let specs = load_provider_file(file.path()).unwrap();
    assert_eq!(specs.len(), 1);
}

#[test]
fn missing_provider_file_is_an_io_error() {
    let err = load_provider_file(std::path::Path::new("/nonexistent/providers.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

// ============================================================================
// SECTION: Quorum Expressions
// ============================================================================

#[test]
fn quorum_expression_parses() {
    let expr = parse_quorum_expr("2/3").unwrap();
    assert_eq!(expr.k, 2);
    assert_eq!(expr.n, 3);
}

#[test]
fn quorum_expression_tolerates_spaces() {
    let expr = parse_quorum_expr(" 1 / 1 ").unwrap();
    assert_eq!(expr.k, 1);
    assert_eq!(expr.n, 1);
}

#[test]
fn malformed_quorum_expressions_are_rejected() {
    for raw in ["3", "a/b", "2/", "/3", "", "2/3/4", "-1/3"] {
        assert!(parse_quorum_expr(raw).is_err(), "expected rejection for {raw}");
    }
}

#[test]
fn out_of_range_thresholds_are_rejected() {
    assert!(parse_quorum_expr("0/3").is_err());
    assert!(parse_quorum_expr("4/3").is_err());
}
