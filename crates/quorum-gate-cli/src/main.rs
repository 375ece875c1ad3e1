// crates/quorum-gate-cli/src/main.rs
// ============================================================================
// Module: Quorum Gate CLI Entry Point
// Description: Command-line front end for quorum decisions.
// Purpose: Load objective, evidence, and provider files, run the quorum, and
//          report votes with conventional exit codes.
// Dependencies: clap, quorum-gate-core, quorum-gate-providers, tokio
// ============================================================================

//! ## Overview
//! The `quorum-gate` binary gates a release on a k-of-n judge quorum: it
//! loads the objective, evidence, and provider files, enforces the
//! `judge:run` scope, fans the evaluation out, prints one line per vote, and
//! exits 0 on pass, 2 on fail, or 3 on permission denial. Configuration
//! errors exit non-zero with a message. Security posture: all three input
//! files are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod evidence;
mod policy;
mod slo;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Parser;
use quorum_gate_config::load_provider_file;
use quorum_gate_config::parse_quorum_expr;
use quorum_gate_core::QuorumResult;
use quorum_gate_core::Vote;
use quorum_gate_core::decide;
use quorum_gate_providers::LocalEvaluator;
use quorum_gate_providers::build_providers;
use quorum_gate_trust::EnvKeySource;
use quorum_gate_trust::KeyStore;
use serde_json::Value;
use thiserror::Error;

use crate::evidence::attach_judges;
use crate::slo::ObjectiveEvaluator;

// ============================================================================
// SECTION: Exit Codes
// ============================================================================

/// Exit code for a failing quorum verdict.
const EXIT_FAIL: u8 = 2;
/// Exit code for a denied permission scope.
const EXIT_PERMISSION_DENIED: u8 = 3;

// ============================================================================
// SECTION: Arguments
// ============================================================================

/// Command-line arguments for the quorum gate.
#[derive(Parser, Debug)]
#[command(name = "quorum-gate", about = "Evaluate evidence against an objective via judge quorum")]
struct Cli {
    /// Path to the objective JSON file.
    #[arg(long, value_name = "PATH")]
    objective: PathBuf,
    /// Path to the evidence JSON file.
    #[arg(long, value_name = "PATH")]
    evidence: PathBuf,
    /// Path to the provider list file (YAML or JSON).
    #[arg(long, value_name = "PATH")]
    providers: PathBuf,
    /// Quorum rule as `k/n`, for example `2/3`.
    #[arg(long, value_name = "K/N")]
    quorum: String,
    /// Merge the quorum result into the evidence document.
    #[arg(long, action = ArgAction::SetTrue)]
    attach_evidence: bool,
    /// Output path used with `--attach-evidence`.
    #[arg(long, value_name = "PATH", default_value = "var/evidence/evidence-with-judges.json")]
    out: PathBuf,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    init_tracing();
    match run().await {
        Ok(code) => code,
        Err(err) => {
            let _ = write_stderr_line(&format!("quorum-gate: {err}"));
            ExitCode::FAILURE
        }
    }
}

/// Executes the quorum command.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if !policy::enforce(policy::JUDGE_RUN_SCOPE) {
        write_stderr_line(&format!("permission denied: scope {}", policy::JUDGE_RUN_SCOPE))
            .map_err(|err| CliError::new(format!("stderr write failed: {err}")))?;
        return Ok(ExitCode::from(EXIT_PERMISSION_DENIED));
    }

    let objective = load_json(&cli.objective)?;
    let mut evidence = load_json(&cli.evidence)?;
    let specs = load_provider_file(&cli.providers)
        .map_err(|err| CliError::new(err.to_string()))?;
    if specs.is_empty() {
        return Err(CliError::new("no providers configured".to_string()));
    }
    let expr =
        parse_quorum_expr(&cli.quorum).map_err(|err| CliError::new(err.to_string()))?;
    let fail_closed = objective
        .pointer("/quorum/fail_closed_on_degrade")
        .and_then(Value::as_bool)
        .unwrap_or(true);

    let key_store = Arc::new(KeyStore::new(EnvKeySource::new()));
    let evaluator: Arc<dyn LocalEvaluator> = Arc::new(ObjectiveEvaluator);
    let providers = build_providers(&specs, &key_store, &evaluator)
        .map_err(|err| CliError::new(err.to_string()))?;

    let result = decide(&providers, &evidence, &objective, expr.k, expr.n, fail_closed)
        .await
        .map_err(|err| CliError::new(err.to_string()))?;

    print_result(&result).map_err(|err| CliError::new(format!("stdout write failed: {err}")))?;

    if cli.attach_evidence {
        attach_judges(&mut evidence, &result);
        write_evidence(&cli.out, &evidence)?;
        write_stdout_line(&format!("[quorum-gate] judges block attached -> {}", cli.out.display()))
            .map_err(|err| CliError::new(format!("stdout write failed: {err}")))?;
    }

    if result.final_decision.is_pass() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_FAIL))
    }
}

// ============================================================================
// SECTION: Command Helpers
// ============================================================================

/// Loads and parses one JSON document.
fn load_json(path: &Path) -> CliResult<Value> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| CliError::new(format!("{}: {err}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|err| CliError::new(format!("{}: invalid json: {err}", path.display())))
}

/// Prints the verdict line and one line per vote.
fn print_result(result: &QuorumResult) -> std::io::Result<()> {
    write_stdout_line(&format!(
        "[quorum-gate] quorum result = {} (pass={} / k={}, n={})",
        result.final_decision.as_str(),
        result.pass_count,
        result.k,
        result.n
    ))?;
    for vote in &result.votes {
        write_stdout_line(&format_vote_line(vote))?;
    }
    Ok(())
}

/// Formats one vote summary line.
fn format_vote_line(vote: &Vote) -> String {
    let latency = vote
        .meta
        .get("latency_ms")
        .and_then(Value::as_f64)
        .map_or_else(|| "-".to_string(), |ms| ms.to_string());
    let reasons = if vote.reasons.is_empty() {
        "-".to_string()
    } else {
        vote.reasons.join(", ")
    };
    format!(
        "  - {}: {} (latency={latency}ms, reasons={reasons})",
        vote.provider_id,
        vote.decision.as_str()
    )
}

/// Writes the merged evidence document, creating parent directories.
fn write_evidence(path: &Path, evidence: &Value) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|err| CliError::new(format!("{}: {err}", parent.display())))?;
    }
    let pretty = serde_json::to_string_pretty(evidence)
        .map_err(|err| CliError::new(format!("evidence serialization failed: {err}")))?;
    std::fs::write(path, pretty)
        .map_err(|err| CliError::new(format!("{}: {err}", path.display())))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Initializes stderr tracing with the conventional env filter.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}
