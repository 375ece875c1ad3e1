// crates/quorum-gate-providers/src/http.rs
// ============================================================================
// Module: HTTP Judge Provider
// Description: Signed remote judge calls with backpressure protection.
// Purpose: Solicit votes from network judges without letting them degrade
//          the decision path.
// Dependencies: quorum-gate-core, quorum-gate-trust, reqwest, tokio
// ============================================================================

//! ## Overview
//! The HTTP provider signs every request with a nonce, timestamp, and
//! HMAC-SHA-256 over the canonical request body, then POSTs it to the
//! configured judge endpoint. Before any network activity it consults its
//! private rate limiter and circuit breaker; both refuse fast without a
//! call. Status handling: 401 is a terminal signature rejection, 5xx and
//! transport failures are retryable with exponential backoff, and other 4xx
//! responses are terminal client errors.
//!
//! Invariants:
//! - The limiter and breaker are owned by this provider instance and never
//!   shared.
//! - The total call budget is bounded by
//!   `(retries + 1) * timeout + sum(backoff)`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use quorum_gate_core::JudgeError;
use quorum_gate_core::JudgeProvider;
use quorum_gate_core::Vote;
use quorum_gate_trust::KeyStore;
use quorum_gate_trust::generate_nonce;
use quorum_gate_trust::sign;
use reqwest::Client;
use reqwest::StatusCode;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::backpressure::BREAKER_HALF_OPEN_TRIALS;
use crate::backpressure::CircuitBreaker;
use crate::backpressure::RATE_LIMIT_BURST;
use crate::backpressure::RATE_LIMIT_PER_SECOND;
use crate::backpressure::TokenBucket;
use crate::backpressure::backoff_ms;

// ============================================================================
// SECTION: Wire Protocol
// ============================================================================

/// Header carrying the request nonce.
pub const NONCE_HEADER: &str = "X-Signature-Nonce";
/// Header carrying the request unix timestamp.
pub const TIMESTAMP_HEADER: &str = "X-Signature-Timestamp";
/// Header carrying the hex HMAC signature of the canonical body.
pub const SIGNATURE_HEADER: &str = "X-Signature";
/// Header naming the signing key.
pub const KEY_ID_HEADER: &str = "X-Key-Id";

/// Response body returned by a remote judge.
#[derive(Debug, Deserialize)]
struct JudgeResponse {
    /// The judge's verdict.
    decision: quorum_gate_core::Decision,
    /// Ordered reasons supporting the verdict.
    #[serde(default)]
    reasons: Vec<String>,
    /// Judge-supplied metadata.
    #[serde(default)]
    meta: Map<String, Value>,
    /// Judge implementation version.
    #[serde(default)]
    version: Option<String>,
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for one HTTP judge provider.
///
/// # Invariants
/// - `timeout_ms` applies per attempt, not per call.
/// - `retries` counts additional attempts after the first.
/// - `insecure = true` disables TLS verification and is for test rigs only.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpJudgeConfig {
    /// Remote judge endpoint URL.
    pub url: String,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Additional retry attempts after the first call.
    pub retries: u32,
    /// Whether requests are signed.
    pub require_signature: bool,
    /// Signing key identifier presented in `X-Key-Id`.
    pub key_id: String,
    /// Consecutive failures before the circuit opens.
    pub breaker_max_failures: u32,
    /// Seconds the circuit stays open before admitting trial calls.
    pub breaker_reset_seconds: f64,
    /// Disables TLS certificate verification.
    pub insecure: bool,
    /// Burst capacity of the per-provider rate limiter.
    pub rate_limit_burst: f64,
    /// Sustained request rate in tokens per second.
    pub rate_limit_per_second: f64,
}

impl HttpJudgeConfig {
    /// Builds a config for the given endpoint with documented defaults.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: 2_000,
            retries: 2,
            require_signature: true,
            key_id: "k1".to_string(),
            breaker_max_failures: 10,
            breaker_reset_seconds: 60.0,
            insecure: false,
            rate_limit_burst: RATE_LIMIT_BURST,
            rate_limit_per_second: RATE_LIMIT_PER_SECOND,
        }
    }
}

/// Errors raised while constructing a provider.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// The HTTP client could not be constructed.
    #[error("http client build failed: {0}")]
    Client(String),
}

// ============================================================================
// SECTION: Attempt Classification
// ============================================================================

/// Outcome classification for one failed attempt.
struct AttemptError {
    /// The judge error to surface if this attempt is the last.
    error: JudgeError,
    /// Whether further attempts may be made.
    retryable: bool,
    /// Whether the breaker records this attempt as a failure.
    breaker_failure: bool,
}

// ============================================================================
// SECTION: Provider Implementation
// ============================================================================

/// Judge provider calling a remote HTTP judge with signed requests.
///
/// # Invariants
/// - The rate limiter and circuit breaker are private to this instance.
/// - Every attempt carries a fresh nonce and timestamp.
pub struct HttpJudgeProvider {
    /// Stable provider identifier.
    provider_id: String,
    /// Provider configuration.
    config: HttpJudgeConfig,
    /// HTTP client with the per-attempt timeout applied.
    client: Client,
    /// Per-provider request rate limiter.
    limiter: TokenBucket,
    /// Per-provider circuit breaker.
    breaker: CircuitBreaker,
    /// Shared signing key store.
    key_store: Arc<KeyStore>,
}

impl HttpJudgeProvider {
    /// Builds a provider for the given endpoint configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderBuildError`] when the HTTP client cannot be built.
    pub fn new(
        provider_id: impl Into<String>,
        config: HttpJudgeConfig,
        key_store: Arc<KeyStore>,
    ) -> Result<Self, ProviderBuildError> {
        let mut builder = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .redirect(Policy::none());
        if config.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder.build().map_err(|err| ProviderBuildError::Client(err.to_string()))?;
        let limiter = TokenBucket::new(config.rate_limit_burst, config.rate_limit_per_second);
        let breaker = CircuitBreaker::new(
            config.breaker_max_failures,
            Duration::from_secs_f64(config.breaker_reset_seconds),
            BREAKER_HALF_OPEN_TRIALS,
        );
        Ok(Self {
            provider_id: provider_id.into(),
            config,
            client,
            limiter,
            breaker,
            key_store,
        })
    }

    /// Returns the breaker for observability and tests.
    #[must_use]
    pub const fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Builds the signed request payload for one attempt.
    fn build_payload(&self, evidence: &Value, objective: &Value) -> Value {
        json!({
            "evidence": evidence,
            "objective": objective,
            "ts": unix_timestamp(),
            "nonce": generate_nonce(),
        })
    }

    /// Signs the payload and returns the signature headers for one attempt.
    fn signature_headers(&self, payload: &Value) -> Result<Vec<(String, String)>, AttemptError> {
        let nonce = payload
            .get("nonce")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let ts = payload.get("ts").and_then(Value::as_i64).unwrap_or_default();
        let mut headers = vec![
            (NONCE_HEADER.to_string(), nonce),
            (TIMESTAMP_HEADER.to_string(), ts.to_string()),
        ];
        if !self.config.require_signature {
            return Ok(headers);
        }
        let material = self
            .key_store
            .get(&self.config.key_id)
            .or_else(|| self.key_store.choose_active())
            .ok_or_else(|| AttemptError {
                error: JudgeError::BadSignature("no signing key available".to_string()),
                retryable: false,
                breaker_failure: true,
            })?;
        let signature = sign(payload, &material.secret).map_err(|err| AttemptError {
            error: JudgeError::BadSignature(format!("payload signing failed: {err}")),
            retryable: false,
            breaker_failure: true,
        })?;
        headers.push((SIGNATURE_HEADER.to_string(), signature));
        headers.push((KEY_ID_HEADER.to_string(), material.key_id));
        Ok(headers)
    }

    /// Performs one signed POST attempt and classifies its outcome.
    async fn send_once(&self, evidence: &Value, objective: &Value) -> Result<Vote, AttemptError> {
        let payload = self.build_payload(evidence, objective);
        let headers = self.signature_headers(&payload)?;

        let started = Instant::now();
        let mut request = self.client.post(&self.config.url).json(&payload);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        let response = request.send().await.map_err(|err| {
            // Connect failures and deadline overruns share retry semantics.
            let error = if err.is_timeout() {
                JudgeError::Timeout(err.to_string())
            } else {
                JudgeError::Timeout(format!("transport error: {err}"))
            };
            AttemptError {
                error,
                retryable: true,
                breaker_failure: true,
            }
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AttemptError {
                error: JudgeError::BadSignature(
                    "remote judge rejected signature/nonce".to_string(),
                ),
                retryable: false,
                breaker_failure: true,
            });
        }
        if status.is_server_error() {
            return Err(AttemptError {
                error: JudgeError::Http {
                    status: status.as_u16(),
                    message: "remote judge server error".to_string(),
                },
                retryable: true,
                breaker_failure: true,
            });
        }
        if status.is_client_error() {
            return Err(AttemptError {
                error: JudgeError::Http {
                    status: status.as_u16(),
                    message: "remote judge rejected request".to_string(),
                },
                retryable: false,
                breaker_failure: false,
            });
        }

        let body: JudgeResponse = response.json().await.map_err(|err| AttemptError {
            error: JudgeError::Http {
                status: status.as_u16(),
                message: format!("invalid judge response body: {err}"),
            },
            retryable: false,
            breaker_failure: false,
        })?;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        let mut vote = Vote {
            provider_id: self.provider_id.clone(),
            decision: body.decision,
            reasons: body.reasons,
            meta: body.meta,
            version: body.version,
        };
        vote.ensure_latency_ms(latency_ms);
        Ok(vote)
    }
}

#[async_trait]
impl JudgeProvider for HttpJudgeProvider {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    async fn evaluate(&self, evidence: &Value, objective: &Value) -> Result<Vote, JudgeError> {
        if !self.limiter.consume(1.0) {
            return Err(JudgeError::Http {
                status: 429,
                message: format!("rate limit exceeded for provider {}", self.provider_id),
            });
        }
        if !self.breaker.try_acquire() {
            return Err(JudgeError::Http {
                status: 503,
                message: format!("circuit open for provider {}", self.provider_id),
            });
        }

        let mut attempt: u32 = 0;
        loop {
            match self.send_once(evidence, objective).await {
                Ok(vote) => {
                    self.breaker.record_success();
                    return Ok(vote);
                }
                Err(outcome) => {
                    if outcome.breaker_failure {
                        self.breaker.record_failure();
                    }
                    if !outcome.retryable || attempt >= self.config.retries {
                        return Err(outcome.error);
                    }
                    tracing::debug!(
                        provider_id = %self.provider_id,
                        attempt,
                        "retrying remote judge after failure"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms(attempt))).await;
                    attempt += 1;
                }
            }
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the current unix timestamp in whole seconds.
fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|since| i64::try_from(since.as_secs()).ok())
        .unwrap_or_default()
}
