//! reqwest-based Writer LLM client, shaped after the teacher's ComfyUI
//! client: a small circuit breaker over consecutive failures, retry with
//! exponential backoff on transient errors, and a hard per-call timeout
//! raced against an external cancellation token.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use inkloom_ports::{LlmCompletion, LlmPort, LlmPrompt, LlmTransportError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

const CIRCUIT_BREAKER_FAILURE_THRESHOLD: u8 = 5;
const CIRCUIT_BREAKER_OPEN_SECS: i64 = 60;
const MAX_RETRIES: u8 = 2;
const BASE_BACKOFF_SECS: u64 = 1;

#[derive(Debug, Clone)]
enum CircuitState {
    Closed,
    Open { until: DateTime<Utc> },
}

struct CircuitBreaker {
    state: Mutex<CircuitState>,
    failures: Mutex<u8>,
}

impl CircuitBreaker {
    fn new() -> Self {
        Self {
            state: Mutex::new(CircuitState::Closed),
            failures: Mutex::new(0),
        }
    }

    fn check(&self) -> Result<(), LlmTransportError> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if let CircuitState::Open { until } = *state {
            if Utc::now() < until {
                return Err(LlmTransportError::Transport(
                    "circuit breaker open, llm endpoint recently failing".to_string(),
                ));
            }
            tracing::debug!("llm circuit breaker cool-down elapsed, half-closing");
            *state = CircuitState::Closed;
        }
        Ok(())
    }

    fn record_success(&self) {
        *self.failures.lock().unwrap_or_else(|p| p.into_inner()) = 0;
        *self.state.lock().unwrap_or_else(|p| p.into_inner()) = CircuitState::Closed;
    }

    fn record_failure(&self) {
        let mut failures = self.failures.lock().unwrap_or_else(|p| p.into_inner());
        *failures += 1;
        if *failures >= CIRCUIT_BREAKER_FAILURE_THRESHOLD {
            let until = Utc::now() + chrono::Duration::seconds(CIRCUIT_BREAKER_OPEN_SECS);
            tracing::warn!(failures = *failures, %until, "llm circuit breaker tripped, opening");
            *self.state.lock().unwrap_or_else(|p| p.into_inner()) = CircuitState::Open { until };
        }
    }
}

/// Classify a non-2xx status into the stable kinds spec.md §4.3 names:
/// `invalid_key (401)`, `rate_limit (429)`, `api_error (5xx)`; anything
/// else (4xx not otherwise named) falls back to the generic transport
/// kind since the spec doesn't assign it a dedicated category.
fn classify_non_2xx(status: u16, body: String) -> LlmTransportError {
    match status {
        401 => LlmTransportError::InvalidKey(body),
        429 => LlmTransportError::RateLimit(body),
        500..=599 => LlmTransportError::ApiError { status, body },
        _ => LlmTransportError::Transport(format!("status {status}: {body}")),
    }
}

/// OpenAI-compatible completions client (works against a local Ollama
/// OpenAI-shim endpoint or a hosted provider).
pub struct HttpLlmClient {
    client: Client,
    base_url: String,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl HttpLlmClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            circuit_breaker: Arc::new(CircuitBreaker::new()),
        }
    }

    async fn call_once(
        &self,
        prompt: &LlmPrompt,
        timeout: Duration,
    ) -> Result<ChatCompletionResponse, LlmTransportError> {
        let body = ChatCompletionRequest {
            model: "writer".to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: prompt.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.user.clone(),
                },
            ],
            temperature: prompt.temperature,
            max_tokens: prompt.max_tokens,
            seed: prompt.seed,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmTransportError::Timeout(timeout.as_millis() as u64)
                } else if e.is_connect() {
                    LlmTransportError::Network(e.to_string())
                } else {
                    LlmTransportError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_non_2xx(status, body));
        }

        response
            .json()
            .await
            .map_err(|e| LlmTransportError::Transport(format!("malformed response envelope: {e}")))
    }
}

#[async_trait]
impl LlmPort for HttpLlmClient {
    async fn complete(
        &self,
        prompt: LlmPrompt,
        cancellation: CancellationToken,
    ) -> Result<LlmCompletion, LlmTransportError> {
        self.circuit_breaker.check()?;

        let timeout = Duration::from_millis(5_000);
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            let call = self.call_once(&prompt, timeout);
            let outcome = tokio::select! {
                biased;
                _ = cancellation.cancelled() => Err(LlmTransportError::Cancelled),
                result = call => result,
            };

            match outcome {
                Ok(response) => {
                    self.circuit_breaker.record_success();
                    let samples = response
                        .choices
                        .into_iter()
                        .map(|c| c.message.content)
                        .collect();
                    return Ok(LlmCompletion {
                        samples,
                        model: response.model,
                    });
                }
                Err(LlmTransportError::Cancelled) => {
                    return Err(LlmTransportError::Cancelled);
                }
                Err(e @ (LlmTransportError::InvalidKey(_) | LlmTransportError::RateLimit(_))) => {
                    // Neither a bad key nor a rate limit resolves itself by
                    // retrying the same request immediately.
                    self.circuit_breaker.record_failure();
                    return Err(e);
                }
                Err(e) => {
                    last_error = Some(e);
                    if attempt < MAX_RETRIES {
                        let backoff = BASE_BACKOFF_SECS * 2u64.pow(attempt as u32);
                        tokio::time::sleep(Duration::from_secs(backoff)).await;
                    }
                }
            }
        }

        self.circuit_breaker.record_failure();
        Err(last_error.unwrap_or_else(|| LlmTransportError::Transport("retries exhausted".into())))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
