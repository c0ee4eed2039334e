//! Writer LLM port (spec.md §4.3 `generateProposal`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable transport error kinds (spec.md §4.3, §7): every non-2xx
/// response and every transport-level failure classifies into exactly
/// one of these, never an uncaught exception.
#[derive(Debug, Error, Clone)]
pub enum LlmTransportError {
    #[error("llm call timed out after {0}ms")]
    Timeout(u64),
    #[error("llm call cancelled")]
    Cancelled,
    #[error("llm endpoint rejected the api key (401): {0}")]
    InvalidKey(String),
    #[error("llm endpoint is rate limiting requests (429): {0}")]
    RateLimit(String),
    #[error("llm endpoint returned a server error ({status}): {body}")]
    ApiError { status: u16, body: String },
    #[error("network error reaching llm endpoint: {0}")]
    Network(String),
    #[error("llm returned no parsable json in {0} sample(s)")]
    ParseError(usize),
    #[error("llm transport error: {0}")]
    Transport(String),
}

/// Prompt bundle assembled by the Prompt Engine (spec.md §4.2).
#[derive(Debug, Clone, Serialize)]
pub struct LlmPrompt {
    pub system: String,
    pub user: String,
    /// Deterministic seed, when the target model honors one.
    pub seed: Option<u64>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Raw text completion(s) returned by the backing model. More than one
/// entry means the adapter drew a multi-sample consensus batch because
/// the endpoint doesn't honor `seed` (spec.md §9 Open Question,
/// resolved in DESIGN.md).
#[derive(Debug, Clone, Deserialize)]
pub struct LlmCompletion {
    pub samples: Vec<String>,
    pub model: String,
}

/// Capability interface over whatever LLM backend generates branch
/// proposals. Mirrors the shape of `engine-ports`' outbound LLM port:
/// one `complete` entry point, cancellation via a token rather than a
/// bespoke cancel method.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LlmPort: Send + Sync {
    async fn complete(
        &self,
        prompt: LlmPrompt,
        cancellation: tokio_util::sync::CancellationToken,
    ) -> Result<LlmCompletion, LlmTransportError>;
}
