//! # inkloom-ports
//!
//! Capability-interface traits the engine depends on and the adapters
//! crate implements, mirroring the teacher's `engine-ports` outbound
//! port split: one trait per external capability, no transport details
//! leaking into the trait signatures.

pub mod clock;
pub mod embedding;
pub mod llm;
pub mod save_store;
pub mod story;
pub mod telemetry_backend;

pub use clock::ClockPort;
pub use embedding::{cosine_similarity, EmbeddingPort};
pub use llm::{LlmCompletion, LlmPort, LlmPrompt, LlmTransportError};
pub use save_store::{SaveError, SaveStorePort};
pub use story::{Choice, StoryError, StoryPort};
pub use telemetry_backend::{TelemetryBackendError, TelemetryBackendPort};

#[cfg(any(test, feature = "testing"))]
pub use clock::MockClockPort;
#[cfg(any(test, feature = "testing"))]
pub use embedding::MockEmbeddingPort;
#[cfg(any(test, feature = "testing"))]
pub use llm::MockLlmPort;
#[cfg(any(test, feature = "testing"))]
pub use save_store::MockSaveStorePort;
#[cfg(any(test, feature = "testing"))]
pub use story::MockStoryPort;
#[cfg(any(test, feature = "testing"))]
pub use telemetry_backend::MockTelemetryBackendPort;
