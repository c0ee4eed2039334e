//! # inkloom-adapters
//!
//! Concrete implementations of `inkloom-ports`' capability traits: a
//! reqwest-based LLM client, a file-backed save store with atomic
//! writes, a system clock, in-memory and HTTP telemetry backends, a
//! fixture Story implementation for the demo runner, and layered
//! configuration loading. Mirrors the teacher's `engine-adapters`
//! infrastructure-layer role.

pub mod clock;
pub mod config;
pub mod llm;
pub mod save;
pub mod story;
pub mod telemetry;

pub use clock::{FixedClock, SystemClock};
pub use config::{load as load_config, ConfigError};
pub use llm::HttpLlmClient;
pub use save::FileSaveStore;
pub use story::{FixtureChoice, FixtureKnot, FixtureStoryAdapter};
pub use telemetry::{HttpTelemetryBackend, InMemoryTelemetryBackend};
