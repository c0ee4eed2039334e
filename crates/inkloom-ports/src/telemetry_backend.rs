//! Telemetry sink port (spec.md §6 telemetry event types). The engine's
//! `TelemetryEmitter` owns buffering/redaction; this trait is just the
//! "where events eventually go" seam, so tests can swap in an in-memory
//! collector and production can swap in an HTTP sink.

use async_trait::async_trait;
use inkloom_domain::TelemetryEvent;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryBackendError {
    #[error("telemetry backend unavailable: {0}")]
    Unavailable(String),
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TelemetryBackendPort: Send + Sync {
    async fn emit(&self, event: TelemetryEvent) -> Result<(), TelemetryBackendError>;
}
