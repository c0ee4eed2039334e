//! Telemetry sink adapters: an in-memory collector for tests and a
//! best-effort HTTP sink for production, mirroring the teacher's
//! pluggable event-bus backend shape (`sqlite_event_bus.rs` /
//! `in_process_notifier.rs`) simplified to this runtime's needs.

use std::sync::Mutex;

use async_trait::async_trait;
use inkloom_domain::TelemetryEvent;
use inkloom_ports::{TelemetryBackendError, TelemetryBackendPort};
use reqwest::Client;

/// Collects events in-process. Used by the demo runner when no
/// `telemetry.backend_url` is configured, and by engine tests that want
/// to assert on emitted events.
#[derive(Default)]
pub struct InMemoryTelemetryBackend {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl InMemoryTelemetryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl TelemetryBackendPort for InMemoryTelemetryBackend {
    async fn emit(&self, event: TelemetryEvent) -> Result<(), TelemetryBackendError> {
        self.events.lock().unwrap_or_else(|p| p.into_inner()).push(event);
        Ok(())
    }
}

/// Posts each event as JSON to a configured collector endpoint. A failed
/// post is reported back to the caller — the engine's `TelemetryEmitter`
/// treats telemetry failures as non-fatal and logs a warning rather than
/// interrupting the pipeline.
pub struct HttpTelemetryBackend {
    client: Client,
    endpoint: String,
}

impl HttpTelemetryBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl TelemetryBackendPort for HttpTelemetryBackend {
    async fn emit(&self, event: TelemetryEvent) -> Result<(), TelemetryBackendError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&event)
            .send()
            .await
            .map_err(|e| TelemetryBackendError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TelemetryBackendError::Unavailable(format!(
                "telemetry collector responded with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}
