//! Telemetry Emitter (spec.md §4.9): a bounded per-topic ring buffer
//! with pluggable backends and a PII redactor run before storage or
//! dispatch. Grounded on the teacher's `sqlite_event_bus.rs` pluggable-
//! backend shape, simplified to this runtime's in-memory + HTTP needs.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use inkloom_domain::{TelemetryEvent, TelemetryEventType};
use inkloom_ports::TelemetryBackendPort;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

pub const DEFAULT_BUFFER_CAP: usize = 50;

static EMAIL_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("static pattern compiles"));

const REDACTED_SENTINEL: &str = "REDACTED";

/// Replace any email-like substring anywhere in `value`'s string leaves
/// with the literal `REDACTED` sentinel (spec.md §4.9, §8 redaction
/// property). Recurses through objects and arrays; numbers/bools/null
/// pass through untouched.
pub fn redact(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(EMAIL_LIKE.replace_all(s, REDACTED_SENTINEL).into_owned()),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        Value::Object(map) => Value::Object(map.iter().map(|(k, v)| (k.clone(), redact(v))).collect()),
        other => other.clone(),
    }
}

/// Bounded, FIFO-evicting ring buffer of `TelemetryEvent`s, keyed by
/// topic (`event_type`'s `topic()` name) so different event kinds don't
/// starve each other's capacity.
pub struct TelemetryEmitter {
    buffer_cap: usize,
    buffers: Mutex<HashMap<&'static str, VecDeque<TelemetryEvent>>>,
    backends: Mutex<Vec<Arc<dyn TelemetryBackendPort>>>,
    enabled: bool,
}

impl TelemetryEmitter {
    pub fn new(buffer_cap: usize, enabled: bool) -> Self {
        Self {
            buffer_cap: buffer_cap.max(1),
            buffers: Mutex::new(HashMap::new()),
            backends: Mutex::new(Vec::new()),
            enabled,
        }
    }

    pub fn add_backend(&self, backend: Arc<dyn TelemetryBackendPort>) {
        self.backends.lock().unwrap_or_else(|p| p.into_inner()).push(backend);
    }

    pub fn remove_all_backends(&self) {
        self.backends.lock().unwrap_or_else(|p| p.into_inner()).clear();
    }

    /// Record `event`, redacting its `event_data` first, storing it in
    /// the bounded per-topic buffer (evicting FIFO past capacity), and
    /// dispatching to every backend. A backend failure is logged and
    /// never surfaced to the caller (spec.md §4.9: "synchronous callers
    /// never observe backend errors").
    pub async fn record(&self, mut event: TelemetryEvent) {
        if !self.enabled {
            return;
        }
        event.event_data = redact(&event.event_data);

        {
            let mut buffers = self.buffers.lock().unwrap_or_else(|p| p.into_inner());
            let topic = event.event_type.topic();
            let buffer = buffers.entry(topic).or_default();
            if buffer.len() >= self.buffer_cap {
                buffer.pop_front();
            }
            buffer.push_back(event.clone());
        }

        let backends = self.backends.lock().unwrap_or_else(|p| p.into_inner()).clone();
        for backend in backends {
            if let Err(err) = backend.emit(event.clone()).await {
                tracing::warn!(error = %err, topic = event.event_type.topic(), "telemetry backend dispatch failed");
            }
        }
    }

    pub fn topic_events(&self, event_type: TelemetryEventType) -> Vec<TelemetryEvent> {
        self.buffers
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(event_type.topic())
            .map(|buf| buf.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use inkloom_ports::TelemetryBackendError;
    use serde_json::json;
    use uuid::Uuid;

    fn event(event_type: TelemetryEventType, data: Value) -> TelemetryEvent {
        TelemetryEvent {
            event_id: Uuid::new_v4(),
            event_type,
            timestamp: Utc::now(),
            session_id: Uuid::new_v4(),
            event_data: data,
        }
    }

    #[test]
    fn redact_replaces_email_like_substrings_anywhere_in_the_tree() {
        let value = json!({
            "note": "contact alice@example.com for help",
            "nested": {"cc": ["bob@example.org", "no email here"]},
        });
        let redacted = redact(&value);
        let serialized = redacted.to_string();
        assert!(!serialized.contains("alice@example.com"));
        assert!(!serialized.contains("bob@example.org"));
        assert!(serialized.contains("REDACTED"));
        assert!(serialized.contains("no email here"));
    }

    #[tokio::test]
    async fn buffer_respects_cap_and_evicts_fifo() {
        let emitter = TelemetryEmitter::new(3, true);
        for i in 0..8 {
            emitter
                .record(event(TelemetryEventType::DirectorDecision, json!({"i": i})))
                .await;
        }
        let events = emitter.topic_events(TelemetryEventType::DirectorDecision);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event_data["i"], json!(5));
        assert_eq!(events[2].event_data["i"], json!(7));
    }

    #[tokio::test]
    async fn disabled_emitter_records_nothing() {
        let emitter = TelemetryEmitter::new(10, false);
        emitter
            .record(event(TelemetryEventType::PlacementOutcome, json!({})))
            .await;
        assert!(emitter.topic_events(TelemetryEventType::PlacementOutcome).is_empty());
    }

    struct FailingBackend;

    #[async_trait::async_trait]
    impl TelemetryBackendPort for FailingBackend {
        async fn emit(&self, _event: TelemetryEvent) -> Result<(), TelemetryBackendError> {
            Err(TelemetryBackendError::Unavailable("down".to_string()))
        }
    }

    #[tokio::test]
    async fn a_failing_backend_does_not_prevent_buffering_or_stop_other_backends() {
        let emitter = TelemetryEmitter::new(10, true);
        emitter.add_backend(Arc::new(FailingBackend));
        emitter
            .record(event(TelemetryEventType::BranchProposalGenerated, json!({})))
            .await;
        assert_eq!(emitter.topic_events(TelemetryEventType::BranchProposalGenerated).len(), 1);
    }
}
