//! Hook Manager (spec.md §4.6): pub-sub over a fixed vocabulary of
//! lifecycle hook points, with parallel and sequential emission and
//! isolated per-handler error handling.
//!
//! Grounded on the teacher's `event_bus_port.rs` / `in_process_notifier.rs`
//! pub-sub shape, narrowed to a closed event vocabulary (spec.md §9:
//! "dynamic hook registration → typed event bus").

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use futures_util::future::join_all;
use serde_json::Value;

use crate::error::HookError;

/// The closed vocabulary of lifecycle hook points (spec.md §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    PreInject,
    PostInject,
    PreCheckpoint,
    PostCheckpoint,
    PreLoad,
    OnRestore,
    OnRollback,
    PreCommit,
    OnCommit,
    PostCommit,
    StateChange,
}

impl HookEvent {
    pub fn name(&self) -> &'static str {
        match self {
            HookEvent::PreInject => "pre_inject",
            HookEvent::PostInject => "post_inject",
            HookEvent::PreCheckpoint => "pre_checkpoint",
            HookEvent::PostCheckpoint => "post_checkpoint",
            HookEvent::PreLoad => "pre_load",
            HookEvent::OnRestore => "on_restore",
            HookEvent::OnRollback => "on_rollback",
            HookEvent::PreCommit => "pre_commit",
            HookEvent::OnCommit => "on_commit",
            HookEvent::PostCommit => "post_commit",
            HookEvent::StateChange => "state_change",
        }
    }
}

/// Payload handed to a handler. `pre_checkpoint` handlers may enrich
/// this (spec.md §4.6: "may enrich the payload") by returning an
/// extended value from `HookResult::Enriched`; every other hook point
/// treats the payload as read-only.
pub type HookPayload = Value;

#[derive(Debug, Clone)]
pub enum HookOutcome {
    Ok,
    Enriched(Value),
}

pub type HookResult = Result<HookOutcome, HookError>;
type BoxFuture<'a> = Pin<Box<dyn Future<Output = HookResult> + Send + 'a>>;
pub type HookHandler = Arc<dyn Fn(HookPayload) -> BoxFuture<'static> + Send + Sync>;

/// One handler's outcome from an emission, recorded rather than
/// propagated — spec.md §4.6: "never propagates exceptions".
#[derive(Debug, Clone)]
pub struct HandlerResult {
    pub handler_index: usize,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Default)]
pub struct HookManager {
    handlers: Mutex<HashMap<&'static str, Vec<HookHandler>>>,
}

impl HookManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `event`. Returns the handler's index
    /// within that event's registration order, usable with `off`.
    pub fn on(&self, event: HookEvent, handler: HookHandler) -> usize {
        let mut handlers = self.handlers.lock().unwrap_or_else(|p| p.into_inner());
        let bucket = handlers.entry(event.name()).or_default();
        bucket.push(handler);
        bucket.len() - 1
    }

    /// Deregister the handler registered at `index` for `event`,
    /// leaving a hole rather than shifting later indices.
    pub fn off(&self, event: HookEvent, index: usize) {
        let mut handlers = self.handlers.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(bucket) = handlers.get_mut(event.name()) {
            if index < bucket.len() {
                bucket.remove(index);
            }
        }
    }

    fn snapshot(&self, event: HookEvent) -> Vec<HookHandler> {
        self.handlers
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(event.name())
            .cloned()
            .unwrap_or_default()
    }

    /// Invoke all handlers for `event` concurrently. Never propagates a
    /// handler's error — each is captured into its own `HandlerResult`,
    /// indexed by registration order (spec.md §4.6, §5: "no ordering
    /// guarantees but produces a list indexed by registration").
    pub async fn emit_parallel(&self, event: HookEvent, payload: HookPayload) -> Vec<HandlerResult> {
        let handlers = self.snapshot(event);
        let futures = handlers.into_iter().enumerate().map(|(handler_index, handler)| {
            let payload = payload.clone();
            async move {
                match handler(payload).await {
                    Ok(_) => HandlerResult {
                        handler_index,
                        success: true,
                        error: None,
                    },
                    Err(err) => HandlerResult {
                        handler_index,
                        success: false,
                        error: Some(err.to_string()),
                    },
                }
            }
        });
        join_all(futures).await
    }

    /// Invoke handlers for `event` in registration order, awaiting each
    /// before starting the next. An exception in one handler is
    /// recorded and does not abort the sequence (spec.md §4.6).
    pub async fn emit_sequential(&self, event: HookEvent, payload: HookPayload) -> Vec<HandlerResult> {
        let handlers = self.snapshot(event);
        let mut results = Vec::with_capacity(handlers.len());
        for (handler_index, handler) in handlers.into_iter().enumerate() {
            let result = match handler(payload.clone()).await {
                Ok(_) => HandlerResult {
                    handler_index,
                    success: true,
                    error: None,
                },
                Err(err) => HandlerResult {
                    handler_index,
                    success: false,
                    error: Some(err.to_string()),
                },
            };
            results.push(result);
        }
        results
    }
}
