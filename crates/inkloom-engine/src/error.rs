//! Per-component error taxonomy (spec.md §7), one enum per engine
//! component rather than a single god-enum — each carries enough
//! context (rule id, proposal id, from/to state) to log usefully.

use uuid::Uuid;

use inkloom_domain::IntegrationState;

#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    #[error("proposal {proposal_id} failed schema validation: {reason}")]
    SchemaViolation { proposal_id: Uuid, reason: String },
    #[error("rule {rule_id} panicked or produced an unrecoverable error: {reason}")]
    RuleExecution { rule_id: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum DirectorError {
    #[error("director decision for proposal {proposal_id} exceeded its latency budget of {budget_ms}ms")]
    LatencyBudgetExceeded { proposal_id: Uuid, budget_ms: u64 },
    #[error("risk weights are invalid: {reason}")]
    InvalidWeights { reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum StateMachineError {
    #[error("illegal transition for proposal {proposal_id}: {from:?} -> {to:?}")]
    IllegalTransition {
        proposal_id: Uuid,
        from: IntegrationState,
        to: IntegrationState,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("hook handler for event {event} failed: {reason}")]
    HandlerFailed { event: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeIntegrationError {
    #[error(transparent)]
    Validator(#[from] ValidatorError),
    #[error(transparent)]
    Director(#[from] DirectorError),
    #[error(transparent)]
    StateMachine(#[from] StateMachineError),
    #[error(transparent)]
    Hook(#[from] HookError),
    #[error(transparent)]
    Save(#[from] inkloom_ports::SaveError),
    #[error(transparent)]
    Story(#[from] inkloom_ports::StoryError),
    #[error(transparent)]
    Llm(#[from] inkloom_ports::LlmTransportError),
}
