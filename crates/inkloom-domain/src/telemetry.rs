//! Telemetry event vocabulary (spec.md §6, "bit-exact field names").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of event type names the runtime ever emits. Kept as an
/// enum (rather than a free-form string) so a typo in a call site is a
/// compile error, not a silently-dropped telemetry event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryEventType {
    BranchProposalGenerated,
    ValidationPipelineExecuted,
    DirectorDecision,
    PlacementOutcome,
    BranchChoicePresented,
    BranchChoiceMade,
    BranchExecutionOutcome,
}

impl TelemetryEventType {
    pub fn topic(&self) -> &'static str {
        match self {
            TelemetryEventType::BranchProposalGenerated => "branch_proposal_generated",
            TelemetryEventType::ValidationPipelineExecuted => "validation_pipeline_executed",
            TelemetryEventType::DirectorDecision => "director_decision",
            TelemetryEventType::PlacementOutcome => "placement_outcome",
            TelemetryEventType::BranchChoicePresented => "branch_choice_presented",
            TelemetryEventType::BranchChoiceMade => "branch_choice_made",
            TelemetryEventType::BranchExecutionOutcome => "branch_execution_outcome",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TelemetryEvent {
    pub event_id: Uuid,
    pub event_type: TelemetryEventType,
    pub timestamp: DateTime<Utc>,
    pub session_id: Uuid,
    pub event_data: serde_json::Value,
}
