//! # inkloom-domain
//!
//! Pure vocabulary types for the inkloom AI-assisted narrative runtime:
//! the LORE snapshot, the Writer's branch proposal, the Validator's
//! report, the Director's decision, the integration state machine's
//! states, the save payload, and the player-preference store.
//!
//! Nothing in this crate performs I/O or depends on `tokio`/`async-trait`
//! — it sits at the innermost layer the way `domain-types`/`domain` sit
//! in the teacher's hexagonal architecture, so both `inkloom-engine` and
//! `inkloom-adapters` can depend on it without depending on each other.

pub mod config;
pub mod context;
pub mod decision;
pub mod error;
pub mod lore;
pub mod preference;
pub mod proposal;
pub mod save;
pub mod state_machine;
pub mod telemetry;
pub mod validation;

pub use config::{DirectorConfig, RiskWeights, RuntimeConfig, TelemetryConfig, ValidatorConfig, WriterConfig};
pub use context::ContextType;
pub use decision::{DecisionOutcome, DirectorDecision, ReturnPathCheck, RiskMetrics};
pub use error::DomainError;
pub use lore::{GameState, Lore, NarrativeContext, ScalarValue};
pub use preference::PlayerPreferenceStore;
pub use proposal::{
    BranchProposal, BranchType, DeterminismLevel, ProposalConstraints, ProposalContent, ProposalMetadata,
    StoryContextRef, VersionInfo,
};
pub use save::{BranchHistoryEntry, BranchOutcome, SavePayload};
pub use state_machine::{is_allowed_transition, IntegrationState, TransitionRecord};
pub use telemetry::{TelemetryEvent, TelemetryEventType};
pub use validation::{
    RuleCategory, RuleOutcome, RuleResult, Sanitization, Severity, ValidationReport, ValidationStatus,
};
