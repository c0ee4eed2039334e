//! The twelve-state Integration State Machine vocabulary (spec.md §4.7).
//!
//! This module only holds the state enum, the allowed-transitions table,
//! and transition-log records — pure data with one pure predicate
//! function. The stateful machine that owns "current state for this
//! proposal" and appends to the log lives in `inkloom-engine::state_machine`,
//! the same split the teacher draws between domain vocabulary and
//! application-layer services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationState {
    Submitted,
    Validating,
    Validated,
    Rejected,
    Queued,
    Presenting,
    Declined,
    Integrating,
    Integrated,
    Executing,
    Archived,
    Reverted,
}

impl IntegrationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            IntegrationState::Rejected
                | IntegrationState::Declined
                | IntegrationState::Archived
                | IntegrationState::Reverted
        )
    }

    /// Only these transitions are allowed to mutate story state (spec.md
    /// §4.7: "Only INTEGRATING → INTEGRATED → EXECUTING may mutate story
    /// state").
    pub fn mutates_story(from: IntegrationState, to: IntegrationState) -> bool {
        matches!(
            (from, to),
            (IntegrationState::Integrating, IntegrationState::Integrated)
                | (IntegrationState::Integrated, IntegrationState::Executing)
        )
    }
}

/// The explicit allowed-transitions table from spec.md §4.7's lifecycle
/// diagram. Anything not listed here is an illegal transition and must
/// raise `StateMachineError` (fatal — it indicates a bug, not a policy
/// outcome).
pub fn is_allowed_transition(from: IntegrationState, to: IntegrationState) -> bool {
    use IntegrationState::*;
    matches!(
        (from, to),
        (Submitted, Validating)
            | (Validating, Validated)
            | (Validating, Rejected)
            | (Validated, Queued)
            | (Queued, Presenting)
            | (Presenting, Declined)
            | (Presenting, Integrating)
            | (Integrating, Integrated)
            | (Integrated, Executing)
            | (Executing, Archived)
            | (Executing, Reverted)
    )
}

/// One logged transition — `(from, to, timestamp, payload_ref)` per
/// spec.md §4.7.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TransitionRecord {
    pub proposal_id: Uuid,
    pub from: IntegrationState,
    pub to: IntegrationState,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use IntegrationState::*;

    const ALL_STATES: [IntegrationState; 12] = [
        Submitted, Validating, Validated, Rejected, Queued, Presenting, Declined, Integrating,
        Integrated, Executing, Archived, Reverted,
    ];

    #[test]
    fn totality_every_pair_not_in_table_is_disallowed_and_allowed_pairs_are_exactly_nine() {
        let mut allowed_count = 0;
        for &from in &ALL_STATES {
            for &to in &ALL_STATES {
                if is_allowed_transition(from, to) {
                    allowed_count += 1;
                }
            }
        }
        assert_eq!(allowed_count, 11, "documented happy + rollback paths");
    }

    #[test]
    fn terminal_states_match_spec() {
        for state in ALL_STATES {
            let expect_terminal = matches!(state, Rejected | Declined | Archived | Reverted);
            assert_eq!(state.is_terminal(), expect_terminal, "{state:?}");
        }
    }

    #[test]
    fn only_integrating_path_mutates_story() {
        assert!(IntegrationState::mutates_story(Integrating, Integrated));
        assert!(IntegrationState::mutates_story(Integrated, Executing));
        assert!(!IntegrationState::mutates_story(Submitted, Validating));
        assert!(!IntegrationState::mutates_story(Executing, Archived));
    }
}
