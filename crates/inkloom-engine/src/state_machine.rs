//! Integration State Machine (spec.md §4.7) — the stateful service that
//! owns "current state for this proposal" and appends to the transition
//! log. The pure vocabulary (states, allowed-transitions table,
//! `TransitionRecord`) lives in `inkloom_domain::state_machine`; this
//! module is the engine-layer service built on top of it.

use std::collections::HashMap;

use chrono::Utc;
use inkloom_domain::{is_allowed_transition, IntegrationState, TransitionRecord};
use uuid::Uuid;

use crate::error::StateMachineError;

/// One proposal's exclusive state machine (spec.md §4.7 ownership
/// invariant: "exclusive to a single orchestrator coroutine per choice
/// point").
pub struct IntegrationStateMachine {
    proposal_id: Uuid,
    current: IntegrationState,
    log: Vec<TransitionRecord>,
}

impl IntegrationStateMachine {
    pub fn new(proposal_id: Uuid) -> Self {
        Self {
            proposal_id,
            current: IntegrationState::Submitted,
            log: Vec::new(),
        }
    }

    pub fn current(&self) -> IntegrationState {
        self.current
    }

    pub fn log(&self) -> &[TransitionRecord] {
        &self.log
    }

    /// Attempt a transition. Illegal transitions raise `StateMachineError`
    /// (spec.md §7: "fatal — indicates a bug") rather than being silently
    /// ignored; every legal transition is logged exactly once.
    pub fn transition(&mut self, to: IntegrationState) -> Result<(), StateMachineError> {
        let from = self.current;
        if !is_allowed_transition(from, to) {
            return Err(StateMachineError::IllegalTransition {
                proposal_id: self.proposal_id,
                from,
                to,
            });
        }
        self.log.push(TransitionRecord {
            proposal_id: self.proposal_id,
            from,
            to,
            timestamp: Utc::now(),
        });
        self.current = to;
        tracing::debug!(proposal_id = %self.proposal_id, ?from, ?to, "integration state transition");
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }
}

/// Per-session registry of in-flight state machines, keyed by proposal
/// id. The orchestrator drops entries once they reach a terminal state
/// and have been archived into the save payload's branch history.
#[derive(Default)]
pub struct StateMachineRegistry {
    machines: HashMap<Uuid, IntegrationStateMachine>,
}

impl StateMachineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, proposal_id: Uuid) -> &mut IntegrationStateMachine {
        self.machines.entry(proposal_id).or_insert_with(|| IntegrationStateMachine::new(proposal_id))
    }

    pub fn get(&self, proposal_id: Uuid) -> Option<&IntegrationStateMachine> {
        self.machines.get(&proposal_id)
    }

    pub fn remove(&mut self, proposal_id: Uuid) -> Option<IntegrationStateMachine> {
        self.machines.remove(&proposal_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use IntegrationState::*;

    #[test]
    fn happy_path_transitions_succeed_and_are_logged_exactly_once() {
        let id = Uuid::new_v4();
        let mut machine = IntegrationStateMachine::new(id);
        let path = [Validating, Validated, Queued, Presenting, Integrating, Integrated, Executing, Archived];
        for to in path {
            machine.transition(to).unwrap();
        }
        assert_eq!(machine.current(), Archived);
        assert_eq!(machine.log().len(), path.len());
        assert!(machine.is_terminal());
    }

    #[test]
    fn illegal_transition_is_rejected_and_does_not_move_state() {
        let id = Uuid::new_v4();
        let mut machine = IntegrationStateMachine::new(id);
        let err = machine.transition(Executing).unwrap_err();
        assert!(matches!(err, StateMachineError::IllegalTransition { .. }));
        assert_eq!(machine.current(), Submitted);
        assert!(machine.log().is_empty());
    }

    #[test]
    fn rollback_path_reaches_reverted() {
        let id = Uuid::new_v4();
        let mut machine = IntegrationStateMachine::new(id);
        for to in [Validating, Validated, Queued, Presenting, Integrating, Integrated, Executing, Reverted] {
            machine.transition(to).unwrap();
        }
        assert_eq!(machine.current(), Reverted);
        assert!(machine.is_terminal());
    }

    #[test]
    fn registry_reuses_the_same_machine_for_a_proposal_id() {
        let id = Uuid::new_v4();
        let mut registry = StateMachineRegistry::new();
        registry.start(id).transition(Validating).unwrap();
        registry.start(id).transition(Rejected).unwrap();
        assert_eq!(registry.get(id).unwrap().current(), Rejected);
    }
}
