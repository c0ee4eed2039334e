//! Runtime Orchestrator (spec.md §1, AMBIENT-4): the single coroutine
//! that owns the `StoryPort` exclusively for one choice point and wires
//! the rest of the pipeline into `addAiChoice`.
//!
//! snapshot -> propose -> validate -> direct -> on approve: state
//! machine through to ARCHIVED with a checkpoint before the only
//! story-mutating transition and a rollback path on any recoverable
//! error; on reject: the player never sees an error, just no AI choice.

use chrono::Utc;
use inkloom_domain::{
    BranchOutcome, BranchHistoryEntry, DirectorConfig, PlayerPreferenceStore, SavePayload, TelemetryEvent,
    TelemetryEventType, ValidatorConfig, WriterConfig,
};
use inkloom_ports::{ClockPort, EmbeddingPort, LlmPort, SaveStorePort, StoryPort};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::director::Director;
use crate::hooks::{HookEvent, HookManager};
use crate::lore::LoreAssembler;
use crate::prompt::PromptEngine;
use crate::state_machine::StateMachineRegistry;
use crate::telemetry::TelemetryEmitter;
use crate::validator::{default_ruleset, Validator};
use crate::writer::Writer;
use inkloom_domain::IntegrationState::*;

/// The orchestrator's single public entry point's three possible
/// outcomes (spec.md AMBIENT-4).
#[derive(Debug, Clone)]
pub enum AiChoiceOutcome {
    Approved { proposal_id: Uuid, text: String },
    Rejected { reason: String },
    Disabled { reason: String },
}

pub struct Orchestrator<'a> {
    story: &'a mut dyn StoryPort,
    llm: &'a dyn LlmPort,
    save_store: &'a dyn SaveStorePort,
    hooks: &'a HookManager,
    telemetry: &'a TelemetryEmitter,
    clock: &'a dyn ClockPort,
    embedding: Option<&'a dyn EmbeddingPort>,
    lore_assembler: LoreAssembler,
    prompt_engine: PromptEngine,
    validator: Validator,
    director: Director,
    preferences: PlayerPreferenceStore,
    states: StateMachineRegistry,
    writer_config: WriterConfig,
    session_id: Uuid,
    save_slot: String,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        story: &'a mut dyn StoryPort,
        llm: &'a dyn LlmPort,
        save_store: &'a dyn SaveStorePort,
        hooks: &'a HookManager,
        telemetry: &'a TelemetryEmitter,
        clock: &'a dyn ClockPort,
        embedding: Option<&'a dyn EmbeddingPort>,
        writer_config: WriterConfig,
        director_config: DirectorConfig,
        validator_config: ValidatorConfig,
        save_slot: impl Into<String>,
    ) -> Self {
        let rules = default_ruleset();
        Self {
            story,
            llm,
            save_store,
            hooks,
            telemetry,
            clock,
            embedding,
            lore_assembler: LoreAssembler::new(inkloom_domain::lore::NarrativeContext::DEFAULT_CAPACITY),
            prompt_engine: PromptEngine::new(writer_config.creativity, 400),
            validator: Validator::new(rules, validator_config.enabled_rules.clone(), validator_config.max_length_tokens),
            director: Director::new(director_config),
            preferences: PlayerPreferenceStore::default(),
            states: StateMachineRegistry::new(),
            writer_config,
            session_id: Uuid::new_v4(),
            save_slot: save_slot.into(),
        }
    }

    pub fn preferences(&self) -> &PlayerPreferenceStore {
        &self.preferences
    }

    /// The whole Writer -> Validator -> Director -> integrate-or-drop
    /// pipeline for one choice point (spec.md AMBIENT-4).
    pub async fn add_ai_choice(&mut self) -> AiChoiceOutcome {
        if self.writer_config.creativity <= 0.0 {
            return AiChoiceOutcome::Disabled {
                reason: "ai-assist disabled: writer creativity is 0".to_string(),
            };
        }

        let lore = self.lore_assembler.assemble(self.story, self.clock.now());
        if !lore.has_return_paths() {
            return AiChoiceOutcome::Disabled {
                reason: "no feasible return paths at this choice point".to_string(),
            };
        }

        let writer = Writer::new(&self.prompt_engine, self.llm, self.writer_config.model.clone());
        let proposal = match writer.generate_proposal(&lore, self.clock.now(), CancellationToken::new()).await {
            Ok(proposal) => proposal,
            Err(err) => {
                tracing::warn!(error = %err, "writer failed to produce a parsable proposal");
                return AiChoiceOutcome::Rejected { reason: err.to_string() };
            }
        };

        self.telemetry
            .record(self.event(TelemetryEventType::BranchProposalGenerated, json!({
                "proposal_id": proposal.id,
                "branch_type": proposal.content.branch_type,
                "confidence": proposal.metadata.confidence_score,
            })))
            .await;

        let (validation, working_proposal) = self
            .validator
            .run(&proposal, &lore.valid_return_paths, self.embedding)
            .await;

        self.telemetry
            .record(self.event(TelemetryEventType::ValidationPipelineExecuted, json!({
                "proposal_id": working_proposal.id,
                "status": validation.status,
                "sanitizations": validation.sanitizations_applied.len(),
            })))
            .await;

        let decision = self
            .director
            .decide(&working_proposal, &validation, self.story, &self.preferences)
            .await;

        self.telemetry
            .record(self.event(TelemetryEventType::DirectorDecision, json!({
                "proposal_id": decision.proposal_id,
                "decision": decision.decision,
                "risk_score": decision.risk_score,
                "reason": decision.reason,
            })))
            .await;

        self.preferences
            .record_outcome(working_proposal.content.branch_type, decision.is_approved());

        if !decision.is_approved() {
            let machine = self.states.start(working_proposal.id);
            let _ = machine.transition(Validating);
            let _ = machine.transition(Rejected);
            return AiChoiceOutcome::Rejected { reason: decision.reason };
        }

        match self.integrate(&working_proposal).await {
            Ok(()) => AiChoiceOutcome::Approved {
                proposal_id: working_proposal.id,
                text: working_proposal.content.text.clone(),
            },
            Err(reason) => AiChoiceOutcome::Rejected { reason },
        }
    }

    /// Drive the state machine from SUBMITTED to ARCHIVED, checkpointing
    /// before the only story-mutating transition and rolling back to a
    /// pre-inject checkpoint on any recoverable error (spec.md §4.7,
    /// AMBIENT-4).
    async fn integrate(&mut self, proposal: &inkloom_domain::BranchProposal) -> Result<(), String> {
        let proposal_id = proposal.id;
        {
            let machine = self.states.start(proposal_id);
            for to in [Validating, Validated, Queued, Presenting, Integrating] {
                machine.transition(to).map_err(|e| e.to_string())?;
            }
        }

        self.hooks
            .emit_sequential(
                HookEvent::PreInject,
                json!({"proposal_id": proposal_id, "return_path": proposal.content.return_path}),
            )
            .await;

        let pre_inject_checkpoint = format!("{}_pre_{}", self.save_slot, proposal_id);
        let snapshot = self.snapshot_payload(Vec::new());
        if let Err(err) = self.save_store.save(&pre_inject_checkpoint, &snapshot).await {
            let machine = self.states.start(proposal_id);
            let _ = machine.transition(Reverted);
            return Err(format!("pre-inject checkpoint failed: {err}"));
        }

        if let Err(err) = self.story.choose_path(&proposal.content.return_path).await {
            self.rollback(proposal_id, &pre_inject_checkpoint).await;
            return Err(format!("story injection failed: {err}"));
        }

        for to in [Integrated, Executing] {
            let machine = self.states.start(proposal_id);
            if let Err(err) = machine.transition(to) {
                self.rollback(proposal_id, &pre_inject_checkpoint).await;
                return Err(err.to_string());
            }
        }

        self.hooks
            .emit_parallel(HookEvent::PostInject, json!({"proposal_id": proposal_id}))
            .await;
        self.hooks
            .emit_parallel(HookEvent::OnCommit, json!({"proposal_id": proposal_id}))
            .await;

        {
            let machine = self.states.start(proposal_id);
            machine.transition(Archived).map_err(|e| e.to_string())?;
        }

        let history_entry = BranchHistoryEntry {
            proposal_id,
            outcome: BranchOutcome::Committed,
            final_state: Archived,
        };
        let final_payload = self.snapshot_payload(vec![history_entry]);
        if let Err(err) = self.save_store.save(&self.save_slot, &final_payload).await {
            tracing::warn!(error = %err, "post-commit save failed; story state already mutated");
        }

        self.telemetry
            .record(self.event(TelemetryEventType::PlacementOutcome, json!({
                "proposal_id": proposal_id,
                "outcome": "committed",
            })))
            .await;
        self.states.remove(proposal_id);
        Ok(())
    }

    async fn rollback(&mut self, proposal_id: Uuid, checkpoint_slot: &str) {
        let machine = self.states.start(proposal_id);
        let _ = machine.transition(Reverted);

        self.hooks
            .emit_sequential(HookEvent::OnRollback, json!({"proposal_id": proposal_id}))
            .await;

        let loaded = crate::save_load::load_save(
            self.save_store,
            checkpoint_slot,
            inkloom_domain::save::CURRENT_SCHEMA_VERSION,
            // A pre-inject checkpoint was written by this same build
            // moments ago, so a mismatch here means the runtime was
            // upgraded mid-session; refuse to guess and fail the
            // restore rather than load a checkpoint of unknown shape.
            |_found, _current| crate::save_load::IncompatibleDecision::Rollback,
        )
        .await;

        match loaded {
            Ok(outcome) => {
                if let Some(checkpoint) = outcome.payload() {
                    if let Err(err) = self.story.load_json(checkpoint.game_state.clone()).await {
                        tracing::error!(error = %err, "rollback restore failed; story state may be inconsistent");
                    }
                } else {
                    tracing::error!(checkpoint_slot, "pre-inject checkpoint schema mismatch; cannot restore");
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to load pre-inject checkpoint for rollback");
            }
        }

        self.telemetry
            .record(self.event(TelemetryEventType::PlacementOutcome, json!({
                "proposal_id": proposal_id,
                "outcome": "reverted",
            })))
            .await;
        self.states.remove(proposal_id);
    }

    fn snapshot_payload(&self, branch_history: Vec<BranchHistoryEntry>) -> SavePayload {
        SavePayload {
            schema_version: inkloom_domain::save::CURRENT_SCHEMA_VERSION,
            game_state: self.story.to_json().unwrap_or(serde_json::Value::Null),
            branch_history,
            last_checkpoint_id: Some(Utc::now().to_rfc3339()),
            lore_history: Vec::new(),
        }
    }

    fn event(&self, event_type: TelemetryEventType, event_data: serde_json::Value) -> TelemetryEvent {
        TelemetryEvent {
            event_id: Uuid::new_v4(),
            event_type,
            timestamp: self.clock.now(),
            session_id: self.session_id,
            event_data,
        }
    }
}
