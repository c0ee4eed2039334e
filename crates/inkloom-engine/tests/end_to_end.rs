//! Crate-level integration suite for the Runtime Orchestrator's
//! `addAiChoice` pipeline, exercising the six end-to-end scenarios
//! spec.md §8 names against the public `Orchestrator` surface rather
//! than any one component in isolation.

use inkloom_domain::{BranchType, DirectorConfig, ValidatorConfig, WriterConfig};
use inkloom_engine::{AiChoiceOutcome, HookManager, Orchestrator, TelemetryEmitter};
use inkloom_ports::{LlmCompletion, LlmTransportError, MockClockPort, MockLlmPort, MockSaveStorePort, MockStoryPort};
use serde_json::json;

fn approved_llm_sample() -> String {
    r#"{"branch_type":"ink_fragment","text":"A short branch of twelve words exactly here for testing purposes today.","character_voice":null,"tags":[],"return_path":"forest","confidence":0.9}"#.to_string()
}

fn misrouted_llm_sample() -> String {
    r#"{"branch_type":"ink_fragment","text":"A short branch that diverts somewhere that was never authored.","character_voice":null,"tags":[],"return_path":"nonexistent_knot","confidence":0.9}"#.to_string()
}

fn base_story() -> MockStoryPort {
    let mut story = MockStoryPort::new();
    story.expect_current_path().returning(|| Some("campfire".to_string()));
    story.expect_variables().returning(std::collections::BTreeMap::new);
    story.expect_all_knots().returning(|| Some(vec!["campfire".to_string(), "forest".to_string()]));
    story.expect_stitches_of().returning(|_| None);
    story.expect_is_terminal().returning(|_| false);
    story.expect_to_json().returning(|| Ok(json!({"node": "campfire"})));
    story
}

fn fixed_clock() -> MockClockPort {
    let mut clock = MockClockPort::new();
    clock.expect_now().returning(chrono::Utc::now);
    clock
}

/// spec.md §8 scenario 1: happy path. Short, confident, in-graph
/// proposal against a lenient threshold commits and reports approved.
#[tokio::test]
async fn happy_path_commits_a_low_risk_proposal() {
    let mut story = base_story();
    story.expect_choose_path().returning(|_| Ok(()));

    let mut llm = MockLlmPort::new();
    llm.expect_complete().returning(|_, _| {
        Ok(LlmCompletion {
            samples: vec![approved_llm_sample()],
            model: "test-model".to_string(),
        })
    });

    let mut save_store = MockSaveStorePort::new();
    save_store.expect_save().returning(|_, _| Ok(()));

    let hooks = HookManager::new();
    let telemetry = TelemetryEmitter::new(10, true);
    let clock = fixed_clock();

    let mut director_config = DirectorConfig::default();
    director_config.risk_threshold = 0.9;
    director_config.min_return_confidence = 0.5;

    let mut orchestrator = Orchestrator::new(
        &mut story,
        &llm,
        &save_store,
        &hooks,
        &telemetry,
        &clock,
        None,
        WriterConfig::default(),
        director_config,
        ValidatorConfig::default(),
        "e2e-happy-path",
    );

    let outcome = orchestrator.add_ai_choice().await;
    assert!(matches!(outcome, AiChoiceOutcome::Approved { .. }));
}

/// spec.md §8 scenario 2: policy block. An identical low-risk proposal
/// is rejected outright once the risk threshold is tightened below what
/// the proposal can ever score, without the story ever being mutated.
#[tokio::test]
async fn tight_risk_threshold_blocks_an_otherwise_approvable_proposal() {
    let mut story = base_story();

    let mut llm = MockLlmPort::new();
    llm.expect_complete().returning(|_, _| {
        Ok(LlmCompletion {
            samples: vec![approved_llm_sample()],
            model: "test-model".to_string(),
        })
    });

    let save_store = MockSaveStorePort::new();
    let hooks = HookManager::new();
    let telemetry = TelemetryEmitter::new(10, true);
    let clock = fixed_clock();

    let mut director_config = DirectorConfig::default();
    director_config.risk_threshold = 0.0;

    let mut orchestrator = Orchestrator::new(
        &mut story,
        &llm,
        &save_store,
        &hooks,
        &telemetry,
        &clock,
        None,
        WriterConfig::default(),
        director_config,
        ValidatorConfig::default(),
        "e2e-policy-block",
    );

    let outcome = orchestrator.add_ai_choice().await;
    assert!(matches!(outcome, AiChoiceOutcome::Rejected { .. }));
}

/// spec.md §8 scenario 3: invalid return path. A proposal that diverts
/// to a node absent from the authored graph never reaches the Director
/// at all — the Validator's return-path rule fails it critically first.
#[tokio::test]
async fn return_path_outside_the_authored_graph_is_rejected() {
    let mut story = base_story();

    let mut llm = MockLlmPort::new();
    llm.expect_complete().returning(|_, _| {
        Ok(LlmCompletion {
            samples: vec![misrouted_llm_sample()],
            model: "test-model".to_string(),
        })
    });

    let save_store = MockSaveStorePort::new();
    let hooks = HookManager::new();
    let telemetry = TelemetryEmitter::new(10, true);
    let clock = fixed_clock();

    let mut orchestrator = Orchestrator::new(
        &mut story,
        &llm,
        &save_store,
        &hooks,
        &telemetry,
        &clock,
        None,
        WriterConfig::default(),
        DirectorConfig::default(),
        ValidatorConfig::default(),
        "e2e-invalid-return-path",
    );

    let outcome = orchestrator.add_ai_choice().await;
    assert!(matches!(outcome, AiChoiceOutcome::Rejected { .. }));
}

/// spec.md §8 scenario 4: LLM timeout. A transport-level timeout is
/// surfaced as a plain rejection, never a propagated error — the player
/// just never sees the AI-assisted choice.
#[tokio::test]
async fn llm_timeout_degrades_to_a_plain_rejection() {
    let mut story = base_story();
    let mut llm = MockLlmPort::new();
    llm.expect_complete().returning(|_, _| Err(LlmTransportError::Timeout(2_000)));

    let save_store = MockSaveStorePort::new();
    let hooks = HookManager::new();
    let telemetry = TelemetryEmitter::new(10, true);
    let clock = fixed_clock();

    let mut orchestrator = Orchestrator::new(
        &mut story,
        &llm,
        &save_store,
        &hooks,
        &telemetry,
        &clock,
        None,
        WriterConfig::default(),
        DirectorConfig::default(),
        ValidatorConfig::default(),
        "e2e-llm-timeout",
    );

    let outcome = orchestrator.add_ai_choice().await;
    assert!(matches!(outcome, AiChoiceOutcome::Rejected { .. }));
}

/// spec.md §8 scenario 5: rollback. Injection into the authored graph
/// fails after a pre-inject checkpoint was already written; the
/// orchestrator restores that checkpoint rather than leaving the story
/// half-mutated.
#[tokio::test]
async fn injection_failure_triggers_a_checkpoint_rollback() {
    let mut story = base_story();
    story
        .expect_choose_path()
        .returning(|_| Err(inkloom_ports::StoryError::Interpreter("boom".to_string())));
    story.expect_load_json().returning(|_| Ok(()));

    let mut llm = MockLlmPort::new();
    llm.expect_complete().returning(|_, _| {
        Ok(LlmCompletion {
            samples: vec![approved_llm_sample()],
            model: "test-model".to_string(),
        })
    });

    let mut save_store = MockSaveStorePort::new();
    save_store.expect_save().returning(|_, _| Ok(()));
    save_store.expect_load().returning(|_| {
        Ok(inkloom_domain::SavePayload {
            schema_version: inkloom_domain::save::CURRENT_SCHEMA_VERSION,
            game_state: json!({"node": "campfire"}),
            branch_history: vec![],
            last_checkpoint_id: None,
            lore_history: vec![],
        })
    });

    let hooks = HookManager::new();
    let telemetry = TelemetryEmitter::new(10, true);
    let clock = fixed_clock();

    let mut director_config = DirectorConfig::default();
    director_config.risk_threshold = 0.9;
    director_config.min_return_confidence = 0.5;

    let mut orchestrator = Orchestrator::new(
        &mut story,
        &llm,
        &save_store,
        &hooks,
        &telemetry,
        &clock,
        None,
        WriterConfig::default(),
        director_config,
        ValidatorConfig::default(),
        "e2e-rollback",
    );

    let outcome = orchestrator.add_ai_choice().await;
    assert!(matches!(outcome, AiChoiceOutcome::Rejected { .. }));
}

/// spec.md §8 scenario 6: preference drift. Repeated approvals at the
/// same choice point should push the branch type's preference EMA
/// upward, never downward, and never outside `[0,1]`.
#[tokio::test]
async fn repeated_approvals_drift_the_preference_ema_upward() {
    let mut story = base_story();
    story.expect_choose_path().returning(|_| Ok(()));

    let mut llm = MockLlmPort::new();
    llm.expect_complete().returning(|_, _| {
        Ok(LlmCompletion {
            samples: vec![approved_llm_sample()],
            model: "test-model".to_string(),
        })
    });

    let mut save_store = MockSaveStorePort::new();
    save_store.expect_save().returning(|_, _| Ok(()));

    let hooks = HookManager::new();
    let telemetry = TelemetryEmitter::new(10, true);
    let clock = fixed_clock();

    let mut director_config = DirectorConfig::default();
    director_config.risk_threshold = 0.9;
    director_config.min_return_confidence = 0.5;

    let mut orchestrator = Orchestrator::new(
        &mut story,
        &llm,
        &save_store,
        &hooks,
        &telemetry,
        &clock,
        None,
        WriterConfig::default(),
        director_config,
        ValidatorConfig::default(),
        "e2e-preference-drift",
    );

    let starting = orchestrator.preferences().get(BranchType::InkFragment);
    for _ in 0..3 {
        let outcome = orchestrator.add_ai_choice().await;
        assert!(matches!(outcome, AiChoiceOutcome::Approved { .. }));
    }
    let ending = orchestrator.preferences().get(BranchType::InkFragment);

    assert!(ending > starting);
    assert!((0.0..=1.0).contains(&ending));
}
