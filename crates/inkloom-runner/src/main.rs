//! inkloom - composition root for the AI-assisted narrative runtime.
//!
//! Loads configuration, wires production adapters into the engine, and
//! drives a small demo authored story through a handful of choice
//! points. At each choice point a fresh `Orchestrator` borrows the story
//! exclusively just long enough to run `addAiChoice` (spec.md §4.7: "one
//! orchestrator coroutine per choice point"), then the runner drives the
//! authored prose and choice directly against the owned story.

use std::sync::Arc;

use inkloom_adapters::{FileSaveStore, FixtureChoice, FixtureKnot, FixtureStoryAdapter, HttpLlmClient, SystemClock};
use inkloom_engine::{AiChoiceOutcome, HookManager, Orchestrator, TelemetryEmitter};
use inkloom_ports::StoryPort;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn demo_story() -> FixtureStoryAdapter {
    FixtureStoryAdapter::new(
        vec![
            FixtureKnot {
                id: "campfire".to_string(),
                prose: vec!["The fire crackles low against the dark.".to_string()],
                tags: vec!["dialogue".to_string()],
                choices: vec![FixtureChoice {
                    text: "Ask about the ruins to the north".to_string(),
                    target: "ruins_approach".to_string(),
                }],
                terminal: false,
            },
            FixtureKnot {
                id: "ruins_approach".to_string(),
                prose: vec!["Old stones rise out of the fog, half-buried.".to_string()],
                tags: vec!["exploration".to_string()],
                choices: vec![FixtureChoice {
                    text: "Step inside".to_string(),
                    target: "ruins_interior".to_string(),
                }],
                terminal: false,
            },
            FixtureKnot {
                id: "ruins_interior".to_string(),
                prose: vec!["Something in the dark shifts, and waits.".to_string()],
                tags: vec!["tension".to_string()],
                choices: vec![],
                terminal: true,
            },
        ],
        "campfire",
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "inkloom=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting inkloom demo runner");

    let config = inkloom_adapters::load_config()?;
    tracing::info!(
        model = %config.writer.model,
        creativity = config.writer.creativity,
        risk_threshold = config.director_config.risk_threshold,
        "configuration loaded"
    );

    let mut story = demo_story();
    let llm = HttpLlmClient::new(
        config.writer.base_url.clone().unwrap_or_else(|| "http://localhost:11434/v1".to_string()),
    );
    let save_store = FileSaveStore::new("./saves");
    let hooks = HookManager::new();
    let telemetry = TelemetryEmitter::new(config.telemetry.buffer_size, config.telemetry.enabled);
    if let Some(backend_url) = &config.telemetry.backend_url {
        telemetry.add_backend(Arc::new(inkloom_adapters::HttpTelemetryBackend::new(backend_url.clone())));
    } else {
        telemetry.add_backend(Arc::new(inkloom_adapters::InMemoryTelemetryBackend::new()));
    }
    let clock = SystemClock::new();

    loop {
        while story.can_continue() {
            println!("{}", story.continue_prose().await?);
        }

        let choices = story.current_choices();
        if choices.is_empty() {
            tracing::info!("reached a terminal knot, demo run complete");
            break;
        }

        let outcome = {
            let mut orchestrator = Orchestrator::new(
                &mut story,
                &llm,
                &save_store,
                &hooks,
                &telemetry,
                &clock,
                None,
                config.writer.clone(),
                config.director_config.clone(),
                config.validator.clone(),
                "demo",
            );
            orchestrator.add_ai_choice().await
        };

        match outcome {
            AiChoiceOutcome::Approved { proposal_id, text } => {
                // The orchestrator already diverted the story into the
                // branch's return path; there is no authored choice left
                // to take at this point, so loop back and continue from
                // wherever the branch rejoined the authored graph.
                println!("[ai branch {proposal_id}] {text}");
                continue;
            }
            AiChoiceOutcome::Rejected { reason } => {
                tracing::debug!(reason = %reason, "ai branch rejected, continuing the authored path");
            }
            AiChoiceOutcome::Disabled { reason } => {
                tracing::debug!(reason = %reason, "ai-assist disabled at this choice point");
            }
        }

        println!("> {}", choices[0].text);
        story.choose_index(choices[0].index).await?;
    }

    Ok(())
}
