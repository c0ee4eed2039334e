//! # inkloom-engine
//!
//! The application layer of the inkloom AI-assisted narrative runtime:
//! LORE Assembler, Prompt Engine, Writer, Validator, Director, Hook
//! Manager, Integration State Machine, Telemetry Emitter, and the
//! Runtime Orchestrator that wires them into `addAiChoice`.
//!
//! Depends only on `inkloom-domain` (vocabulary) and `inkloom-ports`
//! (capability interfaces) — never on `inkloom-adapters` outside tests,
//! the same dependency direction the teacher draws between
//! `engine-app` and `engine-ports`/`engine-adapters`.

pub mod director;
pub mod error;
pub mod hooks;
pub mod lore;
pub mod orchestrator;
pub mod prompt;
pub mod save_load;
pub mod state_machine;
pub mod telemetry;
pub mod validator;
pub mod writer;

pub use director::Director;
pub use error::{DirectorError, HookError, RuntimeIntegrationError, StateMachineError, ValidatorError};
pub use hooks::{HookEvent, HookManager, HookOutcome, HookPayload, HookResult};
pub use lore::LoreAssembler;
pub use orchestrator::{AiChoiceOutcome, Orchestrator};
pub use prompt::{creativity_to_temperature, PromptEngine, PromptTemplate};
pub use save_load::{load_save, IncompatibleDecision, LoadOutcome};
pub use state_machine::{IntegrationStateMachine, StateMachineRegistry};
pub use telemetry::TelemetryEmitter;
pub use validator::{default_ruleset, Validator};
pub use writer::Writer;
