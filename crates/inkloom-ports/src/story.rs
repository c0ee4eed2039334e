//! Story Interpreter port — the narrow capability interface the runtime
//! needs from the narrative interpreter (spec.md §6, §9 "duck-typed Story
//! object → capability interface").
//!
//! The interpreter itself is an external collaborator and out of scope
//! for this workspace; any host application wires its own Ink/Inkle-style
//! VM behind this trait. `inkloom-adapters::story` ships a `FixtureStoryAdapter`
//! for the demo runner and the test suite.

use std::collections::BTreeMap;

use async_trait::async_trait;
use inkloom_domain::ScalarValue;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("no such node: {0}")]
    NoSuchNode(String),
    #[error("story state could not be serialized: {0}")]
    Serialize(String),
    #[error("story state could not be loaded: {0}")]
    Load(String),
    #[error("story interpreter error: {0}")]
    Interpreter(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub text: String,
    pub index: usize,
}

/// Narrow capability interface over a backing narrative interpreter.
///
/// Modeled after `engine-ports/src/outbound/llm_port.rs` and
/// `clock_port.rs`: one trait per external capability, `Send + Sync` so
/// it can live behind an `Arc<dyn StoryPort>`, with a mockable surface
/// for the orchestrator's unit tests.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait StoryPort: Send + Sync {
    /// Whether there is more authored prose to surface before the next
    /// choice point.
    fn can_continue(&self) -> bool;

    /// Advance prose by one step, returning the rendered text.
    async fn continue_prose(&mut self) -> Result<String, StoryError>;

    /// Choices available at the current point.
    fn current_choices(&self) -> Vec<Choice>;

    /// Select a choice by index, advancing the story.
    async fn choose_index(&mut self, index: usize) -> Result<(), StoryError>;

    /// Tags attached to the current line/knot.
    fn current_tags(&self) -> Vec<String>;

    /// Exposed runtime variables. Absent variables are simply missing
    /// from the map — spec.md §4.1 treats that as "undefined", never 0.
    fn variables(&self) -> BTreeMap<String, ScalarValue>;

    /// Canonical id of the current node.
    fn current_path(&self) -> Option<String>;

    /// All known knots in the authored graph, used for return-path
    /// validation. `None` when the interpreter doesn't expose an
    /// enumeration API — callers fall back to a configured whitelist
    /// (spec.md §4.5).
    fn all_knots(&self) -> Option<Vec<String>>;

    /// Stitches (sub-entries) of a knot, when the interpreter supports
    /// that level of addressing.
    fn stitches_of(&self, knot: &str) -> Option<Vec<String>>;

    /// Whether a node is marked terminal (an ending) — terminal nodes are
    /// never valid return-path targets.
    fn is_terminal(&self, node: &str) -> bool;

    /// Divert execution into `path`, implementing an approved branch's
    /// return to the authored graph.
    async fn choose_path(&mut self, path: &str) -> Result<(), StoryError>;

    /// Serialize full interpreter state for checkpointing.
    fn to_json(&self) -> Result<serde_json::Value, StoryError>;

    /// Restore interpreter state from a previously serialized checkpoint.
    async fn load_json(&mut self, state: serde_json::Value) -> Result<(), StoryError>;
}
