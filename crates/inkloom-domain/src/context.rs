//! Context classification shared by the LORE Assembler and Prompt Engine.

use serde::{Deserialize, Serialize};

/// Inferred narrative context at a choice point.
///
/// Classified by the LORE Assembler from a node-name heuristic plus
/// variable flags (spec.md §4.1), and used by the Prompt Engine to pick a
/// template (spec.md §4.2) and by the Director to pick pacing targets
/// (spec.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    Dialogue,
    Exploration,
    Tension,
    Discovery,
}

impl ContextType {
    /// Context types fall back to `Exploration` — spec.md §4.1 edge case:
    /// "missing current node yields context type `exploration`".
    pub fn fallback() -> Self {
        ContextType::Exploration
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextType::Dialogue => "dialogue",
            ContextType::Exploration => "exploration",
            ContextType::Tension => "tension",
            ContextType::Discovery => "discovery",
        }
    }
}

impl Default for ContextType {
    fn default() -> Self {
        ContextType::fallback()
    }
}
