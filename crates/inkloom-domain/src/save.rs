//! Save Payload — the schema-versioned checkpoint format (spec.md §3,
//! §4.8).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state_machine::IntegrationState;

/// Bumped whenever a schema change would break deserialization of an
/// older save. The loader refuses a strictly lower major without a
/// migration path (spec.md §3).
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchOutcome {
    Committed,
    RolledBack,
    Declined,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BranchHistoryEntry {
    pub proposal_id: Uuid,
    pub outcome: BranchOutcome,
    pub final_state: IntegrationState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SavePayload {
    pub schema_version: u32,
    /// Opaque interpreter state blob — round-tripped through
    /// `StoryPort::to_json`/`load_json` without the save adapter ever
    /// interpreting it.
    pub game_state: serde_json::Value,
    pub branch_history: Vec<BranchHistoryEntry>,
    pub last_checkpoint_id: Option<String>,
    pub lore_history: Vec<String>,
}

impl SavePayload {
    pub fn is_compatible(&self, expected: u32) -> bool {
        self.schema_version == expected
    }
}
