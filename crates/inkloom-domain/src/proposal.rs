//! Branch Proposal — the Writer's candidate AI branch (spec.md §3, §6).
//!
//! Serialized with `snake_case` field names because spec.md §6 names the
//! wire fields literally (`metadata.created_at`, `content.branch_type`,
//! …) — this is the one place in the workspace where we follow the
//! spec's JSON Schema instead of the teacher's usual `camelCase` DTO
//! convention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchType {
    InkFragment,
    NarrativeDelta,
    InkKnot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProposalMetadata {
    pub created_at: DateTime<Utc>,
    pub model: String,
    pub model_version: String,
    pub seed: Option<u64>,
    pub context_hash: String,
    pub confidence_score: f32,
    pub generation_time_ms: u64,
    /// Set when the LLM Adapter fell back to multi-sample consensus
    /// because the endpoint doesn't honor seeds (spec.md §4.3).
    pub determinism_level: DeterminismLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeterminismLevel {
    #[default]
    High,
    Low,
}

/// Subset of LORE reflected back into the proposal for audit (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StoryContextRef {
    pub current_scene: String,
    pub context_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProposalContent {
    pub branch_type: BranchType,
    pub text: String,
    pub character_voice: Option<String>,
    pub length_tokens: Option<u32>,
    pub tags: Vec<String>,
    pub return_path: String,
    pub return_path_confidence: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProposalConstraints {
    pub max_length: Option<u32>,
    pub prohibited_patterns: Vec<String>,
    pub style_template: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VersionInfo {
    pub input_hash: String,
    pub llm_seed: Option<u64>,
    pub creativity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BranchProposal {
    pub id: Uuid,
    pub metadata: ProposalMetadata,
    pub story_context: StoryContextRef,
    pub content: ProposalContent,
    pub constraints: ProposalConstraints,
    pub version_info: VersionInfo,
}

impl BranchProposal {
    /// Clamp `confidence_score` into `[0,1]`, matching spec.md §3's
    /// invariant; constructors should call this rather than let an
    /// out-of-range score slip into a persisted proposal.
    pub fn clamp_confidence(&mut self) {
        self.metadata.confidence_score = self.metadata.confidence_score.clamp(0.0, 1.0);
    }

    pub fn validate_invariants(&self) -> Result<(), DomainError> {
        if self.content.text.trim().is_empty() {
            return Err(DomainError::Empty { field: "content.text" });
        }
        if self.content.return_path.trim().is_empty() {
            return Err(DomainError::Empty { field: "content.return_path" });
        }
        if !(0.0..=1.0).contains(&self.metadata.confidence_score) {
            return Err(DomainError::OutOfUnitRange {
                field: "metadata.confidence_score",
                value: self.metadata.confidence_score,
            });
        }
        Ok(())
    }

    /// Produce a new logical version with `text` replaced — the shape the
    /// Validator's sanitizer uses to build `sanitized_proposal` (spec.md
    /// §3: "mutated only by Validator's sanitizer, producing a new
    /// logical version").
    pub fn with_sanitized_text(&self, text: String) -> Self {
        let mut next = self.clone();
        next.content.text = text;
        next
    }
}
