//! Director Decision — the risk-scored approve/reject verdict (spec.md
//! §3, §4.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Approve,
    Reject,
}

/// The six weighted risk components from spec.md §4.5, each in `[0,1]`
/// where higher means riskier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RiskMetrics {
    pub thematic_consistency: f32,
    pub lore_adherence: f32,
    pub character_voice: f32,
    pub narrative_pacing: f32,
    pub player_preference_fit: f32,
    pub proposal_confidence: f32,
}

impl RiskMetrics {
    pub fn clamp(&mut self) {
        self.thematic_consistency = self.thematic_consistency.clamp(0.0, 1.0);
        self.lore_adherence = self.lore_adherence.clamp(0.0, 1.0);
        self.character_voice = self.character_voice.clamp(0.0, 1.0);
        self.narrative_pacing = self.narrative_pacing.clamp(0.0, 1.0);
        self.player_preference_fit = self.player_preference_fit.clamp(0.0, 1.0);
        self.proposal_confidence = self.proposal_confidence.clamp(0.0, 1.0);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReturnPathCheck {
    pub feasible: bool,
    pub confidence: f32,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DirectorDecision {
    pub proposal_id: Uuid,
    pub decision: DecisionOutcome,
    pub reason: String,
    pub risk_score: f32,
    pub risk_metrics: RiskMetrics,
    pub return_path: ReturnPathCheck,
    pub latency_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl DirectorDecision {
    pub fn is_approved(&self) -> bool {
        self.decision == DecisionOutcome::Approve
    }
}
