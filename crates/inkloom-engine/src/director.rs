//! Director (spec.md §4.5): risk scoring, return-path feasibility, and
//! the approve/reject decision, all within a hard latency budget.
//!
//! Telemetry is the orchestrator's job (it owns the bounded
//! `TelemetryEmitter`), so `Director::decide` stays a pure, awaitable
//! function of its inputs plus one `StoryPort` query for return-path
//! feasibility — no buffering or backend concerns live here.

use std::time::{Duration, Instant};

use inkloom_domain::{
    BranchProposal, DecisionOutcome, DirectorConfig, DirectorDecision, PlayerPreferenceStore, RiskMetrics,
    RiskWeights, ReturnPathCheck, ValidationReport,
};
use inkloom_ports::StoryPort;

pub struct Director {
    config: DirectorConfig,
}

impl Director {
    pub fn new(config: DirectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    /// Produce a `DirectorDecision` for `proposal`, racing the full
    /// scoring + return-path-feasibility pipeline against
    /// `directorConfig.decision_timeout_ms`. Exceeding the budget forces
    /// a reject-with-reason rather than blocking the choice point
    /// indefinitely (spec.md §5).
    pub async fn decide(
        &self,
        proposal: &BranchProposal,
        validation: &ValidationReport,
        story: &dyn StoryPort,
        preferences: &PlayerPreferenceStore,
    ) -> DirectorDecision {
        let start = Instant::now();
        let budget = Duration::from_millis(self.config.decision_timeout_ms);

        match tokio::time::timeout(budget, self.decide_inner(proposal, validation, story, preferences)).await {
            Ok(decision) => decision,
            Err(_) => DirectorDecision {
                proposal_id: proposal.id,
                decision: DecisionOutcome::Reject,
                reason: format!("director exceeded its {}ms latency budget", self.config.decision_timeout_ms),
                risk_score: 1.0,
                risk_metrics: placeholder_metrics(self.config.placeholder_default),
                return_path: ReturnPathCheck {
                    feasible: false,
                    confidence: 0.0,
                    reason: "latency budget exceeded before return-path check ran".to_string(),
                },
                latency_ms: start.elapsed().as_millis() as u64,
                timestamp: chrono::Utc::now(),
            },
        }
    }

    async fn decide_inner(
        &self,
        proposal: &BranchProposal,
        validation: &ValidationReport,
        story: &dyn StoryPort,
        preferences: &PlayerPreferenceStore,
    ) -> DirectorDecision {
        let start = Instant::now();

        if validation.is_failed() {
            return DirectorDecision {
                proposal_id: proposal.id,
                decision: DecisionOutcome::Reject,
                reason: "validation pipeline reported failed status".to_string(),
                risk_score: 1.0,
                risk_metrics: placeholder_metrics(self.config.placeholder_default),
                return_path: ReturnPathCheck {
                    feasible: false,
                    confidence: 0.0,
                    reason: "skipped: proposal already failed validation".to_string(),
                },
                latency_ms: start.elapsed().as_millis() as u64,
                timestamp: chrono::Utc::now(),
            };
        }

        let return_path = check_return_path(proposal, story).await;
        let metrics = self.compute_metrics(proposal, validation, preferences, &return_path);
        let risk_score = compute_risk_score(&metrics, &self.config.weights);

        let approve = risk_score <= self.config.risk_threshold
            && return_path.feasible
            && return_path.confidence >= self.config.min_return_confidence;

        let reason = if approve {
            format!("risk {risk_score:.3} within threshold {:.3} and return path feasible", self.config.risk_threshold)
        } else if !return_path.feasible {
            format!("return path infeasible: {}", return_path.reason)
        } else if return_path.confidence < self.config.min_return_confidence {
            format!(
                "return path confidence {:.3} below minimum {:.3}",
                return_path.confidence, self.config.min_return_confidence
            )
        } else {
            format!("risk {risk_score:.3} exceeds threshold {:.3}", self.config.risk_threshold)
        };

        DirectorDecision {
            proposal_id: proposal.id,
            decision: if approve { DecisionOutcome::Approve } else { DecisionOutcome::Reject },
            reason,
            risk_score,
            risk_metrics: metrics,
            return_path,
            latency_ms: start.elapsed().as_millis() as u64,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Six risk components in `[0,1]` (spec.md §4.5). `thematic_consistency`
    /// and `lore_adherence` have no embedding pipeline behind them in this
    /// core and always degrade to `placeholder_default` (DESIGN.md Open
    /// Question 1). `character_voice` reads the Validator's character-voice
    /// rule result when it ran; `narrative_pacing` is a real computed
    /// metric against `pacingTargets`; `player_preference_fit` reads the
    /// running EMA; `proposal_confidence` is the inverse of the Writer's
    /// reported confidence.
    fn compute_metrics(
        &self,
        proposal: &BranchProposal,
        validation: &ValidationReport,
        preferences: &PlayerPreferenceStore,
        return_path: &ReturnPathCheck,
    ) -> RiskMetrics {
        let _ = return_path;
        let placeholder = self.config.placeholder_default;

        let character_voice = character_voice_risk(proposal, validation, placeholder);
        let narrative_pacing = pacing_risk(
            proposal,
            &self.config.pacing_targets,
            self.config.pacing_tolerance_factor,
        );
        let player_preference_fit = 1.0 - preferences.get(proposal.content.branch_type);
        let proposal_confidence = 1.0 - proposal.metadata.confidence_score;

        let mut metrics = RiskMetrics {
            thematic_consistency: placeholder,
            lore_adherence: placeholder,
            character_voice,
            narrative_pacing,
            player_preference_fit,
            proposal_confidence,
        };
        metrics.clamp();
        metrics
    }
}

fn placeholder_metrics(placeholder: f32) -> RiskMetrics {
    let mut metrics = RiskMetrics {
        thematic_consistency: placeholder,
        lore_adherence: placeholder,
        character_voice: placeholder,
        narrative_pacing: placeholder,
        player_preference_fit: placeholder,
        proposal_confidence: placeholder,
    };
    metrics.clamp();
    metrics
}

fn character_voice_risk(proposal: &BranchProposal, validation: &ValidationReport, placeholder: f32) -> f32 {
    if proposal.content.character_voice.is_none() {
        return placeholder;
    }
    let rule = validation.rule_results.iter().find(|r| r.rule_id == "character_voice");
    match rule.map(|r| r.outcome) {
        Some(inkloom_domain::RuleOutcome::Fail) => 0.8,
        Some(inkloom_domain::RuleOutcome::Pass) => 0.2,
        Some(inkloom_domain::RuleOutcome::Sanitized) => 0.4,
        None => placeholder,
    }
}

fn pacing_risk(proposal: &BranchProposal, pacing_targets: &std::collections::BTreeMap<String, u32>, tolerance_factor: f32) -> f32 {
    let phase = proposal.story_context.context_type.as_str();
    let Some(&target) = pacing_targets.get(phase) else {
        return 0.0;
    };
    let target = (target.max(1)) as f32;
    let actual = proposal.content.text.chars().count() as f32;
    let deviation = (actual - target).abs() / target;
    let tolerance = tolerance_factor.max(0.01);
    (deviation / tolerance).clamp(0.0, 1.0)
}

/// Weighted sum over the six risk components. Pure and deterministic:
/// for fixed `metrics`/`weights`, byte-identical across invocations
/// (spec.md §8's determinism-of-risk-scoring property).
pub fn compute_risk_score(metrics: &RiskMetrics, weights: &RiskWeights) -> f32 {
    let score = metrics.thematic_consistency * weights.thematic_consistency
        + metrics.lore_adherence * weights.lore_adherence
        + metrics.character_voice * weights.character_voice
        + metrics.narrative_pacing * weights.narrative_pacing
        + metrics.player_preference_fit * weights.player_preference_fit
        + metrics.proposal_confidence * weights.proposal_confidence;
    score.clamp(0.0, 1.0)
}

async fn check_return_path(proposal: &BranchProposal, story: &dyn StoryPort) -> ReturnPathCheck {
    let target = proposal.content.return_path.trim();

    if story.is_terminal(target) {
        return ReturnPathCheck {
            feasible: false,
            confidence: 0.0,
            reason: format!("{target} is a terminal node"),
        };
    }

    match story.all_knots() {
        Some(knots) => {
            if !knots.iter().any(|k| k == target) {
                return ReturnPathCheck {
                    feasible: false,
                    confidence: 0.0,
                    reason: format!("{target} does not exist in the authored graph"),
                };
            }
            // DESIGN.md Open Question 2: node-existence approximation, not
            // full graph distance. Confidence is derived from how
            // specifically the target resolves, not from a path length.
            let confidence = match story.stitches_of(target) {
                Some(stitches) if !stitches.is_empty() => 0.95,
                _ => 0.85,
            };
            ReturnPathCheck {
                feasible: true,
                confidence,
                reason: "resolved via the interpreter's enumerated knot list".to_string(),
            }
        }
        None => ReturnPathCheck {
            feasible: true,
            confidence: 0.6,
            reason: "approximated via configured whitelist; interpreter has no enumeration API".to_string(),
        },
    }
}
