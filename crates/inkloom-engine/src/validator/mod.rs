//! Validator (spec.md §4.4): an ordered ruleset, each rule returning
//! `{pass, sanitized, fail}` with a severity. Stops on first critical
//! failure; otherwise collects every result.

mod rules;

use std::time::Instant;

use inkloom_domain::{
    BranchProposal, RuleCategory, RuleResult, Sanitization, Severity, ValidationReport,
};
use inkloom_ports::EmbeddingPort;

pub use rules::{ValidationContext, ValidationRule};

/// Ordered list of the eight canonical rules from spec.md §4.4. Order
/// matters: cheap structural/textual checks run before the story-aware
/// return-path check, and the optional embedding-gated check runs last.
pub fn default_ruleset() -> Vec<Box<dyn ValidationRule>> {
    vec![
        Box::new(rules::ProfanityFilter::default()),
        Box::new(rules::ExplicitContentFilter::default()),
        Box::new(rules::SchemaCheck),
        Box::new(rules::LengthLimit),
        Box::new(rules::MarkupStrip::default()),
        Box::new(rules::NarrativeSyntaxValidation),
        Box::new(rules::ReturnPathExistence),
        Box::new(rules::CharacterVoiceConsistency),
    ]
}

pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
    enabled_rule_ids: Vec<String>,
    max_length_tokens: u32,
}

impl Validator {
    pub fn new(rules: Vec<Box<dyn ValidationRule>>, enabled_rule_ids: Vec<String>, max_length_tokens: u32) -> Self {
        Self {
            rules,
            enabled_rule_ids,
            max_length_tokens,
        }
    }

    /// Run the ordered ruleset over `proposal`. Returns the `ValidationReport`
    /// and the (possibly sanitized) working copy of the proposal — the
    /// "canonical `sanitized_proposal`" the Director consumes (spec.md §4.4).
    pub async fn run(
        &self,
        proposal: &BranchProposal,
        valid_return_paths: &[String],
        embedding_port: Option<&dyn EmbeddingPort>,
    ) -> (ValidationReport, BranchProposal) {
        let overall_start = Instant::now();
        let ctx = ValidationContext {
            valid_return_paths,
            max_length_tokens: self.max_length_tokens,
            embedding_port,
        };

        let mut working = proposal.clone();
        let mut rule_results = Vec::new();
        let mut sanitizations_applied = Vec::new();

        for rule in &self.rules {
            if !self.enabled_rule_ids.is_empty() && !self.enabled_rule_ids.iter().any(|id| id == rule.rule_id()) {
                continue;
            }

            let rule_start = Instant::now();
            let outcome = rule.apply(&mut working, &ctx).await;
            let execution_ms = rule_start.elapsed().as_millis() as u64;

            if outcome.outcome == inkloom_domain::RuleOutcome::Sanitized {
                sanitizations_applied.push(Sanitization {
                    rule_id: rule.rule_id().to_string(),
                    description: outcome.message.clone(),
                });
            }

            let is_critical_failure =
                outcome.outcome == inkloom_domain::RuleOutcome::Fail && rule.severity() == Severity::Critical;

            rule_results.push(RuleResult {
                rule_id: rule.rule_id().to_string(),
                category: rule.category(),
                severity: rule.severity(),
                outcome: outcome.outcome,
                message: outcome.message,
                execution_ms,
            });

            if is_critical_failure {
                break;
            }
        }

        let status = ValidationReport::derive_status(&rule_results, &sanitizations_applied);
        let report = ValidationReport {
            proposal_id: proposal.id,
            status,
            rule_results,
            sanitizations_applied,
            risk_score: None,
            total_validation_ms: overall_start.elapsed().as_millis() as u64,
        };

        (report, working)
    }
}

/// Fixed vocabulary of rule categories a caller might want to silence
/// (not used by the default ruleset, but kept so `ValidatorConfig::enabled_rules`
/// has somewhere obvious to map string ids from config onto).
pub fn category_for_rule_id(rule_id: &str) -> Option<RuleCategory> {
    match rule_id {
        "profanity" => Some(RuleCategory::Profanity),
        "explicit_content" => Some(RuleCategory::ExplicitContent),
        "schema" => Some(RuleCategory::Schema),
        "length" => Some(RuleCategory::Length),
        "markup_strip" => Some(RuleCategory::Markup),
        "narrative_syntax" => Some(RuleCategory::NarrativeSyntax),
        "return_path" => Some(RuleCategory::ReturnPath),
        "character_voice" => Some(RuleCategory::CharacterVoice),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use inkloom_domain::{
        BranchType, DeterminismLevel, ProposalConstraints, ProposalContent, ProposalMetadata, StoryContextRef,
        VersionInfo,
    };
    use uuid::Uuid;

    fn proposal(text: &str, return_path: &str) -> BranchProposal {
        BranchProposal {
            id: Uuid::new_v4(),
            metadata: ProposalMetadata {
                created_at: Utc::now(),
                model: "test".into(),
                model_version: "1".into(),
                seed: None,
                context_hash: "h".into(),
                confidence_score: 0.8,
                generation_time_ms: 1,
                determinism_level: DeterminismLevel::High,
            },
            story_context: StoryContextRef {
                current_scene: "campfire".into(),
                context_type: "dialogue".into(),
            },
            content: ProposalContent {
                branch_type: BranchType::InkFragment,
                text: text.to_string(),
                character_voice: None,
                length_tokens: None,
                tags: vec![],
                return_path: return_path.to_string(),
                return_path_confidence: None,
            },
            constraints: ProposalConstraints::default(),
            version_info: VersionInfo {
                input_hash: "h".into(),
                llm_seed: None,
                creativity: 0.5,
            },
        }
    }

    /// spec.md §8 "Validator ordering": a critical failure is reported
    /// even though later rules never ran, and every rule that *did* run
    /// keeps its invocation order in the report.
    #[tokio::test]
    async fn critical_failure_stops_later_rules_but_preserves_order_of_those_that_ran() {
        let validator = Validator::new(default_ruleset(), vec![], 250);
        let paths = vec!["campfire".to_string()];
        // schema is rule #3; return_path (rule #7) never runs because
        // schema never fails here -- use an empty text to trip schema
        // (rule 3, critical) instead, so profanity/explicit_content (1,2)
        // still ran first and are present in order.
        let p = proposal("   ", "campfire");

        let (report, _) = validator.run(&p, &paths, None).await;
        assert_eq!(report.status, inkloom_domain::ValidationStatus::Failed);
        let ids: Vec<&str> = report.rule_results.iter().map(|r| r.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["profanity", "explicit_content", "schema"]);
        assert_eq!(report.rule_results.last().unwrap().rule_id, "schema");
    }

    /// spec.md §8 "Sanitizer idempotence": running the validator again on
    /// its own `sanitized_proposal` yields `passed` with no further
    /// sanitizations.
    #[tokio::test]
    async fn running_the_validator_twice_on_its_own_output_is_idempotent() {
        let validator = Validator::new(default_ruleset(), vec![], 250);
        let paths = vec!["campfire".to_string()];
        let dirty = proposal("well, damn, <b>that's</b> unexpected", "campfire");

        let (first_report, sanitized) = validator.run(&dirty, &paths, None).await;
        assert!(!first_report.sanitizations_applied.is_empty());

        let (second_report, _) = validator.run(&sanitized, &paths, None).await;
        assert_eq!(second_report.status, inkloom_domain::ValidationStatus::Passed);
        assert!(second_report.sanitizations_applied.is_empty());
    }
}
