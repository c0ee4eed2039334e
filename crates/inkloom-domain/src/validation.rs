//! Validation Report — the Validator's ordered ruleset output (spec.md
//! §3, §4.4).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Passed,
    RejectedWithSanitization,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    NonCritical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOutcome {
    Pass,
    Sanitized,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    Profanity,
    ExplicitContent,
    Schema,
    Length,
    Markup,
    NarrativeSyntax,
    ReturnPath,
    CharacterVoice,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RuleResult {
    pub rule_id: String,
    pub category: RuleCategory,
    pub severity: Severity,
    pub outcome: RuleOutcome,
    pub message: String,
    pub execution_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Sanitization {
    pub rule_id: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ValidationReport {
    pub proposal_id: Uuid,
    pub status: ValidationStatus,
    pub rule_results: Vec<RuleResult>,
    pub sanitizations_applied: Vec<Sanitization>,
    /// `None` until the Director fills it in; spec.md §3 calls this field
    /// a "placeholder for Director".
    pub risk_score: Option<f32>,
    pub total_validation_ms: u64,
}

impl ValidationReport {
    /// Status derivation rule from spec.md §4.4: `failed` iff any
    /// critical rule failed; otherwise `rejected_with_sanitization` if at
    /// least one sanitization applied, else `passed`.
    pub fn derive_status(rule_results: &[RuleResult], sanitizations_applied: &[Sanitization]) -> ValidationStatus {
        let any_critical_failed = rule_results
            .iter()
            .any(|r| r.severity == Severity::Critical && r.outcome == RuleOutcome::Fail);
        if any_critical_failed {
            ValidationStatus::Failed
        } else if !sanitizations_applied.is_empty() {
            ValidationStatus::RejectedWithSanitization
        } else {
            ValidationStatus::Passed
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == ValidationStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(outcome: RuleOutcome, severity: Severity) -> RuleResult {
        RuleResult {
            rule_id: "r".into(),
            category: RuleCategory::Profanity,
            severity,
            outcome,
            message: String::new(),
            execution_ms: 0,
        }
    }

    #[test]
    fn critical_failure_wins_over_sanitization() {
        let results = vec![
            rule(RuleOutcome::Sanitized, Severity::NonCritical),
            rule(RuleOutcome::Fail, Severity::Critical),
        ];
        let sanitizations = vec![Sanitization {
            rule_id: "r".into(),
            description: "x".into(),
        }];
        assert_eq!(
            ValidationReport::derive_status(&results, &sanitizations),
            ValidationStatus::Failed
        );
    }

    #[test]
    fn sanitization_without_critical_failure_is_rejected_with_sanitization() {
        let results = vec![rule(RuleOutcome::Sanitized, Severity::NonCritical)];
        let sanitizations = vec![Sanitization {
            rule_id: "r".into(),
            description: "x".into(),
        }];
        assert_eq!(
            ValidationReport::derive_status(&results, &sanitizations),
            ValidationStatus::RejectedWithSanitization
        );
    }

    #[test]
    fn clean_pass_is_passed() {
        let results = vec![rule(RuleOutcome::Pass, Severity::Critical)];
        assert_eq!(ValidationReport::derive_status(&results, &[]), ValidationStatus::Passed);
    }
}
