//! The eight canonical validation rules (spec.md §4.4).
//!
//! Each rule is a small, independently testable `ValidationRule`
//! implementation. Ordering of the `default_ruleset()` vec in `mod.rs`
//! is what encodes the spec's numbered rule list — this module only
//! defines the rules themselves.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use inkloom_domain::{BranchProposal, BranchType, RuleCategory, RuleOutcome, Severity};
use inkloom_ports::EmbeddingPort;

pub struct ValidationContext<'a> {
    pub valid_return_paths: &'a [String],
    pub max_length_tokens: u32,
    pub embedding_port: Option<&'a dyn EmbeddingPort>,
}

pub struct RuleApplyOutcome {
    pub outcome: RuleOutcome,
    pub message: String,
}

impl RuleApplyOutcome {
    fn pass(message: impl Into<String>) -> Self {
        Self {
            outcome: RuleOutcome::Pass,
            message: message.into(),
        }
    }

    fn sanitized(message: impl Into<String>) -> Self {
        Self {
            outcome: RuleOutcome::Sanitized,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            outcome: RuleOutcome::Fail,
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait ValidationRule: Send + Sync {
    fn rule_id(&self) -> &'static str;
    fn category(&self) -> RuleCategory;
    fn severity(&self) -> Severity;
    async fn apply(&self, proposal: &mut BranchProposal, ctx: &ValidationContext<'_>) -> RuleApplyOutcome;
}

/// 1. Profanity filter — word-boundary blocklist, case-insensitive.
/// Non-critical: sanitizes by replacing the matched word with
/// `[expletive]` rather than rejecting the whole proposal.
pub struct ProfanityFilter {
    pattern: Regex,
}

static DEFAULT_PROFANITY_WORDS: &[&str] = &["damn", "hell", "crap", "bastard"];

fn word_boundary_pattern(words: &[&str]) -> Regex {
    let joined = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{joined})\b")).expect("static word list compiles")
}

impl Default for ProfanityFilter {
    fn default() -> Self {
        Self {
            pattern: word_boundary_pattern(DEFAULT_PROFANITY_WORDS),
        }
    }
}

#[async_trait]
impl ValidationRule for ProfanityFilter {
    fn rule_id(&self) -> &'static str {
        "profanity"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Profanity
    }

    fn severity(&self) -> Severity {
        Severity::NonCritical
    }

    async fn apply(&self, proposal: &mut BranchProposal, _ctx: &ValidationContext<'_>) -> RuleApplyOutcome {
        if !self.pattern.is_match(&proposal.content.text) {
            return RuleApplyOutcome::pass("no blocklisted terms found");
        }
        let sanitized = self.pattern.replace_all(&proposal.content.text, "[expletive]");
        proposal.content.text = sanitized.into_owned();
        RuleApplyOutcome::sanitized("replaced blocklisted term(s) with [expletive]")
    }
}

/// 2. Explicit-content filter — category keyword/phrase match. Critical:
/// a hit fails the whole proposal rather than attempting a sanitization
/// that could still leave disallowed content legible.
pub struct ExplicitContentFilter {
    pattern: Regex,
}

static EXPLICIT_CONTENT_PHRASES: &[&str] = &["graphic gore", "sexual assault", "explicit sex"];

impl Default for ExplicitContentFilter {
    fn default() -> Self {
        let joined = EXPLICIT_CONTENT_PHRASES
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        Self {
            pattern: Regex::new(&format!(r"(?i){joined}")).expect("static phrase list compiles"),
        }
    }
}

#[async_trait]
impl ValidationRule for ExplicitContentFilter {
    fn rule_id(&self) -> &'static str {
        "explicit_content"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::ExplicitContent
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    async fn apply(&self, proposal: &mut BranchProposal, _ctx: &ValidationContext<'_>) -> RuleApplyOutcome {
        if self.pattern.is_match(&proposal.content.text) {
            RuleApplyOutcome::fail("matched a disallowed explicit-content phrase")
        } else {
            RuleApplyOutcome::pass("no disallowed explicit-content phrase found")
        }
    }
}

/// 3. Schema check — structural conformance to the Proposal schema.
pub struct SchemaCheck;

#[async_trait]
impl ValidationRule for SchemaCheck {
    fn rule_id(&self) -> &'static str {
        "schema"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Schema
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    async fn apply(&self, proposal: &mut BranchProposal, _ctx: &ValidationContext<'_>) -> RuleApplyOutcome {
        match proposal.validate_invariants() {
            Ok(()) => RuleApplyOutcome::pass("schema conforms"),
            Err(err) => RuleApplyOutcome::fail(format!("schema violation: {err}")),
        }
    }
}

/// 4. Length limits — per-branch-type token budget. Sanitizes by
/// truncating at the last complete sentence at-or-before the budget.
pub struct LengthLimit;

fn approx_token_count(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

fn truncate_at_last_sentence(text: &str, max_tokens: u32) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let budget = words.iter().take(max_tokens as usize).cloned().collect::<Vec<_>>().join(" ");
    match budget.rfind(['.', '!', '?']) {
        Some(idx) => budget[..=idx].to_string(),
        None => budget,
    }
}

#[async_trait]
impl ValidationRule for LengthLimit {
    fn rule_id(&self) -> &'static str {
        "length"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Length
    }

    fn severity(&self) -> Severity {
        Severity::NonCritical
    }

    async fn apply(&self, proposal: &mut BranchProposal, ctx: &ValidationContext<'_>) -> RuleApplyOutcome {
        let budget = proposal
            .constraints
            .max_length
            .unwrap_or(ctx.max_length_tokens);
        let current = approx_token_count(&proposal.content.text);
        if current <= budget {
            return RuleApplyOutcome::pass(format!("{current} tokens within budget of {budget}"));
        }
        let truncated = truncate_at_last_sentence(&proposal.content.text, budget);
        if truncated.is_empty() {
            proposal.content.text = proposal.content.text.split_whitespace().take(budget as usize).collect::<Vec<_>>().join(" ");
        } else {
            proposal.content.text = truncated;
        }
        RuleApplyOutcome::sanitized(format!("truncated from {current} to budget {budget} tokens at last sentence boundary"))
    }
}

/// 5. Markup strip — removes authored-only markup (HTML-like tags and
/// doubled-brace template markers) and collapses 3+ consecutive newlines.
pub struct MarkupStrip {
    tag_pattern: Regex,
    brace_pattern: Regex,
    newline_pattern: Regex,
}

impl Default for MarkupStrip {
    fn default() -> Self {
        Self {
            tag_pattern: Regex::new(r"<[^>]*>").expect("static pattern compiles"),
            brace_pattern: Regex::new(r"\{\{[^}]*\}\}").expect("static pattern compiles"),
            newline_pattern: Regex::new(r"\n{3,}").expect("static pattern compiles"),
        }
    }
}

#[async_trait]
impl ValidationRule for MarkupStrip {
    fn rule_id(&self) -> &'static str {
        "markup_strip"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Markup
    }

    fn severity(&self) -> Severity {
        Severity::NonCritical
    }

    async fn apply(&self, proposal: &mut BranchProposal, _ctx: &ValidationContext<'_>) -> RuleApplyOutcome {
        let original = proposal.content.text.clone();
        let mut text = self.tag_pattern.replace_all(&original, "").into_owned();
        text = self.brace_pattern.replace_all(&text, "").into_owned();
        text = self.newline_pattern.replace_all(&text, "\n\n").into_owned();

        if text == original {
            RuleApplyOutcome::pass("no authored-only markup present")
        } else {
            proposal.content.text = text;
            RuleApplyOutcome::sanitized("stripped authored-only markup and collapsed blank lines")
        }
    }
}

/// 6. Narrative-syntax validation — `text` must parse as a valid
/// fragment/knot in the target authored-story grammar. A simplified,
/// dependency-free Ink-shaped check: braces/diverts must balance, and a
/// knot header (`== name ==`) is only legal when `branch_type` is
/// `ink_knot`.
pub struct NarrativeSyntaxValidation;

fn balanced(text: &str, open: char, close: char) -> bool {
    let mut depth: i32 = 0;
    for c in text.chars() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth < 0 {
                return false;
            }
        }
    }
    depth == 0
}

static KNOT_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*==+\s*\S+\s*==+\s*$").expect("static pattern compiles"));

#[async_trait]
impl ValidationRule for NarrativeSyntaxValidation {
    fn rule_id(&self) -> &'static str {
        "narrative_syntax"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::NarrativeSyntax
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    async fn apply(&self, proposal: &mut BranchProposal, _ctx: &ValidationContext<'_>) -> RuleApplyOutcome {
        let text = &proposal.content.text;

        if !balanced(text, '{', '}') {
            return RuleApplyOutcome::fail("unbalanced `{`/`}` in narrative text");
        }
        if !balanced(text, '[', ']') {
            return RuleApplyOutcome::fail("unbalanced `[`/`]` choice markup in narrative text");
        }

        let has_knot_header = KNOT_HEADER.is_match(text);
        if has_knot_header && proposal.content.branch_type != BranchType::InkKnot {
            return RuleApplyOutcome::fail("knot header present but branch_type is not ink_knot");
        }

        RuleApplyOutcome::pass("parses as a valid fragment/knot for the declared branch_type")
    }
}

/// 7. Return-path existence — `return_path` must resolve to a known,
/// non-terminal knot. Critical: an approved branch with no way back to
/// the authored graph is never safe to inject.
pub struct ReturnPathExistence;

#[async_trait]
impl ValidationRule for ReturnPathExistence {
    fn rule_id(&self) -> &'static str {
        "return_path"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::ReturnPath
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    async fn apply(&self, proposal: &mut BranchProposal, ctx: &ValidationContext<'_>) -> RuleApplyOutcome {
        let path = proposal.content.return_path.trim();
        if ctx.valid_return_paths.iter().any(|p| p == path) {
            RuleApplyOutcome::pass("return_path resolves to a known non-terminal knot")
        } else {
            RuleApplyOutcome::fail(format!("return_path \"{path}\" does not exist in the authored graph"))
        }
    }
}

/// 8. Character-voice consistency (optional, embedding-gated). Best
/// effort: degrades to `pass` whenever there's no voice claim to check
/// or no embedding backend configured.
pub struct CharacterVoiceConsistency;

const VOICE_SIMILARITY_FLOOR: f32 = 0.15;

#[async_trait]
impl ValidationRule for CharacterVoiceConsistency {
    fn rule_id(&self) -> &'static str {
        "character_voice"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::CharacterVoice
    }

    fn severity(&self) -> Severity {
        Severity::NonCritical
    }

    async fn apply(&self, proposal: &mut BranchProposal, ctx: &ValidationContext<'_>) -> RuleApplyOutcome {
        let Some(voice) = proposal.content.character_voice.as_deref() else {
            return RuleApplyOutcome::pass("no character_voice claim to check");
        };
        let Some(embedding_port) = ctx.embedding_port else {
            return RuleApplyOutcome::pass("no embedding backend configured, degrading to pass");
        };

        let voice_embedding = embedding_port.embed(voice).await;
        let text_embedding = embedding_port.embed(&proposal.content.text).await;
        match (voice_embedding, text_embedding) {
            (Ok(v), Ok(t)) => {
                let similarity = inkloom_ports::cosine_similarity(&v, &t);
                if similarity < VOICE_SIMILARITY_FLOOR {
                    RuleApplyOutcome::fail(format!(
                        "text embedding diverges from declared voice \"{voice}\" (similarity {similarity:.3})"
                    ))
                } else {
                    RuleApplyOutcome::pass(format!("voice consistency similarity {similarity:.3}"))
                }
            }
            _ => RuleApplyOutcome::pass("embedding backend errored, degrading to pass"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use inkloom_domain::{DeterminismLevel, ProposalConstraints, ProposalContent, ProposalMetadata, StoryContextRef, VersionInfo};

    fn sample(text: &str, return_path: &str, branch_type: BranchType) -> BranchProposal {
        BranchProposal {
            id: Uuid::new_v4(),
            metadata: ProposalMetadata {
                created_at: Utc::now(),
                model: "test".into(),
                model_version: "1".into(),
                seed: None,
                context_hash: "h".into(),
                confidence_score: 0.8,
                generation_time_ms: 5,
                determinism_level: DeterminismLevel::High,
            },
            story_context: StoryContextRef {
                current_scene: "campfire".into(),
                context_type: "dialogue".into(),
            },
            content: ProposalContent {
                branch_type,
                text: text.to_string(),
                character_voice: None,
                length_tokens: None,
                tags: vec![],
                return_path: return_path.to_string(),
                return_path_confidence: Some(0.9),
            },
            constraints: ProposalConstraints::default(),
            version_info: VersionInfo {
                input_hash: "h".into(),
                llm_seed: None,
                creativity: 0.5,
            },
        }
    }

    fn ctx(paths: &[String]) -> ValidationContext<'_> {
        ValidationContext {
            valid_return_paths: paths,
            max_length_tokens: 10,
            embedding_port: None,
        }
    }

    #[tokio::test]
    async fn profanity_filter_sanitizes_blocklisted_words() {
        let mut p = sample("well, damn, that's unexpected", "campfire", BranchType::InkFragment);
        let paths = vec!["campfire".to_string()];
        let outcome = ProfanityFilter::default().apply(&mut p, &ctx(&paths)).await;
        assert_eq!(outcome.outcome, RuleOutcome::Sanitized);
        assert!(p.content.text.contains("[expletive]"));
    }

    #[tokio::test]
    async fn explicit_content_filter_fails_on_hit() {
        let mut p = sample("a scene of graphic gore", "campfire", BranchType::InkFragment);
        let paths = vec!["campfire".to_string()];
        let outcome = ExplicitContentFilter::default().apply(&mut p, &ctx(&paths)).await;
        assert_eq!(outcome.outcome, RuleOutcome::Fail);
    }

    #[tokio::test]
    async fn length_limit_truncates_at_sentence_boundary() {
        let mut p = sample(
            "One. Two. Three. Four. Five. Six. Seven. Eight. Nine. Ten. Eleven.",
            "campfire",
            BranchType::InkFragment,
        );
        let paths = vec!["campfire".to_string()];
        let outcome = LengthLimit.apply(&mut p, &ctx(&paths)).await;
        assert_eq!(outcome.outcome, RuleOutcome::Sanitized);
        assert!(p.content.text.ends_with('.'));
    }

    #[tokio::test]
    async fn markup_strip_collapses_blank_lines_and_removes_tags() {
        let mut p = sample("Hello <b>world</b>\n\n\n\nmore", "campfire", BranchType::InkFragment);
        let paths = vec!["campfire".to_string()];
        let outcome = MarkupStrip::default().apply(&mut p, &ctx(&paths)).await;
        assert_eq!(outcome.outcome, RuleOutcome::Sanitized);
        assert!(!p.content.text.contains('<'));
        assert!(!p.content.text.contains("\n\n\n"));
    }

    #[tokio::test]
    async fn narrative_syntax_rejects_unbalanced_braces() {
        let mut p = sample("a {broken conditional", "campfire", BranchType::InkFragment);
        let paths = vec!["campfire".to_string()];
        let outcome = NarrativeSyntaxValidation.apply(&mut p, &ctx(&paths)).await;
        assert_eq!(outcome.outcome, RuleOutcome::Fail);
    }

    #[tokio::test]
    async fn narrative_syntax_rejects_knot_header_outside_knot_branch_type() {
        let mut p = sample("== some_knot ==\ntext", "campfire", BranchType::InkFragment);
        let paths = vec!["campfire".to_string()];
        let outcome = NarrativeSyntaxValidation.apply(&mut p, &ctx(&paths)).await;
        assert_eq!(outcome.outcome, RuleOutcome::Fail);
    }

    #[tokio::test]
    async fn return_path_existence_fails_for_unknown_target() {
        let mut p = sample("Short", "nonexistent_knot_xyz", BranchType::InkFragment);
        let paths = vec!["campfire".to_string()];
        let outcome = ReturnPathExistence.apply(&mut p, &ctx(&paths)).await;
        assert_eq!(outcome.outcome, RuleOutcome::Fail);
        assert!(outcome.message.contains("does not exist"));
    }

    #[tokio::test]
    async fn return_path_existence_passes_for_known_target() {
        let mut p = sample("Short", "campfire", BranchType::InkFragment);
        let paths = vec!["campfire".to_string()];
        let outcome = ReturnPathExistence.apply(&mut p, &ctx(&paths)).await;
        assert_eq!(outcome.outcome, RuleOutcome::Pass);
    }

    #[tokio::test]
    async fn character_voice_consistency_passes_without_embedding_backend() {
        let mut p = sample("Short", "campfire", BranchType::InkFragment);
        p.content.character_voice = Some("Gruff Blacksmith".to_string());
        let paths = vec!["campfire".to_string()];
        let outcome = CharacterVoiceConsistency.apply(&mut p, &ctx(&paths)).await;
        assert_eq!(outcome.outcome, RuleOutcome::Pass);
    }
}
