//! Writer (spec.md §1, §4.3): turns a LORE snapshot into a candidate
//! `BranchProposal` by rendering a prompt, calling the `LlmPort`, and
//! parsing the response. Seed derivation and the multi-sample
//! consensus rule for non-seeded endpoints (DESIGN.md Open Question 3)
//! live here rather than in the transport-only `LlmPort` adapter.

use std::time::Instant;

use chrono::{DateTime, Utc};
use inkloom_domain::{
    BranchProposal, BranchType, DeterminismLevel, ProposalConstraints, ProposalContent, ProposalMetadata, Lore,
    StoryContextRef, VersionInfo,
};
use inkloom_ports::{LlmPort, LlmTransportError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::prompt::PromptEngine;

#[derive(Debug, Deserialize)]
struct RawProposalJson {
    branch_type: BranchType,
    text: String,
    character_voice: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    return_path: String,
    confidence: f32,
}

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("static pattern compiles"));

/// Three-tier parsing fallback from spec.md §4.3: strict JSON, then a
/// fenced code block's contents, then the first balanced `{...}`
/// substring.
fn parse_raw_proposal(text: &str) -> Option<RawProposalJson> {
    if let Ok(parsed) = serde_json::from_str::<RawProposalJson>(text) {
        return Some(parsed);
    }
    if let Some(captures) = FENCED_BLOCK.captures(text) {
        if let Ok(parsed) = serde_json::from_str::<RawProposalJson>(captures[1].trim()) {
            return Some(parsed);
        }
    }
    if let Some(candidate) = first_balanced_object(text) {
        if let Ok(parsed) = serde_json::from_str::<RawProposalJson>(&candidate) {
            return Some(parsed);
        }
    }
    None
}

fn first_balanced_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0i32;
    for (offset, c) in text[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + offset + 1].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// `SHA256(input_hash || creativity || model_id) mod 2^31` (spec.md
/// §4.3): identical inputs always derive the identical sampling seed.
pub fn derive_seed(input_hash: &str, creativity: f32, model_id: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(input_hash.as_bytes());
    hasher.update(creativity.to_be_bytes());
    hasher.update(model_id.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes) % (1u64 << 31)
}

pub struct Writer<'a> {
    prompt_engine: &'a PromptEngine,
    llm: &'a dyn LlmPort,
    model_id: String,
}

impl<'a> Writer<'a> {
    pub fn new(prompt_engine: &'a PromptEngine, llm: &'a dyn LlmPort, model_id: impl Into<String>) -> Self {
        Self {
            prompt_engine,
            llm,
            model_id: model_id.into(),
        }
    }

    /// Render a prompt from `lore`, call the LLM, and parse the response
    /// into a `BranchProposal`. When the port returns more than one
    /// sample (it couldn't honor the derived seed), applies the
    /// majority-vote-on-`branch_type`-then-highest-confidence consensus
    /// rule and tags the result `determinism_level = low`.
    pub async fn generate_proposal(
        &self,
        lore: &Lore,
        now: DateTime<Utc>,
        cancellation: CancellationToken,
    ) -> Result<BranchProposal, LlmTransportError> {
        let mut prompt = self.prompt_engine.render(lore);
        let seed = derive_seed(&lore.context_hash, self.prompt_engine.creativity, &self.model_id);
        prompt.seed = Some(seed);

        let start = Instant::now();
        let completion = self.llm.complete(prompt, cancellation).await?;
        let generation_time_ms = start.elapsed().as_millis() as u64;

        let mut parsed: Vec<RawProposalJson> = completion
            .samples
            .iter()
            .filter_map(|s| parse_raw_proposal(s))
            .collect();

        if parsed.is_empty() {
            return Err(LlmTransportError::ParseError(completion.samples.len()));
        }

        let determinism_level = if parsed.len() > 1 {
            DeterminismLevel::Low
        } else {
            DeterminismLevel::High
        };

        let chosen = if parsed.len() == 1 {
            parsed.remove(0)
        } else {
            consensus_pick(parsed)
        };

        let current_scene = lore
            .game_state
            .current_node
            .clone()
            .unwrap_or_else(|| "unknown".to_string());

        let mut proposal = BranchProposal {
            id: Uuid::new_v4(),
            metadata: ProposalMetadata {
                created_at: now,
                model: completion.model.clone(),
                model_version: "1".to_string(),
                seed: Some(seed),
                context_hash: lore.context_hash.clone(),
                confidence_score: chosen.confidence,
                generation_time_ms,
                determinism_level,
            },
            story_context: StoryContextRef {
                current_scene,
                context_type: lore.game_state.context_type.as_str().to_string(),
            },
            content: ProposalContent {
                branch_type: chosen.branch_type,
                length_tokens: Some(chosen.text.split_whitespace().count() as u32),
                text: chosen.text,
                character_voice: chosen.character_voice,
                tags: chosen.tags,
                return_path: chosen.return_path,
                return_path_confidence: None,
            },
            constraints: ProposalConstraints::default(),
            version_info: VersionInfo {
                input_hash: lore.context_hash.clone(),
                llm_seed: Some(seed),
                creativity: self.prompt_engine.creativity,
            },
        };
        proposal.clamp_confidence();
        Ok(proposal)
    }
}

/// DESIGN.md Open Question 3 resolution: majority vote on `branch_type`
/// across samples; within the majority group, the highest
/// `confidence_score`, tie-broken by sample index.
fn consensus_pick(samples: Vec<RawProposalJson>) -> RawProposalJson {
    let mut counts: Vec<(BranchType, usize)> = Vec::new();
    for sample in &samples {
        match counts.iter_mut().find(|(bt, _)| *bt == sample.branch_type) {
            Some((_, count)) => *count += 1,
            None => counts.push((sample.branch_type, 1)),
        }
    }
    let majority_type = counts
        .iter()
        .max_by_key(|(_, count)| *count)
        .map(|(bt, _)| *bt)
        .expect("samples is non-empty");

    samples
        .into_iter()
        .enumerate()
        .filter(|(_, s)| s.branch_type == majority_type)
        .max_by(|(ia, a), (ib, b)| {
            a.confidence
                .partial_cmp(&b.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ib.cmp(ia).reverse())
        })
        .map(|(_, s)| s)
        .expect("majority group is non-empty")
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkloom_domain::{ContextType, GameState, NarrativeContext, ScalarValue};
    use inkloom_ports::{LlmCompletion, MockLlmPort};
    use std::collections::BTreeMap;

    fn sample_lore() -> Lore {
        Lore::assemble(
            BTreeMap::from([("courage".to_string(), ScalarValue::Int(2))]),
            GameState {
                current_node: Some("campfire".to_string()),
                context_type: ContextType::Dialogue,
                flags: BTreeMap::new(),
            },
            NarrativeContext::default(),
            vec!["forest".to_string()],
            Utc::now(),
        )
    }

    #[test]
    fn derive_seed_is_deterministic_for_identical_inputs() {
        let a = derive_seed("hash1", 0.5, "gpt-4o-mini");
        let b = derive_seed("hash1", 0.5, "gpt-4o-mini");
        assert_eq!(a, b);
        assert!(a < (1u64 << 31));
    }

    #[test]
    fn derive_seed_changes_with_input_hash() {
        let a = derive_seed("hash1", 0.5, "gpt-4o-mini");
        let b = derive_seed("hash2", 0.5, "gpt-4o-mini");
        assert_ne!(a, b);
    }

    #[test]
    fn parses_strict_json() {
        let text = r#"{"branch_type":"ink_fragment","text":"Short","character_voice":null,"tags":[],"return_path":"forest","confidence":0.8}"#;
        let parsed = parse_raw_proposal(text).unwrap();
        assert_eq!(parsed.branch_type, BranchType::InkFragment);
        assert_eq!(parsed.return_path, "forest");
    }

    #[test]
    fn parses_fenced_code_block() {
        let text = "Sure, here you go:\n```json\n{\"branch_type\":\"narrative_delta\",\"text\":\"ok\",\"character_voice\":null,\"tags\":[],\"return_path\":\"forest\",\"confidence\":0.5}\n```";
        let parsed = parse_raw_proposal(text).unwrap();
        assert_eq!(parsed.branch_type, BranchType::NarrativeDelta);
    }

    #[test]
    fn parses_first_balanced_object_amid_prose() {
        let text = "here's the branch: {\"branch_type\":\"ink_fragment\",\"text\":\"a {nested} thing\",\"character_voice\":null,\"tags\":[],\"return_path\":\"forest\",\"confidence\":0.6} and some trailing prose";
        let parsed = parse_raw_proposal(text).unwrap();
        assert_eq!(parsed.text, "a {nested} thing");
    }

    #[test]
    fn unparsable_text_yields_none() {
        assert!(parse_raw_proposal("not json at all").is_none());
    }

    #[tokio::test]
    async fn single_sample_yields_high_determinism() {
        let mut mock = MockLlmPort::new();
        mock.expect_complete().returning(|_, _| {
            Ok(LlmCompletion {
                samples: vec![
                    r#"{"branch_type":"ink_fragment","text":"Short","character_voice":null,"tags":[],"return_path":"forest","confidence":0.8}"#
                        .to_string(),
                ],
                model: "test-model".to_string(),
            })
        });
        let engine = PromptEngine::new(0.5, 200);
        let writer = Writer::new(&engine, &mock, "test-model");
        let proposal = writer
            .generate_proposal(&sample_lore(), Utc::now(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(proposal.metadata.determinism_level, DeterminismLevel::High);
        assert_eq!(proposal.content.return_path, "forest");
    }

    #[tokio::test]
    async fn multi_sample_consensus_picks_majority_branch_type_then_highest_confidence() {
        let mut mock = MockLlmPort::new();
        mock.expect_complete().returning(|_, _| {
            Ok(LlmCompletion {
                samples: vec![
                    r#"{"branch_type":"ink_fragment","text":"a","character_voice":null,"tags":[],"return_path":"forest","confidence":0.4}"#.to_string(),
                    r#"{"branch_type":"ink_fragment","text":"b","character_voice":null,"tags":[],"return_path":"forest","confidence":0.9}"#.to_string(),
                    r#"{"branch_type":"ink_knot","text":"c","character_voice":null,"tags":[],"return_path":"forest","confidence":0.95}"#.to_string(),
                ],
                model: "test-model".to_string(),
            })
        });
        let engine = PromptEngine::new(0.5, 200);
        let writer = Writer::new(&engine, &mock, "test-model");
        let proposal = writer
            .generate_proposal(&sample_lore(), Utc::now(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(proposal.metadata.determinism_level, DeterminismLevel::Low);
        assert_eq!(proposal.content.branch_type, BranchType::InkFragment);
        assert_eq!(proposal.content.text, "b");
    }

    #[tokio::test]
    async fn unparsable_response_is_a_transport_error() {
        let mut mock = MockLlmPort::new();
        mock.expect_complete()
            .returning(|_, _| Ok(LlmCompletion { samples: vec!["garbage".to_string()], model: "m".to_string() }));
        let engine = PromptEngine::new(0.5, 200);
        let writer = Writer::new(&engine, &mock, "test-model");
        let err = writer
            .generate_proposal(&sample_lore(), Utc::now(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmTransportError::ParseError(1)));
    }
}
