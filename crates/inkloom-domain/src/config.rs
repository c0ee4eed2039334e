//! The configuration surface from spec.md §6, as a pure value object.
//!
//! `inkloom-adapters::config` is responsible for *loading* this from
//! layered sources (defaults, file, environment); this module only
//! defines the shape and its validation rules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Weighted components of the Director's risk score (spec.md §4.5). Must
/// sum to 1.0 within a small epsilon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
#[validate(schema(function = "validate_weights_sum_to_one"))]
pub struct RiskWeights {
    pub thematic_consistency: f32,
    pub lore_adherence: f32,
    pub character_voice: f32,
    pub narrative_pacing: f32,
    pub player_preference_fit: f32,
    pub proposal_confidence: f32,
}

impl Default for RiskWeights {
    fn default() -> Self {
        // spec.md §4.5 gives 0.25/0.25/0.20/0.15/0.15 over the five
        // semantic metrics plus a separately-blended inverse-confidence
        // term. DESIGN.md Open Question resolution 4: `proposal_confidence`
        // gets its own slot in this vector rather than a special-cased
        // blend factor, so the five named weights are scaled by 0.8 to
        // leave room for a 0.2 confidence weight (0.25*0.8, 0.25*0.8,
        // 0.20*0.8, 0.15*0.8, 0.15*0.8, 0.2) — same proportions, sums to 1.
        Self {
            thematic_consistency: 0.2,
            lore_adherence: 0.2,
            character_voice: 0.16,
            narrative_pacing: 0.12,
            player_preference_fit: 0.12,
            proposal_confidence: 0.2,
        }
    }
}

fn validate_weights_sum_to_one(weights: &RiskWeights) -> Result<(), ValidationError> {
    let sum = weights.thematic_consistency
        + weights.lore_adherence
        + weights.character_voice
        + weights.narrative_pacing
        + weights.player_preference_fit
        + weights.proposal_confidence;
    if (sum - 1.0).abs() > 1e-3 {
        let mut err = ValidationError::new("weights_must_sum_to_one");
        err.message = Some(format!("risk weights sum to {sum}, expected 1.0").into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DirectorConfig {
    #[validate(nested)]
    pub weights: RiskWeights,
    /// Target character length per narrative phase, used by the pacing
    /// risk component.
    pub pacing_targets: BTreeMap<String, u32>,
    #[validate(range(min = 0.0))]
    pub pacing_tolerance_factor: f32,
    #[validate(range(min = 0.0, max = 1.0))]
    pub placeholder_default: f32,
    #[validate(range(min = 0.0, max = 1.0))]
    pub risk_threshold: f32,
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_return_confidence: f32,
    /// Hard timeout for the Director's decision loop (spec.md §4.5).
    pub decision_timeout_ms: u64,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            weights: RiskWeights::default(),
            pacing_targets: BTreeMap::from([
                ("dialogue".to_string(), 400),
                ("exploration".to_string(), 600),
                ("tension".to_string(), 350),
                ("discovery".to_string(), 500),
            ]),
            pacing_tolerance_factor: 0.6,
            placeholder_default: 0.3,
            risk_threshold: 0.5,
            min_return_confidence: 0.6,
            decision_timeout_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WriterConfig {
    #[validate(range(min = 0.0, max = 1.0))]
    pub creativity: f32,
    pub model: String,
    pub base_url: Option<String>,
    pub timeout_ms: u64,
    /// Number of samples to draw when the endpoint doesn't honor seeds
    /// (spec.md §4.3 determinism fallback).
    pub consensus_samples: u8,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            creativity: 0.6,
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            timeout_ms: 5_000,
            consensus_samples: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorConfig {
    pub enabled_rules: Vec<String>,
    pub max_length_tokens: u32,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            enabled_rules: vec![
                "profanity".to_string(),
                "explicit_content".to_string(),
                "schema".to_string(),
                "length".to_string(),
                "markup_strip".to_string(),
                "narrative_syntax".to_string(),
                "return_path".to_string(),
                "character_voice".to_string(),
            ],
            max_length_tokens: 250,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryConfig {
    pub backend_url: Option<String>,
    pub buffer_size: usize,
    pub enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            buffer_size: 50,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    #[validate(nested)]
    pub director_config: DirectorConfig,
    #[validate(nested)]
    pub writer: WriterConfig,
    #[validate(nested)]
    pub validator: ValidatorConfig,
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}
