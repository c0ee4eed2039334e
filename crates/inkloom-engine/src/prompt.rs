//! Prompt Engine (spec.md §4.2): selects a template from context type
//! and renders a pure function of LORE + template + valid-paths list.

use inkloom_domain::{ContextType, Lore, ScalarValue};
use inkloom_ports::LlmPrompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    Dialogue,
    Exploration,
}

impl PromptTemplate {
    /// Context-to-template table from spec.md §4.2.
    pub fn for_context(context_type: ContextType) -> Self {
        match context_type {
            ContextType::Dialogue | ContextType::Tension => PromptTemplate::Dialogue,
            ContextType::Discovery | ContextType::Exploration => PromptTemplate::Exploration,
        }
    }
}

pub struct PromptEngine {
    pub creativity: f32,
    pub max_tokens: u32,
}

impl PromptEngine {
    pub fn new(creativity: f32, max_tokens: u32) -> Self {
        Self {
            creativity: creativity.clamp(0.0, 1.0),
            max_tokens,
        }
    }

    /// Render `(system_prompt, user_prompt)` for a LORE snapshot. A pure
    /// function of its inputs — iteration is always over `BTreeMap`s and
    /// sorted vectors, so identical LORE always renders identical text.
    pub fn render(&self, lore: &Lore) -> LlmPrompt {
        let template = PromptTemplate::for_context(lore.game_state.context_type);
        let system = self.render_system(template);
        let user = self.render_user(lore);

        LlmPrompt {
            system,
            user,
            seed: None,
            temperature: creativity_to_temperature(self.creativity),
            max_tokens: self.max_tokens,
        }
    }

    fn render_system(&self, template: PromptTemplate) -> String {
        let role_line = match template {
            PromptTemplate::Dialogue => {
                "You write a single short branch of in-character dialogue or narration that could plausibly follow the current scene."
            }
            PromptTemplate::Exploration => {
                "You write a single short branch of exploratory narration describing what the player notices or can do next."
            }
        };

        format!(
            "{role_line}\n\
             Respond with a single JSON object only, matching this shape:\n\
             {{\"branch_type\": \"ink_fragment\" | \"narrative_delta\" | \"ink_knot\", \
             \"text\": string, \"character_voice\": string | null, \"tags\": string[], \
             \"return_path\": string, \"confidence\": number}}\n\
             Do not invent characters, locations, or items not already present in the provided context.\n\
             Do not write more than one scene beat. Do not break the fourth wall.\n\
             The `return_path` must be one of the listed valid return paths."
        )
    }

    fn render_user(&self, lore: &Lore) -> String {
        let mut user = String::new();

        let (courage, caution) = trait_counters(lore);
        user.push_str(&format!(
            "CHARACTER TRAITS: courage={courage}, caution={caution}\n"
        ));

        let inventory = inventory_listing(lore);
        if !inventory.is_empty() {
            user.push_str(&format!("INVENTORY: {}\n", inventory.join(", ")));
        }

        if lore.narrative_context.is_empty() {
            user.push_str("RECENT ACTIONS: none yet\n");
        } else {
            let recent: Vec<&str> = lore.narrative_context.choices().collect();
            user.push_str(&format!("RECENT ACTIONS: {}\n", recent.join(" -> ")));
        }

        let scene_name = lore
            .game_state
            .current_node
            .as_deref()
            .map(humanize_scene_name)
            .unwrap_or_else(|| "an unknown place".to_string());
        user.push_str(&format!("CURRENT SCENE: {scene_name}\n"));
        user.push_str(&format!("CONTEXT: {}\n", lore.game_state.context_type.as_str()));

        if lore.valid_return_paths.is_empty() {
            user.push_str("VALID RETURN PATHS: none\n");
        } else {
            user.push_str(&format!(
                "VALID RETURN PATHS: {}\n",
                lore.valid_return_paths.join(", ")
            ));
        }

        user
    }
}

/// Linear creativity-to-temperature mapping into `[0, 2]`, clamped
/// (spec.md §4.3).
pub fn creativity_to_temperature(creativity: f32) -> f32 {
    (creativity.clamp(0.0, 1.0) * 2.0).clamp(0.0, 2.0)
}

fn trait_counters(lore: &Lore) -> (i64, i64) {
    let courage = match lore.player_state.get("courage") {
        Some(ScalarValue::Int(i)) => *i,
        Some(ScalarValue::Float(f)) => *f as i64,
        _ => 0,
    };
    let caution = match lore.player_state.get("caution") {
        Some(ScalarValue::Int(i)) => *i,
        Some(ScalarValue::Float(f)) => *f as i64,
        _ => 0,
    };
    (courage, caution)
}

fn inventory_listing(lore: &Lore) -> Vec<String> {
    lore.player_state
        .iter()
        .filter(|(k, _)| k.starts_with("has_"))
        .filter_map(|(k, v)| match v {
            ScalarValue::Bool(true) => Some(k.trim_start_matches("has_").replace('_', " ")),
            _ => None,
        })
        .collect()
}

fn humanize_scene_name(node: &str) -> String {
    node.replace(['_', '-'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkloom_domain::{GameState, NarrativeContext};
    use std::collections::BTreeMap;

    fn sample_lore(context_type: ContextType) -> Lore {
        let mut player_state = BTreeMap::new();
        player_state.insert("courage".to_string(), ScalarValue::Int(3));
        player_state.insert("has_lantern".to_string(), ScalarValue::Bool(true));

        Lore::assemble(
            player_state,
            GameState {
                current_node: Some("old_ruins".to_string()),
                context_type,
                flags: BTreeMap::new(),
            },
            NarrativeContext::default(),
            vec!["forest_edge".to_string()],
            chrono::Utc::now(),
        )
    }

    #[test]
    fn dialogue_and_tension_contexts_select_dialogue_template() {
        assert_eq!(PromptTemplate::for_context(ContextType::Dialogue), PromptTemplate::Dialogue);
        assert_eq!(PromptTemplate::for_context(ContextType::Tension), PromptTemplate::Dialogue);
    }

    #[test]
    fn discovery_and_exploration_contexts_select_exploration_template() {
        assert_eq!(PromptTemplate::for_context(ContextType::Discovery), PromptTemplate::Exploration);
        assert_eq!(PromptTemplate::for_context(ContextType::Exploration), PromptTemplate::Exploration);
    }

    #[test]
    fn rendering_is_deterministic_for_identical_lore() {
        let engine = PromptEngine::new(0.5, 200);
        let lore = sample_lore(ContextType::Discovery);
        let a = engine.render(&lore);
        let b = engine.render(&lore);
        assert_eq!(a.user, b.user);
        assert_eq!(a.system, b.system);
    }

    #[test]
    fn user_prompt_humanizes_scene_name_and_lists_inventory() {
        let engine = PromptEngine::new(0.5, 200);
        let lore = sample_lore(ContextType::Discovery);
        let prompt = engine.render(&lore);
        assert!(prompt.user.contains("old ruins"));
        assert!(prompt.user.contains("lantern"));
    }

    #[test]
    fn creativity_maps_linearly_into_0_2_and_clamps() {
        assert_eq!(creativity_to_temperature(0.0), 0.0);
        assert_eq!(creativity_to_temperature(0.5), 1.0);
        assert_eq!(creativity_to_temperature(1.0), 2.0);
        assert_eq!(creativity_to_temperature(5.0), 2.0);
    }
}
