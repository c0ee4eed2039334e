//! LORE Assembler (spec.md §4.1).

use std::collections::BTreeMap;

use inkloom_domain::{ContextType, GameState, Lore, NarrativeContext, ScalarValue};
use inkloom_ports::StoryPort;

/// Flags whose presence (set `true`) raises the inferred context toward
/// `Tension`, per spec.md §4.1 ("a `wolves_spotted` boolean raises
/// tension"). A small, explicit list rather than a classifier — the
/// heuristic the spec calls for, not a model.
const TENSION_FLAGS: &[&str] = &["wolves_spotted", "alarm_raised", "under_attack", "pursued"];

pub struct LoreAssembler {
    history: NarrativeContext,
}

impl LoreAssembler {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: NarrativeContext::new(capacity).unwrap_or_default(),
        }
    }

    pub fn record_choice(&mut self, text: impl Into<String>) {
        self.history.record(text);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Build a `Lore` snapshot from the current `Story` state.
    ///
    /// Absent variables stay absent rather than defaulting to a scalar —
    /// spec.md §4.1's "undefined, not 0" edge case falls naturally out of
    /// just copying whatever `StoryPort::variables` returns.
    pub fn assemble(&self, story: &dyn StoryPort, clock_now: chrono::DateTime<chrono::Utc>) -> Lore {
        let current_node = story.current_path();
        let variables: BTreeMap<String, ScalarValue> = story.variables();
        let flags = flags_from_variables(&variables);
        let context_type = classify_context(current_node.as_deref(), &flags);

        let game_state = GameState {
            current_node: current_node.clone(),
            context_type,
            flags,
        };

        let valid_return_paths = match current_node.as_deref() {
            None => Vec::new(),
            Some(current) => all_knots_minus_current_and_terminal(story, current),
        };

        Lore::assemble(variables, game_state, self.history.clone(), valid_return_paths, clock_now)
    }
}

fn flags_from_variables(variables: &BTreeMap<String, ScalarValue>) -> BTreeMap<String, bool> {
    variables
        .iter()
        .filter_map(|(k, v)| match v {
            ScalarValue::Bool(b) => Some((k.clone(), *b)),
            _ => None,
        })
        .collect()
}

/// Node-name heuristic plus variable flags, per spec.md §4.1. Falls back
/// to `Exploration` when there's no current node to classify (the
/// orchestrator then force-rejects any proposal for an empty
/// return-path set).
fn classify_context(current_node: Option<&str>, flags: &BTreeMap<String, bool>) -> ContextType {
    if flags.iter().any(|(k, v)| *v && TENSION_FLAGS.contains(&k.as_str())) {
        return ContextType::Tension;
    }

    let Some(node) = current_node else {
        return ContextType::fallback();
    };
    let lowered = node.to_lowercase();
    if lowered.contains("discover") || lowered.contains("ruins") || lowered.contains("find") {
        ContextType::Discovery
    } else if lowered.contains("talk")
        || lowered.contains("dialogue")
        || lowered.contains("convo")
        || lowered.contains("campfire")
    {
        ContextType::Dialogue
    } else {
        ContextType::Exploration
    }
}

fn all_knots_minus_current_and_terminal(story: &dyn StoryPort, current: &str) -> Vec<String> {
    story
        .all_knots()
        .unwrap_or_default()
        .into_iter()
        .filter(|id| id != current && !story.is_terminal(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkloom_ports::MockStoryPort;

    fn story_with(current: Option<&str>, variables: BTreeMap<String, ScalarValue>, knots: Vec<&str>) -> MockStoryPort {
        let mut mock = MockStoryPort::new();
        let current_owned = current.map(str::to_string);
        mock.expect_current_path().returning(move || current_owned.clone());
        let vars = variables.clone();
        mock.expect_variables().returning(move || vars.clone());
        let knots_owned: Vec<String> = knots.iter().map(|s| s.to_string()).collect();
        mock.expect_all_knots().returning(move || Some(knots_owned.clone()));
        mock.expect_is_terminal().returning(|node| node == "ending");
        mock
    }

    #[test]
    fn missing_current_node_falls_back_to_exploration_with_no_return_paths() {
        let story = story_with(None, BTreeMap::new(), vec!["a", "b"]);
        let assembler = LoreAssembler::new(5);
        let lore = assembler.assemble(&story, chrono::Utc::now());
        assert_eq!(lore.game_state.context_type, ContextType::Exploration);
        assert!(lore.valid_return_paths.is_empty());
    }

    #[test]
    fn tension_flag_overrides_node_name_heuristic() {
        let mut vars = BTreeMap::new();
        vars.insert("wolves_spotted".to_string(), ScalarValue::Bool(true));
        let story = story_with(Some("campfire"), vars, vec!["campfire", "forest"]);
        let assembler = LoreAssembler::new(5);
        let lore = assembler.assemble(&story, chrono::Utc::now());
        assert_eq!(lore.game_state.context_type, ContextType::Tension);
    }

    #[test]
    fn return_paths_exclude_current_and_terminal_nodes() {
        let story = story_with(Some("campfire"), BTreeMap::new(), vec!["campfire", "forest", "ending"]);
        let assembler = LoreAssembler::new(5);
        let lore = assembler.assemble(&story, chrono::Utc::now());
        assert_eq!(lore.valid_return_paths, vec!["forest".to_string()]);
    }

    #[test]
    fn recorded_choices_flow_into_narrative_context() {
        let mut assembler = LoreAssembler::new(5);
        assembler.record_choice("looked around");
        let story = story_with(Some("forest"), BTreeMap::new(), vec!["forest"]);
        let lore = assembler.assemble(&story, chrono::Utc::now());
        assert_eq!(lore.narrative_context.choices().collect::<Vec<_>>(), vec!["looked around"]);
    }
}
