//! In-memory fixture story adapter — a small authored knot graph used
//! by the demo runner and by engine/adapter tests in place of a real
//! Ink-style interpreter.

use std::collections::BTreeMap;

use async_trait::async_trait;
use inkloom_domain::ScalarValue;
use inkloom_ports::{Choice, StoryError, StoryPort};

#[derive(Debug, Clone)]
pub struct FixtureKnot {
    pub id: String,
    pub prose: Vec<String>,
    pub tags: Vec<String>,
    pub choices: Vec<FixtureChoice>,
    pub terminal: bool,
}

#[derive(Debug, Clone)]
pub struct FixtureChoice {
    pub text: String,
    pub target: String,
}

/// A tiny in-memory "Story" implementing the capability interface: a
/// fixed map of knots, a cursor into the current knot's prose lines, and
/// a variable table. Good enough to drive the orchestrator end-to-end
/// without a real narrative interpreter.
pub struct FixtureStoryAdapter {
    knots: BTreeMap<String, FixtureKnot>,
    current: String,
    line_cursor: usize,
    variables: BTreeMap<String, ScalarValue>,
}

impl FixtureStoryAdapter {
    pub fn new(knots: Vec<FixtureKnot>, start: impl Into<String>) -> Self {
        let knots = knots.into_iter().map(|k| (k.id.clone(), k)).collect();
        Self {
            knots,
            current: start.into(),
            line_cursor: 0,
            variables: BTreeMap::new(),
        }
    }

    pub fn set_variable(&mut self, key: impl Into<String>, value: ScalarValue) {
        self.variables.insert(key.into(), value);
    }

    fn current_knot(&self) -> Result<&FixtureKnot, StoryError> {
        self.knots
            .get(&self.current)
            .ok_or_else(|| StoryError::NoSuchNode(self.current.clone()))
    }
}

#[async_trait]
impl StoryPort for FixtureStoryAdapter {
    fn can_continue(&self) -> bool {
        self.knots
            .get(&self.current)
            .map(|k| self.line_cursor < k.prose.len())
            .unwrap_or(false)
    }

    async fn continue_prose(&mut self) -> Result<String, StoryError> {
        let knot = self
            .knots
            .get(&self.current)
            .ok_or_else(|| StoryError::NoSuchNode(self.current.clone()))?;
        let line = knot
            .prose
            .get(self.line_cursor)
            .cloned()
            .ok_or_else(|| StoryError::Interpreter("no more prose to continue".to_string()))?;
        self.line_cursor += 1;
        Ok(line)
    }

    fn current_choices(&self) -> Vec<Choice> {
        match self.knots.get(&self.current) {
            Some(knot) => knot
                .choices
                .iter()
                .enumerate()
                .map(|(index, c)| Choice {
                    text: c.text.clone(),
                    index,
                })
                .collect(),
            None => Vec::new(),
        }
    }

    async fn choose_index(&mut self, index: usize) -> Result<(), StoryError> {
        let target = self
            .current_knot()?
            .choices
            .get(index)
            .map(|c| c.target.clone())
            .ok_or_else(|| StoryError::Interpreter(format!("no choice at index {index}")))?;
        self.choose_path(&target).await
    }

    fn current_tags(&self) -> Vec<String> {
        self.knots
            .get(&self.current)
            .map(|k| k.tags.clone())
            .unwrap_or_default()
    }

    fn variables(&self) -> BTreeMap<String, ScalarValue> {
        self.variables.clone()
    }

    fn current_path(&self) -> Option<String> {
        Some(self.current.clone())
    }

    fn all_knots(&self) -> Option<Vec<String>> {
        Some(self.knots.keys().cloned().collect())
    }

    fn stitches_of(&self, _knot: &str) -> Option<Vec<String>> {
        None
    }

    fn is_terminal(&self, node: &str) -> bool {
        self.knots.get(node).map(|k| k.terminal).unwrap_or(false)
    }

    async fn choose_path(&mut self, path: &str) -> Result<(), StoryError> {
        if !self.knots.contains_key(path) {
            return Err(StoryError::NoSuchNode(path.to_string()));
        }
        self.current = path.to_string();
        self.line_cursor = 0;
        Ok(())
    }

    fn to_json(&self) -> Result<serde_json::Value, StoryError> {
        serde_json::to_value(FixtureSnapshot {
            current: self.current.clone(),
            line_cursor: self.line_cursor,
            variables: self.variables.clone(),
        })
        .map_err(|e| StoryError::Serialize(e.to_string()))
    }

    async fn load_json(&mut self, state: serde_json::Value) -> Result<(), StoryError> {
        let snapshot: FixtureSnapshot =
            serde_json::from_value(state).map_err(|e| StoryError::Load(e.to_string()))?;
        if !self.knots.contains_key(&snapshot.current) {
            return Err(StoryError::NoSuchNode(snapshot.current));
        }
        self.current = snapshot.current;
        self.line_cursor = snapshot.line_cursor;
        self.variables = snapshot.variables;
        Ok(())
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct FixtureSnapshot {
    current: String,
    line_cursor: usize,
    variables: BTreeMap<String, ScalarValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_knot_story() -> FixtureStoryAdapter {
        FixtureStoryAdapter::new(
            vec![
                FixtureKnot {
                    id: "campfire".to_string(),
                    prose: vec!["The fire crackles.".to_string()],
                    tags: vec!["dialogue".to_string()],
                    choices: vec![FixtureChoice {
                        text: "Ask about the ruins".to_string(),
                        target: "ruins".to_string(),
                    }],
                    terminal: false,
                },
                FixtureKnot {
                    id: "ruins".to_string(),
                    prose: vec!["Old stones, half-buried.".to_string()],
                    tags: vec![],
                    choices: vec![],
                    terminal: true,
                },
            ],
            "campfire",
        )
    }

    #[tokio::test]
    async fn choosing_an_index_diverts_to_target_knot() {
        let mut story = two_knot_story();
        story.choose_index(0).await.unwrap();
        assert_eq!(story.current_path(), Some("ruins".to_string()));
        assert!(story.is_terminal("ruins"));
    }

    #[tokio::test]
    async fn snapshot_round_trips() {
        let mut story = two_knot_story();
        story.set_variable("courage", ScalarValue::Int(3));
        story.continue_prose().await.unwrap();
        let snapshot = story.to_json().unwrap();

        let mut restored = two_knot_story();
        restored.load_json(snapshot).await.unwrap();
        assert_eq!(restored.variables().get("courage"), Some(&ScalarValue::Int(3)));
        assert!(!restored.can_continue());
    }

    #[tokio::test]
    async fn choosing_unknown_path_errors() {
        let mut story = two_knot_story();
        let err = story.choose_path("nowhere").await.unwrap_err();
        assert!(matches!(err, StoryError::NoSuchNode(_)));
    }
}
