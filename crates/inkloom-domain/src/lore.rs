//! LORE — the deterministic runtime-state snapshot captured at a choice
//! point (spec.md §3 "Story Snapshot (LORE)").
//!
//! `Lore` itself is pure data: the LORE *Assembler* that reads a
//! `StoryPort` and builds one of these lives in `inkloom-engine`. Keeping
//! the type here lets both the engine and any adapter (prompt rendering,
//! telemetry, save payloads) depend on it without depending on each other.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::context::ContextType;
use crate::error::DomainError;

/// A scalar runtime variable value. The interpreter exposes variables as a
/// small dynamic type; we mirror only what the pipeline needs to hash and
/// render into prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ScalarValue {
    /// Canonical string form used when hashing — stable across platforms,
    /// unlike `f64`'s `Display` for some edge values.
    fn canonical(&self) -> String {
        match self {
            ScalarValue::Bool(b) => format!("b:{b}"),
            ScalarValue::Int(i) => format!("i:{i}"),
            ScalarValue::Float(f) => format!("f:{f:.6}"),
            ScalarValue::Text(s) => format!("s:{s}"),
        }
    }
}

/// Game-state flags and identifiers at the choice point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GameState {
    pub current_node: Option<String>,
    pub context_type: ContextType,
    pub flags: BTreeMap<String, bool>,
}

/// Bounded, FIFO-trimmed buffer of recent player choices, newest last.
///
/// Default cap is 5, per spec.md §3; the Assembler enforces `cap <= 10`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeContext {
    capacity: usize,
    recent_choices: VecDeque<String>,
}

impl NarrativeContext {
    pub const DEFAULT_CAPACITY: usize = 5;
    pub const MAX_CAPACITY: usize = 10;

    pub fn new(capacity: usize) -> Result<Self, DomainError> {
        if capacity == 0 {
            return Err(DomainError::InvalidCapacity(capacity));
        }
        Ok(Self {
            capacity: capacity.min(Self::MAX_CAPACITY),
            recent_choices: VecDeque::with_capacity(capacity.min(Self::MAX_CAPACITY)),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&mut self, choice_text: impl Into<String>) {
        if self.recent_choices.len() >= self.capacity {
            self.recent_choices.pop_front();
        }
        self.recent_choices.push_back(choice_text.into());
    }

    pub fn clear(&mut self) {
        self.recent_choices.clear();
    }

    /// Newest-last, as spec.md §3 requires.
    pub fn choices(&self) -> impl Iterator<Item = &str> {
        self.recent_choices.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.recent_choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent_choices.is_empty()
    }
}

impl Default for NarrativeContext {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY).expect("default capacity is nonzero")
    }
}

/// A deterministic fingerprint of the interpreter's state at one choice
/// point. See spec.md §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lore {
    pub player_state: BTreeMap<String, ScalarValue>,
    pub game_state: GameState,
    pub narrative_context: NarrativeContext,
    /// Known valid return-path targets (all node ids minus the current
    /// node minus terminal nodes) — spec.md §4.1.
    pub valid_return_paths: Vec<String>,
    /// Stable SHA-256 over the sorted, whitespace-normalized hashable
    /// subset (excludes `capture_timestamp`).
    pub context_hash: String,
    pub capture_timestamp: DateTime<Utc>,
}

impl Lore {
    /// Build a `Lore` snapshot and compute its `context_hash`.
    ///
    /// `player_state` and `game_state.flags` must already be in a stable
    /// iteration order for the hash to be reproducible across processes —
    /// `BTreeMap` guarantees that here, so callers don't need to sort.
    pub fn assemble(
        player_state: BTreeMap<String, ScalarValue>,
        game_state: GameState,
        narrative_context: NarrativeContext,
        valid_return_paths: Vec<String>,
        capture_timestamp: DateTime<Utc>,
    ) -> Self {
        let mut valid_return_paths = valid_return_paths;
        valid_return_paths.sort();

        let context_hash = Self::compute_hash(&player_state, &game_state, &narrative_context, &valid_return_paths);

        Self {
            player_state,
            game_state,
            narrative_context,
            valid_return_paths,
            context_hash,
            capture_timestamp,
        }
    }

    /// Recompute the hash over the hashable subset. Exposed so tests (and
    /// the sanitizer-idempotence / determinism properties) can verify a
    /// `Lore` wasn't tampered with after assembly.
    pub fn compute_hash(
        player_state: &BTreeMap<String, ScalarValue>,
        game_state: &GameState,
        narrative_context: &NarrativeContext,
        valid_return_paths: &[String],
    ) -> String {
        let mut buf = String::new();
        for (k, v) in player_state {
            buf.push_str(k);
            buf.push('=');
            buf.push_str(&v.canonical());
            buf.push(';');
        }
        buf.push('|');
        if let Some(node) = &game_state.current_node {
            buf.push_str(node);
        }
        buf.push('|');
        buf.push_str(game_state.context_type.as_str());
        buf.push('|');
        for (k, v) in &game_state.flags {
            buf.push_str(k);
            buf.push('=');
            buf.push_str(if *v { "1" } else { "0" });
            buf.push(';');
        }
        buf.push('|');
        for choice in narrative_context.choices() {
            buf.push_str(choice.trim());
            buf.push(';');
        }
        buf.push('|');
        for path in valid_return_paths {
            buf.push_str(path);
            buf.push(';');
        }

        let digest = Sha256::digest(buf.as_bytes());
        hex::encode(digest)
    }

    pub fn has_return_paths(&self) -> bool {
        !self.valid_return_paths.is_empty()
    }
}
