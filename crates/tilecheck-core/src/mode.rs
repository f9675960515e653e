//! Game-mode configuration consumed from the mode catalog.
//!
//! A [`ModeConfig`] is immutable and looked up by key. Its free-form
//! `special_rules` map is interpreted by [`SpecialRules::from_map`],
//! which ignores unknown keys and turns malformed values into
//! "feature disabled" rather than errors.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Mode family whose replays may contain practice-tile actions.
pub const PRACTICE_FAMILY: &str = "practice";

/// Merge-legality rule family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ruleset {
    /// Classic doubling: equal tiles merge into their sum.
    Pow2,
    /// Consecutive Fibonacci numbers merge into their sum.
    Fibonacci,
}

impl Ruleset {
    /// Wire tag (`"pow2"` or `"fibonacci"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pow2 => "pow2",
            Self::Fibonacci => "fibonacci",
        }
    }

    /// Parse a wire tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "pow2" => Some(Self::Pow2),
            "fibonacci" => Some(Self::Fibonacci),
            _ => None,
        }
    }

    /// Spawn table used when a mode's own table is empty or unusable.
    pub fn default_spawn_table(self) -> Vec<SpawnEntry> {
        match self {
            Self::Pow2 => vec![SpawnEntry::new(2, 9), SpawnEntry::new(4, 1)],
            Self::Fibonacci => vec![SpawnEntry::new(1, 9), SpawnEntry::new(2, 1)],
        }
    }
}

impl fmt::Display for Ruleset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weighted entry of a spawn table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnEntry {
    /// Tile value placed when this entry is drawn.
    pub value: u64,
    /// Relative weight; zero-weight entries are never drawn.
    pub weight: u32,
}

impl SpawnEntry {
    /// Create a spawn entry.
    pub fn new(value: u64, weight: u32) -> Self {
        Self { value, weight }
    }
}

/// Immutable definition of a game mode, as served by the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModeConfig {
    /// Canonical catalog key.
    pub key: String,
    /// Board columns.
    pub board_width: u32,
    /// Board rows.
    pub board_height: u32,
    /// Merge rule family.
    pub ruleset: Ruleset,
    /// Ordered weighted spawn table.
    #[serde(default)]
    pub spawn_table: Vec<SpawnEntry>,
    /// Largest tile a merge may produce; `None` is unbounded.
    #[serde(default)]
    pub max_tile: Option<u64>,
    /// Whether undo actions are allowed at all.
    #[serde(default)]
    pub undo_enabled: bool,
    /// Mode family tag; [`PRACTICE_FAMILY`] enables practice tiles.
    #[serde(default)]
    pub mode_family: String,
    /// Ranking policy tag recorded in replays (e.g. `"ranked"`).
    #[serde(default)]
    pub rank_policy: String,
    /// Leaderboard bucket a verified session is filed under.
    #[serde(default)]
    pub ranked_bucket: String,
    /// Free-form special rules; see [`SpecialRules`].
    #[serde(default)]
    pub special_rules: Map<String, Value>,
}

impl ModeConfig {
    /// Whether this mode belongs to the practice family.
    pub fn is_practice(&self) -> bool {
        self.mode_family == PRACTICE_FAMILY
    }

    /// Interpret the special-rules map.
    pub fn rules(&self) -> SpecialRules {
        SpecialRules::from_map(&self.special_rules)
    }

    /// Whether a game in this mode may end in the win-stop state:
    /// `pow2` boards without a tile cap.
    pub fn allows_win_stop(&self) -> bool {
        self.ruleset == Ruleset::Pow2 && self.max_tile.is_none()
    }
}

/// Direction-lock parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirectionLock {
    /// A lock phase begins every `every_k_moves` successful moves.
    pub every_k_moves: u64,
}

/// Recognized special rules, with malformed values already dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpecialRules {
    /// Total undos allowed over a game.
    pub undo_limit: Option<u32>,
    /// Combo multiplier, always `> 1` when present.
    pub combo_multiplier: Option<f64>,
    /// Periodic direction lock.
    pub direction_lock: Option<DirectionLock>,
    /// Impassable `(x, y)` cells, not yet clamped to a board.
    pub blocked_cells: Vec<(usize, usize)>,
}

impl SpecialRules {
    /// Interpret a free-form special-rules map.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let undo_limit = map
            .get("undo_limit")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok());

        let combo_multiplier = map
            .get("combo_multiplier")
            .and_then(Value::as_f64)
            .filter(|m| m.is_finite() && *m > 1.0);

        let direction_lock = map
            .get("direction_lock")
            .and_then(Value::as_object)
            .and_then(|lock| lock.get("every_k_moves"))
            .and_then(Value::as_u64)
            .filter(|k| *k > 0)
            .map(|every_k_moves| DirectionLock { every_k_moves });

        let blocked_cells = map
            .get("blocked_cells")
            .and_then(Value::as_array)
            .map(|cells| cells.iter().filter_map(parse_cell).collect())
            .unwrap_or_default();

        Self {
            undo_limit,
            combo_multiplier,
            direction_lock,
            blocked_cells,
        }
    }

    /// Blocked cells that fall inside a `width × height` board,
    /// deduplicated, in first-seen order.
    pub fn blocked_within(&self, width: usize, height: usize) -> Vec<(usize, usize)> {
        let mut out: Vec<(usize, usize)> = Vec::new();
        for &(x, y) in &self.blocked_cells {
            if x < width && y < height && !out.contains(&(x, y)) {
                out.push((x, y));
            }
        }
        out
    }
}

fn parse_cell(v: &Value) -> Option<(usize, usize)> {
    let pair = v.as_array()?;
    if pair.len() != 2 {
        return None;
    }
    let x = usize::try_from(pair[0].as_u64()?).ok()?;
    let y = usize::try_from(pair[1].as_u64()?).ok()?;
    Some((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules(v: Value) -> SpecialRules {
        match v {
            Value::Object(map) => SpecialRules::from_map(&map),
            _ => panic!("test rules must be an object"),
        }
    }

    #[test]
    fn empty_map_disables_everything() {
        assert_eq!(rules(json!({})), SpecialRules::default());
    }

    #[test]
    fn recognized_keys_parse() {
        let r = rules(json!({
            "undo_limit": 3,
            "combo_multiplier": 1.5,
            "direction_lock": {"every_k_moves": 4},
            "blocked_cells": [[0, 0], [2, 1]],
            "something_else": true,
        }));
        assert_eq!(r.undo_limit, Some(3));
        assert_eq!(r.combo_multiplier, Some(1.5));
        assert_eq!(r.direction_lock, Some(DirectionLock { every_k_moves: 4 }));
        assert_eq!(r.blocked_cells, vec![(0, 0), (2, 1)]);
    }

    #[test]
    fn malformed_values_fall_back_to_disabled() {
        let r = rules(json!({
            "undo_limit": -1,
            "combo_multiplier": 1.0,
            "direction_lock": {"every_k_moves": 0},
            "blocked_cells": "nope",
        }));
        assert_eq!(r, SpecialRules::default());

        let r = rules(json!({
            "combo_multiplier": "2",
            "direction_lock": 3,
        }));
        assert_eq!(r.combo_multiplier, None);
        assert_eq!(r.direction_lock, None);
    }

    #[test]
    fn malformed_blocked_entries_are_skipped() {
        let r = rules(json!({"blocked_cells": [[1, 1], [2], "x", [3, -1], [0, 2]]}));
        assert_eq!(r.blocked_cells, vec![(1, 1), (0, 2)]);
    }

    #[test]
    fn blocked_cells_clamped_to_board() {
        let r = rules(json!({"blocked_cells": [[0, 0], [4, 0], [1, 3], [0, 0]]}));
        assert_eq!(r.blocked_within(4, 4), vec![(0, 0), (1, 3)]);
        assert_eq!(r.blocked_within(1, 1), vec![(0, 0)]);
    }

    #[test]
    fn ruleset_tags() {
        assert_eq!(Ruleset::from_tag("pow2"), Some(Ruleset::Pow2));
        assert_eq!(Ruleset::from_tag("fibonacci"), Some(Ruleset::Fibonacci));
        assert_eq!(Ruleset::from_tag("POW2"), None);
        assert_eq!(
            serde_json::to_value(Ruleset::Fibonacci).unwrap(),
            json!("fibonacci")
        );
    }

    #[test]
    fn mode_config_deserializes_with_defaults() {
        let mode: ModeConfig = serde_json::from_value(json!({
            "key": "classic_4x4",
            "board_width": 4,
            "board_height": 4,
            "ruleset": "pow2",
        }))
        .unwrap();
        assert!(mode.spawn_table.is_empty());
        assert_eq!(mode.max_tile, None);
        assert!(!mode.undo_enabled);
        assert!(!mode.is_practice());
        assert!(mode.allows_win_stop());
    }
}
