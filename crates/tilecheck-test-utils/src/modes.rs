//! Standard game modes.
//!
//! - `classic_4x4` (legacy alias `classic`): ranked pow2, no undo
//! - `undo_4x4`: undo with a limit of 3
//! - `fib_4x4`: fibonacci ruleset
//! - `practice_4x4`: practice family, tile insertion allowed
//! - `blocked_5x5`: two blocked cells
//! - `combo_4x4`: combo multiplier 1.5
//! - `lock_4x4`: direction lock every 4 moves

use serde_json::{json, Map, Value};
use tilecheck_core::{ModeConfig, Ruleset, StaticCatalog};

fn base(key: &str, ruleset: Ruleset, family: &str, special: Value) -> ModeConfig {
    let special_rules = match special {
        Value::Object(m) => m,
        _ => Map::new(),
    };
    ModeConfig {
        key: key.into(),
        board_width: 4,
        board_height: 4,
        ruleset,
        spawn_table: vec![],
        max_tile: None,
        undo_enabled: false,
        mode_family: family.into(),
        rank_policy: "ranked".into(),
        ranked_bucket: key.into(),
        special_rules,
    }
}

pub fn classic_mode() -> ModeConfig {
    base("classic_4x4", Ruleset::Pow2, "classic", json!({}))
}

pub fn undo_mode() -> ModeConfig {
    ModeConfig {
        undo_enabled: true,
        rank_policy: "unranked".into(),
        ..base("undo_4x4", Ruleset::Pow2, "classic", json!({"undo_limit": 3}))
    }
}

pub fn fibonacci_mode() -> ModeConfig {
    base("fib_4x4", Ruleset::Fibonacci, "classic", json!({}))
}

pub fn practice_mode() -> ModeConfig {
    ModeConfig {
        rank_policy: "unranked".into(),
        ..base("practice_4x4", Ruleset::Pow2, "practice", json!({}))
    }
}

pub fn blocked_mode() -> ModeConfig {
    ModeConfig {
        board_width: 5,
        board_height: 5,
        ..base(
            "blocked_5x5",
            Ruleset::Pow2,
            "special",
            json!({"blocked_cells": [[2, 2], [0, 4]]}),
        )
    }
}

pub fn combo_mode() -> ModeConfig {
    base(
        "combo_4x4",
        Ruleset::Pow2,
        "special",
        json!({"combo_multiplier": 1.5}),
    )
}

pub fn lock_mode() -> ModeConfig {
    base(
        "lock_4x4",
        Ruleset::Pow2,
        "special",
        json!({"direction_lock": {"every_k_moves": 4}}),
    )
}

/// Catalog holding every mode above plus the `classic` alias.
pub fn standard_catalog() -> StaticCatalog {
    let mut catalog = StaticCatalog::new();
    for mode in [
        classic_mode(),
        undo_mode(),
        fibonacci_mode(),
        practice_mode(),
        blocked_mode(),
        combo_mode(),
        lock_mode(),
    ] {
        catalog.insert(mode).expect("fixture keys are unique");
    }
    catalog
        .alias("classic", "classic_4x4")
        .expect("alias target exists");
    catalog
}
