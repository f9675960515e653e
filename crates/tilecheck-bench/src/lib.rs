//! Benchmark profiles for the tilecheck replay verifier.
//!
//! - [`wide_mode`]: an 8x8 classic board, for long games with many merges
//! - [`profile_catalog`]: the standard test catalog plus [`wide_mode`]
//! - [`profile_games`]: finished games over a spread of seeds

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tilecheck_core::{ModeConfig, StaticCatalog};
use tilecheck_test_utils::{classic_mode, standard_catalog, Recording};

/// Key of [`wide_mode`].
pub const WIDE_KEY: &str = "classic_8x8";

/// Classic pow2 rules on an 8x8 board.
pub fn wide_mode() -> ModeConfig {
    ModeConfig {
        key: WIDE_KEY.into(),
        board_width: 8,
        board_height: 8,
        ranked_bucket: WIDE_KEY.into(),
        ..classic_mode()
    }
}

/// The standard test catalog with [`wide_mode`] added.
pub fn profile_catalog() -> StaticCatalog {
    let mut catalog = standard_catalog();
    catalog
        .insert(wide_mode())
        .expect("standard catalog has no 8x8 mode");
    catalog
}

/// `count` finished games of `mode`, seeds spread evenly over `(0, 1)`.
pub fn profile_games(mode: &ModeConfig, count: usize) -> Vec<Recording> {
    (0..count)
        .map(|i| {
            let seed = (i + 1) as f64 / (count + 1) as f64;
            Recording::play(mode, seed, None)
        })
        .collect()
}
