//! Tilecheck: a deterministic sliding-tile game engine and the
//! server-side verifier that replays submitted games.
//!
//! This is the facade crate that re-exports the public API of the
//! tilecheck sub-crates. Clients embed the engine and record an action
//! log; the server re-runs that log and trusts only what it recomputes.
//!
//! # Quick start
//!
//! ```rust
//! use serde_json::json;
//! use tilecheck::prelude::*;
//!
//! let mode = ModeConfig {
//!     key: "classic_4x4".into(),
//!     board_width: 4,
//!     board_height: 4,
//!     ruleset: Ruleset::Pow2,
//!     spawn_table: vec![],
//!     max_tile: None,
//!     undo_enabled: false,
//!     mode_family: "classic".into(),
//!     rank_policy: "ranked".into(),
//!     ranked_bucket: "classic_4x4".into(),
//!     special_rules: Default::default(),
//! };
//! let mut catalog = StaticCatalog::new();
//! catalog.insert(mode.clone()).unwrap();
//!
//! // Client: play to the end, logging every action.
//! let seed = 0.123456;
//! let mut engine = GameEngine::new(&mode, seed).unwrap();
//! let mut actions = Vec::new();
//! while !engine.is_game_over() {
//!     let d = Direction::ALL
//!         .into_iter()
//!         .find(|&d| engine.would_move(d))
//!         .unwrap();
//!     engine.move_tiles(d);
//!     actions.push(Action::Move(d));
//! }
//! let end = engine.snapshot();
//!
//! // Server: replay and compare.
//! let submission = Submission {
//!     mode_key: mode.key.clone(),
//!     board_width: 4,
//!     board_height: 4,
//!     ruleset: "pow2".into(),
//!     undo_enabled: false,
//!     ranked_bucket: mode.ranked_bucket.clone(),
//!     replay: ReplayPayload::for_mode(&mode, seed, actions).to_value().unwrap(),
//!     final_board: json!(end.board),
//!     claimed_score: end.score as i64,
//!     claimed_best_tile: end.best_tile as i64,
//! };
//! let validator = Validator::new(catalog, ValidatorConfig::default());
//! let verdict = validator.validate(&submission);
//! assert_eq!(verdict.outcome().unwrap().score, end.score);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tilecheck-core` | Actions, modes, catalog, tile rules, IDs, simulation errors |
//! | [`engine`] | `tilecheck-engine` | Board, keyed draws, the game engine |
//! | [`replay`] | `tilecheck-replay` | Replay payloads, codec, board hashing, the validator |
//! | [`worker`] | `tilecheck-worker` | Job store contract, in-memory store, worker pool |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types (`tilecheck-core`).
///
/// Contains [`types::Action`], [`types::ModeConfig`], the
/// [`types::ModeCatalog`] trait, tile rules, and the simulation error
/// taxonomy.
pub use tilecheck_core as types;

/// The deterministic game engine (`tilecheck-engine`).
///
/// [`engine::GameEngine`] applies moves, undos and practice tiles;
/// [`engine::draw`] holds the keyed random draws.
pub use tilecheck_engine as engine;

/// Replay payloads and validation (`tilecheck-replay`).
///
/// Build payloads with [`replay::ReplayPayload`], verify submissions with
/// [`replay::Validator`].
pub use tilecheck_replay as replay;

/// Background verification (`tilecheck-worker`).
///
/// Implement [`worker::JobStore`] for your database, or use
/// [`worker::MemoryStore`], and run a [`worker::WorkerPool`].
pub use tilecheck_worker as worker;

/// Common imports for typical tilecheck usage.
///
/// ```rust
/// use tilecheck::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use tilecheck_core::{
        Action, Direction, ModeCatalog, ModeConfig, Ruleset, SpawnEntry, StaticCatalog,
    };

    // Errors
    pub use tilecheck_core::{SimError, SimErrorKind};
    pub use tilecheck_engine::EngineError;

    // Engine
    pub use tilecheck_engine::{FinalState, GameEngine, MoveResult, Outcome};

    // Replay
    pub use tilecheck_replay::{
        RejectReason, ReplayPayload, Submission, Validator, ValidatorConfig, Verdict,
        VerifiedOutcome,
    };

    // Worker
    pub use tilecheck_worker::{
        JobStore, MemoryStore, StopToken, Worker, WorkerConfig, WorkerPool,
    };
}
