//! Deterministic simulation of the tile-merging puzzle.
//!
//! A [`GameEngine`] owns exactly one game. It is synchronous, holds no
//! external resources, and touches no shared state, so any number of
//! engines can replay logs in parallel. Given the same mode, seed, and
//! action log, two engines always end on bit-identical boards.
//!
//! # Determinism
//!
//! Tile spawns never come from a running generator. Each spawn is a pure
//! function of `(seed, history length)` (see [`draw::spawn_draw`]), so a
//! board reached through undo-then-redo spawns exactly what a fresh
//! forward replay of the same history would.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod board;
pub mod draw;
pub mod engine;
pub mod error;
mod slide;

pub use board::Board;
pub use engine::{EngineStats, FinalState, GameEngine, MoveResult, MoveSummary, Outcome};
pub use error::EngineError;
