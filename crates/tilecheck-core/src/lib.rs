//! Core types for the tilecheck replay verifier.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the simulation engine, the replay validator,
//! and the verification worker: identifiers, move directions and replay
//! actions, game-mode configuration, tile arithmetic for both rulesets,
//! the mode catalog seam, and the simulation error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod action;
pub mod catalog;
pub mod error;
pub mod id;
pub mod mode;
pub mod tile;

pub use action::{Action, Direction};
pub use catalog::{ModeCatalog, StaticCatalog};
pub use error::{CatalogError, SimError, SimErrorKind};
pub use id::{JobId, SessionId};
pub use mode::{
    DirectionLock, ModeConfig, Ruleset, SpawnEntry, SpecialRules, PRACTICE_FAMILY,
};
pub use tile::{is_legal_tile, merge_value, CANONICAL_WIN_TILE};
