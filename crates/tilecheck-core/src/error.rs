//! Error types shared across the tilecheck workspace.
//!
//! Simulation errors are indexed by the offending replay action so that
//! a rejection can point at the exact entry of a submitted log.

use std::error::Error;
use std::fmt;

use crate::action::Direction;

/// Why a replay action could not be applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimErrorKind {
    /// The log is longer than the configured action budget.
    TooManyActions {
        /// Number of actions in the log.
        len: usize,
        /// Configured maximum.
        max: usize,
    },
    /// The action tag is not one of `m`, `u`, `p`.
    UnknownAction {
        /// The unrecognized tag, or a description of the entry.
        tag: String,
    },
    /// The action tag is known but its payload is malformed.
    MalformedAction {
        /// Description of what is wrong.
        detail: String,
    },
    /// An action arrived after the game reached game-over.
    ActionAfterGameOver,
    /// The mode does not allow undo.
    UndoDisabled,
    /// The mode's `undo_limit` is exhausted.
    UndoLimitReached,
    /// There is no move to undo.
    NothingToUndo,
    /// A practice tile was placed outside the practice family.
    PracticeNotAllowed,
    /// The practice tile targets a bad cell or carries an illegal value.
    InvalidPracticeTile {
        /// Column.
        x: usize,
        /// Row.
        y: usize,
        /// Requested value.
        value: u64,
    },
    /// The move did not change the board.
    NoOpMove {
        /// Direction attempted.
        direction: Direction,
    },
    /// The move targets the currently locked direction.
    DirectionLocked {
        /// Direction attempted.
        direction: Direction,
    },
}

impl SimErrorKind {
    /// Stable machine-readable code for rejection reasons.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TooManyActions { .. } => "too_many_actions",
            Self::UnknownAction { .. } => "unknown_action",
            Self::MalformedAction { .. } => "malformed_action",
            Self::ActionAfterGameOver => "action_after_game_over",
            Self::UndoDisabled => "undo_disabled",
            Self::UndoLimitReached => "undo_limit_reached",
            Self::NothingToUndo => "nothing_to_undo",
            Self::PracticeNotAllowed => "practice_not_allowed",
            Self::InvalidPracticeTile { .. } => "invalid_practice_tile",
            Self::NoOpMove { .. } => "no_op_move",
            Self::DirectionLocked { .. } => "direction_locked",
        }
    }
}

impl fmt::Display for SimErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyActions { len, max } => {
                write!(f, "log has {len} actions, maximum is {max}")
            }
            Self::UnknownAction { tag } => write!(f, "unknown action '{tag}'"),
            Self::MalformedAction { detail } => write!(f, "malformed action: {detail}"),
            Self::ActionAfterGameOver => write!(f, "action after game over"),
            Self::UndoDisabled => write!(f, "undo is disabled for this mode"),
            Self::UndoLimitReached => write!(f, "undo limit reached"),
            Self::NothingToUndo => write!(f, "nothing to undo"),
            Self::PracticeNotAllowed => write!(f, "practice tiles outside practice mode"),
            Self::InvalidPracticeTile { x, y, value } => {
                write!(f, "invalid practice tile {value} at ({x}, {y})")
            }
            Self::NoOpMove { direction } => write!(f, "move {direction} changes nothing"),
            Self::DirectionLocked { direction } => {
                write!(f, "move {direction} is direction-locked")
            }
        }
    }
}

/// A replay action that could not be applied, with its log index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimError {
    /// Zero-based index of the offending action.
    pub index: usize,
    /// What went wrong.
    pub kind: SimErrorKind,
}

impl SimError {
    /// Create an error for the action at `index`.
    pub fn new(index: usize, kind: SimErrorKind) -> Self {
        Self { index, kind }
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action {}: {}", self.index, self.kind)
    }
}

impl Error for SimError {}

/// Errors from building a [`StaticCatalog`](crate::StaticCatalog).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogError {
    /// A mode with this key is already registered.
    DuplicateKey {
        /// The repeated key.
        key: String,
    },
    /// An alias points at a key that is not registered.
    DanglingAlias {
        /// The alias.
        alias: String,
        /// The missing target key.
        target: String,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey { key } => write!(f, "mode '{key}' registered twice"),
            Self::DanglingAlias { alias, target } => {
                write!(f, "alias '{alias}' points at unknown mode '{target}'")
            }
        }
    }
}

impl Error for CatalogError {}
