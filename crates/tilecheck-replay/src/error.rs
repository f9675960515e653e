//! Rejection reasons.
//!
//! Every rejection carries a stable snake_case code (see
//! [`RejectReason::code`]) that callers persist alongside the session,
//! plus structured detail for logs.

use std::error::Error;
use std::fmt;

use tilecheck_core::{Ruleset, SimError, SimErrorKind};

use crate::compare::BoardDivergence;

/// A mode-bound field embedded in the replay payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayField {
    /// `mode_key`.
    ModeKey,
    /// `board_width` / `board_height`.
    BoardSize,
    /// `ruleset`.
    Ruleset,
    /// `undo_enabled`.
    UndoFlag,
    /// `mode_family`.
    ModeFamily,
    /// `rank_policy`.
    RankPolicy,
    /// `special_rules_snapshot`.
    SpecialRules,
}

impl ReplayField {
    fn mismatch_code(self) -> &'static str {
        match self {
            Self::ModeKey => "replay_mode_key_mismatch",
            Self::BoardSize => "replay_board_size_mismatch",
            Self::Ruleset => "replay_ruleset_mismatch",
            Self::UndoFlag => "replay_undo_flag_mismatch",
            Self::ModeFamily => "replay_mode_family_mismatch",
            Self::RankPolicy => "replay_rank_policy_mismatch",
            Self::SpecialRules => "replay_special_rules_mismatch",
        }
    }
}

impl fmt::Display for ReplayField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ModeKey => "mode_key",
            Self::BoardSize => "board size",
            Self::Ruleset => "ruleset",
            Self::UndoFlag => "undo_enabled",
            Self::ModeFamily => "mode_family",
            Self::RankPolicy => "rank_policy",
            Self::SpecialRules => "special_rules_snapshot",
        };
        f.write_str(name)
    }
}

/// Why a submission was rejected.
#[derive(Clone, Debug, PartialEq)]
pub enum RejectReason {
    /// The declared mode key resolves to nothing, even through aliases.
    UnknownMode {
        /// The declared key.
        key: String,
    },
    /// The resolved mode cannot be simulated (e.g. oversized board).
    ModeUnplayable {
        /// Engine diagnostic.
        detail: String,
    },
    /// Declared board size differs from the mode's.
    BoardSizeMismatch {
        /// Declared `(width, height)`.
        declared: (u32, u32),
        /// The mode's `(width, height)`.
        expected: (u32, u32),
    },
    /// Declared ruleset differs from the mode's.
    RulesetMismatch {
        /// Declared ruleset tag.
        declared: String,
        /// The mode's ruleset.
        expected: Ruleset,
    },
    /// Declared undo flag differs from the mode's.
    UndoFlagMismatch {
        /// Declared flag.
        declared: bool,
    },
    /// Declared ranked bucket differs from the mode's.
    RankedBucketMismatch {
        /// Declared bucket.
        declared: String,
        /// The mode's bucket.
        expected: String,
    },
    /// The replay is not an object, or a field has the wrong JSON type.
    ReplayMalformed {
        /// What was wrong.
        detail: String,
    },
    /// `v` is missing or not the supported version.
    ReplayVersionUnsupported {
        /// The `v` value as found, rendered as JSON.
        found: String,
    },
    /// `seed` is missing or not a finite number.
    ReplaySeedInvalid,
    /// `actions` is missing or not an array.
    ReplayActionsInvalid,
    /// More actions than the configured maximum.
    ReplayTooLong {
        /// Number of actions in the log.
        len: usize,
        /// Configured maximum.
        max: usize,
    },
    /// A mode-bound field embedded in the replay disagrees with the mode.
    ReplayFieldMismatch {
        /// Which field.
        field: ReplayField,
    },
    /// The claimed final board has the wrong shape or an illegal value.
    FinalBoardInvalid {
        /// What was wrong.
        detail: String,
    },
    /// The claimed score is negative.
    ScoreInvalid {
        /// The claim.
        claimed: i64,
    },
    /// The claimed best tile is negative or not a legal tile.
    BestTileInvalid {
        /// The claim.
        claimed: i64,
    },
    /// An action could not be decoded or applied.
    Simulation(SimError),
    /// The simulation aborted unexpectedly.
    SimulationAborted {
        /// Panic message, if one was recoverable.
        detail: String,
    },
    /// Recomputed score differs from the claim.
    ScoreMismatch {
        /// The claim.
        claimed: u64,
        /// The recomputed value.
        recomputed: u64,
    },
    /// Recomputed best tile differs from the claim.
    BestTileMismatch {
        /// The claim.
        claimed: u64,
        /// The recomputed value.
        recomputed: u64,
    },
    /// Recomputed board differs from the claim.
    BoardMismatch(BoardDivergence),
    /// The replay ends while moves remain and win-stop does not apply.
    NotTerminal,
}

fn sim_code(kind: &SimErrorKind) -> &'static str {
    match kind {
        SimErrorKind::TooManyActions { .. } => "sim_too_many_actions",
        SimErrorKind::UnknownAction { .. } => "sim_unknown_action",
        SimErrorKind::MalformedAction { .. } => "sim_malformed_action",
        SimErrorKind::ActionAfterGameOver => "sim_action_after_game_over",
        SimErrorKind::UndoDisabled => "sim_undo_disabled",
        SimErrorKind::UndoLimitReached => "sim_undo_limit_reached",
        SimErrorKind::NothingToUndo => "sim_nothing_to_undo",
        SimErrorKind::PracticeNotAllowed => "sim_practice_not_allowed",
        SimErrorKind::InvalidPracticeTile { .. } => "sim_invalid_practice_tile",
        SimErrorKind::NoOpMove { .. } => "sim_no_op_move",
        SimErrorKind::DirectionLocked { .. } => "sim_direction_locked",
    }
}

impl RejectReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownMode { .. } => "unknown_mode",
            Self::ModeUnplayable { .. } => "mode_unplayable",
            Self::BoardSizeMismatch { .. } => "board_size_mismatch",
            Self::RulesetMismatch { .. } => "ruleset_mismatch",
            Self::UndoFlagMismatch { .. } => "undo_flag_mismatch",
            Self::RankedBucketMismatch { .. } => "ranked_bucket_mismatch",
            Self::ReplayMalformed { .. } => "replay_malformed",
            Self::ReplayVersionUnsupported { .. } => "replay_version_unsupported",
            Self::ReplaySeedInvalid => "replay_seed_invalid",
            Self::ReplayActionsInvalid => "replay_actions_invalid",
            Self::ReplayTooLong { .. } => "replay_too_long",
            Self::ReplayFieldMismatch { field } => field.mismatch_code(),
            Self::FinalBoardInvalid { .. } => "final_board_invalid",
            Self::ScoreInvalid { .. } => "score_invalid",
            Self::BestTileInvalid { .. } => "best_tile_invalid",
            Self::Simulation(e) => sim_code(&e.kind),
            Self::SimulationAborted { .. } => "sim_aborted",
            Self::ScoreMismatch { .. } => "score_mismatch",
            Self::BestTileMismatch { .. } => "best_tile_mismatch",
            Self::BoardMismatch(_) => "board_mismatch",
            Self::NotTerminal => "not_terminal",
        }
    }

    /// Index of the offending action, for simulation failures.
    pub fn action_index(&self) -> Option<usize> {
        match self {
            Self::Simulation(e) => Some(e.index),
            _ => None,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMode { key } => write!(f, "unknown mode '{key}'"),
            Self::ModeUnplayable { detail } => write!(f, "mode cannot be simulated: {detail}"),
            Self::BoardSizeMismatch { declared, expected } => write!(
                f,
                "declared board {}x{}, mode is {}x{}",
                declared.0, declared.1, expected.0, expected.1
            ),
            Self::RulesetMismatch { declared, expected } => write!(
                f,
                "declared ruleset '{declared}', mode is '{}'",
                expected.as_str()
            ),
            Self::UndoFlagMismatch { declared } => {
                write!(f, "declared undo_enabled={declared} disagrees with mode")
            }
            Self::RankedBucketMismatch { declared, expected } => write!(
                f,
                "declared ranked bucket '{declared}', mode is '{expected}'"
            ),
            Self::ReplayMalformed { detail } => write!(f, "malformed replay: {detail}"),
            Self::ReplayVersionUnsupported { found } => {
                write!(f, "unsupported replay version {found}")
            }
            Self::ReplaySeedInvalid => write!(f, "replay seed missing or not a finite number"),
            Self::ReplayActionsInvalid => write!(f, "replay actions missing or not an array"),
            Self::ReplayTooLong { len, max } => {
                write!(f, "replay has {len} actions, maximum is {max}")
            }
            Self::ReplayFieldMismatch { field } => {
                write!(f, "replay {field} disagrees with mode")
            }
            Self::FinalBoardInvalid { detail } => write!(f, "invalid final board: {detail}"),
            Self::ScoreInvalid { claimed } => write!(f, "invalid claimed score {claimed}"),
            Self::BestTileInvalid { claimed } => write!(f, "invalid claimed best tile {claimed}"),
            Self::Simulation(e) => write!(f, "simulation failed at {e}"),
            Self::SimulationAborted { detail } => write!(f, "simulation aborted: {detail}"),
            Self::ScoreMismatch {
                claimed,
                recomputed,
            } => write!(f, "claimed score {claimed}, replay scores {recomputed}"),
            Self::BestTileMismatch {
                claimed,
                recomputed,
            } => write!(f, "claimed best tile {claimed}, replay reaches {recomputed}"),
            Self::BoardMismatch(d) => write!(
                f,
                "final board differs in {} cell(s) (claimed={:#018x}, replayed={:#018x})",
                d.cells.len(),
                d.claimed_hash,
                d.replayed_hash
            ),
            Self::NotTerminal => write!(f, "replay ends before the game is over"),
        }
    }
}

impl Error for RejectReason {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Simulation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SimError> for RejectReason {
    fn from(e: SimError) -> Self {
        Self::Simulation(e)
    }
}
