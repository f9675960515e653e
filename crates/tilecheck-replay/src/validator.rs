//! Server-side replay validation.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. resolve the declared mode (aliases included)
//! 2. outer declared fields against the mode
//! 3. replay envelope structure, then embedded fields against the mode
//! 4. well-formedness of the claimed board, score, and best tile
//! 5. simulation in a fresh engine, decoding each action just before it
//!    is applied, so the first bad action wins whether it is malformed
//!    or illegal
//! 6. recomputed score, best tile, and board against the claims, then
//!    the terminal condition
//!
//! Validation is a pure function of the submission and the catalog, so
//! validating the same submission twice yields the same verdict.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;
use tilecheck_core::{is_legal_tile, ModeCatalog, ModeConfig, Ruleset};
use tilecheck_engine::{EngineError, FinalState, GameEngine, Outcome};
use tracing::debug;

use crate::codec::decode_action;
use crate::compare::compare_boards;
use crate::config::ValidatorConfig;
use crate::error::{RejectReason, ReplayField};
use crate::hash::board_hash;
use crate::payload::Envelope;

/// A client's claim, as received alongside its replay.
#[derive(Clone, Debug, PartialEq)]
pub struct Submission {
    /// Declared mode key (canonical or legacy alias).
    pub mode_key: String,
    /// Declared board columns.
    pub board_width: u32,
    /// Declared board rows.
    pub board_height: u32,
    /// Declared ruleset tag.
    pub ruleset: String,
    /// Declared undo flag.
    pub undo_enabled: bool,
    /// Declared leaderboard bucket.
    pub ranked_bucket: String,
    /// Replay payload (schema v3).
    pub replay: Value,
    /// Claimed final board as an array of rows.
    pub final_board: Value,
    /// Claimed score.
    pub claimed_score: i64,
    /// Claimed best tile.
    pub claimed_best_tile: i64,
}

/// The recomputed result of an accepted replay. Persist these values,
/// never the client's claims.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedOutcome {
    /// Canonical key of the mode the replay was verified under.
    pub mode_key: String,
    /// Recomputed score.
    pub score: u64,
    /// Recomputed best tile.
    pub best_tile: u64,
    /// Recomputed final board.
    pub board: Vec<Vec<u64>>,
    /// [`board_hash`] of `board`.
    pub board_hash: u64,
    /// How the game ended.
    pub outcome: Outcome,
    /// Number of actions replayed.
    pub actions: usize,
}

/// Result of [`Validator::validate`].
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    /// Every check passed.
    Accepted(VerifiedOutcome),
    /// A check failed.
    Rejected(RejectReason),
}

impl Verdict {
    /// Whether the submission was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// The recomputed outcome, if accepted.
    pub fn outcome(&self) -> Option<&VerifiedOutcome> {
        match self {
            Self::Accepted(o) => Some(o),
            Self::Rejected(_) => None,
        }
    }

    /// The rejection reason, if rejected.
    pub fn reason(&self) -> Option<&RejectReason> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected(r) => Some(r),
        }
    }
}

/// Verifies submissions against a mode catalog.
#[derive(Clone, Debug)]
pub struct Validator<C> {
    catalog: C,
    config: ValidatorConfig,
}

impl<C: ModeCatalog> Validator<C> {
    /// Create a validator over `catalog`.
    pub fn new(catalog: C, config: ValidatorConfig) -> Self {
        Self { catalog, config }
    }

    /// Active configuration.
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Verify one submission. Never panics on malformed input.
    pub fn validate(&self, submission: &Submission) -> Verdict {
        match self.check(submission) {
            Ok(outcome) => Verdict::Accepted(outcome),
            Err(reason) => {
                debug!(
                    target: "tilecheck::validator",
                    mode_key = %submission.mode_key,
                    code = reason.code(),
                    action_index = reason.action_index(),
                    %reason,
                    "replay rejected"
                );
                Verdict::Rejected(reason)
            }
        }
    }

    fn check(&self, sub: &Submission) -> Result<VerifiedOutcome, RejectReason> {
        let mode = self
            .catalog
            .resolve(&sub.mode_key)
            .ok_or_else(|| RejectReason::UnknownMode {
                key: sub.mode_key.clone(),
            })?;
        check_declared(sub, &mode)?;

        let envelope = Envelope::parse(&sub.replay, self.config.max_actions)?;
        if let Some(key) = envelope.mode_key {
            let same_mode = self
                .catalog
                .resolve(key)
                .is_some_and(|m| m.key == mode.key);
            if !same_mode {
                return Err(RejectReason::ReplayFieldMismatch {
                    field: ReplayField::ModeKey,
                });
            }
        }
        envelope.check_fields(&mode)?;

        let claimed_board = parse_board(&sub.final_board, &mode)?;
        let claimed_score = u64::try_from(sub.claimed_score).map_err(|_| {
            RejectReason::ScoreInvalid {
                claimed: sub.claimed_score,
            }
        })?;
        let claimed_best_tile = u64::try_from(sub.claimed_best_tile)
            .ok()
            .filter(|&t| is_legal_tile(mode.ruleset, t, mode.max_tile))
            .ok_or(RejectReason::BestTileInvalid {
                claimed: sub.claimed_best_tile,
            })?;

        let fin = simulate(&mode, envelope.seed, envelope.actions)?;

        if fin.score != claimed_score {
            return Err(RejectReason::ScoreMismatch {
                claimed: claimed_score,
                recomputed: fin.score,
            });
        }
        if fin.best_tile != claimed_best_tile {
            return Err(RejectReason::BestTileMismatch {
                claimed: claimed_best_tile,
                recomputed: fin.best_tile,
            });
        }
        if let Some(divergence) = compare_boards(&claimed_board, &fin.board) {
            return Err(RejectReason::BoardMismatch(divergence));
        }
        let terminal = match fin.outcome {
            Outcome::GameOver => true,
            Outcome::WinStop => self.config.allow_win_stop,
            Outcome::Playing => false,
        };
        if !terminal {
            return Err(RejectReason::NotTerminal);
        }

        Ok(VerifiedOutcome {
            mode_key: mode.key,
            score: fin.score,
            best_tile: fin.best_tile,
            board_hash: board_hash(&fin.board),
            board: fin.board,
            outcome: fin.outcome,
            actions: envelope.actions.len(),
        })
    }
}

fn check_declared(sub: &Submission, mode: &ModeConfig) -> Result<(), RejectReason> {
    if (sub.board_width, sub.board_height) != (mode.board_width, mode.board_height) {
        return Err(RejectReason::BoardSizeMismatch {
            declared: (sub.board_width, sub.board_height),
            expected: (mode.board_width, mode.board_height),
        });
    }
    if Ruleset::from_tag(&sub.ruleset) != Some(mode.ruleset) {
        return Err(RejectReason::RulesetMismatch {
            declared: sub.ruleset.clone(),
            expected: mode.ruleset,
        });
    }
    if sub.undo_enabled != mode.undo_enabled {
        return Err(RejectReason::UndoFlagMismatch {
            declared: sub.undo_enabled,
        });
    }
    if sub.ranked_bucket != mode.ranked_bucket {
        return Err(RejectReason::RankedBucketMismatch {
            declared: sub.ranked_bucket.clone(),
            expected: mode.ranked_bucket.clone(),
        });
    }
    Ok(())
}

/// Parse a claimed board: exactly `height` rows of `width` legal tiles.
fn parse_board(value: &Value, mode: &ModeConfig) -> Result<Vec<Vec<u64>>, RejectReason> {
    let invalid = |detail: String| RejectReason::FinalBoardInvalid { detail };
    let (width, height) = (mode.board_width as usize, mode.board_height as usize);

    let rows = value
        .as_array()
        .ok_or_else(|| invalid("board is not an array".into()))?;
    if rows.len() != height {
        return Err(invalid(format!("expected {height} rows, got {}", rows.len())));
    }

    rows.iter()
        .enumerate()
        .map(|(y, row)| {
            let cells = row
                .as_array()
                .ok_or_else(|| invalid(format!("row {y} is not an array")))?;
            if cells.len() != width {
                return Err(invalid(format!(
                    "row {y}: expected {width} cells, got {}",
                    cells.len()
                )));
            }
            cells
                .iter()
                .enumerate()
                .map(|(x, cell)| {
                    cell.as_u64()
                        .filter(|&v| is_legal_tile(mode.ruleset, v, mode.max_tile))
                        .ok_or_else(|| invalid(format!("illegal tile {cell} at ({x}, {y})")))
                })
                .collect()
        })
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

/// Replay the undecoded `actions` in a fresh engine. The log length was
/// already bounded by [`Envelope::parse`]. A panic inside the engine
/// becomes a rejection rather than unwinding into the caller.
fn simulate(mode: &ModeConfig, seed: f64, actions: &[Value]) -> Result<FinalState, RejectReason> {
    let run = || -> Result<FinalState, RejectReason> {
        let mut engine = GameEngine::new(mode, seed).map_err(|e| match e {
            EngineError::InvalidSeed { .. } => RejectReason::ReplaySeedInvalid,
            other => RejectReason::ModeUnplayable {
                detail: other.to_string(),
            },
        })?;
        for (index, value) in actions.iter().enumerate() {
            let action = decode_action(index, value)?;
            engine.apply_action(index, action)?;
        }
        Ok(engine.snapshot())
    };
    panic::catch_unwind(AssertUnwindSafe(run)).unwrap_or_else(|payload| {
        Err(RejectReason::SimulationAborted {
            detail: panic_message(payload.as_ref()),
        })
    })
}
