//! The game state machine: moves, undo, direction locks, practice tiles.
//!
//! # States
//!
//! ```text
//! Playing ──move──▶ Playing ──(no legal move left)──▶ GameOver
//!    ▲                                                   │
//!    └────────────────────────undo───────────────────────┘
//! ```
//!
//! `WinStop` is not a state of its own: it is how [`GameEngine::outcome`]
//! labels a still-playable uncapped `pow2` board whose best tile reached
//! [`CANONICAL_WIN_TILE`].

use std::collections::VecDeque;

use tilecheck_core::{
    is_legal_tile, Action, Direction, ModeConfig, Ruleset, SimError, SimErrorKind, SpawnEntry,
    CANONICAL_WIN_TILE,
};

use crate::board::Board;
use crate::draw::{lock_direction, spawn_draw, SpawnDraw};
use crate::error::{EngineError, MAX_CELLS};
use crate::slide::slide;

/// Maximum number of undo snapshots retained. The oldest is dropped
/// when a move would exceed it.
pub const UNDO_STACK_CAPACITY: usize = 64;

/// How a game currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Legal moves remain and the win tile has not been reached
    /// (or win-stop does not apply to this mode).
    Playing,
    /// No direction changes the board.
    GameOver,
    /// Legal moves remain, but an uncapped `pow2` board reached the win tile.
    WinStop,
}

/// Details of a move that changed the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveSummary {
    /// Direction moved.
    pub direction: Direction,
    /// Number of merges performed.
    pub merges: u32,
    /// Sum of merged tile values.
    pub merge_gain: u64,
    /// Extra score from the combo multiplier.
    pub combo_bonus: u64,
    /// Spawned tile as `(x, y, value)`, if an empty cell existed.
    pub spawned: Option<(usize, usize, u64)>,
    /// Whether the move ended the game.
    pub game_over: bool,
}

/// Result of [`GameEngine::move_tiles`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveResult {
    /// The board changed.
    Moved(MoveSummary),
    /// Nothing slid or merged. A pending direction lock was consumed.
    NoChange,
    /// The direction is locked; state is untouched.
    Locked,
    /// The game is already over; state is untouched.
    GameOver,
}

impl MoveResult {
    /// Whether the board changed.
    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved(_))
    }
}

/// Per-game counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Successful moves on the current line of play.
    pub moves: u64,
    /// Undos performed over the whole game.
    pub undos_used: u32,
    /// Consecutive merging moves.
    pub combo_streak: u32,
    /// History entries (moves and undos) recorded so far.
    pub history_len: u64,
}

/// Owned copy of the end-of-replay result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinalState {
    /// Final score.
    pub score: u64,
    /// Largest tile on the final board.
    pub best_tile: u64,
    /// Final board, row-major.
    pub board: Vec<Vec<u64>>,
    /// How the game stands.
    pub outcome: Outcome,
}

impl FinalState {
    /// Whether the game ended in an accepted terminal condition.
    pub fn is_terminal(&self) -> bool {
        matches!(self.outcome, Outcome::GameOver | Outcome::WinStop)
    }
}

/// Mode parameters after normalization.
#[derive(Clone, Debug)]
struct Rules {
    ruleset: Ruleset,
    spawn_table: Vec<SpawnEntry>,
    max_tile: Option<u64>,
    undo_enabled: bool,
    practice: bool,
    win_stop: bool,
    undo_limit: Option<u32>,
    combo_multiplier: Option<f64>,
    lock_every: Option<u64>,
}

impl Rules {
    fn from_mode(mode: &ModeConfig) -> Self {
        let special = mode.rules();
        let mut spawn_table: Vec<SpawnEntry> = mode
            .spawn_table
            .iter()
            .copied()
            .filter(|e| e.weight > 0 && e.value > 0)
            .filter(|e| is_legal_tile(mode.ruleset, e.value, mode.max_tile))
            .collect();
        if spawn_table.is_empty() {
            spawn_table = mode.ruleset.default_spawn_table();
        }
        Self {
            ruleset: mode.ruleset,
            spawn_table,
            max_tile: mode.max_tile,
            undo_enabled: mode.undo_enabled,
            practice: mode.is_practice(),
            win_stop: mode.allows_win_stop(),
            undo_limit: special.undo_limit,
            combo_multiplier: special.combo_multiplier,
            lock_every: special.direction_lock.map(|l| l.every_k_moves),
        }
    }
}

/// State restored by undo. Deep copy; shares nothing with the live board.
#[derive(Clone, Debug)]
struct Snapshot {
    board: Board,
    score: u64,
    combo_streak: u32,
    moves: u64,
    lock_consumed_at: u64,
}

/// One game, replayable from `(mode, seed, actions)`.
#[derive(Clone, Debug)]
pub struct GameEngine {
    seed: f64,
    rules: Rules,
    board: Board,
    score: u64,
    game_over: bool,
    moves: u64,
    combo_streak: u32,
    undos_used: u32,
    /// Move count at which the pending lock was consumed.
    lock_consumed_at: u64,
    history_len: u64,
    undo_stack: VecDeque<Snapshot>,
}

impl GameEngine {
    /// Start a game: normalize the mode, build the board, and place the
    /// two opening tiles.
    pub fn new(mode: &ModeConfig, seed: f64) -> Result<Self, EngineError> {
        if !seed.is_finite() {
            return Err(EngineError::InvalidSeed { seed });
        }
        let width = mode.board_width.max(1) as usize;
        let height = mode.board_height.max(1) as usize;
        if width.saturating_mul(height) > MAX_CELLS {
            return Err(EngineError::BoardTooLarge {
                width: mode.board_width,
                height: mode.board_height,
            });
        }

        let blocked = mode.rules().blocked_within(width, height);
        let mut engine = Self {
            seed,
            rules: Rules::from_mode(mode),
            board: Board::new(width, height, &blocked),
            score: 0,
            game_over: false,
            moves: 0,
            combo_streak: 0,
            undos_used: 0,
            lock_consumed_at: 0,
            history_len: 0,
            undo_stack: VecDeque::new(),
        };
        // Both opening spawns see an empty history.
        let opening = spawn_draw(seed, 0);
        engine.spawn(opening);
        engine.spawn(opening);
        engine.game_over = !engine.any_move_available();
        Ok(engine)
    }

    /// The seed this game was created with.
    pub fn seed(&self) -> f64 {
        self.seed
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Current score.
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Largest tile on the board.
    pub fn best_tile(&self) -> u64 {
        self.board.best_tile()
    }

    /// Whether no direction changes the board.
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// How the game currently stands.
    pub fn outcome(&self) -> Outcome {
        if self.game_over {
            Outcome::GameOver
        } else if self.rules.win_stop && self.best_tile() >= CANONICAL_WIN_TILE {
            Outcome::WinStop
        } else {
            Outcome::Playing
        }
    }

    /// Counters for the current game.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            moves: self.moves,
            undos_used: self.undos_used,
            combo_streak: self.combo_streak,
            history_len: self.history_len,
        }
    }

    /// History entries recorded so far (moves and undos).
    pub fn history_len(&self) -> u64 {
        self.history_len
    }

    /// Undos still allowed under `undo_limit`; `None` if unlimited.
    pub fn undo_remaining(&self) -> Option<u32> {
        self.rules
            .undo_limit
            .map(|limit| limit.saturating_sub(self.undos_used))
    }

    /// Owned copy of score, best tile, board, and outcome.
    pub fn snapshot(&self) -> FinalState {
        FinalState {
            score: self.score,
            best_tile: self.best_tile(),
            board: self.board.rows(),
            outcome: self.outcome(),
        }
    }

    /// The direction forbidden for the next attempt, if a lock is pending.
    pub fn locked_direction(&self) -> Option<Direction> {
        let k = self.rules.lock_every?;
        if self.moves == 0 || self.moves % k != 0 || self.lock_consumed_at == self.moves {
            return None;
        }
        Some(lock_direction(self.seed, self.moves / k))
    }

    /// Whether moving in `direction` now would change the board.
    pub fn would_move(&self, direction: Direction) -> bool {
        !self.game_over && self.locked_direction() != Some(direction) && self.slides(direction)
    }

    /// Slide all tiles in `direction`.
    ///
    /// A move that changes the board updates the score and combo streak,
    /// pushes an undo snapshot, spawns a tile, and records one history
    /// entry. Any attempt other than the locked direction consumes a
    /// pending lock, even when it changes nothing.
    pub fn move_tiles(&mut self, direction: Direction) -> MoveResult {
        if self.game_over {
            return MoveResult::GameOver;
        }
        // The snapshot must carry the lock as it stood before this attempt,
        // so that undo re-arms a lock the move consumed.
        let lock_before = self.lock_consumed_at;
        if let Some(locked) = self.locked_direction() {
            if locked == direction {
                return MoveResult::Locked;
            }
            self.lock_consumed_at = self.moves;
        }

        let before = self.board.clone();
        let slid = slide(
            &mut self.board,
            direction,
            self.rules.ruleset,
            self.rules.max_tile,
        );
        if !slid.moved {
            return MoveResult::NoChange;
        }

        self.push_snapshot(Snapshot {
            board: before,
            score: self.score,
            combo_streak: self.combo_streak,
            moves: self.moves,
            lock_consumed_at: lock_before,
        });

        let mut combo_bonus = 0;
        if slid.merges > 0 {
            self.combo_streak = self.combo_streak.saturating_add(1);
            if let Some(mult) = self.rules.combo_multiplier {
                if self.combo_streak > 1 {
                    let extra =
                        slid.gain as f64 * (mult - 1.0) * f64::from(self.combo_streak - 1);
                    combo_bonus = extra.floor() as u64;
                }
            }
        } else {
            self.combo_streak = 0;
        }
        self.score = self.score.saturating_add(slid.gain.saturating_add(combo_bonus));

        let spawned = self.spawn(spawn_draw(self.seed, self.history_len));
        self.history_len += 1;
        self.moves += 1;
        self.game_over = !self.any_move_available();

        MoveResult::Moved(MoveSummary {
            direction,
            merges: slid.merges,
            merge_gain: slid.gain,
            combo_bonus,
            spawned,
            game_over: self.game_over,
        })
    }

    /// Restore the state before the most recent successful move.
    ///
    /// Counts as one history entry but never spawns. The undo counter is
    /// not restored, so `undo_limit` bounds undos over the whole game.
    pub fn undo(&mut self) -> Result<(), SimErrorKind> {
        if !self.rules.undo_enabled {
            return Err(SimErrorKind::UndoDisabled);
        }
        if let Some(limit) = self.rules.undo_limit {
            if self.undos_used >= limit {
                return Err(SimErrorKind::UndoLimitReached);
            }
        }
        let snap = self
            .undo_stack
            .pop_back()
            .ok_or(SimErrorKind::NothingToUndo)?;

        self.board = snap.board;
        self.score = snap.score;
        self.combo_streak = snap.combo_streak;
        self.moves = snap.moves;
        self.lock_consumed_at = snap.lock_consumed_at;
        self.game_over = false;
        self.undos_used += 1;
        self.history_len += 1;
        Ok(())
    }

    /// Overwrite one cell directly (practice modes only).
    ///
    /// `value` must be a legal tile for the ruleset, or zero to clear.
    /// Consumes no history entry and spawns nothing.
    pub fn insert_practice_tile(&mut self, x: usize, y: usize, value: u64) -> Result<(), SimErrorKind> {
        if !self.rules.practice {
            return Err(SimErrorKind::PracticeNotAllowed);
        }
        let legal = is_legal_tile(self.rules.ruleset, value, self.rules.max_tile);
        if self.board.is_blocked(x, y) || !legal || !self.board.set(x, y, value) {
            return Err(SimErrorKind::InvalidPracticeTile { x, y, value });
        }
        self.game_over = !self.any_move_available();
        Ok(())
    }

    /// Apply a whole replay log, stopping at the first illegal action.
    ///
    /// A move that changes nothing is an error here: genuine clients
    /// never record one.
    pub fn apply_log(&mut self, actions: &[Action], max_actions: usize) -> Result<(), SimError> {
        if actions.len() > max_actions {
            return Err(SimError::new(
                max_actions,
                SimErrorKind::TooManyActions {
                    len: actions.len(),
                    max: max_actions,
                },
            ));
        }

        for (index, action) in actions.iter().enumerate() {
            self.apply_action(index, *action)?;
        }
        Ok(())
    }

    /// Apply the action at position `index` of a replay log.
    ///
    /// Same rules as [`apply_log`](Self::apply_log), one action at a time,
    /// for callers that decode the log as they go.
    pub fn apply_action(&mut self, index: usize, action: Action) -> Result<(), SimError> {
        if self.game_over {
            return Err(SimError::new(index, SimErrorKind::ActionAfterGameOver));
        }
        let applied = match action {
            Action::Move(direction) => match self.move_tiles(direction) {
                MoveResult::Moved(_) => Ok(()),
                MoveResult::NoChange => Err(SimErrorKind::NoOpMove { direction }),
                MoveResult::Locked => Err(SimErrorKind::DirectionLocked { direction }),
                MoveResult::GameOver => Err(SimErrorKind::ActionAfterGameOver),
            },
            Action::Undo => self.undo(),
            Action::PracticeSet { x, y, value } => self.insert_practice_tile(x, y, value),
        };
        applied.map_err(|kind| SimError::new(index, kind))
    }

    fn push_snapshot(&mut self, snap: Snapshot) {
        if self.undo_stack.len() == UNDO_STACK_CAPACITY {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(snap);
    }

    fn spawn(&mut self, draw: SpawnDraw) -> Option<(usize, usize, u64)> {
        let cell = draw.pick_cell(&self.board.empty_cells())?;
        let value = draw.pick_value(&self.rules.spawn_table)?;
        let (x, y) = (cell % self.board.width(), cell / self.board.width());
        self.board.set(x, y, value).then_some((x, y, value))
    }

    fn slides(&self, direction: Direction) -> bool {
        let mut scratch = self.board.clone();
        slide(&mut scratch, direction, self.rules.ruleset, self.rules.max_tile).moved
    }

    fn any_move_available(&self) -> bool {
        Direction::ALL.iter().any(|&d| self.slides(d))
    }
}
