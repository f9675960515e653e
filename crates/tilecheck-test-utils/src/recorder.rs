//! Recorded games.
//!
//! A [`Recording`] is what an honest client would hold at the end of a
//! session: the mode, the seed, the action log, and the engine's final
//! state. Tamper tests start from one and perturb a single claim.

use serde_json::json;
use tilecheck_core::{Action, Direction, ModeConfig};
use tilecheck_engine::{FinalState, GameEngine};
use tilecheck_replay::{ReplayPayload, Submission};

/// Direction preference used by [`Recording::play`].
pub const PREFERENCE: [Direction; 4] = [
    Direction::Down,
    Direction::Left,
    Direction::Right,
    Direction::Up,
];

#[derive(Clone, Debug)]
pub struct Recording {
    pub mode: ModeConfig,
    pub seed: f64,
    pub actions: Vec<Action>,
    pub final_state: FinalState,
}

impl Recording {
    /// Play the first legal direction in [`PREFERENCE`] order until the
    /// game ends or `limit` actions are logged.
    pub fn play(mode: &ModeConfig, seed: f64, limit: Option<usize>) -> Self {
        let mut engine = GameEngine::new(mode, seed).expect("fixture modes are playable");
        let mut actions = Vec::new();
        while !engine.is_game_over() && limit.is_none_or(|n| actions.len() < n) {
            let Some(d) = PREFERENCE.into_iter().find(|&d| engine.would_move(d)) else {
                break;
            };
            engine.move_tiles(d);
            actions.push(Action::Move(d));
        }
        Self {
            mode: mode.clone(),
            seed,
            actions,
            final_state: engine.snapshot(),
        }
    }

    /// Replay an explicit log (panics if the log is illegal).
    pub fn from_log(mode: &ModeConfig, seed: f64, actions: Vec<Action>) -> Self {
        let mut engine = GameEngine::new(mode, seed).expect("fixture modes are playable");
        engine
            .apply_log(&actions, usize::MAX)
            .expect("fixture logs are legal");
        Self {
            mode: mode.clone(),
            seed,
            actions,
            final_state: engine.snapshot(),
        }
    }

    pub fn replay_payload(&self) -> ReplayPayload {
        ReplayPayload::for_mode(&self.mode, self.seed, self.actions.clone())
    }

    pub fn replay_json(&self) -> String {
        self.replay_payload()
            .to_json()
            .expect("replay payloads serialize")
    }

    pub fn final_board_json(&self) -> String {
        json!(self.final_state.board).to_string()
    }

    /// The honest submission for this game.
    pub fn submission(&self) -> Submission {
        Submission {
            mode_key: self.mode.key.clone(),
            board_width: self.mode.board_width,
            board_height: self.mode.board_height,
            ruleset: self.mode.ruleset.as_str().into(),
            undo_enabled: self.mode.undo_enabled,
            ranked_bucket: self.mode.ranked_bucket.clone(),
            replay: self
                .replay_payload()
                .to_value()
                .expect("replay payloads serialize"),
            final_board: json!(self.final_state.board),
            claimed_score: self.final_state.score as i64,
            claimed_best_tile: self.final_state.best_tile as i64,
        }
    }
}
