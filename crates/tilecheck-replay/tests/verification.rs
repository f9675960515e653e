//! Integration test: end-to-end replay verification.
//!
//! Each test records a game by driving a real engine with a fixed
//! policy, wraps the result as a client submission, and checks what the
//! validator makes of the genuine and the tampered claims.

use proptest::prelude::*;
use serde_json::json;
use tilecheck_core::{Action, Direction, StaticCatalog};
use tilecheck_engine::{GameEngine, Outcome};
use tilecheck_replay::{RejectReason, ReplayPayload, Submission, Validator, ValidatorConfig, Verdict};
use tilecheck_test_utils::{
    classic_mode, lock_mode, practice_mode, standard_catalog, undo_mode, Recording, PREFERENCE,
};

// ── Helpers ─────────────────────────────────────────────────────

fn validator(config: ValidatorConfig) -> Validator<StaticCatalog> {
    Validator::new(standard_catalog(), config)
}

fn finished_game(seed: f64) -> Submission {
    let rec = Recording::play(&classic_mode(), seed, None);
    assert_eq!(rec.final_state.outcome, Outcome::GameOver);
    rec.submission()
}

fn code(verdict: &Verdict) -> &'static str {
    verdict.reason().map(|r| r.code()).unwrap_or("accepted")
}

// ── Golden fixture ──────────────────────────────────────────────

const GOLDEN_SEED: f64 = 0.123456;

/// Wire direction indices (`2 = down, 3 = left`) of the first 40 moves
/// the preference policy makes in `classic_4x4` under [`GOLDEN_SEED`].
const GOLDEN_LOG: [u64; 40] = [
    2, 2, 2, 2, 2, 2, 3, 2, 2, 2, //
    2, 2, 3, 3, 2, 2, 2, 3, 2, 2, //
    2, 2, 2, 2, 3, 2, 2, 2, 2, 2, //
    2, 2, 2, 2, 2, 2, 2, 2, 3, 2, //
];
const GOLDEN_SCORE: u64 = 248;
const GOLDEN_BOARD: [[u64; 4]; 4] = [
    [0, 0, 0, 0],
    [0, 2, 2, 0],
    [8, 8, 2, 0],
    [32, 16, 16, 4],
];

fn golden_actions() -> Vec<Action> {
    GOLDEN_LOG
        .iter()
        .map(|&d| Action::Move(Direction::from_index(d).unwrap()))
        .collect()
}

// ── Acceptance ──────────────────────────────────────────────────

#[test]
fn genuine_finished_game_is_accepted() {
    let sub = finished_game(0.123456);
    let verdict = validator(ValidatorConfig::default()).validate(&sub);
    let outcome = verdict.outcome().expect("genuine game must verify");
    assert_eq!(outcome.outcome, Outcome::GameOver);
    assert_eq!(outcome.score as i64, sub.claimed_score);
    assert_eq!(outcome.mode_key, "classic_4x4");
}

#[test]
fn verification_is_idempotent() {
    let v = validator(ValidatorConfig::default());
    let sub = finished_game(0.987);
    let first = v.validate(&sub);
    let second = v.validate(&sub);
    assert!(first.is_accepted());
    assert_eq!(first, second);
}

#[test]
fn alias_submission_verifies_under_canonical_key() {
    let mut sub = finished_game(0.42);
    sub.mode_key = "classic".into();
    sub.replay["mode_key"] = json!("classic");
    let verdict = validator(ValidatorConfig::default()).validate(&sub);
    assert_eq!(verdict.outcome().unwrap().mode_key, "classic_4x4");
}

#[test]
fn undo_game_is_accepted_and_undo_beyond_limit_is_not() {
    let m = undo_mode();
    let seed = 0.31;
    let mut actions = Recording::play(&m, seed, Some(10)).actions;
    actions.extend([Action::Undo, Action::Undo]);

    // Continue the game from the undone position with the same policy.
    let mut engine = GameEngine::new(&m, seed).unwrap();
    engine.apply_log(&actions, 1000).unwrap();
    while !engine.is_game_over() {
        let d = PREFERENCE
            .into_iter()
            .find(|&d| engine.would_move(d))
            .unwrap();
        engine.move_tiles(d);
        actions.push(Action::Move(d));
    }
    let rec = Recording::from_log(&m, seed, actions.clone());
    let mut sub = rec.submission();
    assert!(validator(ValidatorConfig::default()).validate(&sub).is_accepted());

    // undo_4x4 allows three undos over the whole game.
    let mut too_many = actions[..12].to_vec();
    too_many.extend([Action::Undo, Action::Undo]);
    sub.replay = ReplayPayload::for_mode(&m, seed, too_many).to_value().unwrap();
    let verdict = validator(ValidatorConfig::default()).validate(&sub);
    assert_eq!(code(&verdict), "sim_undo_limit_reached");
    assert_eq!(verdict.reason().unwrap().action_index(), Some(13));
}

#[test]
fn win_stop_follows_config() {
    let actions = vec![Action::PracticeSet {
        x: 3,
        y: 3,
        value: 2048,
    }];
    let rec = Recording::from_log(&practice_mode(), 0.2, actions);
    assert_eq!(rec.final_state.outcome, Outcome::WinStop);
    let sub = rec.submission();

    let allowed = validator(ValidatorConfig::default()).validate(&sub);
    assert_eq!(allowed.outcome().unwrap().outcome, Outcome::WinStop);

    let strict = validator(ValidatorConfig {
        allow_win_stop: false,
        ..Default::default()
    })
    .validate(&sub);
    assert_eq!(code(&strict), "not_terminal");
}

#[test]
fn locked_direction_in_log_is_rejected() {
    let m = lock_mode();
    let seed = 0.77;
    let rec = Recording::play(&m, seed, Some(4));
    let mut engine = GameEngine::new(&m, seed).unwrap();
    engine.apply_log(&rec.actions, 10).unwrap();
    let locked = engine.locked_direction().expect("lock after 4 moves");

    let mut sub = rec.submission();
    let mut actions = rec.actions.clone();
    actions.push(Action::Move(locked));
    sub.replay = ReplayPayload::for_mode(&m, seed, actions).to_value().unwrap();
    let verdict = validator(ValidatorConfig::default()).validate(&sub);
    assert_eq!(code(&verdict), "sim_direction_locked");
    assert_eq!(verdict.reason().unwrap().action_index(), Some(4));
}

// ── Golden replay ───────────────────────────────────────────────

#[test]
fn golden_opening_tiles() {
    let engine = GameEngine::new(&classic_mode(), GOLDEN_SEED).unwrap();
    assert_eq!(
        engine.board().rows(),
        vec![
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 2, 2, 0],
            vec![0, 0, 0, 0],
        ]
    );
}

#[test]
fn golden_forty_action_replay() {
    let rec = Recording::from_log(&classic_mode(), GOLDEN_SEED, golden_actions());
    assert_eq!(rec.final_state.score, GOLDEN_SCORE);
    assert_eq!(rec.final_state.best_tile, 32);
    assert_eq!(
        rec.final_state.board,
        GOLDEN_BOARD.iter().map(|row| row.to_vec()).collect::<Vec<_>>()
    );
    assert_eq!(rec.final_state.outcome, Outcome::Playing);

    // The log is exactly what the recording policy produces.
    let played = Recording::play(&classic_mode(), GOLDEN_SEED, Some(40));
    assert_eq!(played.actions, rec.actions);

    let v = validator(ValidatorConfig::default());
    let mut sub = rec.submission();
    assert_eq!(sub.replay["actions"][0], json!(["m", 2]));
    assert_eq!(code(&v.validate(&sub)), "not_terminal");

    sub.claimed_score += 2;
    let verdict = v.validate(&sub);
    assert_eq!(
        verdict.reason(),
        Some(&RejectReason::ScoreMismatch {
            claimed: GOLDEN_SCORE + 2,
            recomputed: GOLDEN_SCORE,
        })
    );
    assert_eq!(code(&verdict), "score_mismatch");
}

// ── Tamper detection ────────────────────────────────────────────

#[test]
fn best_tile_tamper_rejected() {
    let mut sub = finished_game(0.55);
    sub.claimed_best_tile *= 2;
    assert_eq!(
        code(&validator(ValidatorConfig::default()).validate(&sub)),
        "best_tile_mismatch"
    );
}

#[test]
fn board_tamper_rejected_with_cell_report() {
    let mut sub = finished_game(0.66);
    let rows: Vec<Vec<u64>> = serde_json::from_value(sub.final_board.clone()).unwrap();
    let (mut tx, mut ty, mut min) = (0, 0, u64::MAX);
    for (y, row) in rows.iter().enumerate() {
        for (x, &v) in row.iter().enumerate() {
            if v < min {
                (tx, ty, min) = (x, y, v);
            }
        }
    }
    let swapped = if min == 2 { 4 } else { 2 };
    sub.final_board[ty][tx] = json!(swapped);

    let verdict = validator(ValidatorConfig::default()).validate(&sub);
    let Some(RejectReason::BoardMismatch(report)) = verdict.reason() else {
        panic!("expected board mismatch, got {verdict:?}");
    };
    assert_eq!(report.cells.len(), 1);
    assert_eq!((report.cells[0].x, report.cells[0].y), (tx, ty));
    assert_eq!(report.cells[0].replayed, Some(min));
}

#[test]
fn dropped_or_appended_action_rejected() {
    let sub = finished_game(0.12);
    let v = validator(ValidatorConfig::default());

    let mut truncated = sub.clone();
    let actions = truncated.replay["actions"].as_array_mut().unwrap();
    actions.pop();
    assert!(!v.validate(&truncated).is_accepted());

    let mut extended = sub;
    extended.replay["actions"]
        .as_array_mut()
        .unwrap()
        .push(json!(["m", 0]));
    assert_eq!(
        code(&v.validate(&extended)),
        "sim_action_after_game_over"
    );
}

#[test]
fn illegal_action_reported_before_later_malformed_tuple() {
    let mut sub = finished_game(0.12);
    let actions = sub.replay["actions"].as_array_mut().unwrap();
    let last = actions.len() - 1;
    // An undo classic_4x4 forbids, early in the log; garbage at the end.
    actions.insert(1, json!(["u"]));
    actions[last + 1] = json!(["m", 9]);

    let verdict = validator(ValidatorConfig::default()).validate(&sub);
    assert_eq!(code(&verdict), "sim_undo_disabled");
    assert_eq!(verdict.reason().unwrap().action_index(), Some(1));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn any_score_perturbation_rejected(delta in 1i64..10_000, down in any::<bool>()) {
        let sub = finished_game(0.314);
        let mut tampered = sub.clone();
        tampered.claimed_score = if down && sub.claimed_score >= delta {
            sub.claimed_score - delta
        } else {
            sub.claimed_score + delta
        };
        let verdict = validator(ValidatorConfig::default()).validate(&tampered);
        prop_assert_eq!(code(&verdict), "score_mismatch");
    }
}
