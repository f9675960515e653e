//! The schema-v3 replay envelope.
//!
//! [`ReplayPayload`] is the owned, typed form used when building a replay
//! (clients, fixtures, benches). [`Envelope`] is the borrowed view the
//! validator parses out of untrusted JSON: it checks structure only and
//! leaves the action tuples undecoded so that decoding errors surface
//! with their index during simulation.

use serde::Serialize;
use serde_json::{Map, Value};
use tilecheck_core::{Action, ModeConfig, Ruleset};

use crate::codec::serialize_actions;
use crate::error::{RejectReason, ReplayField};
use crate::REPLAY_VERSION;

/// An owned replay ready to be serialized.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReplayPayload {
    /// Schema version; always [`REPLAY_VERSION`] when built here.
    pub v: u64,
    /// Game seed.
    pub seed: f64,
    /// Mode key the client played.
    pub mode_key: String,
    /// Board columns.
    pub board_width: u32,
    /// Board rows.
    pub board_height: u32,
    /// Merge rule family.
    pub ruleset: Ruleset,
    /// Whether undo was enabled.
    pub undo_enabled: bool,
    /// Mode family tag.
    pub mode_family: String,
    /// Ranking policy tag.
    pub rank_policy: String,
    /// Special rules in force when the game was played.
    pub special_rules_snapshot: Map<String, Value>,
    /// Daily-challenge identifier, if any.
    pub challenge_id: Option<String>,
    /// The action log.
    #[serde(serialize_with = "serialize_actions")]
    pub actions: Vec<Action>,
}

impl ReplayPayload {
    /// A replay whose embedded fields all agree with `mode`.
    pub fn for_mode(mode: &ModeConfig, seed: f64, actions: Vec<Action>) -> Self {
        Self {
            v: REPLAY_VERSION,
            seed,
            mode_key: mode.key.clone(),
            board_width: mode.board_width,
            board_height: mode.board_height,
            ruleset: mode.ruleset,
            undo_enabled: mode.undo_enabled,
            mode_family: mode.mode_family.clone(),
            rank_policy: mode.rank_policy.clone(),
            special_rules_snapshot: mode.special_rules.clone(),
            challenge_id: None,
            actions,
        }
    }

    /// Serialize to a JSON value.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Structurally checked view of an untrusted replay.
///
/// Embedded mode-bound fields are optional: absent (or `null`) fields are
/// not compared, present ones must have the right JSON type.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope<'a> {
    /// Finite game seed.
    pub seed: f64,
    /// Embedded `mode_key`.
    pub mode_key: Option<&'a str>,
    /// Embedded `board_width`.
    pub board_width: Option<u64>,
    /// Embedded `board_height`.
    pub board_height: Option<u64>,
    /// Embedded `ruleset` tag.
    pub ruleset: Option<&'a str>,
    /// Embedded `undo_enabled`.
    pub undo_enabled: Option<bool>,
    /// Embedded `mode_family`.
    pub mode_family: Option<&'a str>,
    /// Embedded `rank_policy`.
    pub rank_policy: Option<&'a str>,
    /// Embedded `special_rules_snapshot`.
    pub special_rules: Option<&'a Map<String, Value>>,
    /// Embedded `challenge_id`.
    pub challenge_id: Option<&'a str>,
    /// Undecoded action tuples, at most `max_actions` of them.
    pub actions: &'a [Value],
}

fn malformed(detail: String) -> RejectReason {
    RejectReason::ReplayMalformed { detail }
}

fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn opt_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<Option<&'a str>, RejectReason> {
    present(obj, key)
        .map(|v| v.as_str().ok_or_else(|| malformed(format!("{key} must be a string"))))
        .transpose()
}

fn opt_uint(obj: &Map<String, Value>, key: &str) -> Result<Option<u64>, RejectReason> {
    present(obj, key)
        .map(|v| {
            v.as_u64()
                .ok_or_else(|| malformed(format!("{key} must be a non-negative integer")))
        })
        .transpose()
}

fn opt_bool(obj: &Map<String, Value>, key: &str) -> Result<Option<bool>, RejectReason> {
    present(obj, key)
        .map(|v| v.as_bool().ok_or_else(|| malformed(format!("{key} must be a boolean"))))
        .transpose()
}

impl<'a> Envelope<'a> {
    /// Parse the envelope, checking version, seed, action array, and the
    /// JSON types of every embedded field, in that order.
    pub fn parse(value: &'a Value, max_actions: usize) -> Result<Self, RejectReason> {
        let obj = value
            .as_object()
            .ok_or_else(|| malformed("replay is not an object".to_string()))?;

        match obj.get("v") {
            Some(v) if v.as_u64() == Some(REPLAY_VERSION) => {}
            Some(v) => {
                return Err(RejectReason::ReplayVersionUnsupported {
                    found: v.to_string(),
                })
            }
            None => {
                return Err(RejectReason::ReplayVersionUnsupported {
                    found: "missing".to_string(),
                })
            }
        }

        let seed = obj
            .get("seed")
            .and_then(Value::as_f64)
            .filter(|s| s.is_finite())
            .ok_or(RejectReason::ReplaySeedInvalid)?;

        let actions = obj
            .get("actions")
            .and_then(Value::as_array)
            .ok_or(RejectReason::ReplayActionsInvalid)?;
        if actions.len() > max_actions {
            return Err(RejectReason::ReplayTooLong {
                len: actions.len(),
                max: max_actions,
            });
        }

        let special_rules = present(obj, "special_rules_snapshot")
            .map(|v| {
                v.as_object()
                    .ok_or_else(|| malformed("special_rules_snapshot must be an object".into()))
            })
            .transpose()?;

        Ok(Self {
            seed,
            mode_key: opt_str(obj, "mode_key")?,
            board_width: opt_uint(obj, "board_width")?,
            board_height: opt_uint(obj, "board_height")?,
            ruleset: opt_str(obj, "ruleset")?,
            undo_enabled: opt_bool(obj, "undo_enabled")?,
            mode_family: opt_str(obj, "mode_family")?,
            rank_policy: opt_str(obj, "rank_policy")?,
            special_rules,
            challenge_id: opt_str(obj, "challenge_id")?,
            actions: actions.as_slice(),
        })
    }

    /// Compare embedded fields other than `mode_key` against the mode.
    ///
    /// `mode_key` needs the catalog's alias table and is checked by the
    /// validator.
    pub fn check_fields(&self, mode: &ModeConfig) -> Result<(), RejectReason> {
        let mismatch = |field| Err(RejectReason::ReplayFieldMismatch { field });

        let width_ok = self
            .board_width
            .is_none_or(|w| w == u64::from(mode.board_width));
        let height_ok = self
            .board_height
            .is_none_or(|h| h == u64::from(mode.board_height));
        if !(width_ok && height_ok) {
            return mismatch(ReplayField::BoardSize);
        }
        if self.ruleset.is_some_and(|r| r != mode.ruleset.as_str()) {
            return mismatch(ReplayField::Ruleset);
        }
        if self.undo_enabled.is_some_and(|u| u != mode.undo_enabled) {
            return mismatch(ReplayField::UndoFlag);
        }
        if self.mode_family.is_some_and(|f| f != mode.mode_family) {
            return mismatch(ReplayField::ModeFamily);
        }
        if self.rank_policy.is_some_and(|p| p != mode.rank_policy) {
            return mismatch(ReplayField::RankPolicy);
        }
        if self.special_rules.is_some_and(|s| *s != mode.special_rules) {
            return mismatch(ReplayField::SpecialRules);
        }
        Ok(())
    }
}
