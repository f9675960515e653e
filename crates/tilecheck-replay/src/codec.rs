//! JSON tuple encoding of replay actions.
//!
//! | action | encoding |
//! |--------|----------|
//! | move | `["m", dir]` with `dir` 0 = up, 1 = right, 2 = down, 3 = left |
//! | undo | `["u"]` |
//! | practice tile | `["p", x, y, value]` |
//!
//! Decoding errors carry the action's index, using the same
//! [`SimError`] type the engine reports, so a bad tuple and an illegal
//! move are indistinguishable to the caller apart from their cause.

use serde::ser::{SerializeSeq, Serializer};
use serde_json::{json, Value};
use tilecheck_core::{Action, Direction, SimError, SimErrorKind};

/// Encode one action as its JSON tuple.
pub fn encode_action(action: &Action) -> Value {
    match *action {
        Action::Move(d) => json!(["m", d.index()]),
        Action::Undo => json!(["u"]),
        Action::PracticeSet { x, y, value } => json!(["p", x, y, value]),
    }
}

/// Serialize an action list as an array of tuples (for `serialize_with`).
pub fn serialize_actions<S: Serializer>(actions: &[Action], s: S) -> Result<S::Ok, S::Error> {
    let mut seq = s.serialize_seq(Some(actions.len()))?;
    for action in actions {
        seq.serialize_element(&encode_action(action))?;
    }
    seq.end()
}

fn malformed(index: usize, detail: impl Into<String>) -> SimError {
    SimError::new(
        index,
        SimErrorKind::MalformedAction {
            detail: detail.into(),
        },
    )
}

fn uint_at(index: usize, tuple: &[Value], pos: usize, what: &str) -> Result<u64, SimError> {
    tuple
        .get(pos)
        .and_then(Value::as_u64)
        .ok_or_else(|| malformed(index, format!("{what} must be a non-negative integer")))
}

fn expect_arity(index: usize, tuple: &[Value], arity: usize, tag: &str) -> Result<(), SimError> {
    if tuple.len() == arity {
        Ok(())
    } else {
        Err(malformed(
            index,
            format!("'{tag}' takes {} operands, got {}", arity - 1, tuple.len().saturating_sub(1)),
        ))
    }
}

/// Decode the action at log position `index`.
pub fn decode_action(index: usize, value: &Value) -> Result<Action, SimError> {
    let tuple = value
        .as_array()
        .ok_or_else(|| malformed(index, "action is not an array"))?;
    let tag = tuple
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(index, "action tag is not a string"))?;

    match tag {
        "m" => {
            expect_arity(index, tuple, 2, tag)?;
            let dir = uint_at(index, tuple, 1, "direction")?;
            Direction::from_index(dir)
                .map(Action::Move)
                .ok_or_else(|| malformed(index, format!("direction {dir} out of range")))
        }
        "u" => {
            expect_arity(index, tuple, 1, tag)?;
            Ok(Action::Undo)
        }
        "p" => {
            expect_arity(index, tuple, 4, tag)?;
            let x = uint_at(index, tuple, 1, "x")?;
            let y = uint_at(index, tuple, 2, "y")?;
            let value = uint_at(index, tuple, 3, "value")?;
            let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
                return Err(malformed(index, "coordinate out of range"));
            };
            Ok(Action::PracticeSet { x, y, value })
        }
        other => Err(SimError::new(
            index,
            SimErrorKind::UnknownAction {
                tag: other.to_string(),
            },
        )),
    }
}

/// Decode a whole action array, stopping at the first bad entry.
pub fn decode_actions(values: &[Value]) -> Result<Vec<Action>, SimError> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| decode_action(i, v))
        .collect()
}
