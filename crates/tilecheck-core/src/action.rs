//! Move directions and replay actions.

use std::fmt;

/// One of the four slide directions.
///
/// The wire encoding is `0 = up, 1 = right, 2 = down, 3 = left`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Slide towards row 0.
    Up,
    /// Slide towards the last column.
    Right,
    /// Slide towards the last row.
    Down,
    /// Slide towards column 0.
    Left,
}

impl Direction {
    /// All directions in wire order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Decode a wire index. Returns `None` outside `0..=3`.
    pub fn from_index(index: u64) -> Option<Self> {
        match index {
            0 => Some(Self::Up),
            1 => Some(Self::Right),
            2 => Some(Self::Down),
            3 => Some(Self::Left),
            _ => None,
        }
    }

    /// Wire index of this direction.
    pub fn index(self) -> u8 {
        match self {
            Self::Up => 0,
            Self::Right => 1,
            Self::Down => 2,
            Self::Left => 3,
        }
    }

    /// Unit vector `(dx, dy)` with `y` growing downwards.
    pub fn vector(self) -> (isize, isize) {
        match self {
            Self::Up => (0, -1),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Up => "up",
            Self::Right => "right",
            Self::Down => "down",
            Self::Left => "left",
        };
        f.write_str(name)
    }
}

/// A single entry of a replay log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Slide every tile in a direction (`["m", dir]`).
    Move(Direction),
    /// Restore the state before the most recent successful move (`["u"]`).
    Undo,
    /// Overwrite one cell; practice modes only (`["p", x, y, value]`).
    PracticeSet {
        /// Column.
        x: usize,
        /// Row.
        y: usize,
        /// New cell value; zero clears the cell.
        value: u64,
    },
}

impl Action {
    /// Short machine name of the action kind, matching the wire tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Move(_) => "m",
            Self::Undo => "u",
            Self::PracticeSet { .. } => "p",
        }
    }
}
