//! Errors from constructing a [`GameEngine`](crate::GameEngine).

use std::error::Error;
use std::fmt;

/// Largest board (in cells) the engine will allocate.
pub const MAX_CELLS: usize = 4096;

/// Errors detected during [`GameEngine::new`](crate::GameEngine::new).
#[derive(Clone, Debug, PartialEq)]
pub enum EngineError {
    /// The seed is NaN or infinite.
    InvalidSeed {
        /// The rejected seed.
        seed: f64,
    },
    /// Width × height exceeds [`MAX_CELLS`].
    BoardTooLarge {
        /// Configured columns.
        width: u32,
        /// Configured rows.
        height: u32,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSeed { seed } => write!(f, "seed must be finite, got {seed}"),
            Self::BoardTooLarge { width, height } => {
                write!(f, "board {width}x{height} exceeds {MAX_CELLS} cells")
            }
        }
    }
}

impl Error for EngineError {}
