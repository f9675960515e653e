//! Validator configuration.

use std::error::Error;
use std::fmt;

/// Upper bound on `max_actions` accepted by [`ValidatorConfig::validate`].
pub const MAX_ACTIONS_CEILING: usize = 1_000_000;

/// Policy knobs for the [`Validator`](crate::Validator).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Longest accepted action log. Bounds per-replay CPU time. Default: 100 000.
    pub max_actions: usize,
    /// Accept a still-playable uncapped `pow2` board that reached the win
    /// tile as a legitimate ending. Default: `true`.
    pub allow_win_stop: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_actions: 100_000,
            allow_win_stop: true,
        }
    }
}

impl ValidatorConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_actions == 0 {
            return Err(ConfigError::ZeroMaxActions);
        }
        if self.max_actions > MAX_ACTIONS_CEILING {
            return Err(ConfigError::MaxActionsTooLarge {
                configured: self.max_actions,
            });
        }
        Ok(())
    }
}

/// Errors detected during [`ValidatorConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_actions` is zero; no replay could ever be accepted.
    ZeroMaxActions,
    /// `max_actions` exceeds [`MAX_ACTIONS_CEILING`].
    MaxActionsTooLarge {
        /// The configured value.
        configured: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroMaxActions => write!(f, "max_actions must be at least 1"),
            Self::MaxActionsTooLarge { configured } => write!(
                f,
                "max_actions {configured} exceeds ceiling {MAX_ACTIONS_CEILING}"
            ),
        }
    }
}

impl Error for ConfigError {}
