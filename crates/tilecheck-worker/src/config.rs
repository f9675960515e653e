//! Worker configuration and validation.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use tilecheck_replay::ValidatorConfig;

use crate::store::ClaimPolicy;

/// Configuration for a [`Worker`](crate::Worker) and its pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Sleep between polls when the queue is idle. Default: 500 ms.
    pub poll_interval: Duration,
    /// A `running` job untouched for this long is reclaimed. Default: 5 min.
    pub stale_after: Duration,
    /// Claims allowed per job before it is abandoned. Default: 5.
    pub max_attempts: u32,
    /// Upper bound on the retry delay, in seconds. Default: 300.
    pub backoff_cap_secs: u64,
    /// Replay validation policy.
    pub validator: ValidatorConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            stale_after: Duration::from_secs(5 * 60),
            max_attempts: 5,
            backoff_cap_secs: 300,
            validator: ValidatorConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.stale_after.is_zero() {
            return Err(ConfigError::ZeroStaleAfter);
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroMaxAttempts);
        }
        if self.backoff_cap_secs == 0 {
            return Err(ConfigError::ZeroBackoffCap);
        }
        self.validator.validate()?;
        Ok(())
    }

    /// The claim eligibility rules this config implies.
    pub fn claim_policy(&self) -> ClaimPolicy {
        ClaimPolicy {
            stale_after: self.stale_after,
            max_attempts: self.max_attempts,
        }
    }
}

/// Errors detected during [`WorkerConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `poll_interval` is zero; an idle worker would spin.
    ZeroPollInterval,
    /// `stale_after` is zero; every running job would be reclaimed at once.
    ZeroStaleAfter,
    /// `max_attempts` is zero; no job could ever be claimed.
    ZeroMaxAttempts,
    /// `backoff_cap_secs` is zero.
    ZeroBackoffCap,
    /// The embedded validator config is invalid.
    Validator(tilecheck_replay::ConfigError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroPollInterval => write!(f, "poll_interval must be positive"),
            Self::ZeroStaleAfter => write!(f, "stale_after must be positive"),
            Self::ZeroMaxAttempts => write!(f, "max_attempts must be at least 1"),
            Self::ZeroBackoffCap => write!(f, "backoff_cap_secs must be at least 1"),
            Self::Validator(e) => write!(f, "validator: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validator(e) => Some(e),
            _ => None,
        }
    }
}

impl From<tilecheck_replay::ConfigError> for ConfigError {
    fn from(e: tilecheck_replay::ConfigError) -> Self {
        Self::Validator(e)
    }
}
