//! Strongly-typed identifiers for persisted sessions and jobs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a submitted game session.
///
/// Sessions are created by the submission layer; the verifier only
/// reads them and writes back the verification result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SessionId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies a verification job in the queue.
///
/// Exactly one job exists per submitted session. Job IDs are ordered,
/// and the claim query uses them as the FIFO tie-breaker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
