//! Worker error types.

use std::error::Error;
use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::store::StoreError;

/// Errors raised while processing a job or running the pool.
///
/// Every variant reaching [`Worker::poll_once`](crate::Worker::poll_once)
/// is transient from the job's point of view: the job is marked failed
/// and retried after backoff. Rejections are not errors.
#[derive(Debug)]
pub enum WorkerError {
    /// The job store failed.
    Store(StoreError),
    /// A stored payload is not valid JSON.
    Payload {
        /// Which session column failed to parse.
        field: &'static str,
        /// Parser error.
        source: serde_json::Error,
    },
    /// Processing panicked.
    Panicked {
        /// Panic message, if it was a string.
        detail: String,
    },
    /// The worker configuration is invalid.
    Config(ConfigError),
    /// A pool thread could not be spawned.
    Spawn(io::Error),
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Payload { field, source } => write!(f, "invalid {field}: {source}"),
            Self::Panicked { detail } => write!(f, "processing panicked: {detail}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Spawn(e) => write!(f, "thread spawn failed: {e}"),
        }
    }
}

impl Error for WorkerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Payload { source, .. } => Some(source),
            Self::Config(e) => Some(e),
            Self::Spawn(e) => Some(e),
            Self::Panicked { .. } => None,
        }
    }
}

impl From<StoreError> for WorkerError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<ConfigError> for WorkerError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<io::Error> for WorkerError {
    fn from(e: io::Error) -> Self {
        Self::Spawn(e)
    }
}
