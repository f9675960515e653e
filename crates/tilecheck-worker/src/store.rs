//! The storage contract between the worker and the job queue.
//!
//! Every method is one transaction. The claim is the only
//! synchronization point between workers: an implementation must
//! guarantee that two concurrent claims never return the same job,
//! skipping contended rows rather than blocking on them.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use tilecheck_core::{JobId, SessionId};
use tilecheck_replay::{RejectReason, VerifiedOutcome};

use crate::clock::Millis;
use crate::job::{JobStatus, SessionRecord, VerificationJob};

/// Eligibility rules for [`JobStore::claim`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClaimPolicy {
    /// A `running` job not updated for this long is presumed abandoned.
    pub stale_after: Duration,
    /// Jobs with this many attempts are never claimed again.
    pub max_attempts: u32,
}

impl ClaimPolicy {
    /// Whether `job` may be claimed at `now`.
    pub fn eligible(&self, job: &VerificationJob, now: Millis) -> bool {
        if job.attempts >= self.max_attempts {
            return false;
        }
        match job.status {
            JobStatus::Queued | JobStatus::Failed => job.available_at <= now,
            JobStatus::Running => job.updated_at < now.saturating_sub(self.stale_after),
            JobStatus::Done => false,
        }
    }
}

/// Result of [`JobStore::claim`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Claim {
    /// A job is now `running` and owned by the caller.
    Claimed {
        /// The job after the claim update.
        job: VerificationJob,
        /// Its session.
        session: SessionRecord,
    },
    /// The job's session no longer exists; the job was closed as `done`.
    Orphaned {
        /// The closed job.
        job: VerificationJob,
    },
    /// Nothing eligible.
    Idle,
}

/// Errors from a [`JobStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached or the transaction aborted.
    Unavailable {
        /// Diagnostic.
        detail: String,
    },
    /// No such job.
    JobNotFound {
        /// The missing job.
        job: JobId,
    },
    /// No such session.
    SessionNotFound {
        /// The missing session.
        session: SessionId,
    },
    /// The verified result could not be encoded for storage.
    Encode {
        /// Diagnostic.
        detail: String,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { detail } => write!(f, "store unavailable: {detail}"),
            Self::JobNotFound { job } => write!(f, "job {job} not found"),
            Self::SessionNotFound { session } => write!(f, "session {session} not found"),
            Self::Encode { detail } => write!(f, "cannot encode result: {detail}"),
        }
    }
}

impl Error for StoreError {}

/// Transactional access to the verification queue and session rows.
pub trait JobStore: Send + Sync {
    /// Select one eligible job ordered by `(available_at, id)`, mark it
    /// `running`, bump `attempts`, clear `last_error`, touch
    /// `updated_at`, and fetch its session.
    fn claim(&self, now: Millis, policy: &ClaimPolicy) -> Result<Claim, StoreError>;

    /// Mark the session verified with the recomputed values and the job done.
    fn complete_verified(
        &self,
        job: JobId,
        session: SessionId,
        outcome: &VerifiedOutcome,
        now: Millis,
    ) -> Result<(), StoreError>;

    /// Mark the session rejected with `reason` and the job done.
    fn complete_rejected(
        &self,
        job: JobId,
        session: SessionId,
        reason: &RejectReason,
        now: Millis,
    ) -> Result<(), StoreError>;

    /// Mark the job failed, claimable again from `available_at`.
    /// The session is left untouched.
    fn fail(
        &self,
        job: JobId,
        error: &str,
        available_at: Millis,
        now: Millis,
    ) -> Result<(), StoreError>;
}

impl<S: JobStore + ?Sized> JobStore for std::sync::Arc<S> {
    fn claim(&self, now: Millis, policy: &ClaimPolicy) -> Result<Claim, StoreError> {
        (**self).claim(now, policy)
    }

    fn complete_verified(
        &self,
        job: JobId,
        session: SessionId,
        outcome: &VerifiedOutcome,
        now: Millis,
    ) -> Result<(), StoreError> {
        (**self).complete_verified(job, session, outcome, now)
    }

    fn complete_rejected(
        &self,
        job: JobId,
        session: SessionId,
        reason: &RejectReason,
        now: Millis,
    ) -> Result<(), StoreError> {
        (**self).complete_rejected(job, session, reason, now)
    }

    fn fail(
        &self,
        job: JobId,
        error: &str,
        available_at: Millis,
        now: Millis,
    ) -> Result<(), StoreError> {
        (**self).fail(job, error, available_at, now)
    }
}
