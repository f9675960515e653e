//! In-process [`JobStore`].
//!
//! A single mutex is the transaction boundary: each trait method holds
//! it for its whole read-modify-write, so a claim is an atomic
//! conditional update and two workers can never take the same job.
//! Useful for tests, benches, and embedding the verifier in one process.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use tilecheck_core::{JobId, SessionId};
use tilecheck_replay::{RejectReason, VerifiedOutcome};

use crate::clock::Millis;
use crate::job::{JobStatus, SessionRecord, VerificationJob};
use crate::store::{Claim, ClaimPolicy, JobStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    jobs: BTreeMap<JobId, VerificationJob>,
    sessions: HashMap<SessionId, SessionRecord>,
    /// Terminal writes per job (verified, rejected, orphaned).
    completions: HashMap<JobId, u32>,
    next_job: u64,
}

/// Mutex-guarded job and session tables.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    offline: AtomicBool,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        if self.offline.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable {
                detail: "store is offline".into(),
            });
        }
        self.tables.lock().map_err(|_| StoreError::Unavailable {
            detail: "store mutex poisoned".into(),
        })
    }

    /// Insert or replace a session row.
    pub fn insert_session(&self, session: SessionRecord) -> Result<(), StoreError> {
        self.lock()?.sessions.insert(session.id, session);
        Ok(())
    }

    /// Delete a session row (its jobs stay queued).
    pub fn remove_session(&self, id: SessionId) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.lock()?.sessions.remove(&id))
    }

    /// Queue a verification job for `session`, claimable from `now`.
    pub fn enqueue(&self, session: SessionId, now: Millis) -> Result<JobId, StoreError> {
        let mut t = self.lock()?;
        t.next_job += 1;
        let id = JobId(t.next_job);
        t.jobs.insert(id, VerificationJob::queued(id, session, now));
        Ok(id)
    }

    /// Insert a session and queue its job in one step.
    pub fn submit(&self, session: SessionRecord, now: Millis) -> Result<JobId, StoreError> {
        let id = session.id;
        self.insert_session(session)?;
        self.enqueue(id, now)
    }

    /// Copy of a job row.
    pub fn job(&self, id: JobId) -> Result<Option<VerificationJob>, StoreError> {
        Ok(self.lock()?.jobs.get(&id).cloned())
    }

    /// Copy of a session row.
    pub fn session(&self, id: SessionId) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.lock()?.sessions.get(&id).cloned())
    }

    /// Copies of all job rows, in id order.
    pub fn jobs(&self) -> Result<Vec<VerificationJob>, StoreError> {
        Ok(self.lock()?.jobs.values().cloned().collect())
    }

    /// How many terminal writes `job` has received.
    pub fn completions(&self, job: JobId) -> Result<u32, StoreError> {
        Ok(self.lock()?.completions.get(&job).copied().unwrap_or(0))
    }

    /// Simulate an outage: every operation fails with
    /// [`StoreError::Unavailable`] until set back to `false`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Release);
    }
}

impl Tables {
    fn finish_job(&mut self, job: JobId, now: Millis) -> Result<(), StoreError> {
        let row = self
            .jobs
            .get_mut(&job)
            .ok_or(StoreError::JobNotFound { job })?;
        row.status = JobStatus::Done;
        row.last_error = None;
        row.updated_at = now;
        *self.completions.entry(job).or_insert(0) += 1;
        Ok(())
    }

    fn session_mut(&mut self, session: SessionId) -> Result<&mut SessionRecord, StoreError> {
        self.sessions
            .get_mut(&session)
            .ok_or(StoreError::SessionNotFound { session })
    }
}

impl JobStore for MemoryStore {
    fn claim(&self, now: Millis, policy: &ClaimPolicy) -> Result<Claim, StoreError> {
        let mut t = self.lock()?;
        let Some(id) = t
            .jobs
            .values()
            .filter(|j| policy.eligible(j, now))
            .min_by_key(|j| (j.available_at, j.id))
            .map(|j| j.id)
        else {
            return Ok(Claim::Idle);
        };

        let session = {
            let job = t.jobs.get(&id).ok_or(StoreError::JobNotFound { job: id })?;
            t.sessions.get(&job.session_id).cloned()
        };
        let row = t
            .jobs
            .get_mut(&id)
            .ok_or(StoreError::JobNotFound { job: id })?;
        row.attempts += 1;
        row.updated_at = now;

        match session {
            Some(session) => {
                row.status = JobStatus::Running;
                row.last_error = None;
                Ok(Claim::Claimed {
                    job: row.clone(),
                    session,
                })
            }
            None => {
                row.status = JobStatus::Done;
                row.last_error = Some(format!("session {} not found", row.session_id));
                let job = row.clone();
                *t.completions.entry(id).or_insert(0) += 1;
                Ok(Claim::Orphaned { job })
            }
        }
    }

    fn complete_verified(
        &self,
        job: JobId,
        session: SessionId,
        outcome: &VerifiedOutcome,
        now: Millis,
    ) -> Result<(), StoreError> {
        let mut t = self.lock()?;
        if !t.jobs.contains_key(&job) {
            return Err(StoreError::JobNotFound { job });
        }
        // Validate the whole write before mutating either row.
        let mut updated = t.session_mut(session)?.clone();
        updated
            .mark_verified(outcome)
            .map_err(|e| StoreError::Encode {
                detail: e.to_string(),
            })?;
        *t.session_mut(session)? = updated;
        t.finish_job(job, now)
    }

    fn complete_rejected(
        &self,
        job: JobId,
        session: SessionId,
        reason: &RejectReason,
        now: Millis,
    ) -> Result<(), StoreError> {
        let mut t = self.lock()?;
        if !t.jobs.contains_key(&job) {
            return Err(StoreError::JobNotFound { job });
        }
        t.session_mut(session)?.mark_rejected(reason);
        t.finish_job(job, now)
    }

    fn fail(
        &self,
        job: JobId,
        error: &str,
        available_at: Millis,
        now: Millis,
    ) -> Result<(), StoreError> {
        let mut t = self.lock()?;
        let row = t
            .jobs
            .get_mut(&job)
            .ok_or(StoreError::JobNotFound { job })?;
        // A job another worker already finished stays finished.
        if row.status == JobStatus::Done {
            return Ok(());
        }
        row.status = JobStatus::Failed;
        row.last_error = Some(error.to_string());
        row.available_at = available_at;
        row.updated_at = now;
        Ok(())
    }
}
