//! The verification loop.
//!
//! One [`Worker`] claims one job at a time, replays its session through
//! the [`Validator`], and writes the outcome back through the
//! [`JobStore`]. A rejection is a normal terminal outcome. Store errors,
//! unparseable payloads and panics are transient: the job is marked
//! failed and becomes claimable again after exponential backoff.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tilecheck_core::{JobId, ModeCatalog, SessionId};
use tilecheck_replay::{Submission, Validator, Verdict};
use tracing::{debug, error, info, warn};

use crate::backoff::retry_delay;
use crate::clock::Clock;
use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::job::{SessionRecord, VerificationJob};
use crate::pool::StopToken;
use crate::store::{Claim, ClaimPolicy, JobStore};

const TARGET: &str = "tilecheck::worker";

/// What one [`Worker::poll_once`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// The session was verified and the job closed.
    Verified {
        /// Processed job.
        job: JobId,
        /// Its session.
        session: SessionId,
    },
    /// The session was rejected and the job closed.
    Rejected {
        /// Processed job.
        job: JobId,
        /// Its session.
        session: SessionId,
        /// Reason code stored on the session.
        code: &'static str,
    },
    /// Processing hit a transient error; the job will be retried.
    Failed {
        /// Processed job.
        job: JobId,
        /// Diagnostic stored as `last_error`.
        error: String,
    },
    /// The job's session was missing; the job was closed.
    Orphaned {
        /// Closed job.
        job: JobId,
    },
    /// Nothing to do.
    Idle,
}

/// Counters accumulated by [`Worker::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Sessions verified.
    pub verified: u64,
    /// Sessions rejected.
    pub rejected: u64,
    /// Jobs marked failed for retry.
    pub failed: u64,
    /// Jobs closed for a missing session.
    pub orphaned: u64,
    /// Polls that found nothing.
    pub idle_polls: u64,
    /// Polls that returned an error (store unreachable).
    pub errors: u64,
}

impl WorkerStats {
    /// Jobs that reached a terminal or retry state.
    pub fn processed(&self) -> u64 {
        self.verified + self.rejected + self.failed + self.orphaned
    }

    fn record(&mut self, outcome: &PollOutcome) {
        match outcome {
            PollOutcome::Verified { .. } => self.verified += 1,
            PollOutcome::Rejected { .. } => self.rejected += 1,
            PollOutcome::Failed { .. } => self.failed += 1,
            PollOutcome::Orphaned { .. } => self.orphaned += 1,
            PollOutcome::Idle => self.idle_polls += 1,
        }
    }

    /// Sum of two stat blocks.
    pub fn merge(self, other: WorkerStats) -> WorkerStats {
        WorkerStats {
            verified: self.verified + other.verified,
            rejected: self.rejected + other.rejected,
            failed: self.failed + other.failed,
            orphaned: self.orphaned + other.orphaned,
            idle_polls: self.idle_polls + other.idle_polls,
            errors: self.errors + other.errors,
        }
    }
}

/// A single verification worker.
///
/// Pool threads each get a [`Worker::fork`] sharing the store, validator
/// and clock.
pub struct Worker<S, C> {
    name: String,
    store: Arc<S>,
    validator: Arc<Validator<C>>,
    clock: Arc<dyn Clock>,
    config: WorkerConfig,
    policy: ClaimPolicy,
}

impl<S, C> fmt::Debug for Worker<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: JobStore, C: ModeCatalog> Worker<S, C> {
    /// Create a worker. Fails if `config` does not validate.
    pub fn new(
        name: impl Into<String>,
        store: Arc<S>,
        catalog: C,
        clock: Arc<dyn Clock>,
        config: WorkerConfig,
    ) -> Result<Self, WorkerError> {
        config.validate()?;
        let validator = Arc::new(Validator::new(catalog, config.validator.clone()));
        Ok(Self {
            name: name.into(),
            store,
            validator,
            clock,
            policy: config.claim_policy(),
            config,
        })
    }

    /// A sibling worker sharing this one's store, validator and clock.
    pub fn fork(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: Arc::clone(&self.store),
            validator: Arc::clone(&self.validator),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
            policy: self.policy,
        }
    }

    /// Worker name, used in log events.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Active configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Claim and process at most one job.
    ///
    /// Returns `Err` only when the store itself fails, either on claim
    /// or while recording a failure; the job (if any) is then left for
    /// stale-claim recovery.
    pub fn poll_once(&self) -> Result<PollOutcome, WorkerError> {
        let now = self.clock.now();
        match self.store.claim(now, &self.policy)? {
            Claim::Idle => Ok(PollOutcome::Idle),
            Claim::Orphaned { job } => {
                warn!(
                    target: TARGET,
                    worker = %self.name,
                    job = %job.id,
                    session = %job.session_id,
                    "session missing, job closed"
                );
                Ok(PollOutcome::Orphaned { job: job.id })
            }
            Claim::Claimed { job, session } => {
                info!(
                    target: TARGET,
                    worker = %self.name,
                    job = %job.id,
                    session = %session.id,
                    attempt = job.attempts,
                    "claimed"
                );
                self.process(&job, &session)
            }
        }
    }

    fn process(
        &self,
        job: &VerificationJob,
        session: &SessionRecord,
    ) -> Result<PollOutcome, WorkerError> {
        let err = match panic::catch_unwind(AssertUnwindSafe(|| self.verify(job, session))) {
            Ok(Ok(outcome)) => return Ok(outcome),
            Ok(Err(e)) => e,
            Err(payload) => WorkerError::Panicked {
                detail: panic_message(payload.as_ref()),
            },
        };

        let now = self.clock.now();
        let delay = retry_delay(job.attempts, self.config.backoff_cap_secs);
        let message = err.to_string();
        warn!(
            target: TARGET,
            worker = %self.name,
            job = %job.id,
            session = %session.id,
            attempt = job.attempts,
            retry_in_secs = delay.as_secs(),
            error = %message,
            "verification failed"
        );
        self.store.fail(job.id, &message, now + delay, now)?;
        Ok(PollOutcome::Failed {
            job: job.id,
            error: message,
        })
    }

    fn verify(
        &self,
        job: &VerificationJob,
        session: &SessionRecord,
    ) -> Result<PollOutcome, WorkerError> {
        let submission = submission_of(session)?;
        match self.validator.validate(&submission) {
            Verdict::Accepted(outcome) => {
                self.store
                    .complete_verified(job.id, session.id, &outcome, self.clock.now())?;
                info!(
                    target: TARGET,
                    worker = %self.name,
                    job = %job.id,
                    session = %session.id,
                    score = outcome.score,
                    best_tile = outcome.best_tile,
                    "verified"
                );
                Ok(PollOutcome::Verified {
                    job: job.id,
                    session: session.id,
                })
            }
            Verdict::Rejected(reason) => {
                self.store
                    .complete_rejected(job.id, session.id, &reason, self.clock.now())?;
                info!(
                    target: TARGET,
                    worker = %self.name,
                    job = %job.id,
                    session = %session.id,
                    code = reason.code(),
                    "rejected"
                );
                Ok(PollOutcome::Rejected {
                    job: job.id,
                    session: session.id,
                    code: reason.code(),
                })
            }
        }
    }

    /// Poll until `stop` is signalled, sleeping `poll_interval` whenever
    /// the queue is idle or the store is unreachable. Stop is checked
    /// between polls; a job in flight always finishes.
    pub fn run(&self, stop: &StopToken) -> WorkerStats {
        let mut stats = WorkerStats::default();
        debug!(target: TARGET, worker = %self.name, "started");
        while !stop.is_stopped() {
            match self.poll_once() {
                Ok(PollOutcome::Idle) => {
                    stats.record(&PollOutcome::Idle);
                    stop.wait(self.config.poll_interval);
                }
                Ok(outcome) => stats.record(&outcome),
                Err(e) => {
                    stats.errors += 1;
                    error!(target: TARGET, worker = %self.name, error = %e, "poll failed");
                    stop.wait(self.config.poll_interval);
                }
            }
        }
        debug!(
            target: TARGET,
            worker = %self.name,
            processed = stats.processed(),
            "stopped"
        );
        stats
    }
}

/// Rebuild the validator input from a stored session row.
fn submission_of(session: &SessionRecord) -> Result<Submission, WorkerError> {
    let replay = serde_json::from_str(&session.replay_json).map_err(|source| {
        WorkerError::Payload {
            field: "replay_json",
            source,
        }
    })?;
    let final_board = serde_json::from_str(&session.final_board_json).map_err(|source| {
        WorkerError::Payload {
            field: "final_board_json",
            source,
        }
    })?;
    Ok(Submission {
        mode_key: session.mode_key.clone(),
        board_width: session.board_width,
        board_height: session.board_height,
        ruleset: session.ruleset.clone(),
        undo_enabled: session.undo_enabled,
        ranked_bucket: session.ranked_bucket.clone(),
        replay,
        final_board,
        claimed_score: session.claimed_score,
        claimed_best_tile: session.claimed_best_tile,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, Millis};
    use crate::job::{JobStatus, SessionStatus};
    use crate::memory::MemoryStore;
    use crate::store::StoreError;
    use std::time::Duration;
    use tilecheck_core::StaticCatalog;
    use tilecheck_replay::{RejectReason, VerifiedOutcome};
    use tilecheck_test_utils::{classic_mode, standard_catalog, Recording};

    fn worker(store: Arc<MemoryStore>, clock: Arc<ManualClock>) -> Worker<MemoryStore, StaticCatalog> {
        Worker::new("test", store, standard_catalog(), clock, WorkerConfig::default()).unwrap()
    }

    fn finished_game() -> SessionRecord {
        let rec = Recording::play(&classic_mode(), 0.123456, None);
        SessionRecord::pending(SessionId(1), &rec.submission())
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = WorkerConfig {
            max_attempts: 0,
            ..WorkerConfig::default()
        };
        let err = Worker::new(
            "w",
            Arc::new(MemoryStore::new()),
            standard_catalog(),
            Arc::new(ManualClock::default()),
            cfg,
        )
        .unwrap_err();
        assert!(matches!(err, WorkerError::Config(_)));
    }

    #[test]
    fn idle_queue_polls_idle() {
        let w = worker(Arc::new(MemoryStore::new()), Arc::new(ManualClock::default()));
        assert_eq!(w.poll_once().unwrap(), PollOutcome::Idle);
    }

    #[test]
    fn honest_game_is_verified_with_recomputed_values() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Millis(1_000)));
        let job = store.submit(finished_game(), clock.now()).unwrap();
        let w = worker(Arc::clone(&store), clock);

        let outcome = w.poll_once().unwrap();
        assert_eq!(
            outcome,
            PollOutcome::Verified {
                job,
                session: SessionId(1)
            }
        );
        let s = store.session(SessionId(1)).unwrap().unwrap();
        assert_eq!(s.status, SessionStatus::Verified);
        assert_eq!(s.verified_score, Some(s.claimed_score as u64));
        assert_eq!(store.job(job).unwrap().unwrap().status, JobStatus::Done);
    }

    #[test]
    fn tampered_score_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        let mut session = finished_game();
        session.claimed_score += 2;
        let job = store.submit(session, clock.now()).unwrap();
        let w = worker(Arc::clone(&store), clock);

        assert_eq!(
            w.poll_once().unwrap(),
            PollOutcome::Rejected {
                job,
                session: SessionId(1),
                code: "score_mismatch"
            }
        );
        let s = store.session(SessionId(1)).unwrap().unwrap();
        assert_eq!(s.status, SessionStatus::Rejected);
        assert_eq!(s.verified_score, None);
    }

    #[test]
    fn unparseable_payload_fails_with_backoff() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Millis(10_000)));
        let mut session = finished_game();
        session.replay_json = "{not json".into();
        let job = store.submit(session, clock.now()).unwrap();
        let w = worker(Arc::clone(&store), Arc::clone(&clock));

        let PollOutcome::Failed { error, .. } = w.poll_once().unwrap() else {
            panic!("expected a failure");
        };
        assert!(error.contains("replay_json"));
        let row = store.job(job).unwrap().unwrap();
        assert_eq!(row.status, JobStatus::Failed);
        // First claim bumps attempts to 1, so the delay is 2^1 seconds.
        assert_eq!(row.available_at, Millis(12_000));
        assert_eq!(
            store.session(SessionId(1)).unwrap().unwrap().status,
            SessionStatus::Pending
        );

        assert_eq!(w.poll_once().unwrap(), PollOutcome::Idle);
        clock.advance(Duration::from_secs(2));
        assert!(matches!(w.poll_once().unwrap(), PollOutcome::Failed { .. }));
        assert_eq!(store.job(job).unwrap().unwrap().available_at, Millis(16_000));
    }

    #[test]
    fn missing_session_is_orphaned() {
        let store = Arc::new(MemoryStore::new());
        let job = store.enqueue(SessionId(42), Millis(0)).unwrap();
        let w = worker(Arc::clone(&store), Arc::new(ManualClock::default()));
        assert_eq!(w.poll_once().unwrap(), PollOutcome::Orphaned { job });
    }

    /// Store whose completion writes always fail.
    struct FlakyStore {
        inner: MemoryStore,
    }

    impl JobStore for FlakyStore {
        fn claim(&self, now: Millis, policy: &ClaimPolicy) -> Result<Claim, StoreError> {
            self.inner.claim(now, policy)
        }

        fn complete_verified(
            &self,
            _: JobId,
            _: SessionId,
            _: &VerifiedOutcome,
            _: Millis,
        ) -> Result<(), StoreError> {
            Err(StoreError::Unavailable {
                detail: "write timeout".into(),
            })
        }

        fn complete_rejected(
            &self,
            _: JobId,
            _: SessionId,
            _: &RejectReason,
            _: Millis,
        ) -> Result<(), StoreError> {
            panic!("connection pool exploded")
        }

        fn fail(
            &self,
            job: JobId,
            error: &str,
            available_at: Millis,
            now: Millis,
        ) -> Result<(), StoreError> {
            self.inner.fail(job, error, available_at, now)
        }
    }

    #[test]
    fn store_error_during_completion_is_transient() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
        });
        let job = store.inner.submit(finished_game(), Millis(0)).unwrap();
        let w = Worker::new(
            "flaky",
            Arc::clone(&store),
            standard_catalog(),
            Arc::new(ManualClock::default()),
            WorkerConfig::default(),
        )
        .unwrap();

        let PollOutcome::Failed { error, .. } = w.poll_once().unwrap() else {
            panic!("expected a failure");
        };
        assert!(error.contains("write timeout"));
        let row = store.inner.job(job).unwrap().unwrap();
        assert_eq!(row.status, JobStatus::Failed);
        assert_eq!(row.last_error.as_deref(), Some(error.as_str()));
    }

    #[test]
    fn panic_during_processing_is_caught() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
        });
        let mut session = finished_game();
        session.claimed_score += 2;
        let job = store.inner.submit(session, Millis(0)).unwrap();
        let w = Worker::new(
            "flaky",
            Arc::clone(&store),
            standard_catalog(),
            Arc::new(ManualClock::default()),
            WorkerConfig::default(),
        )
        .unwrap();

        let PollOutcome::Failed { error, .. } = w.poll_once().unwrap() else {
            panic!("expected a failure");
        };
        assert!(error.contains("connection pool exploded"));
        assert_eq!(store.inner.job(job).unwrap().unwrap().status, JobStatus::Failed);
    }

    #[test]
    fn offline_store_surfaces_error() {
        let store = Arc::new(MemoryStore::new());
        store.set_offline(true);
        let w = worker(Arc::clone(&store), Arc::new(ManualClock::default()));
        assert!(matches!(w.poll_once(), Err(WorkerError::Store(_))));
    }

    #[test]
    fn run_stops_when_token_is_set() {
        let store = Arc::new(MemoryStore::new());
        store.submit(finished_game(), Millis(0)).unwrap();
        let w = worker(Arc::clone(&store), Arc::new(ManualClock::default()));
        let stop = StopToken::new();
        let stopper = stop.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            stopper.stop();
        });
        let stats = w.run(&stop);
        handle.join().unwrap();
        assert_eq!(stats.verified, 1);
        assert!(stats.idle_polls >= 1);
    }
}
