//! Queue and session records, as the worker sees them.
//!
//! Both rows are owned by an external store; these structs are the
//! worker's typed view of them and serialize with `serde` so a store
//! implementation can persist them however it likes.

use std::fmt;

use serde::{Deserialize, Serialize};
use tilecheck_core::{JobId, SessionId};
use tilecheck_replay::{RejectReason, Submission, VerifiedOutcome};

use crate::clock::Millis;

/// Lifecycle of a verification job.
///
/// ```text
/// queued ──claim──▶ running ──▶ done
///                     │  ▲
///            transient│  │claim (after backoff)
///                     ▼  │
///                    failed
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting for its first claim.
    Queued,
    /// Claimed by a worker.
    Running,
    /// Last attempt hit a transient error; claimable after `available_at`.
    Failed,
    /// Finished (verified, rejected, or orphaned).
    Done,
}

impl JobStatus {
    /// Lowercase tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Failed => "failed",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the verification queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationJob {
    /// Job identifier; FIFO tie-breaker.
    pub id: JobId,
    /// Session to verify.
    pub session_id: SessionId,
    /// Current state.
    pub status: JobStatus,
    /// Claims so far.
    pub attempts: u32,
    /// Earliest time the job may be claimed.
    pub available_at: Millis,
    /// Diagnostic from the last failure, if any.
    pub last_error: Option<String>,
    /// Last state change; drives stale-claim recovery.
    pub updated_at: Millis,
}

impl VerificationJob {
    /// A freshly queued job, claimable from `now`.
    pub fn queued(id: JobId, session_id: SessionId, now: Millis) -> Self {
        Self {
            id,
            session_id,
            status: JobStatus::Queued,
            attempts: 0,
            available_at: now,
            last_error: None,
            updated_at: now,
        }
    }
}

/// Verification state of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Not yet verified.
    Pending,
    /// Replay recomputed and matched the claims.
    Verified,
    /// Replay or claims rejected.
    Rejected,
}

/// Structured rejection stored on a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// Stable reason code, e.g. `score_mismatch`.
    pub code: String,
    /// Human-readable detail.
    pub detail: String,
    /// Offending action index for simulation failures.
    pub action_index: Option<usize>,
}

impl From<&RejectReason> for Rejection {
    fn from(r: &RejectReason) -> Self {
        Self {
            code: r.code().to_string(),
            detail: r.to_string(),
            action_index: r.action_index(),
        }
    }
}

/// A submitted game session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Session identifier.
    pub id: SessionId,
    /// Declared mode key.
    pub mode_key: String,
    /// Declared board columns.
    pub board_width: u32,
    /// Declared board rows.
    pub board_height: u32,
    /// Declared ruleset tag.
    pub ruleset: String,
    /// Declared undo flag.
    pub undo_enabled: bool,
    /// Declared leaderboard bucket.
    pub ranked_bucket: String,
    /// Raw replay payload.
    pub replay_json: String,
    /// Raw claimed final board.
    pub final_board_json: String,
    /// Claimed score.
    pub claimed_score: i64,
    /// Claimed best tile.
    pub claimed_best_tile: i64,
    /// Verification state.
    pub status: SessionStatus,
    /// Recomputed score, once verified.
    pub verified_score: Option<u64>,
    /// Recomputed best tile, once verified.
    pub verified_best_tile: Option<u64>,
    /// Recomputed final board as JSON, once verified.
    pub verified_board: Option<String>,
    /// Why verification failed, once rejected.
    pub rejection_reason: Option<Rejection>,
}

impl SessionRecord {
    /// A pending session holding `submission`'s declared fields and payloads.
    pub fn pending(id: SessionId, submission: &Submission) -> Self {
        Self {
            id,
            mode_key: submission.mode_key.clone(),
            board_width: submission.board_width,
            board_height: submission.board_height,
            ruleset: submission.ruleset.clone(),
            undo_enabled: submission.undo_enabled,
            ranked_bucket: submission.ranked_bucket.clone(),
            replay_json: submission.replay.to_string(),
            final_board_json: submission.final_board.to_string(),
            claimed_score: submission.claimed_score,
            claimed_best_tile: submission.claimed_best_tile,
            status: SessionStatus::Pending,
            verified_score: None,
            verified_best_tile: None,
            verified_board: None,
            rejection_reason: None,
        }
    }

    /// Record a successful verification. Stores the recomputed values.
    pub fn mark_verified(&mut self, outcome: &VerifiedOutcome) -> Result<(), serde_json::Error> {
        self.verified_board = Some(serde_json::to_string(&outcome.board)?);
        self.status = SessionStatus::Verified;
        self.verified_score = Some(outcome.score);
        self.verified_best_tile = Some(outcome.best_tile);
        self.rejection_reason = None;
        Ok(())
    }

    /// Record a rejection.
    pub fn mark_rejected(&mut self, reason: &RejectReason) {
        self.status = SessionStatus::Rejected;
        self.verified_score = None;
        self.verified_best_tile = None;
        self.verified_board = None;
        self.rejection_reason = Some(Rejection::from(reason));
    }
}
