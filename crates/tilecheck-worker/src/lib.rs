//! Background verification of submitted game sessions.
//!
//! Sessions and their verification jobs live in an external store
//! reached through the [`JobStore`] trait. A [`Worker`] claims one job
//! at a time, replays the session through a
//! [`Validator`](tilecheck_replay::Validator) and writes back either
//! the recomputed result or a structured rejection. A [`WorkerPool`]
//! runs several workers on named threads; the claim is the only point
//! where they synchronize.
//!
//! [`MemoryStore`] is a complete in-process store for tests, benches
//! and single-process deployments.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod backoff;
pub mod clock;
pub mod config;
pub mod error;
pub mod job;
pub mod memory;
pub mod pool;
pub mod store;
pub mod worker;

pub use backoff::retry_delay;
pub use clock::{Clock, ManualClock, Millis, SystemClock};
pub use config::{ConfigError, WorkerConfig};
pub use error::WorkerError;
pub use job::{JobStatus, Rejection, SessionRecord, SessionStatus, VerificationJob};
pub use memory::MemoryStore;
pub use pool::{ShutdownReport, StopToken, WorkerPool};
pub use store::{Claim, ClaimPolicy, JobStore, StoreError};
pub use worker::{PollOutcome, Worker, WorkerStats};
