//! Replay payloads and server-side replay validation.
//!
//! A client submits its claimed result together with a compact action
//! log. The [`Validator`] trusts none of it: it resolves the mode from
//! the catalog, checks every declared field against it, re-runs the log
//! through a fresh [`GameEngine`](tilecheck_engine::GameEngine), and
//! accepts only when the recomputed result matches the claims exactly.
//!
//! # Architecture
//!
//! - [`payload`] parses the schema-v3 JSON envelope and builds new ones
//! - [`codec`] converts individual actions to and from their JSON tuples
//! - [`hash`] and [`compare`] detect and localize board mismatches
//! - [`validator`] orders the checks and produces a [`Verdict`]
//!
//! # Format
//!
//! ```text
//! {"v":3, "seed":0.123456, "mode_key":"classic_4x4", ...,
//!  "actions":[["m",0], ["u"], ["p",1,2,8]]}
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod compare;
pub mod config;
pub mod error;
pub mod hash;
pub mod payload;
pub mod validator;

pub use compare::{compare_boards, BoardDivergence, CellDivergence};
pub use config::{ConfigError, ValidatorConfig};
pub use error::{RejectReason, ReplayField};
pub use hash::board_hash;
pub use payload::{Envelope, ReplayPayload};
pub use tilecheck_engine::Outcome;
pub use validator::{Submission, Validator, Verdict, VerifiedOutcome};

/// Replay schema version accepted by this build.
pub const REPLAY_VERSION: u64 = 3;
