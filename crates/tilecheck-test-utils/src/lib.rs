//! Test fixtures for tilecheck development.
//!
//! Provides a [`standard_catalog`] covering every rule variant and a
//! [`Recording`] helper that plays a real game with a fixed policy and
//! turns it into a client submission.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod modes;
pub mod recorder;

pub use modes::{
    blocked_mode, classic_mode, combo_mode, fibonacci_mode, lock_mode, practice_mode,
    standard_catalog, undo_mode,
};
pub use recorder::{Recording, PREFERENCE};
