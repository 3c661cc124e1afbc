//! # rehome-core
//!
//! Core logic for Rehome: validating an import, rewriting patches into the
//! target subdirectory, and replaying the external history commit by commit
//! with rollback on failure.

pub mod config;
mod error;
pub mod identity;
pub mod job;
pub mod patch;
pub mod replay;

#[cfg(test)]
mod test_mocks;

pub use config::Config;
pub use error::{Error, Result};
pub use identity::{ConfiguredIdentity, Identity};
pub use job::{ImportJob, ImportRequest};
pub use patch::{Patch, PatchSynthesizer, PathRewriter};
pub use replay::{ImportReport, ReplayEngine, ReplayEvent, ReplayState};
