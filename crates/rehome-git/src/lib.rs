//! # rehome-git
//!
//! Git command layer for Rehome. Runs the `git` executable against an
//! explicit working directory and exposes the handful of verbs an import
//! needs behind the [`GitOps`] trait.

mod error;
mod repository;
mod runner;
mod traits;
mod types;

pub use error::{Error, Result};
pub use repository::{EMPTY_PATCH_MESSAGE, Repository};
pub use runner::{CommandOutput, GitRunner, StreamingCommand};
pub use traits::GitOps;
pub use types::{ApplyOptions, CommitId};
