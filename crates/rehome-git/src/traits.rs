//! Trait abstractions for git operations.
//!
//! This module defines the `GitOps` trait which abstracts the git verbs an
//! import needs, enabling dependency injection and testability.

use std::future::Future;
use std::path::PathBuf;

use crate::{ApplyOptions, CommitId, Result};

/// Trait for git repository operations.
///
/// This trait abstracts git operations, allowing for:
/// - Dependency injection in the preflight and replay code
/// - Mock implementations for testing
///
/// Every method is bound to one working copy; an import holds one
/// implementation for the source and one for the destination.
#[allow(clippy::missing_errors_doc)]
pub trait GitOps {
    // === Repository Info ===

    /// Root of the working tree containing the bound directory.
    fn toplevel(&self) -> impl Future<Output = Result<PathBuf>>;

    /// Absolute path of the `.git` directory.
    fn git_dir(&self) -> impl Future<Output = Result<PathBuf>>;

    /// Whether `HEAD` points at a commit.
    fn has_commits(&self) -> impl Future<Output = Result<bool>>;

    /// The commit `HEAD` points at.
    fn head(&self) -> impl Future<Output = Result<String>>;

    // === History ===

    /// First-parent history of `HEAD`, oldest first.
    fn first_parent_commits(&self) -> impl Future<Output = Result<Vec<CommitId>>>;

    /// Mailbox-formatted patch for a single commit, diffed against its first
    /// parent, with custom path prefixes for each side.
    fn commit_patch(
        &self,
        commit: &CommitId,
        src_prefix: &str,
        dst_prefix: &str,
    ) -> impl Future<Output = Result<Vec<u8>>>;

    /// Render `format` (a `git show --format` string) for one commit.
    fn show(&self, commit: &CommitId, format: &str) -> impl Future<Output = Result<String>>;

    /// The git version number, without the `git version` label.
    fn version(&self) -> impl Future<Output = Result<String>>;

    // === Working Directory ===

    /// Whether tracked files differ from `HEAD`.
    fn has_uncommitted_changes(&self) -> impl Future<Output = Result<bool>>;

    /// Whether a `git am` session, or a `git rebase` using the apply
    /// backend, is already in progress.
    fn apply_in_progress(&self) -> impl Future<Output = Result<bool>>;

    // === Configuration ===

    /// Read a repository-local config value; `None` if unset.
    fn config_get(&self, key: &str) -> impl Future<Output = Result<Option<String>>>;

    /// Write a repository-local config value.
    fn config_set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>>;

    /// Remove a repository-local config value; a no-op if unset.
    fn config_unset(&self, key: &str) -> impl Future<Output = Result<()>>;

    // === Applying ===

    /// Apply a mailbox patch read from stdin.
    ///
    /// Returns [`crate::Error::EmptyPatch`] when git reports the patch as empty;
    /// the `am` session is then still open and must be skipped or aborted.
    fn am(&self, options: &ApplyOptions, patch: &[u8]) -> impl Future<Output = Result<()>>;

    /// Skip the current patch of an `am` session.
    fn am_skip(&self) -> impl Future<Output = Result<()>>;

    /// Abort an `am` session, restoring the branch it started from.
    fn am_abort(&self) -> impl Future<Output = Result<()>>;

    /// Hard reset the current branch and working tree to `reference`.
    fn reset_hard(&self, reference: &str) -> impl Future<Output = Result<()>>;
}
