//! Error types for rehome-core.

use std::path::PathBuf;

use rehome_git::CommitId;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing or running an import.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The external repository path does not exist.
    #[error("no repository found at \"{}\"", .0.display())]
    SourceNotFound(PathBuf),

    /// The external repository path is not a directory.
    #[error("external repo path \"{}\" is not a directory", .0.display())]
    SourceNotDirectory(PathBuf),

    /// The subdirectory argument cannot be placed inside the destination.
    #[error("invalid target directory \"{}\": {reason}", .path.display())]
    InvalidTargetSubdirectory {
        /// The rejected subdirectory.
        path: PathBuf,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The destination path is not inside the working tree git reported.
    #[error("\"{}\" is not inside the repository at \"{}\"", .destination.display(), .toplevel.display())]
    DestinationOutsideRepository {
        /// The destination path.
        destination: PathBuf,
        /// The working tree root git reported.
        toplevel: PathBuf,
    },

    /// The target subdirectory already exists in the destination.
    #[error("target directory already exists \"{}\"", .0.display())]
    TargetAlreadyExists(PathBuf),

    /// The source repository has no commits to import.
    #[error("no git commits to import at \"{}\"", .0.display())]
    NoCommitsFound(PathBuf),

    /// The destination has uncommitted changes.
    #[error("local repository has un-committed changes")]
    DirtyWorkingTree,

    /// The destination is in the middle of its own `git am` or apply-backend
    /// `git rebase`.
    #[error("a `git am` or `git rebase` session is already in progress in the destination - finish or abort it first")]
    ApplyInProgress,

    /// `git show` returned something that is not an email/name pair.
    #[error("could not read identity of commit {commit} from {output:?}")]
    MalformedIdentity {
        /// The commit that was queried.
        commit: CommitId,
        /// The raw output.
        output: String,
    },

    /// A commit could not be replayed; the destination was rolled back.
    #[error("failed to apply commit {commit}.\n{cause}")]
    ImportAborted {
        /// The commit whose replay failed.
        commit: CommitId,
        /// What went wrong while replaying it.
        cause: Box<Error>,
    },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Git operation error.
    #[error("git error: {0}")]
    Git(#[from] rehome_git::Error),
}
