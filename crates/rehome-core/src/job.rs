//! Preflight checks and the import job they produce.

use std::path::{Component, Path, PathBuf};

use rehome_git::{CommitId, GitOps};

use crate::error::{Error, Result};
use crate::identity::{self, ConfiguredIdentity};

/// Paths supplied by the user, resolved to absolute form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    /// The external repository to import.
    pub source: PathBuf,
    /// Working copy of the destination repository.
    pub destination: PathBuf,
    /// Where the history lands, relative to `destination`.
    pub subdirectory: PathBuf,
}

impl ImportRequest {
    /// Resolve `source` and `destination` against the current directory.
    ///
    /// # Errors
    /// Returns error if the current directory cannot be determined.
    pub fn new(
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
        subdirectory: impl Into<PathBuf>,
    ) -> Result<Self> {
        Ok(Self {
            source: std::path::absolute(source)?,
            destination: std::path::absolute(destination)?,
            subdirectory: subdirectory.into(),
        })
    }
}

/// A validated import, ready to be replayed.
#[derive(Debug)]
pub struct ImportJob<G> {
    /// Git bound to the external repository.
    pub source: G,
    /// Git bound to the destination working copy.
    pub destination: G,
    /// Absolute path of the external repository.
    pub source_path: PathBuf,
    /// Absolute path of the destination working copy.
    pub destination_root: PathBuf,
    /// Target directory relative to `destination_root`.
    pub target_subdirectory: PathBuf,
    /// Target directory relative to the repository root, `/`-separated.
    pub target_relative_to_root: String,
    /// Commits to replay, oldest first.
    pub commits: Vec<CommitId>,
    /// The destination's identity before anything was touched.
    pub original_identity: ConfiguredIdentity,
    /// `HEAD` of the destination before anything was touched.
    pub checkpoint: String,
}

impl<G: GitOps> ImportJob<G> {
    /// Validate a request and gather everything the replay needs.
    ///
    /// Nothing is written to either repository here. The destination's
    /// working tree is checked before the source history is read.
    ///
    /// # Errors
    /// Returns the first failed check; see [`Error`].
    pub async fn initialize(request: ImportRequest, source: G, destination: G) -> Result<Self> {
        let ImportRequest {
            source: source_path,
            destination: destination_root,
            subdirectory,
        } = request;

        check_source_dir(&source_path)?;
        let subdirectory_parts = subdirectory_components(&subdirectory)?;

        let toplevel = destination.toplevel().await?;
        let offset = offset_from_root(&toplevel, &destination_root)?;
        let target_relative_to_root = offset
            .into_iter()
            .chain(subdirectory_parts)
            .collect::<Vec<_>>()
            .join("/");

        if destination_root.join(&subdirectory).exists() {
            return Err(Error::TargetAlreadyExists(subdirectory));
        }

        if destination.has_uncommitted_changes().await? {
            return Err(Error::DirtyWorkingTree);
        }
        if destination.apply_in_progress().await? {
            return Err(Error::ApplyInProgress);
        }

        if !source.has_commits().await? {
            return Err(Error::NoCommitsFound(source_path));
        }
        let commits = source.first_parent_commits().await?;
        if commits.is_empty() {
            return Err(Error::NoCommitsFound(source_path));
        }

        // Backed up because every replayed commit changes them.
        let original_identity = identity::capture(&destination).await?;
        let checkpoint = destination.head().await?;

        tracing::info!(
            commits = commits.len(),
            source = %source_path.display(),
            target = %target_relative_to_root,
            %checkpoint,
            "import validated"
        );

        Ok(Self {
            source,
            destination,
            source_path,
            destination_root,
            target_subdirectory: subdirectory,
            target_relative_to_root,
            commits,
            original_identity,
            checkpoint,
        })
    }

    /// One-line description of what is about to happen.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "About to import {} commits from {} into {}",
            self.commits.len(),
            self.source_path.display(),
            self.target_subdirectory.display()
        )
    }
}

fn check_source_dir(path: &Path) -> Result<()> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::SourceNotFound(path.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };

    if metadata.is_dir() {
        Ok(())
    } else {
        Err(Error::SourceNotDirectory(path.to_path_buf()))
    }
}

/// Split the target subdirectory into plain path segments.
fn subdirectory_components(subdirectory: &Path) -> Result<Vec<String>> {
    let invalid = |reason| Error::InvalidTargetSubdirectory {
        path: subdirectory.to_path_buf(),
        reason,
    };

    let mut parts = Vec::new();
    for component in subdirectory.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => return Err(invalid("must not contain `..`")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("must be relative to the destination"));
            }
        }
    }

    if parts.is_empty() {
        return Err(invalid("must name a directory"));
    }
    Ok(parts)
}

/// Segments leading from the repository root to `destination`.
fn offset_from_root(toplevel: &Path, destination: &Path) -> Result<Vec<String>> {
    // Git reports the resolved path; resolve ours the same way.
    let toplevel_resolved = std::fs::canonicalize(toplevel)?;
    let destination_resolved = std::fs::canonicalize(destination)?;

    let offset = destination_resolved
        .strip_prefix(&toplevel_resolved)
        .map_err(|_| Error::DestinationOutsideRepository {
            destination: destination.to_path_buf(),
            toplevel: toplevel.to_path_buf(),
        })?;

    Ok(offset
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect())
}
