//! Repository wrapper providing the git verbs an import needs.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::runner::GitRunner;
use crate::traits::GitOps;
use crate::types::{ApplyOptions, CommitId};

/// First words git prints when a mailbox patch has no diff.
pub const EMPTY_PATCH_MESSAGE: &str = "Patch is empty.";

const VERSION_LABEL: &str = "git version ";

/// A git working copy driven through the `git` executable.
#[derive(Debug, Clone)]
pub struct Repository {
    runner: GitRunner,
    workdir: PathBuf,
}

impl Repository {
    /// Bind a runner to a working directory.
    ///
    /// Nothing is checked here; the first command reports a missing or
    /// invalid repository.
    #[must_use]
    pub fn new(runner: GitRunner, workdir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            workdir: workdir.into(),
        }
    }

    /// Bind the default `git` executable to a working directory.
    #[must_use]
    pub fn open(workdir: impl Into<PathBuf>) -> Self {
        Self::new(GitRunner::default(), workdir)
    }

    async fn git(&self, args: &[&str]) -> Result<String> {
        self.runner.run_captured(args, &self.workdir).await
    }
}

impl GitOps for Repository {
    async fn toplevel(&self) -> Result<PathBuf> {
        self.git(&["rev-parse", "--show-toplevel"])
            .await
            .map(PathBuf::from)
    }

    async fn git_dir(&self) -> Result<PathBuf> {
        self.git(&["rev-parse", "--absolute-git-dir"])
            .await
            .map(PathBuf::from)
    }

    async fn has_commits(&self) -> Result<bool> {
        // --quiet turns a missing ref into a silent exit status 1.
        match self.git(&["rev-parse", "--verify", "--quiet", "HEAD"]).await {
            Ok(_) => Ok(true),
            Err(err) if err.exit_code() == Some(1) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn head(&self) -> Result<String> {
        self.git(&["rev-parse", "HEAD"]).await
    }

    async fn first_parent_commits(&self) -> Result<Vec<CommitId>> {
        // Following only first parents flattens merged side branches.
        let log = self
            .git(&["log", "--format=%h", "--first-parent"])
            .await?;

        let mut commits: Vec<CommitId> = log
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(CommitId::from)
            .collect();
        commits.reverse();
        Ok(commits)
    }

    async fn commit_patch(
        &self,
        commit: &CommitId,
        src_prefix: &str,
        dst_prefix: &str,
    ) -> Result<Vec<u8>> {
        let src_prefix = format!("--src-prefix={src_prefix}");
        let dst_prefix = format!("--dst-prefix={dst_prefix}");
        let args = [
            "log",
            "--reverse",
            "--first-parent",
            "-p",
            "-m",
            "--pretty=email",
            "--stat",
            "--binary",
            "-1",
            "--color=never",
            commit.as_str(),
            src_prefix.as_str(),
            dst_prefix.as_str(),
        ];
        self.runner.run_captured_bytes(&args, &self.workdir).await
    }

    async fn show(&self, commit: &CommitId, format: &str) -> Result<String> {
        let format = format!("--format={format}");
        self.git(&["show", "-s", format.as_str(), commit.as_str()]).await
    }

    async fn version(&self) -> Result<String> {
        let output = self.git(&["--version"]).await?;
        if let Some(version) = output.strip_prefix(VERSION_LABEL) {
            return Ok(version.to_string());
        }
        Err(Error::UnexpectedOutput {
            command: "git --version".to_string(),
            output,
        })
    }

    async fn has_uncommitted_changes(&self) -> Result<bool> {
        // Stat-only changes would otherwise show up in diff-index.
        if let Err(err) = self.git(&["update-index", "-q", "--refresh"]).await {
            tracing::debug!(error = %err, "index refresh failed");
        }

        let changes = self.git(&["diff-index", "HEAD"]).await?;
        Ok(!changes.trim().is_empty())
    }

    async fn apply_in_progress(&self) -> Result<bool> {
        let path = self.git(&["rev-parse", "--git-path", "rebase-apply"]).await?;
        Ok(self.workdir.join(path).exists())
    }

    async fn config_get(&self, key: &str) -> Result<Option<String>> {
        match self.git(&["config", "--local", "--get", key]).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.exit_code() == Some(1) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn config_set(&self, key: &str, value: &str) -> Result<()> {
        self.git(&["config", "--local", key, value]).await?;
        Ok(())
    }

    async fn config_unset(&self, key: &str) -> Result<()> {
        // Exit status 5 means the key was not set.
        match self.git(&["config", "--local", "--unset", key]).await {
            Ok(_) => Ok(()),
            Err(err) if err.exit_code() == Some(5) => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn am(&self, options: &ApplyOptions, patch: &[u8]) -> Result<()> {
        let mut args = vec!["am"];
        args.extend(options.to_args());

        let process = self.runner.run_streaming(&args, &self.workdir)?;
        match process.complete(patch).await {
            Ok(output) => {
                tracing::debug!(stdout = %output.stdout.trim(), "patch applied");
                if !output.stderr.trim().is_empty() {
                    // Whitespace and fuzz warnings from git apply.
                    tracing::debug!(stderr = %output.stderr.trim(), "git am warnings");
                }
                Ok(())
            }
            Err(Error::CommandFailed { stdout, stderr, .. })
                if is_empty_patch(&stdout) || is_empty_patch(&stderr) =>
            {
                Err(Error::EmptyPatch)
            }
            Err(err) => Err(err),
        }
    }

    async fn am_skip(&self) -> Result<()> {
        self.git(&["am", "--skip"]).await?;
        Ok(())
    }

    async fn am_abort(&self) -> Result<()> {
        self.git(&["am", "--abort"]).await?;
        Ok(())
    }

    async fn reset_hard(&self, reference: &str) -> Result<()> {
        self.git(&["reset", "--hard", reference]).await?;
        Ok(())
    }
}

fn is_empty_patch(output: &str) -> bool {
    output
        .lines()
        .any(|line| line.trim_start().starts_with(EMPTY_PATCH_MESSAGE))
}
