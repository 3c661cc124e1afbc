//! Replay engine: applies each source commit to the destination in order.
//!
//! Commits are replayed strictly one after another. The first failure rolls
//! the destination back to the job's checkpoint before the error is returned.

use rehome_git::{CommitId, GitOps};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::identity;
use crate::job::ImportJob;
use crate::patch::PatchSynthesizer;

/// Where the engine is in its run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayState {
    /// Nothing has been applied yet.
    Idle,
    /// Working on the commit at `index` of the job's commit list.
    Applying {
        /// Position in the commit list.
        index: usize,
        /// The commit being replayed.
        commit: CommitId,
    },
    /// Every commit was replayed.
    Committed,
    /// A commit failed; the destination is being restored.
    RollingBack {
        /// The commit that failed.
        commit: CommitId,
    },
    /// The destination was restored after a failure.
    RolledBack {
        /// The commit that failed.
        commit: CommitId,
    },
}

/// Progress notifications emitted while replaying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayEvent {
    /// About to replay a commit.
    Applying {
        /// Position in the commit list, zero-based.
        index: usize,
        /// Length of the commit list.
        total: usize,
        /// The commit.
        commit: CommitId,
    },
    /// A commit produced an empty patch and was skipped.
    Skipped {
        /// The commit.
        commit: CommitId,
    },
    /// A commit failed and the destination is being reset.
    RollingBack {
        /// The commit that failed.
        commit: CommitId,
        /// Where the destination is reset to.
        checkpoint: String,
    },
    /// Every commit was replayed.
    Finished,
}

/// What happened to a single commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommitOutcome {
    Applied,
    Skipped,
}

/// Summary of a successful import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Commits that became new commits in the destination.
    pub applied: usize,
    /// Commits skipped because their patch was empty.
    pub skipped: Vec<CommitId>,
}

/// Replays a validated [`ImportJob`].
pub struct ReplayEngine<'a, G> {
    job: &'a ImportJob<G>,
    config: &'a Config,
    synthesizer: PatchSynthesizer<'a, G>,
    state: ReplayState,
}

impl<'a, G: GitOps> ReplayEngine<'a, G> {
    /// Create an engine for `job`.
    #[must_use]
    pub fn new(job: &'a ImportJob<G>, config: &'a Config) -> Self {
        Self {
            job,
            config,
            synthesizer: PatchSynthesizer::new(&job.source, &job.target_relative_to_root),
            state: ReplayState::Idle,
        }
    }

    /// Current state of the run.
    #[must_use]
    pub const fn state(&self) -> &ReplayState {
        &self.state
    }

    /// Replay every commit of the job.
    ///
    /// # Errors
    /// Returns [`Error::ImportAborted`] after rolling back if any commit
    /// fails, including when the original identity cannot be put back
    /// after it.
    pub async fn execute(&mut self) -> Result<ImportReport> {
        self.execute_with(|_| {}).await
    }

    /// Replay every commit of the job, reporting progress to `on_event`.
    ///
    /// # Errors
    /// See [`ReplayEngine::execute`].
    pub async fn execute_with<F>(&mut self, mut on_event: F) -> Result<ImportReport>
    where
        F: FnMut(&ReplayEvent),
    {
        let job = self.job;
        let total = job.commits.len();
        let mut report = ImportReport::default();

        for (index, commit) in job.commits.iter().enumerate() {
            self.state = ReplayState::Applying {
                index,
                commit: commit.clone(),
            };
            on_event(&ReplayEvent::Applying {
                index,
                total,
                commit: commit.clone(),
            });
            tracing::info!(%commit, index, total, "applying commit");

            match self.replay_commit(commit).await {
                Ok(CommitOutcome::Applied) => report.applied += 1,
                Ok(CommitOutcome::Skipped) => {
                    tracing::info!(%commit, "skipped empty patch");
                    on_event(&ReplayEvent::Skipped {
                        commit: commit.clone(),
                    });
                    report.skipped.push(commit.clone());
                }
                Err(cause) => {
                    self.state = ReplayState::RollingBack {
                        commit: commit.clone(),
                    };
                    on_event(&ReplayEvent::RollingBack {
                        commit: commit.clone(),
                        checkpoint: job.checkpoint.clone(),
                    });
                    self.roll_back().await;
                    self.state = ReplayState::RolledBack {
                        commit: commit.clone(),
                    };
                    return Err(Error::ImportAborted {
                        commit: commit.clone(),
                        cause: Box::new(cause),
                    });
                }
            }
        }

        self.state = ReplayState::Committed;
        on_event(&ReplayEvent::Finished);
        tracing::info!(applied = report.applied, skipped = report.skipped.len(), "import finished");

        Ok(report)
    }

    /// Synthesize, apply under the commit's own identity, then restore the
    /// original identity whatever the apply did.
    async fn replay_commit(&self, commit: &CommitId) -> Result<CommitOutcome> {
        let job = self.job;
        let patch = self.synthesizer.synthesize(commit).await?;
        let committer =
            identity::identity_of(&job.source, commit, self.config.identity.source).await?;

        identity::install(&job.destination, &committer).await?;
        let applied = self.apply(patch.as_bytes()).await;
        let restored = identity::restore(&job.destination, &job.original_identity).await;

        let outcome = applied?;
        restored?;
        Ok(outcome)
    }

    async fn apply(&self, patch: &[u8]) -> Result<CommitOutcome> {
        let destination = &self.job.destination;
        let options = self.config.apply.options();

        match destination.am(&options, patch).await {
            Ok(()) => Ok(CommitOutcome::Applied),
            Err(rehome_git::Error::EmptyPatch) if self.config.apply.skip_empty => {
                destination.am_skip().await?;
                Ok(CommitOutcome::Skipped)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Put the destination back the way preflight found it.
    ///
    /// Each step is attempted even if an earlier one fails; failures are
    /// logged so they never replace the error that caused the rollback.
    async fn roll_back(&self) {
        let job = self.job;
        tracing::info!(checkpoint = %job.checkpoint, "rolling back to previous HEAD");

        if let Err(err) = identity::restore(&job.destination, &job.original_identity).await {
            tracing::warn!(error = %err, "failed to restore identity during rollback");
        }
        // Fails harmlessly when no am session is open.
        if let Err(err) = job.destination.am_abort().await {
            tracing::debug!(error = %err, "git am --abort during rollback");
        }
        if let Err(err) = job.destination.reset_hard(&job.checkpoint).await {
            tracing::warn!(error = %err, checkpoint = %job.checkpoint, "failed to reset during rollback");
        }
    }
}
