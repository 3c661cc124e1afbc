//! `rehome` import - Replay an external repository into a subdirectory.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rehome_core::config::CONFIG_FILE;
use rehome_core::{Config, ImportJob, ImportReport, ImportRequest, ReplayEngine, ReplayEvent};
use rehome_git::{GitOps, Repository};

use crate::output;

/// Run the import.
pub fn run(external_repo: &Path, destination_repo: &Path, subdirectory: &Path) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let report = rt.block_on(import(external_repo, destination_repo, subdirectory))?;

    if !report.skipped.is_empty() {
        output::warn(&format!(
            "Skipped {} empty commit(s):",
            report.skipped.len()
        ));
        for commit in &report.skipped {
            output::detail(&format!("  {commit}"));
        }
    }
    output::success(&format!(
        "Imported {} commit(s) into {}",
        report.applied,
        subdirectory.display()
    ));
    Ok(())
}

async fn import(
    external_repo: &Path,
    destination_repo: &Path,
    subdirectory: &Path,
) -> Result<ImportReport> {
    let request = ImportRequest::new(external_repo, destination_repo, subdirectory)?;
    let source = Repository::open(&request.source);
    let destination = Repository::open(&request.destination);

    let job = ImportJob::initialize(request, source, destination).await?;
    let config_path = job.destination.git_dir().await?.join(CONFIG_FILE);
    let config = Config::load(&config_path)
        .map_err(|e| anyhow!("Failed to load {}: {e}", config_path.display()))?;

    output::info(&job.summary());

    let mut engine = ReplayEngine::new(&job, &config);
    let report = engine.execute_with(print_event).await?;
    Ok(report)
}

fn print_event(event: &ReplayEvent) {
    match event {
        ReplayEvent::Applying {
            index,
            total,
            commit,
        } => output::detail(&format!("  [{}/{total}] {commit}", index + 1)),
        ReplayEvent::Skipped { commit } => {
            output::detail(&format!("  {commit} produced an empty patch, skipped"));
        }
        ReplayEvent::RollingBack { commit, checkpoint } => output::warn(&format!(
            "Commit {commit} failed, resetting destination to {checkpoint}"
        )),
        ReplayEvent::Finished => {}
    }
}
