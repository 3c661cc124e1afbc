//! Command-line interface definition.

use std::path::PathBuf;

use clap::Parser;

pub mod import;

const AFTER_HELP: &str = "\
Examples:
  rehome ../legacy-service . services/legacy
  rehome ~/src/widgets ~/src/monorepo packages/widgets

The destination must have a clean working tree and the target subdirectory
must not exist yet. Each commit on the external repository's first-parent
history is replayed with its original author, committer and dates. If any
commit fails to apply, the destination is reset to where it started.

Settings are read from <git-dir>/rehome.toml when present. Set REHOME_LOG
(e.g. REHOME_LOG=debug) to see every git command that runs.";

/// Import the full history of one git repository into a subdirectory of another.
#[derive(Parser)]
#[command(name = "rehome")]
#[command(about, long_about = None, after_help = AFTER_HELP)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Path to the repository whose history is imported.
    #[arg(value_name = "EXTERNAL_REPO")]
    pub external_repo: PathBuf,

    /// Working copy of the repository that receives the history.
    #[arg(value_name = "DESTINATION_REPO")]
    pub destination_repo: PathBuf,

    /// Directory, relative to the destination, that the files land in.
    #[arg(value_name = "SUBDIRECTORY")]
    pub subdirectory: PathBuf,
}
