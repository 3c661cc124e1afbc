//! Rehome CLI - Move a repository's history into a subdirectory of another.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::Cli;

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = commands::import::run(&cli.external_repo, &cli.destination_repo, &cli.subdirectory);

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Diagnostics go to stderr, filtered by `REHOME_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("REHOME_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
