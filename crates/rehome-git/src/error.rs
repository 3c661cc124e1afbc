//! Error types for rehome-git.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running git.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The git process could not be started at all.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        /// The command line that was attempted.
        command: String,
        /// Underlying spawn error.
        source: std::io::Error,
    },

    /// The git process exited with a non-zero status.
    #[error("`{command}` failed ({}): {}", describe_status(.status), diagnostic(.stderr, .stdout))]
    CommandFailed {
        /// The command line that was run.
        command: String,
        /// Exit code, `None` if the process was killed by a signal.
        status: Option<i32>,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },

    /// `git am` refused a patch because it carried no changes.
    #[error("patch is empty")]
    EmptyPatch,

    /// Output from git could not be interpreted.
    #[error("unexpected output from `{command}`: {output:?}")]
    UnexpectedOutput {
        /// The command line that was run.
        command: String,
        /// The offending output.
        output: String,
    },

    /// IO error while talking to a child process.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Exit code of a failed command, if this is a [`Error::CommandFailed`].
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { status, .. } => *status,
            _ => None,
        }
    }
}

#[allow(clippy::ref_option)]
fn describe_status(status: &Option<i32>) -> String {
    status.map_or_else(
        || "terminated by signal".to_string(),
        |code| format!("exit status {code}"),
    )
}

/// Prefer stderr; `git am` reports most of its diagnostics on stdout.
fn diagnostic<'a>(stderr: &'a str, stdout: &'a str) -> &'a str {
    let stderr = stderr.trim();
    if stderr.is_empty() { stdout.trim() } else { stderr }
}
