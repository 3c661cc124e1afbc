//! Spawning git processes.
//!
//! Every git invocation in rehome goes through [`GitRunner`]. Short queries
//! are captured in full; `git am` is started with [`GitRunner::run_streaming`]
//! so the patch can be fed through stdin.

use std::io::ErrorKind;
use std::path::Path;
use std::process::{Output, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};

use crate::error::{Error, Result};

/// Runs git with an explicit working directory.
#[derive(Debug, Clone)]
pub struct GitRunner {
    program: String,
}

impl Default for GitRunner {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitRunner {
    /// Create a runner for the given git executable.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The executable this runner invokes.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run to completion and return stdout as text, minus the final newline.
    ///
    /// # Errors
    /// Returns `CommandFailed` if git exits non-zero, `Spawn` if it cannot start.
    pub async fn run_captured(&self, args: &[&str], cwd: &Path) -> Result<String> {
        let stdout = self.run_captured_bytes(args, cwd).await?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    /// Run to completion and return raw stdout bytes, minus the final newline.
    ///
    /// # Errors
    /// Returns `CommandFailed` if git exits non-zero, `Spawn` if it cannot start.
    pub async fn run_captured_bytes(&self, args: &[&str], cwd: &Path) -> Result<Vec<u8>> {
        let command = self.describe(args);
        tracing::debug!(%command, cwd = %cwd.display(), "running git");

        let output = self
            .command(args, cwd)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| Error::Spawn {
                command: command.clone(),
                source,
            })?;

        let mut stdout = check_output(command, output)?.stdout;
        strip_final_newline(&mut stdout);
        Ok(stdout)
    }

    /// Start git with a writable stdin.
    ///
    /// # Errors
    /// Returns `Spawn` if the process cannot be started.
    pub fn run_streaming(&self, args: &[&str], cwd: &Path) -> Result<StreamingCommand> {
        let command = self.describe(args);
        tracing::debug!(%command, cwd = %cwd.display(), "starting git");

        let mut child = self
            .command(args, cwd)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                command: command.clone(),
                source,
            })?;
        let stdin = child.stdin.take();

        Ok(StreamingCommand {
            command,
            child,
            stdin,
        })
    }

    fn command(&self, args: &[&str], cwd: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        // Diagnostics such as "Patch is empty." are matched textually.
        cmd.args(args)
            .current_dir(cwd)
            .env("LC_ALL", "C")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn describe(&self, args: &[&str]) -> String {
        let mut command = self.program.clone();
        for arg in args {
            command.push(' ');
            command.push_str(arg);
        }
        command
    }
}

/// A running git process whose stdin is still open.
#[derive(Debug)]
pub struct StreamingCommand {
    command: String,
    child: Child,
    stdin: Option<ChildStdin>,
}

/// Text captured from a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl StreamingCommand {
    /// Write `input` to stdin, close it, and wait for the process to exit.
    ///
    /// The write runs concurrently with draining stdout/stderr, so a chatty
    /// process cannot block on a full pipe while we are still writing.
    ///
    /// # Errors
    /// Returns `CommandFailed` on a non-zero exit, `Io` if waiting fails or
    /// stdin reports anything other than a broken pipe.
    pub async fn complete(self, input: &[u8]) -> Result<CommandOutput> {
        let Self {
            command,
            child,
            stdin,
        } = self;

        let write = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            let written = stdin.write_all(input).await;
            drop(stdin);
            match written {
                // The exit status tells the real story.
                Err(err) if err.kind() == ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        };

        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output?;
        let output = check_output(command, output)?;
        written?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

fn check_output(command: String, output: Output) -> Result<Output> {
    if output.status.success() {
        return Ok(output);
    }

    Err(Error::CommandFailed {
        command,
        status: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

fn strip_final_newline(bytes: &mut Vec<u8>) {
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
    }
}
