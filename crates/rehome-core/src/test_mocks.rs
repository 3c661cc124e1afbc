//! Mock implementation of `GitOps` for testing.
//!
//! Clones share state, so a test can hand a clone to the code under test
//! and inspect the recorded calls afterwards.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rehome_git::{ApplyOptions, CommitId, Error as GitError, GitOps, Result as GitResult};

/// What a scripted `am` call does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmResult {
    /// Git reports the patch as empty.
    Empty,
    /// The patch does not apply.
    Fail,
}

/// A patch the mock accepted, with the committer configured at the time.
#[derive(Debug, Clone)]
pub struct AppliedPatch {
    pub patch: Vec<u8>,
    pub committer_email: Option<String>,
}

#[derive(Debug)]
struct MockState {
    toplevel: PathBuf,
    head: String,
    commits: Vec<CommitId>,
    patches: HashMap<String, Vec<u8>>,
    show_output: HashMap<String, String>,
    identities: HashMap<String, (String, String)>,
    version: String,
    config: HashMap<String, String>,
    dirty: bool,
    apply_in_progress: bool,
    am_results: HashMap<usize, AmResult>,
    am_count: usize,
    applied: Vec<AppliedPatch>,
    /// `(head, applied.len())` before each successful `am`.
    history: Vec<(String, usize)>,
    failing: HashSet<&'static str>,
    calls: Vec<String>,
}

/// Mock implementation of `GitOps` for testing.
#[derive(Debug, Clone)]
pub struct MockGitOps {
    workdir: PathBuf,
    state: Rc<RefCell<MockState>>,
}

impl Default for MockGitOps {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGitOps {
    pub fn new() -> Self {
        Self {
            workdir: PathBuf::from("/"),
            state: Rc::new(RefCell::new(MockState {
                toplevel: PathBuf::from("/"),
                head: "0000000000000000000000000000000000000000".to_string(),
                commits: Vec::new(),
                patches: HashMap::new(),
                show_output: HashMap::new(),
                identities: HashMap::new(),
                version: "2.43.0".to_string(),
                config: HashMap::new(),
                dirty: false,
                apply_in_progress: false,
                am_results: HashMap::new(),
                am_count: 0,
                applied: Vec::new(),
                history: Vec::new(),
                failing: HashSet::new(),
                calls: Vec::new(),
            })),
        }
    }

    pub fn with_commits(self, commits: &[&str]) -> Self {
        self.state.borrow_mut().commits = commits.iter().map(|c| CommitId::from(*c)).collect();
        self
    }

    pub fn with_toplevel(mut self, path: &Path) -> Self {
        self.state.borrow_mut().toplevel = path.to_path_buf();
        self.workdir = path.to_path_buf();
        self
    }

    pub fn with_head(self, head: &str) -> Self {
        self.state.borrow_mut().head = head.to_string();
        self
    }

    pub fn with_config(self, key: &str, value: &str) -> Self {
        self.state
            .borrow_mut()
            .config
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_dirty(self, dirty: bool) -> Self {
        self.state.borrow_mut().dirty = dirty;
        self
    }

    pub fn with_apply_in_progress(self, in_progress: bool) -> Self {
        self.state.borrow_mut().apply_in_progress = in_progress;
        self
    }

    pub fn with_identity(self, commit: &str, email: &str, name: &str) -> Self {
        self.state
            .borrow_mut()
            .identities
            .insert(commit.to_string(), (email.to_string(), name.to_string()));
        self
    }

    /// Raw `show` output for `commit`, whatever format is asked for.
    pub fn with_show_output(self, commit: &str, output: &str) -> Self {
        self.state
            .borrow_mut()
            .show_output
            .insert(commit.to_string(), output.to_string());
        self
    }

    pub fn with_patch(self, commit: &str, patch: &str) -> Self {
        self.state
            .borrow_mut()
            .patches
            .insert(commit.to_string(), patch.as_bytes().to_vec());
        self
    }

    pub fn with_version(self, version: &str) -> Self {
        self.state.borrow_mut().version = version.to_string();
        self
    }

    /// Script the outcome of the `index`-th `am` call (zero-based).
    pub fn with_am_result(self, index: usize, result: AmResult) -> Self {
        self.state.borrow_mut().am_results.insert(index, result);
        self
    }

    /// Make every call to `operation` fail.
    pub fn with_failing(self, operation: &'static str) -> Self {
        self.state.borrow_mut().failing.insert(operation);
        self
    }

    pub fn commits(&self) -> Vec<CommitId> {
        self.state.borrow().commits.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn config_value(&self, key: &str) -> Option<String> {
        self.state.borrow().config.get(key).cloned()
    }

    pub fn head_value(&self) -> String {
        self.state.borrow().head.clone()
    }

    pub fn applied(&self) -> Vec<AppliedPatch> {
        self.state.borrow().applied.clone()
    }

    fn record(&self, operation: &'static str, call: String) -> GitResult<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(call.clone());
        if state.failing.contains(operation) {
            return Err(failure(&call, "scripted failure"));
        }
        Ok(())
    }
}

fn failure(command: &str, stderr: &str) -> GitError {
    GitError::CommandFailed {
        command: format!("git {command}"),
        status: Some(128),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

impl GitOps for MockGitOps {
    async fn toplevel(&self) -> GitResult<PathBuf> {
        self.record("toplevel", "toplevel".to_string())?;
        Ok(self.state.borrow().toplevel.clone())
    }

    async fn git_dir(&self) -> GitResult<PathBuf> {
        self.record("git_dir", "git_dir".to_string())?;
        Ok(self.workdir.join(".git"))
    }

    async fn has_commits(&self) -> GitResult<bool> {
        self.record("has_commits", "has_commits".to_string())?;
        Ok(!self.state.borrow().commits.is_empty())
    }

    async fn head(&self) -> GitResult<String> {
        self.record("head", "head".to_string())?;
        Ok(self.state.borrow().head.clone())
    }

    async fn first_parent_commits(&self) -> GitResult<Vec<CommitId>> {
        self.record("first_parent_commits", "first_parent_commits".to_string())?;
        Ok(self.state.borrow().commits.clone())
    }

    async fn commit_patch(
        &self,
        commit: &CommitId,
        _src_prefix: &str,
        _dst_prefix: &str,
    ) -> GitResult<Vec<u8>> {
        let call = format!("commit_patch {commit}");
        self.record("commit_patch", call.clone())?;
        self.state
            .borrow()
            .patches
            .get(commit.as_str())
            .cloned()
            .ok_or_else(|| failure(&call, &format!("fatal: bad object {commit}")))
    }

    async fn show(&self, commit: &CommitId, format: &str) -> GitResult<String> {
        let call = format!("show {commit} {format}");
        self.record("show", call.clone())?;
        let state = self.state.borrow();
        if let Some(raw) = state.show_output.get(commit.as_str()) {
            return Ok(raw.clone());
        }
        state
            .identities
            .get(commit.as_str())
            .map(|(email, name)| format!("{email}\0{name}"))
            .ok_or_else(|| failure(&call, &format!("fatal: bad object {commit}")))
    }

    async fn version(&self) -> GitResult<String> {
        self.record("version", "version".to_string())?;
        Ok(self.state.borrow().version.clone())
    }

    async fn has_uncommitted_changes(&self) -> GitResult<bool> {
        self.record("has_uncommitted_changes", "has_uncommitted_changes".to_string())?;
        Ok(self.state.borrow().dirty)
    }

    async fn apply_in_progress(&self) -> GitResult<bool> {
        self.record("apply_in_progress", "apply_in_progress".to_string())?;
        Ok(self.state.borrow().apply_in_progress)
    }

    async fn config_get(&self, key: &str) -> GitResult<Option<String>> {
        self.record("config_get", format!("config_get {key}"))?;
        Ok(self.state.borrow().config.get(key).cloned())
    }

    async fn config_set(&self, key: &str, value: &str) -> GitResult<()> {
        self.record("config_set", format!("config_set {key} {value}"))?;
        self.state
            .borrow_mut()
            .config
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn config_unset(&self, key: &str) -> GitResult<()> {
        self.record("config_unset", format!("config_unset {key}"))?;
        self.state.borrow_mut().config.remove(key);
        Ok(())
    }

    async fn am(&self, options: &ApplyOptions, patch: &[u8]) -> GitResult<()> {
        let call = std::iter::once("am")
            .chain(options.to_args())
            .collect::<Vec<_>>()
            .join(" ");
        self.record("am", call.clone())?;

        let mut state = self.state.borrow_mut();
        let index = state.am_count;
        state.am_count += 1;

        match state.am_results.get(&index).copied() {
            Some(AmResult::Empty) => {
                state.apply_in_progress = true;
                Err(GitError::EmptyPatch)
            }
            Some(AmResult::Fail) => {
                state.apply_in_progress = true;
                Err(failure(&call, "error: patch does not apply"))
            }
            None => {
                let checkpoint = (state.head.clone(), state.applied.len());
                state.history.push(checkpoint);
                let committer_email = state.config.get("user.email").cloned();
                state.applied.push(AppliedPatch {
                    patch: patch.to_vec(),
                    committer_email,
                });
                state.head = format!("applied-{index}");
                Ok(())
            }
        }
    }

    async fn am_skip(&self) -> GitResult<()> {
        self.record("am_skip", "am_skip".to_string())?;
        self.state.borrow_mut().apply_in_progress = false;
        Ok(())
    }

    async fn am_abort(&self) -> GitResult<()> {
        self.record("am_abort", "am_abort".to_string())?;
        self.state.borrow_mut().apply_in_progress = false;
        Ok(())
    }

    async fn reset_hard(&self, reference: &str) -> GitResult<()> {
        self.record("reset_hard", format!("reset_hard {reference}"))?;
        let mut state = self.state.borrow_mut();
        if let Some(position) = state.history.iter().position(|(head, _)| head == reference) {
            let applied = state.history[position].1;
            state.applied.truncate(applied);
            state.history.truncate(position);
        }
        state.head = reference.to_string();
        Ok(())
    }
}
