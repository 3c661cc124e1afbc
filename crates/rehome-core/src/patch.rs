//! Turning a source commit into a patch rooted under the target subdirectory.
//!
//! Git renders each side of the diff with a placeholder prefix
//! ([`SOURCE_PLACEHOLDER`], [`DESTINATION_PLACEHOLDER`]) so that structural
//! path positions can be told apart from path-like text elsewhere. The
//! [`PathRewriter`] then splices the target directory in right after each
//! placeholder, and after the `copy`/`rename` labels.

use std::cell::OnceCell;
use std::sync::LazyLock;

use regex::bytes::Regex;
use rehome_git::{CommitId, GitOps};

use crate::error::Result;

/// Prefix git puts on "before" paths.
pub const SOURCE_PLACEHOLDER: &str = "COMPARE_A/";

/// Prefix git puts on "after" paths.
pub const DESTINATION_PLACEHOLDER: &str = "COMPARE_B/";

/// `--- COMPARE_A/path` and `+++ COMPARE_B/path`, optionally quoted.
static SIDE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:---|\+\+\+) "?COMPARE_[AB]/"#).expect("valid regex")
});

/// The "before" path of `diff --git`.
static DIFF_SOURCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^diff --git "?COMPARE_A/"#).expect("valid regex"));

/// The "after" path of `diff --git`; group 1 is everything before it.
static DIFF_DESTINATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^diff --git (.+ "?)COMPARE_B/"#).expect("valid regex"));

/// `copy from`, `copy to`, `rename from`, `rename to`.
static COPY_OR_RENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:copy|rename) (?:from|to) "?"#).expect("valid regex")
});

/// A mailbox-formatted patch for one commit, paths already rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch(Vec<u8>);

impl Patch {
    /// Raw patch bytes, ready for `git am`.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Take the bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Where in a patch a line sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// Mail headers, commit message and diffstat.
    Preamble,
    /// Between `diff --git` and the first hunk.
    FileHeader,
    /// Hunks, binary data, and the trailer.
    Content,
}

/// Splices a directory prefix into every path-bearing header line.
#[derive(Debug, Clone)]
pub struct PathRewriter {
    prefix: Vec<u8>,
}

impl PathRewriter {
    /// Build a rewriter for `target`, a path relative to the repository root.
    ///
    /// Backslashes are turned into forward slashes; patches always use `/`.
    #[must_use]
    pub fn new(target: &str) -> Self {
        let target = target.replace('\\', "/");
        let target = target.trim_matches('/');
        let mut prefix = target.as_bytes().to_vec();
        if !prefix.is_empty() {
            prefix.push(b'/');
        }
        Self { prefix }
    }

    /// The prefix inserted after each placeholder, including the trailing `/`.
    #[must_use]
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Rewrite every file header in `patch`.
    ///
    /// Only lines between a `diff --git` line and the first hunk of that
    /// file are touched; the commit message and diff content pass through
    /// byte for byte.
    #[must_use]
    pub fn rewrite(&self, patch: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(patch.len() + 64 * self.prefix.len());
        let mut section = Section::Preamble;

        for line in patch.split_inclusive(|b| *b == b'\n') {
            if line.starts_with(b"diff --git ") {
                section = Section::FileHeader;
                out.extend_from_slice(&self.rewrite_diff_line(line));
                continue;
            }

            if section == Section::FileHeader
                && (line.starts_with(b"@@") || line.starts_with(b"GIT binary patch"))
            {
                section = Section::Content;
            }

            match section {
                Section::FileHeader => out.extend_from_slice(&self.rewrite_header_line(line)),
                Section::Preamble | Section::Content => out.extend_from_slice(line),
            }
        }

        out
    }

    fn rewrite_diff_line(&self, line: &[u8]) -> Vec<u8> {
        let line = match DIFF_SOURCE.find(line) {
            Some(found) => splice(line, found.end(), &self.prefix),
            None => line.to_vec(),
        };

        let Some(caps) = DIFF_DESTINATION.captures(&line) else {
            return line;
        };
        let (Some(whole), Some(before)) = (caps.get(0), caps.get(1)) else {
            return line;
        };
        // Leave the line alone when its first path already carries the
        // "after" placeholder.
        let before = before.as_bytes();
        if before.starts_with(DESTINATION_PLACEHOLDER.as_bytes())
            || before.starts_with(format!("\"{DESTINATION_PLACEHOLDER}").as_bytes())
        {
            return line;
        }

        splice(&line, whole.end(), &self.prefix)
    }

    fn rewrite_header_line(&self, line: &[u8]) -> Vec<u8> {
        SIDE_HEADER
            .find(line)
            .or_else(|| COPY_OR_RENAME.find(line))
            .map_or_else(|| line.to_vec(), |found| splice(line, found.end(), &self.prefix))
    }
}

fn splice(line: &[u8], at: usize, insert: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(line.len() + insert.len());
    out.extend_from_slice(&line[..at]);
    out.extend_from_slice(insert);
    out.extend_from_slice(&line[at..]);
    out
}

/// Produces rewritten patches for commits of the source repository.
#[derive(Debug)]
pub struct PatchSynthesizer<'a, G> {
    source: &'a G,
    rewriter: PathRewriter,
    version: OnceCell<String>,
}

impl<'a, G: GitOps> PatchSynthesizer<'a, G> {
    /// Create a synthesizer that roots every path under `target`.
    #[must_use]
    pub fn new(source: &'a G, target: &str) -> Self {
        Self {
            source,
            rewriter: PathRewriter::new(target),
            version: OnceCell::new(),
        }
    }

    /// Build the patch for `commit`.
    ///
    /// # Errors
    /// Returns error if generating the diff or reading the git version fails.
    pub async fn synthesize(&self, commit: &CommitId) -> Result<Patch> {
        let diff = self
            .source
            .commit_patch(commit, SOURCE_PLACEHOLDER, DESTINATION_PLACEHOLDER)
            .await?;
        let version = self.version().await?;

        // Same shape as the signature format-patch appends.
        let mut patch = diff;
        patch.extend_from_slice(b"\n--\n");
        patch.extend_from_slice(version.as_bytes());
        patch.push(b'\n');

        Ok(Patch(self.rewriter.rewrite(&patch)))
    }

    async fn version(&self) -> Result<String> {
        if let Some(version) = self.version.get() {
            return Ok(version.clone());
        }
        let version = self.source.version().await?;
        Ok(self.version.get_or_init(|| version).clone())
    }
}
