//! Small value types shared by the git verbs.

use std::fmt;

/// An abbreviated commit hash as printed by `git log --format=%h`.
///
/// Opaque to rehome: it is only ever handed back to git.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitId(String);

impl CommitId {
    /// Wrap a hash string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The hash as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CommitId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Flags passed to `git am` when replaying a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ApplyOptions {
    /// Fall back to a three-way merge (`-3`).
    pub three_way: bool,
    /// Keep bracketed subject content that is not `[PATCH]` (`--keep-non-patch`).
    pub keep_non_patch: bool,
    /// Record the author date as committer date (`--committer-date-is-author-date`).
    pub committer_date_is_author_date: bool,
    /// Keep carriage returns at line ends (`--keep-cr`). Without it, CRLF
    /// content arrives with LF endings.
    pub keep_cr: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            three_way: true,
            keep_non_patch: true,
            committer_date_is_author_date: true,
            keep_cr: false,
        }
    }
}

impl ApplyOptions {
    /// Render as `git am` arguments.
    #[must_use]
    pub fn to_args(&self) -> Vec<&'static str> {
        let mut args = Vec::with_capacity(4);
        if self.three_way {
            args.push("-3");
        }
        if self.keep_non_patch {
            args.push("--keep-non-patch");
        }
        if self.committer_date_is_author_date {
            args.push("--committer-date-is-author-date");
        }
        if self.keep_cr {
            args.push("--keep-cr");
        }
        args
    }
}
