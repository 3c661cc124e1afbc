//! Configuration management for Rehome.

use std::fs;
use std::path::Path;

use rehome_git::ApplyOptions;
use serde::Deserialize;

use crate::error::Result;

/// File name of the optional config inside the destination's `.git` directory.
pub const CONFIG_FILE: &str = "rehome.toml";

/// Rehome configuration loaded from `.git/rehome.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// How patches are applied.
    #[serde(default)]
    pub apply: ApplyConfig,

    /// Whose identity replayed commits are recorded under.
    #[serde(default)]
    pub identity: IdentityConfig,
}

impl Config {
    /// Load config from a TOML file.
    ///
    /// # Errors
    /// Returns error if file can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Settings for `git am`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct ApplyConfig {
    /// Fall back to a three-way merge.
    #[serde(default = "enabled")]
    pub three_way: bool,

    /// Keep bracketed subject text other than `[PATCH]`.
    #[serde(default = "enabled")]
    pub keep_non_patch: bool,

    /// Keep original commit dates.
    #[serde(default = "enabled")]
    pub committer_date_is_author_date: bool,

    /// Skip commits whose patch is empty instead of aborting.
    #[serde(default = "enabled")]
    pub skip_empty: bool,

    /// Preserve CRLF line endings in imported files.
    #[serde(default)]
    pub keep_cr: bool,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            three_way: true,
            keep_non_patch: true,
            committer_date_is_author_date: true,
            skip_empty: true,
            keep_cr: false,
        }
    }
}

impl ApplyConfig {
    /// The `git am` flags these settings translate to.
    #[must_use]
    pub const fn options(&self) -> ApplyOptions {
        ApplyOptions {
            three_way: self.three_way,
            keep_non_patch: self.keep_non_patch,
            committer_date_is_author_date: self.committer_date_is_author_date,
            keep_cr: self.keep_cr,
        }
    }
}

const fn enabled() -> bool {
    true
}

/// Identity settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IdentityConfig {
    /// Which identity of the source commit becomes the replayed committer.
    #[serde(default)]
    pub source: IdentitySource,
}

/// Which identity recorded on a source commit to install while replaying it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentitySource {
    /// The commit's committer (`%ce` / `%cn`).
    #[default]
    Committer,
    /// The commit's author (`%ae` / `%an`).
    Author,
}
