//! Reading commit identities and swapping the destination's configured one.
//!
//! `git am` records the committer from `user.email` / `user.name`, so each
//! replayed commit temporarily installs the identity of its source commit.

use rehome_git::{CommitId, GitOps};

use crate::config::IdentitySource;
use crate::error::{Error, Result};

const EMAIL_KEY: &str = "user.email";
const NAME_KEY: &str = "user.name";

/// An email and display name pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Email address, verbatim from the source commit.
    pub email: String,
    /// Display name, verbatim from the source commit.
    pub name: String,
}

/// The destination's repository-local identity as it was before the import.
///
/// Either key may be unset, in which case restoring unsets it again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfiguredIdentity {
    /// `user.email`, if set locally.
    pub email: Option<String>,
    /// `user.name`, if set locally.
    pub name: Option<String>,
}

/// Read the identity recorded on `commit`.
///
/// # Errors
/// Returns error if git fails or prints something other than two fields.
pub async fn identity_of<G: GitOps>(
    source: &G,
    commit: &CommitId,
    which: IdentitySource,
) -> Result<Identity> {
    // NUL cannot occur inside either field.
    let format = match which {
        IdentitySource::Committer => "%ce%x00%cn",
        IdentitySource::Author => "%ae%x00%an",
    };
    let output = source.show(commit, format).await?;

    let Some((email, name)) = output.split_once('\0') else {
        return Err(Error::MalformedIdentity {
            commit: commit.clone(),
            output,
        });
    };

    Ok(Identity {
        email: email.to_string(),
        name: name.to_string(),
    })
}

/// Make `identity` the destination's committer.
///
/// # Errors
/// Returns error if writing either key fails.
pub async fn install<G: GitOps>(destination: &G, identity: &Identity) -> Result<()> {
    tracing::debug!(email = %identity.email, name = %identity.name, "installing identity");
    destination.config_set(EMAIL_KEY, &identity.email).await?;
    destination.config_set(NAME_KEY, &identity.name).await?;
    Ok(())
}

/// Snapshot the destination's local identity.
///
/// # Errors
/// Returns error if the config cannot be read.
pub async fn capture<G: GitOps>(destination: &G) -> Result<ConfiguredIdentity> {
    Ok(ConfiguredIdentity {
        email: destination.config_get(EMAIL_KEY).await?,
        name: destination.config_get(NAME_KEY).await?,
    })
}

/// Put a captured identity back exactly as it was.
///
/// # Errors
/// Returns error if writing either key fails.
pub async fn restore<G: GitOps>(destination: &G, original: &ConfiguredIdentity) -> Result<()> {
    restore_key(destination, EMAIL_KEY, original.email.as_deref()).await?;
    restore_key(destination, NAME_KEY, original.name.as_deref()).await
}

async fn restore_key<G: GitOps>(destination: &G, key: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(value) => destination.config_set(key, value).await?,
        None => destination.config_unset(key).await?,
    }
    Ok(())
}
