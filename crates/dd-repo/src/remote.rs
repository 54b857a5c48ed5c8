// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Remote target and credential handling
//!
//! The push credential lives inside [`RemoteTarget`] and is formatted into
//! a URL only at the `git remote add` seam. Everything user-visible (Debug
//! output, error messages, logs) goes through [`RemoteTarget::display_url`]
//! or [`RemoteTarget::scrub`] so the token never leaks.

use std::fmt;

const REDACTED: &str = "[REDACTED]";

/// Where deploys are pushed.
#[derive(Clone)]
pub enum RemoteTarget {
    /// GitHub repository in `owner/name` form, pushed over HTTPS with an
    /// access token embedded in the remote URL.
    GitHub { repo: String, token: String },
    /// Pre-built remote URL used verbatim (self-hosted remotes, local
    /// path remotes in tests). Assumed to carry no secret.
    Url(String),
}

impl RemoteTarget {
    pub fn github(repo: impl Into<String>, token: impl Into<String>) -> Self {
        Self::GitHub {
            repo: repo.into(),
            token: token.into(),
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    /// The URL registered with git, credential included. Not `pub`: only
    /// the working-copy bootstrap may format this.
    pub(crate) fn authenticated_url(&self) -> String {
        match self {
            Self::GitHub { repo, token } => format!("https://{token}@github.com/{repo}.git"),
            Self::Url(url) => url.clone(),
        }
    }

    /// Credential-free form, safe for logs and error messages.
    pub fn display_url(&self) -> String {
        match self {
            Self::GitHub { repo, .. } => format!("https://github.com/{repo}.git"),
            Self::Url(url) => url.clone(),
        }
    }

    /// Remove the credential from arbitrary text (git stderr quotes the
    /// remote URL on fetch/push failures).
    pub fn scrub(&self, text: &str) -> String {
        match self {
            Self::GitHub { token, .. } if !token.is_empty() => text.replace(token, REDACTED),
            _ => text.to_string(),
        }
    }
}

impl fmt::Debug for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GitHub { repo, .. } => f
                .debug_struct("GitHub")
                .field("repo", repo)
                .field("token", &REDACTED)
                .finish(),
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authenticated_url_embeds_token() {
        let target = RemoteTarget::github("acme/site", "ghp_secret123");
        assert_eq!(
            target.authenticated_url(),
            "https://ghp_secret123@github.com/acme/site.git"
        );
    }

    #[test]
    fn display_url_omits_token() {
        let target = RemoteTarget::github("acme/site", "ghp_secret123");
        assert_eq!(target.display_url(), "https://github.com/acme/site.git");
    }

    #[test]
    fn scrub_removes_token_from_stderr() {
        let target = RemoteTarget::github("acme/site", "ghp_secret123");
        let stderr = "fatal: unable to access 'https://ghp_secret123@github.com/acme/site.git/'";
        let scrubbed = target.scrub(stderr);
        assert!(!scrubbed.contains("ghp_secret123"));
        assert!(scrubbed.contains("[REDACTED]"));
    }

    #[test]
    fn scrub_is_identity_for_plain_urls() {
        let target = RemoteTarget::url("/tmp/remote.git");
        assert_eq!(target.scrub("some error"), "some error");
    }

    #[test]
    fn debug_never_prints_token() {
        let target = RemoteTarget::github("acme/site", "ghp_secret123");
        let rendered = format!("{:?}", target);
        assert!(!rendered.contains("ghp_secret123"));
        assert!(rendered.contains("acme/site"));
    }
}
