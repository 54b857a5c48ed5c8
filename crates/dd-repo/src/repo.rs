// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Deploy working-copy reconciliation and publishing
//!
//! [`WorkingCopy`] implements the three pipeline stages: `ensure_ready`
//! (reconcile local state against the remote), `materialize` (write a
//! file batch) and `publish` (stage, commit, push). [`DeployRepo`] wraps
//! a working copy in an async mutex so concurrent deploy requests can
//! never interleave git state.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::{fs, time};
use tracing::{debug, info};

use crate::error::{RepoError, RepoResult};
use crate::remote::RemoteTarget;

/// A unit of deployable content: a path relative to the working-copy
/// root and the file body to write there verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub content: String,
}

/// Configuration for the deploy working copy. Built once at startup and
/// handed to [`DeployRepo::new`]; core logic reads no environment.
#[derive(Debug, Clone)]
pub struct RepoConfig {
    /// Absolute path of the local working copy
    pub root: PathBuf,

    /// Remote name registered during bootstrap
    pub remote_name: String,

    /// Branch deploys are committed to and pushed
    pub branch: String,

    /// Where pushes go, credential included
    pub target: RemoteTarget,

    /// Fixed label prefixed to every commit message
    pub commit_label: String,

    /// Commit author identity, set as local repo config during bootstrap
    pub author_name: String,
    pub author_email: String,

    /// Upper bound on network-bound git operations (fetch, push)
    pub network_timeout: Duration,
}

impl RepoConfig {
    pub fn new(root: impl Into<PathBuf>, target: RemoteTarget) -> Self {
        Self {
            root: root.into(),
            remote_name: "origin".to_string(),
            branch: "main".to_string(),
            target,
            commit_label: "AI auto-update".to_string(),
            author_name: "drydock".to_string(),
            author_email: "deploy@drydock.invalid".to_string(),
            network_timeout: Duration::from_secs(60),
        }
    }
}

/// A published deploy commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub sha: String,
    pub message: String,
}

/// Result of a publish cycle. A clean working copy after staging is a
/// distinct, non-fatal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Committed(CommitInfo),
    NoChanges,
}

/// The local working copy mirroring the target remote repository.
///
/// Not safe for concurrent mutation; wrap it in [`DeployRepo`] for
/// anything request-driven.
pub struct WorkingCopy {
    config: RepoConfig,
    initialized: bool,
}

impl WorkingCopy {
    pub fn new(config: RepoConfig) -> Self {
        Self {
            config,
            initialized: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Reconcile the working copy so it is a valid clone of the target
    /// remote on the configured branch.
    ///
    /// Fast path: once a valid working tree has been observed, later
    /// calls return immediately (no re-fetch, no branch re-validation).
    /// Otherwise the directory is bootstrapped: init, remote
    /// registration, fetch, and either a hard reset onto the remote
    /// branch or, when the remote branch does not exist yet, an unborn
    /// local branch that the first publish will create.
    pub async fn ensure_ready(&mut self) -> RepoResult<()> {
        if self.initialized {
            return Ok(());
        }

        fs::create_dir_all(&self.config.root).await?;

        if self.is_valid_working_tree().await {
            debug!(
                root = %self.config.root.display(),
                "reusing existing working copy"
            );
            self.initialized = true;
            return Ok(());
        }

        self.bootstrap().await?;
        self.initialized = true;
        Ok(())
    }

    /// Structural check: the directory must itself be the top level of a
    /// git work tree. Presence of files is not enough, and a parent
    /// repository must not make a bare subdirectory look initialized.
    async fn is_valid_working_tree(&self) -> bool {
        let toplevel = match self.run_git(&["rev-parse", "--show-toplevel"]).await {
            Ok(out) => out,
            Err(_) => return false,
        };
        let reported = match fs::canonicalize(Path::new(&toplevel)).await {
            Ok(path) => path,
            Err(_) => return false,
        };
        match fs::canonicalize(&self.config.root).await {
            Ok(root) => root == reported,
            Err(_) => false,
        }
    }

    async fn bootstrap(&self) -> RepoResult<()> {
        info!(
            root = %self.config.root.display(),
            remote = %self.config.target.display_url(),
            branch = %self.config.branch,
            "bootstrapping working copy"
        );

        self.run_git(&["init", "-b", &self.config.branch]).await?;
        let url = self.config.target.authenticated_url();
        self.run_git(&["remote", "add", &self.config.remote_name, &url]).await?;
        self.run_git(&["config", "user.name", &self.config.author_name]).await?;
        self.run_git(&["config", "user.email", &self.config.author_email]).await?;

        self.run_git_network("fetch", &["fetch", &self.config.remote_name]).await?;

        let remote_ref = format!("{}/{}", self.config.remote_name, self.config.branch);
        let remote_branch_exists = self
            .run_git(&[
                "rev-parse",
                "--verify",
                "--quiet",
                &format!("refs/remotes/{remote_ref}"),
            ])
            .await
            .is_ok();

        if remote_branch_exists {
            self.run_git(&["reset", "--hard", &remote_ref]).await?;
            self.run_git(&["branch", "--set-upstream-to", &remote_ref, &self.config.branch])
                .await?;
            info!(branch = %self.config.branch, "checked out remote branch");
        } else {
            // Brand-new remote: stay on the unborn local branch and let
            // the first publish create the initial commit.
            info!(branch = %self.config.branch, "remote branch absent, starting fresh");
        }

        Ok(())
    }

    /// Write a batch of file entries into the working copy, in input
    /// order, creating intermediate directories as needed and
    /// overwriting existing files.
    ///
    /// Fails fast on the first write error; entries already written stay
    /// on disk (at-least-once overwrite semantics). Duplicate paths in
    /// one batch are last-write-wins.
    pub async fn materialize(&self, entries: &[FileEntry]) -> RepoResult<()> {
        for entry in entries {
            let target = resolve_entry_path(&self.config.root, &entry.path)?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&target, entry.content.as_bytes()).await?;
            debug!(path = %entry.path, bytes = entry.content.len(), "materialized file");
        }
        Ok(())
    }

    /// Stage the entire tree, commit with a timestamped message, and
    /// push to the configured remote branch.
    ///
    /// An empty diff after staging short-circuits to
    /// [`PublishOutcome::NoChanges`] without committing. Push failures
    /// are terminal: no retry, no rebase, no force-push.
    pub async fn publish(&self) -> RepoResult<PublishOutcome> {
        self.run_git(&["add", "-A"]).await?;

        let status = self.run_git(&["status", "--porcelain"]).await?;
        if status.is_empty() {
            info!("working copy clean, nothing to commit");
            return Ok(PublishOutcome::NoChanges);
        }

        let message = format!(
            "{}: {}",
            self.config.commit_label,
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        self.run_git(&["commit", "-m", &message]).await?;
        let sha = self.run_git(&["rev-parse", "HEAD"]).await?;

        self.run_git_network(
            "push",
            &["push", "-u", &self.config.remote_name, &self.config.branch],
        )
        .await?;

        info!(commit = %sha, branch = %self.config.branch, "published deploy commit");
        Ok(PublishOutcome::Committed(CommitInfo { sha, message }))
    }

    async fn run_git(&self, args: &[&str]) -> RepoResult<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.config.root)
            .output()
            .await
            .map_err(|e| RepoError::GitUnavailable(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RepoError::Git {
                op: args.first().copied().unwrap_or("git").to_string(),
                detail: self.config.target.scrub(stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Network-bound git operations run under the configured timeout; a
    /// hung remote maps to [`RepoError::NetworkTimeout`] instead of
    /// hanging the request forever.
    async fn run_git_network(&self, op: &str, args: &[&str]) -> RepoResult<String> {
        let seconds = self.config.network_timeout.as_secs();
        match time::timeout(self.config.network_timeout, self.run_git(args)).await {
            Ok(result) => result,
            Err(_) => Err(RepoError::NetworkTimeout {
                op: op.to_string(),
                seconds,
            }),
        }
    }
}

/// The process-wide deploy boundary: one logical repository handle,
/// all mutating operations serialized by an internal async mutex.
///
/// `ensure_ready`, `materialize` and `publish` are only reachable
/// through [`DeployRepo::deploy`] (or the startup warm-up), so
/// concurrent requests queue instead of interleaving `add`/`commit`/
/// `push` sequences.
pub struct DeployRepo {
    inner: Mutex<WorkingCopy>,
}

impl DeployRepo {
    pub fn new(config: RepoConfig) -> Self {
        Self {
            inner: Mutex::new(WorkingCopy::new(config)),
        }
    }

    /// Startup reconciliation. Callers may treat failure as non-fatal;
    /// every deploy re-runs the reconciliation anyway.
    pub async fn warm_up(&self) -> RepoResult<()> {
        let mut copy = self.inner.lock().await;
        copy.ensure_ready().await
    }

    /// Run a full deploy cycle: reconcile, write the batch, publish.
    /// Holds the repository lock for the whole cycle.
    pub async fn deploy(&self, entries: &[FileEntry]) -> RepoResult<PublishOutcome> {
        let mut copy = self.inner.lock().await;
        copy.ensure_ready().await?;
        copy.materialize(entries).await?;
        copy.publish().await
    }
}

/// Resolve an entry's relative path against the working-copy root.
///
/// Rejects absolute paths, parent-directory traversal, and writes into
/// the repository's own `.git` directory.
fn resolve_entry_path(root: &Path, relative: &str) -> RepoResult<PathBuf> {
    let candidate = Path::new(relative);
    if relative.is_empty() || candidate.is_absolute() {
        return Err(RepoError::PathTraversal(relative.to_string()));
    }

    let mut clean = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => return Err(RepoError::PathTraversal(relative.to_string())),
        }
    }

    match clean.components().next() {
        Some(Component::Normal(first)) if first == std::ffi::OsStr::new(".git") => {
            Err(RepoError::PathTraversal(relative.to_string()))
        }
        Some(_) => Ok(root.join(clean)),
        None => Err(RepoError::PathTraversal(relative.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_path_joins_inside_root() {
        let root = Path::new("/work/repo");
        let resolved = resolve_entry_path(root, "pages/index.html").unwrap();
        assert_eq!(resolved, root.join("pages/index.html"));
    }

    #[test]
    fn entry_path_allows_curdir_components() {
        let root = Path::new("/work/repo");
        let resolved = resolve_entry_path(root, "./assets/app.js").unwrap();
        assert_eq!(resolved, root.join("assets/app.js"));
    }

    #[test]
    fn entry_path_rejects_parent_traversal() {
        let root = Path::new("/work/repo");
        for path in ["../escape.txt", "a/../../escape.txt", "a/b/../../../c"] {
            let result = resolve_entry_path(root, path);
            assert!(
                matches!(result, Err(RepoError::PathTraversal(_))),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn entry_path_rejects_absolute_paths() {
        let root = Path::new("/work/repo");
        let result = resolve_entry_path(root, "/etc/passwd");
        assert!(matches!(result, Err(RepoError::PathTraversal(_))));
    }

    #[test]
    fn entry_path_rejects_git_dir_writes() {
        let root = Path::new("/work/repo");
        for path in [".git/config", ".git/hooks/post-checkout"] {
            let result = resolve_entry_path(root, path);
            assert!(
                matches!(result, Err(RepoError::PathTraversal(_))),
                "{path} should be rejected"
            );
        }
        // A file merely named with a .git suffix is fine
        assert!(resolve_entry_path(root, "docs/.gitignore").is_ok());
    }

    #[test]
    fn entry_path_rejects_empty_path() {
        let root = Path::new("/work/repo");
        assert!(matches!(
            resolve_entry_path(root, ""),
            Err(RepoError::PathTraversal(_))
        ));
        assert!(matches!(
            resolve_entry_path(root, "."),
            Err(RepoError::PathTraversal(_))
        ));
    }

    #[test]
    fn repo_config_defaults() {
        let config = RepoConfig::new("/tmp/repo", RemoteTarget::url("/tmp/remote.git"));
        assert_eq!(config.remote_name, "origin");
        assert_eq!(config.branch, "main");
        assert_eq!(config.commit_label, "AI auto-update");
        assert_eq!(config.network_timeout, Duration::from_secs(60));
    }
}
