// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for working-copy operations

/// Result type for working-copy operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors surfaced by the working-copy layer.
///
/// Git stderr embedded in [`RepoError::Git`] is scrubbed of the remote
/// credential before the error is constructed.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("failed to run git: {0}")]
    GitUnavailable(String),

    #[error("git {op} failed: {detail}")]
    Git { op: String, detail: String },

    #[error("git {op} timed out after {seconds}s")]
    NetworkTimeout { op: String, seconds: u64 },

    #[error("path escapes the working copy: {0}")]
    PathTraversal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
