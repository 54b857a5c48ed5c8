// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Working-copy management crate for drydock.
//!
//! This crate owns the local git working copy that mirrors the target
//! remote repository: reconciling its state before every deploy, writing
//! incoming file batches into it, and publishing the result as a pushed
//! commit. All mutating access is serialized through [`DeployRepo`].

pub mod error;
pub mod remote;
pub mod repo;

pub use error::{RepoError, RepoResult};
pub use remote::RemoteTarget;
pub use repo::{CommitInfo, DeployRepo, FileEntry, PublishOutcome, RepoConfig, WorkingCopy};
