// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! drydock deploy-receiver REST server
//!
//! This crate implements the HTTP boundary of the deploy-receiver: an
//! authenticated endpoint that accepts file batches from upstream
//! automation and publishes them to a remote git branch through the
//! working-copy layer in `dd-repo`, plus a liveness probe.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::Server;
