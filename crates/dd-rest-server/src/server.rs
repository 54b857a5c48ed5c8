// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Main server implementation

use crate::auth::{AuthConfig, auth_middleware};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};
use dd_repo::{DeployRepo, RepoConfig};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// REST API server
pub struct Server {
    config: ServerConfig,
    app: Router,
    state: AppState,
}

impl Server {
    /// Create a new server instance owning a fresh repository handle
    pub fn new(config: ServerConfig, repo_config: RepoConfig) -> Self {
        let state = AppState::new(config.clone(), DeployRepo::new(repo_config));
        Self::with_state(config, state)
    }

    /// Construct a server from an already-built app state (used for tests)
    pub fn with_state(config: ServerConfig, state: AppState) -> Self {
        let app = Self::build_app(state.clone(), &config);
        Self { config, app, state }
    }

    /// Build the Axum application with routes and middleware
    pub fn build_app(state: AppState, config: &ServerConfig) -> Router {
        let auth_config = AuthConfig {
            api_key: config.api_key.clone(),
        };

        let middleware_stack = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(config.max_body_bytes))
            .layer(from_fn(move |req, next| {
                let auth_config = auth_config.clone();
                auth_middleware(auth_config, req, next)
            }));

        Router::new()
            .route("/api/deploy", post(handlers::deploy::deploy))
            .route("/api/status", get(handlers::status::status))
            .with_state(state)
            .layer(middleware_stack)
    }

    /// Run the server
    pub async fn run(self) -> ServerResult<()> {
        if self.config.warm_start {
            // Reconcile once at startup; failure is tolerated because
            // every deploy re-runs the reconciliation
            match self.state.repo.warm_up().await {
                Ok(()) => info!("working copy ready"),
                Err(err) => warn!(
                    error = %err,
                    "startup reconciliation failed; will retry on first deploy"
                ),
            }
        }

        let addr = self.config.bind_addr;
        info!("Starting server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.app)
            .await
            .map_err(|err| ServerError::Internal(format!("REST server error: {err}")))?;

        Ok(())
    }

    /// Get the bind address
    pub fn addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
