//! Server state management

use crate::config::ServerConfig;
use dd_repo::DeployRepo;
use std::sync::Arc;

/// Shared server state
#[derive(Clone)]
pub struct AppState {
    /// The single process-wide repository handle; all mutation is
    /// serialized inside it
    pub repo: Arc<DeployRepo>,

    /// Server configuration
    pub config: ServerConfig,
}

impl AppState {
    /// Create new app state
    pub fn new(config: ServerConfig, repo: DeployRepo) -> Self {
        Self {
            repo: Arc::new(repo),
            config,
        }
    }

    /// Get configuration reference
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
