//! Authentication

use crate::error::ServerError;
use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Header carrying the shared deploy secret
pub const API_KEY_HEADER: &str = "x-api-key";

/// Authentication configuration
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub api_key: Option<String>,
}

impl AuthConfig {
    /// Create auth config from API key
    pub fn with_api_key(api_key: String) -> Self {
        Self {
            api_key: Some(api_key),
        }
    }

    /// Validate API key authentication
    pub fn validate_api_key(&self, provided_key: &str) -> Result<(), ServerError> {
        match &self.api_key {
            Some(expected_key) if expected_key == provided_key => Ok(()),
            Some(_) => Err(ServerError::Forbidden("Forbidden".to_string())),
            None => Err(ServerError::Forbidden(
                "API key authentication not configured".to_string(),
            )),
        }
    }
}

/// Authentication middleware
///
/// Rejects with 403 before the request reaches any handler, so an
/// unauthenticated call never touches the filesystem or git layer.
pub async fn auth_middleware(
    auth_config: AuthConfig,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // The liveness probe stays open
    if req.uri().path() == "/api/status" {
        return Ok(next.run(req).await);
    }

    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    let auth_result = match provided {
        Some(key) => auth_config.validate_api_key(key),
        None => Err(ServerError::Forbidden("Forbidden".to_string())),
    };

    match auth_result {
        Ok(()) => Ok(next.run(req).await),
        Err(err) => Ok(err.into_response()),
    }
}
