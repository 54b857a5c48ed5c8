//! Liveness endpoint

use crate::ServerResult;
use crate::models::StatusResponse;
use axum::Json;

/// Liveness probe reporting current server time
pub async fn status() -> ServerResult<Json<StatusResponse>> {
    let response = StatusResponse {
        ok: true,
        time: chrono::Utc::now().to_rfc3339(),
    };
    Ok(Json(response))
}
