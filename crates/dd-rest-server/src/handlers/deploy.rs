//! Deploy endpoint

use crate::ServerResult;
use crate::error::ServerError;
use crate::models::{DeployResponse, parse_deploy_request};
use crate::state::AppState;
use axum::{Json, extract::State};
use dd_repo::PublishOutcome;
use serde_json::Value;
use tracing::info;

/// Accept a batch of files and publish them as a commit pushed to the
/// target branch
pub async fn deploy(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> ServerResult<Json<DeployResponse>> {
    let Some(Json(body)) = body else {
        return Err(ServerError::BadRequest(
            "request body must be a JSON object".to_string(),
        ));
    };
    let entries = parse_deploy_request(&body)?;
    info!(files = entries.len(), "deploy request accepted");

    let outcome = state.repo.deploy(&entries).await?;

    let message = match outcome {
        PublishOutcome::Committed(commit) => {
            format!("deployed {} file(s) as commit {}", entries.len(), commit.sha)
        }
        PublishOutcome::NoChanges => {
            "nothing to commit, working copy already matches the batch".to_string()
        }
    };
    Ok(Json(DeployResponse { ok: true, message }))
}
