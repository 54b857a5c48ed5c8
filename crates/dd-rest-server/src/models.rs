// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Request and response models

use crate::error::ServerError;
use dd_repo::FileEntry;
use serde::Serialize;
use serde_json::Value;

/// Successful deploy response
#[derive(Debug, Serialize)]
pub struct DeployResponse {
    pub ok: bool,
    pub message: String,
}

/// Liveness response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub ok: bool,
    pub time: String,
}

/// Extract the file batch from a deploy request body.
///
/// The body must be a JSON object whose `files` field is an array of
/// `{path, content}` entries; anything else is a client error, raised
/// before any side effect.
pub fn parse_deploy_request(body: &Value) -> Result<Vec<FileEntry>, ServerError> {
    let files = body
        .get("files")
        .ok_or_else(|| ServerError::BadRequest("`files` field must be an array".to_string()))?;

    if !files.is_array() {
        return Err(ServerError::BadRequest(
            "`files` field must be an array".to_string(),
        ));
    }

    serde_json::from_value(files.clone())
        .map_err(|err| ServerError::BadRequest(format!("invalid `files` entry: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_valid_batch() {
        let body = json!({
            "files": [
                {"path": "index.html", "content": "<html/>"},
                {"path": "a/b.txt", "content": ""},
            ]
        });
        let entries = parse_deploy_request(&body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "index.html");
        assert_eq!(entries[1].content, "");
    }

    #[test]
    fn accepts_an_empty_batch() {
        let body = json!({ "files": [] });
        assert!(parse_deploy_request(&body).unwrap().is_empty());
    }

    #[test]
    fn rejects_missing_files_field() {
        let body = json!({ "other": 1 });
        let err = parse_deploy_request(&body).unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }

    #[test]
    fn rejects_non_array_files() {
        for body in [
            json!({ "files": "not-a-list" }),
            json!({ "files": {"path": "x"} }),
            json!({ "files": null }),
            json!({ "files": 42 }),
        ] {
            let err = parse_deploy_request(&body).unwrap_err();
            assert!(matches!(err, ServerError::BadRequest(_)), "body: {body}");
        }
    }

    #[test]
    fn rejects_malformed_entries() {
        let body = json!({ "files": [{"path": 7, "content": "x"}] });
        let err = parse_deploy_request(&body).unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }
}
