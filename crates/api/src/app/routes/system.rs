use axum::{extract::Extension, response::Response};
use serde_json::json;

use crate::app::dto;
use crate::context::PrincipalContext;

pub async fn health() -> Response {
    dto::ok(json!({ "status": "ok" }))
}

pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> Response {
    dto::ok(json!({
        "userId": principal.user_id().to_string(),
        "role": principal.role().as_str(),
    }))
}
