use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use laundry_infra::WorkflowError;

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "success": false,
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Map a ledger/workflow failure to its HTTP response.
///
/// Internal failures are always logged; their text reaches the caller only
/// when `expose_internal` is set.
pub fn workflow_error_to_response(err: WorkflowError, expose_internal: bool) -> Response {
    match err {
        WorkflowError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        WorkflowError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        WorkflowError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        WorkflowError::InvalidState(msg) => json_error(StatusCode::CONFLICT, "invalid_state", msg),
        // Only reachable if a caller bypasses `with_retry`.
        WorkflowError::Concurrency(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        WorkflowError::Internal(msg) => {
            error!(error = %msg, "internal error while handling request");
            let message = if expose_internal {
                msg
            } else {
                "internal server error".to_string()
            };
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_statuses() {
        let cases = [
            (WorkflowError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (WorkflowError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (WorkflowError::Conflict("x".into()), StatusCode::CONFLICT),
            (WorkflowError::InvalidState("x".into()), StatusCode::CONFLICT),
            (WorkflowError::Concurrency("x".into()), StatusCode::CONFLICT),
            (WorkflowError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(workflow_error_to_response(err, false).status(), status);
        }
    }
}
