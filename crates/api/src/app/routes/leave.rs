use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, patch, post},
};
use serde_json::json;

use laundry_auth::{Operation, Role};
use laundry_core::UserId;
use laundry_infra::WorkflowError;
use laundry_leave::LeaveRequestId;

use crate::app::dto::{self, ApiJson};
use crate::app::errors::json_error;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/apply", post(apply_leave))
        .route("/all", get(list_all_leave))
        .route("/all/:employee_id", get(list_employee_leave))
        .route("/update-status/:id", patch(decide_leave))
        .route("/:id", get(get_leave).delete(delete_leave))
}

/// Employees only see their own leave.
fn owner_scope(principal: &PrincipalContext) -> Option<UserId> {
    (principal.role() == Role::Employee).then(|| principal.user_id())
}

pub async fn apply_leave(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<dto::ApplyLeaveRequest>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::ApplyLeave) {
        return denied;
    }
    let start = match dto::parse_instant("startDate", &body.start_date) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let end = match dto::parse_instant("endDate", &body.end_date) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services
        .leave
        .apply(principal.user_id(), body.leave_type, start, end, body.reason)
        .await
    {
        Ok(leave) => dto::created(leave),
        Err(e) => services.fail(e),
    }
}

pub async fn list_all_leave(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::ListAllLeave) {
        return denied;
    }

    match services.leave.list_all().await {
        Ok(leave) => dto::ok(leave),
        Err(e) => services.fail(e),
    }
}

pub async fn list_employee_leave(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(employee_id): Path<String>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::ListEmployeeLeave) {
        return denied;
    }
    let employee: UserId = match dto::parse(&employee_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    if owner_scope(&principal).is_some_and(|own| own != employee) {
        return json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "employees may only list their own leave",
        );
    }

    match services.leave.list_for_employee(employee).await {
        Ok(leave) => dto::ok(leave),
        Err(e) => services.fail(e),
    }
}

pub async fn get_leave(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::ViewLeave) {
        return denied;
    }
    let id: LeaveRequestId = match dto::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.leave.get(id).await {
        Ok(leave) if owner_scope(&principal).is_some_and(|own| own != leave.employee()) => {
            services.fail(WorkflowError::not_found(format!("leave request {id}")))
        }
        Ok(leave) => dto::ok(leave),
        Err(e) => services.fail(e),
    }
}

pub async fn decide_leave(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::LeaveStatusRequest>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::DecideLeave) {
        return denied;
    }
    let id: LeaveRequestId = match dto::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.leave.decide(id, body.status, principal.user_id()).await {
        Ok(leave) => dto::ok(leave),
        Err(e) => services.fail(e),
    }
}

pub async fn delete_leave(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::DeleteLeave) {
        return denied;
    }
    let id: LeaveRequestId = match dto::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.leave.delete(id, owner_scope(&principal)).await {
        Ok(()) => dto::ok(json!({ "id": id.to_string() })),
        Err(e) => services.fail(e),
    }
}
