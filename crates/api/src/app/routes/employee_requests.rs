use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    response::Response,
    routing::{get, post, put},
};
use serde::Serialize;

use laundry_auth::Operation;
use laundry_core::UserId;
use laundry_inventory::InventoryItem;
use laundry_requests::{EmployeeRequest, EmployeeRequestId, RequestLine};

use crate::app::dto::{self, ApiJson};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/create", post(create_request))
        .route("/employee/:id", get(list_for_employee))
        .route("/pending", get(list_pending))
        .route("/all", get(list_approved))
        .route("/:id", get(get_request))
        .route("/:id/approve", put(approve_request))
        .route("/:id/reject", put(reject_request))
        .route("/:id/fulfill", put(fulfill_request))
}

/// A request with the current state of the items it names.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestDetail {
    #[serde(flatten)]
    request: EmployeeRequest,
    item_details: Vec<InventoryItem>,
}

pub async fn create_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<dto::CreateEmployeeRequestBody>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::CreateEmployeeRequest) {
        return denied;
    }

    let order = match dto::parse(&body.order_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let mut lines = Vec::with_capacity(body.items.len());
    for line in body.items {
        match dto::parse(&line.inventory_item) {
            Ok(inventory_item) => lines.push(RequestLine {
                inventory_item,
                quantity: line.quantity,
            }),
            Err(res) => return res,
        }
    }

    match services.requests.create(principal.user_id(), order, lines).await {
        Ok(request) => dto::created(request),
        Err(e) => services.fail(e),
    }
}

/// `:id` is an employee's user id, or `all` for every employee.
pub async fn list_for_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::ListOwnRequests) {
        return denied;
    }

    let employee = if id == "all" {
        None
    } else {
        match dto::parse::<UserId>(&id) {
            Ok(v) => Some(v),
            Err(res) => return res,
        }
    };

    match services.requests.list_for_employee(employee).await {
        Ok(requests) => dto::ok(requests),
        Err(e) => services.fail(e),
    }
}

pub async fn list_pending(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::ListPendingRequests) {
        return denied;
    }

    match services.requests.list_pending().await {
        Ok(requests) => dto::ok(requests),
        Err(e) => services.fail(e),
    }
}

pub async fn list_approved(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::ListApprovedRequests) {
        return denied;
    }

    match services.requests.list_approved_or_fulfilled().await {
        Ok(requests) => dto::ok(requests),
        Err(e) => services.fail(e),
    }
}

pub async fn get_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::ViewRequest) {
        return denied;
    }
    let id: EmployeeRequestId = match dto::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    let request = match services.requests.get(id).await {
        Ok(r) => r,
        Err(e) => return services.fail(e),
    };
    match services.requests.items_of(&request).await {
        Ok(item_details) => dto::ok(RequestDetail {
            request,
            item_details,
        }),
        Err(e) => services.fail(e),
    }
}

pub async fn approve_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Option<ApiJson<dto::DecisionNotes>>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::ApproveRequest) {
        return denied;
    }
    let id: EmployeeRequestId = match dto::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let notes = body.and_then(|ApiJson(b)| b.notes);

    match services.requests.approve(id, principal.user_id(), notes).await {
        Ok(request) => dto::ok(request),
        Err(e) => services.fail(e),
    }
}

pub async fn reject_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Option<ApiJson<dto::DecisionNotes>>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::RejectRequest) {
        return denied;
    }
    let id: EmployeeRequestId = match dto::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let notes = body.and_then(|ApiJson(b)| b.notes);

    match services.requests.reject(id, principal.user_id(), notes).await {
        Ok(request) => dto::ok(request),
        Err(e) => services.fail(e),
    }
}

pub async fn fulfill_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::FulfillRequest) {
        return denied;
    }
    let id: EmployeeRequestId = match dto::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.requests.fulfill(id, principal.user_id()).await {
        Ok(request) => dto::ok(request),
        Err(e) => services.fail(e),
    }
}
