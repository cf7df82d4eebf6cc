use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    response::Response,
    routing::{get, post, put},
};

use laundry_auth::Operation;
use laundry_core::UserId;
use laundry_orders::{NewServiceOrder, OrderId};

use crate::app::dto::{self, ApiJson};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(place_order))
        .route("/:id", get(get_order))
        .route("/:id/assign", put(assign_order))
}

pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<dto::PlaceOrderRequest>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::PlaceOrder) {
        return denied;
    }
    let customer: UserId = match dto::parse(&body.customer_id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    let input = NewServiceOrder {
        customer,
        notes: body.notes,
        is_paid: body.is_paid,
    };
    match services.directory.place_order(input).await {
        Ok(order) => dto::created(order),
        Err(e) => services.fail(e),
    }
}

pub async fn assign_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::AssignOrderRequest>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::AssignOrder) {
        return denied;
    }
    let id: OrderId = match dto::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let employee: UserId = match dto::parse(&body.employee_id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.directory.assign_order(id, employee).await {
        Ok(order) => dto::ok(order),
        Err(e) => services.fail(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::ViewOrder) {
        return denied;
    }
    let id: OrderId = match dto::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.directory.get_order(id).await {
        Ok(order) => dto::ok(order),
        Err(e) => services.fail(e),
    }
}
