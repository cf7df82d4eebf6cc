use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    response::Response,
    routing::{get, put},
};

use laundry_auth::Operation;
use laundry_parties::SupplierId;
use laundry_reorder::{NewReorder, SupplierOrderId};

use crate::app::dto::{self, ApiJson};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/requests", get(list_reorders).post(create_reorder))
        .route("/requests/all/:supplier_id", get(list_by_supplier))
        .route("/requests/:id/status", put(decide_reorder))
        .route("/requests/:id/fulfill", put(fulfill_reorder))
}

pub async fn create_reorder(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<dto::CreateReorderRequest>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::CreateReorder) {
        return denied;
    }

    let supplier: SupplierId = match dto::parse(&body.supplier_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let items = match body
        .items
        .into_iter()
        .map(dto::ReorderLineBody::into_line)
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(v) => v,
        Err(res) => return res,
    };

    let input = NewReorder {
        supplier,
        items,
        requested_by: principal.user_id(),
        expected_delivery_date: body.expected_delivery_date,
        notes: body.notes,
    };

    match services.reorders.create(input).await {
        Ok(order) => dto::created(order),
        Err(e) => services.fail(e),
    }
}

pub async fn list_reorders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::ListReorders) {
        return denied;
    }

    match services.reorders.list().await {
        Ok(orders) => dto::ok(orders),
        Err(e) => services.fail(e),
    }
}

pub async fn list_by_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(supplier_id): Path<String>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::ListSupplierReorders) {
        return denied;
    }
    let supplier: SupplierId = match dto::parse(&supplier_id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.reorders.list_by_supplier(supplier).await {
        Ok(orders) => dto::ok(orders),
        Err(e) => services.fail(e),
    }
}

pub async fn decide_reorder(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::ReorderStatusRequest>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::DecideReorder) {
        return denied;
    }
    let id: SupplierOrderId = match dto::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.reorders.decide(id, body.status).await {
        Ok(order) => dto::ok(order),
        Err(e) => services.fail(e),
    }
}

pub async fn fulfill_reorder(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::FulfillReorder) {
        return denied;
    }
    let id: SupplierOrderId = match dto::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.reorders.fulfill(id).await {
        Ok(fulfillment) => dto::ok(fulfillment),
        Err(e) => services.fail(e),
    }
}
