use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    response::Response,
    routing::{get, post},
};
use serde_json::json;

use laundry_auth::Operation;
use laundry_inventory::{InventoryItemId, NewInventoryItem};

use crate::app::dto::{self, ApiJson};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/alerts", get(stock_alerts))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
        .route("/:id/adjust", post(adjust_stock))
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::ListInventory) {
        return denied;
    }

    match services.ledger.list_items().await {
        Ok(items) => dto::ok(items),
        Err(e) => services.fail(e),
    }
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<dto::CreateItemRequest>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::CreateItem) {
        return denied;
    }

    let input = match new_item(body) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.ledger.create_item(input).await {
        Ok(item) => dto::created(item),
        Err(e) => services.fail(e),
    }
}

fn new_item(body: dto::CreateItemRequest) -> Result<NewInventoryItem, Response> {
    Ok(NewInventoryItem {
        name: body.name,
        category: dto::parse(&body.category)?,
        current_stock: body.current_stock,
        reorder_level: body.reorder_level,
        unit: dto::parse(&body.unit)?,
        supplier: body.supplier.as_deref().map(dto::parse).transpose()?,
    })
}

pub async fn stock_alerts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::ViewStockAlerts) {
        return denied;
    }

    dto::ok(services.alerts.recent())
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::ListInventory) {
        return denied;
    }
    let id: InventoryItemId = match dto::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.ledger.get_item(id).await {
        Ok(item) => dto::ok(item),
        Err(e) => services.fail(e),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::UpdateItemRequest>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::UpdateItem) {
        return denied;
    }
    let id: InventoryItemId = match dto::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let update = match body.into_update() {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.ledger.update_item(id, update).await {
        Ok(item) => dto::ok(item),
        Err(e) => services.fail(e),
    }
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::AdjustStockRequest>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::AdjustStock) {
        return denied;
    }
    let id: InventoryItemId = match dto::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.ledger.adjust_stock(id, body.delta).await {
        Ok(item) => dto::ok(item),
        Err(e) => services.fail(e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::DeleteItem) {
        return denied;
    }
    let id: InventoryItemId = match dto::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.ledger.delete_item(id).await {
        Ok(()) => dto::ok(json!({ "id": id.to_string() })),
        Err(e) => services.fail(e),
    }
}
