use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    response::Response,
    routing::{get, post},
};

use laundry_auth::Operation;
use laundry_parties::{NewSupplier, SupplierId};

use crate::app::dto::{self, ApiJson};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_supplier).get(list_suppliers))
        .route("/:id", get(get_supplier))
}

pub async fn register_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<NewSupplier>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::RegisterSupplier) {
        return denied;
    }

    match services.directory.register_supplier(body).await {
        Ok(supplier) => dto::created(supplier),
        Err(e) => services.fail(e),
    }
}

pub async fn list_suppliers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::ListSuppliers) {
        return denied;
    }

    match services.directory.list_suppliers().await {
        Ok(suppliers) => dto::ok(suppliers),
        Err(e) => services.fail(e),
    }
}

pub async fn get_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = authz::authorize(&principal, Operation::ListSuppliers) {
        return denied;
    }
    let id: SupplierId = match dto::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.directory.get_supplier(id).await {
        Ok(supplier) => dto::ok(supplier),
        Err(e) => services.fail(e),
    }
}
