use axum::{Router, routing::get};

pub mod employee_requests;
pub mod inventory;
pub mod leave;
pub mod orders;
pub mod reorder;
pub mod suppliers;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/inventory", inventory::router())
        .nest("/employee-requests", employee_requests::router())
        .nest("/reorder", reorder::router())
        .nest("/suppliers", suppliers::router())
        .nest("/orders", orders::router())
        .nest("/leave", leave::router())
}
