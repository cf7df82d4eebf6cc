//! Supplier reorder requests.
//!
//! This crate contains business rules for reorders, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod order;

pub use order::{NewReorder, ReorderDecision, ReorderLine, ReorderStatus, SupplierOrder, SupplierOrderId};
