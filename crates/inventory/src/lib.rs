//! Inventory domain module (the stock ledger's records and rules).
//!
//! This crate contains business rules for inventory, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod item;
pub mod status;

pub use item::{
    Category, InventoryItem, InventoryItemId, ItemUpdate, NewInventoryItem, RestockLine, Unit,
    restock_reorder_level,
};
pub use status::{StockStatus, derive_status};
