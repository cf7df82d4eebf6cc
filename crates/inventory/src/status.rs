//! Stock status derivation.
//!
//! `derive_status` is the only place the four tiers are decided. Every ledger
//! mutation goes through it.

use serde::{Deserialize, Serialize};

/// Derived stock tier of an inventory item, ordered from worst to best.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StockStatus {
    Critical,
    Low,
    Adequate,
    High,
}

impl StockStatus {
    /// Whether the tier calls for a reorder.
    pub fn needs_reorder(self) -> bool {
        matches!(self, StockStatus::Critical | StockStatus::Low)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StockStatus::Critical => "Critical",
            StockStatus::Low => "Low",
            StockStatus::Adequate => "Adequate",
            StockStatus::High => "High",
        }
    }
}

impl core::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a stock quantity and its reorder level to a status tier.
///
/// - `current_stock <= 0` → Critical
/// - `current_stock <= reorder_level` → Low
/// - `current_stock > 2 * reorder_level` → High
/// - otherwise → Adequate
pub fn derive_status(current_stock: i64, reorder_level: i64) -> StockStatus {
    if current_stock <= 0 {
        StockStatus::Critical
    } else if current_stock <= reorder_level {
        StockStatus::Low
    } else if current_stock > reorder_level.saturating_mul(2) {
        StockStatus::High
    } else {
        StockStatus::Adequate
    }
}
