//! Stock alerts.
//!
//! The ledger publishes an alert when a mutation drops an item into a lower
//! tier that needs reordering. Sinks are fire-and-forget: `publish` cannot
//! fail and must not block.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use laundry_inventory::{InventoryItem, InventoryItemId, StockStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAlert {
    pub item_id: InventoryItemId,
    pub name: String,
    pub previous_status: StockStatus,
    pub status: StockStatus,
    pub current_stock: i64,
    pub reorder_level: i64,
    pub raised_at: DateTime<Utc>,
}

impl StockAlert {
    /// Alert for `item` if it moved from `previous` into a worse tier that needs a reorder.
    pub fn for_transition(
        previous: StockStatus,
        item: &InventoryItem,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let status = item.status();
        if !status.needs_reorder() || status >= previous {
            return None;
        }
        Some(Self {
            item_id: item.id_typed(),
            name: item.name().to_string(),
            previous_status: previous,
            status,
            current_stock: item.current_stock(),
            reorder_level: item.reorder_level(),
            raised_at: now,
        })
    }
}

pub trait StockAlertSink: Send + Sync {
    fn publish(&self, alert: StockAlert);
}

impl<S> StockAlertSink for Arc<S>
where
    S: StockAlertSink + ?Sized,
{
    fn publish(&self, alert: StockAlert) {
        (**self).publish(alert)
    }
}

/// Writes alerts to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertSink;

impl StockAlertSink for TracingAlertSink {
    fn publish(&self, alert: StockAlert) {
        tracing::warn!(
            item_id = %alert.item_id,
            item = %alert.name,
            status = %alert.status,
            previous_status = %alert.previous_status,
            current_stock = alert.current_stock,
            reorder_level = alert.reorder_level,
            "stock alert"
        );
    }
}

/// Keeps the most recent alerts in memory (and logs them).
#[derive(Debug)]
pub struct InMemoryAlertSink {
    capacity: usize,
    recent: RwLock<VecDeque<StockAlert>>,
}

impl InMemoryAlertSink {
    pub const DEFAULT_CAPACITY: usize = 100;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            recent: RwLock::new(VecDeque::new()),
        }
    }

    /// Newest first.
    pub fn recent(&self) -> Vec<StockAlert> {
        match self.recent.read() {
            Ok(recent) => recent.iter().rev().cloned().collect(),
            Err(_) => vec![],
        }
    }
}

impl Default for InMemoryAlertSink {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl StockAlertSink for InMemoryAlertSink {
    fn publish(&self, alert: StockAlert) {
        TracingAlertSink.publish(alert.clone());
        if let Ok(mut recent) = self.recent.write() {
            if recent.len() == self.capacity {
                recent.pop_front();
            }
            recent.push_back(alert);
        }
    }
}

#[cfg(test)]
mod tests {
    use laundry_inventory::{Category, NewInventoryItem, Unit};

    use super::*;

    fn item(stock: i64, level: i64) -> InventoryItem {
        InventoryItem::create(
            NewInventoryItem {
                name: "Softener".to_string(),
                category: Category::Cleaning,
                current_stock: stock,
                reorder_level: level,
                unit: Unit::Liters,
                supplier: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn alert_only_on_downward_move_into_reorder_tier() {
        let now = Utc::now();
        assert!(StockAlert::for_transition(StockStatus::Adequate, &item(3, 10), now).is_some());
        assert!(StockAlert::for_transition(StockStatus::Low, &item(0, 10), now).is_some());
        assert!(StockAlert::for_transition(StockStatus::Low, &item(3, 10), now).is_none());
        assert!(StockAlert::for_transition(StockStatus::High, &item(15, 10), now).is_none());
        assert!(StockAlert::for_transition(StockStatus::Critical, &item(3, 10), now).is_none());
    }

    #[test]
    fn in_memory_sink_keeps_newest_first_within_capacity() {
        let sink = InMemoryAlertSink::new(2);
        for stock in [3, 2, 1] {
            let alert = StockAlert::for_transition(StockStatus::High, &item(stock, 10), Utc::now()).unwrap();
            sink.publish(alert);
        }
        let recent = sink.recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].current_stock, 1);
        assert_eq!(recent[1].current_stock, 2);
    }
}
