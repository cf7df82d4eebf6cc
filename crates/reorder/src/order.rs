use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use laundry_core::{Document, DocumentId, DomainError, DomainResult, UserId};
use laundry_inventory::{Category, RestockLine, Unit};
use laundry_parties::SupplierId;

laundry_core::document_id!(
    /// Reorder request identifier.
    SupplierOrderId
);

/// Reorder lifecycle.
///
/// `PartiallyFulfilled` is part of the stored vocabulary but no transition
/// produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorderStatus {
    Pending,
    Approved,
    Rejected,
    Fulfilled,
    PartiallyFulfilled,
}

impl ReorderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReorderStatus::Pending => "pending",
            ReorderStatus::Approved => "approved",
            ReorderStatus::Rejected => "rejected",
            ReorderStatus::Fulfilled => "fulfilled",
            ReorderStatus::PartiallyFulfilled => "partially_fulfilled",
        }
    }
}

impl core::fmt::Display for ReorderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of reviewing a pending reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderDecision {
    Approved,
    Rejected,
}

/// A requested line, identified by item name rather than ledger id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderLine {
    pub name: String,
    pub category: Category,
    pub quantity: i64,
    pub unit: Unit,
}

/// Input for opening a reorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReorder {
    pub supplier: SupplierId,
    pub items: Vec<ReorderLine>,
    pub requested_by: UserId,
    pub expected_delivery_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierOrder {
    id: SupplierOrderId,
    supplier: SupplierId,
    items: Vec<ReorderLine>,
    status: ReorderStatus,
    requested_by: UserId,
    expected_delivery_date: Option<DateTime<Utc>>,
    notes: Option<String>,
    fulfilled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SupplierOrder {
    pub fn open(input: NewReorder, now: DateTime<Utc>) -> DomainResult<Self> {
        if input.items.is_empty() {
            return Err(DomainError::validation("reorder must contain at least one item"));
        }

        let mut items = Vec::with_capacity(input.items.len());
        for line in input.items {
            let name = line.name.trim();
            if name.is_empty() {
                return Err(DomainError::validation("item name cannot be empty"));
            }
            if line.quantity < 1 {
                return Err(DomainError::validation(format!(
                    "quantity for {name} must be at least 1"
                )));
            }
            items.push(ReorderLine {
                name: name.to_string(),
                ..line
            });
        }

        let order = Self {
            id: SupplierOrderId::new(),
            supplier: input.supplier,
            items,
            status: ReorderStatus::Pending,
            requested_by: input.requested_by,
            expected_delivery_date: input.expected_delivery_date,
            notes: input
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            fulfilled_at: None,
            created_at: now,
            updated_at: now,
        };
        order.restock_lines()?;
        Ok(order)
    }

    pub fn id_typed(&self) -> SupplierOrderId {
        self.id
    }

    pub fn supplier(&self) -> SupplierId {
        self.supplier
    }

    pub fn items(&self) -> &[ReorderLine] {
        &self.items
    }

    pub fn status(&self) -> ReorderStatus {
        self.status
    }

    pub fn requested_by(&self) -> UserId {
        self.requested_by
    }

    pub fn expected_delivery_date(&self) -> Option<DateTime<Utc>> {
        self.expected_delivery_date
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn fulfilled_at(&self) -> Option<DateTime<Utc>> {
        self.fulfilled_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Approve or reject. Only a pending reorder can be decided.
    pub fn decide(&mut self, decision: ReorderDecision, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status != ReorderStatus::Pending {
            return Err(DomainError::invalid_state(format!(
                "reorder {} is {} and can no longer be decided",
                self.id, self.status
            )));
        }
        self.status = match decision {
            ReorderDecision::Approved => ReorderStatus::Approved,
            ReorderDecision::Rejected => ReorderStatus::Rejected,
        };
        self.updated_at = now;
        Ok(())
    }

    /// Mark as delivered. Rejected and already fulfilled reorders are refused.
    pub fn fulfill(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if matches!(self.status, ReorderStatus::Rejected | ReorderStatus::Fulfilled) {
            return Err(DomainError::invalid_state(format!(
                "reorder {} is {} and cannot be fulfilled",
                self.id, self.status
            )));
        }
        self.status = ReorderStatus::Fulfilled;
        self.fulfilled_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Delivered quantities per item name, in first-seen order.
    ///
    /// Lines with the same name are merged; the first line's category and unit win.
    /// Validation if a merged quantity does not fit in an `i64`.
    pub fn restock_lines(&self) -> DomainResult<Vec<RestockLine>> {
        let mut merged: Vec<RestockLine> = Vec::new();
        for line in &self.items {
            match merged.iter_mut().find(|m| m.name == line.name) {
                Some(existing) => {
                    existing.quantity = existing.quantity.checked_add(line.quantity).ok_or_else(|| {
                        DomainError::validation(format!(
                            "total quantity for {} is too large",
                            line.name
                        ))
                    })?;
                }
                None => merged.push(RestockLine {
                    name: line.name.clone(),
                    category: line.category,
                    quantity: line.quantity,
                    unit: line.unit,
                }),
            }
        }
        Ok(merged)
    }
}

impl Document for SupplierOrder {
    const COLLECTION: &'static str = "supplier_orders";

    fn document_id(&self) -> DocumentId {
        self.id.document_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_time() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn line(name: &str, quantity: i64) -> ReorderLine {
        ReorderLine {
            name: name.to_string(),
            category: Category::Cleaning,
            quantity,
            unit: Unit::Liters,
        }
    }

    fn input(items: Vec<ReorderLine>) -> NewReorder {
        NewReorder {
            supplier: SupplierId::new(),
            items,
            requested_by: UserId::new(),
            expected_delivery_date: None,
            notes: Some("rush".to_string()),
        }
    }

    #[test]
    fn open_validates_lines() {
        for items in [vec![], vec![line("  ", 2)], vec![line("Bleach", 0)]] {
            assert!(matches!(
                SupplierOrder::open(input(items), test_time()),
                Err(DomainError::Validation(_))
            ));
        }
    }

    #[test]
    fn open_trims_names() {
        let order = SupplierOrder::open(input(vec![line(" Bleach ", 2)]), test_time()).unwrap();
        assert_eq!(order.items()[0].name, "Bleach");
        assert_eq!(order.status(), ReorderStatus::Pending);
        assert_eq!(order.notes(), Some("rush"));
    }

    #[test]
    fn fulfill_from_pending_or_approved() {
        let mut pending = SupplierOrder::open(input(vec![line("Bleach", 2)]), test_time()).unwrap();
        let mut approved = pending.clone();
        approved.decide(ReorderDecision::Approved, test_time()).unwrap();

        pending.fulfill(test_time()).unwrap();
        approved.fulfill(test_time()).unwrap();
        assert_eq!(pending.status(), ReorderStatus::Fulfilled);
        assert_eq!(approved.fulfilled_at(), Some(test_time()));
    }

    #[test]
    fn rejected_or_fulfilled_cannot_be_fulfilled() {
        let mut order = SupplierOrder::open(input(vec![line("Bleach", 2)]), test_time()).unwrap();
        let mut rejected = order.clone();
        rejected.decide(ReorderDecision::Rejected, test_time()).unwrap();
        assert!(matches!(rejected.fulfill(test_time()), Err(DomainError::InvalidState(_))));

        order.fulfill(test_time()).unwrap();
        assert!(matches!(order.fulfill(test_time()), Err(DomainError::InvalidState(_))));
    }

    #[test]
    fn decide_only_from_pending() {
        let mut order = SupplierOrder::open(input(vec![line("Bleach", 2)]), test_time()).unwrap();
        order.decide(ReorderDecision::Approved, test_time()).unwrap();
        assert!(matches!(
            order.decide(ReorderDecision::Rejected, test_time()),
            Err(DomainError::InvalidState(_))
        ));
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(ReorderStatus::PartiallyFulfilled).unwrap(),
            serde_json::json!("partially_fulfilled")
        );
    }

    #[test]
    fn restock_lines_merge_duplicate_names() {
        let order = SupplierOrder::open(
            input(vec![line("Bleach", 5), line("Hangers", 1), line("Bleach", 7)]),
            test_time(),
        )
        .unwrap();
        let lines = order.restock_lines().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "Bleach");
        assert_eq!(lines[0].quantity, 12);
        assert_eq!(lines[1].quantity, 1);
    }

    #[test]
    fn open_rejects_merged_quantities_that_overflow() {
        let err = SupplierOrder::open(
            input(vec![line("Bleach", i64::MAX), line("Bleach", i64::MAX)]),
            test_time(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let order = SupplierOrder::open(
            input(vec![line("Bleach", i64::MAX), line("Softener", i64::MAX)]),
            test_time(),
        )
        .unwrap();
        assert_eq!(order.restock_lines().unwrap().len(), 2);
    }

    #[test]
    fn stored_order_with_overflowing_lines_is_refused() {
        let order = SupplierOrder::open(input(vec![line("Bleach", 1)]), test_time()).unwrap();
        let mut json = serde_json::to_value(order).unwrap();
        json["items"] = serde_json::json!([
            { "name": "Bleach", "category": "Cleaning", "quantity": i64::MAX, "unit": "liters" },
            { "name": "Bleach", "category": "Cleaning", "quantity": 1, "unit": "liters" },
        ]);
        let order: SupplierOrder = serde_json::from_value(json).unwrap();

        assert!(matches!(order.restock_lines(), Err(DomainError::Validation(_))));
    }

    proptest! {
        #[test]
        fn merging_preserves_total_quantity(
            lines in proptest::collection::vec((0usize..3, 1i64..500), 1..12)
        ) {
            let names = ["Bleach", "Softener", "Bags"];
            let items: Vec<_> = lines.iter().map(|(n, q)| line(names[*n], *q)).collect();
            let order = SupplierOrder::open(input(items), test_time()).unwrap();
            let merged = order.restock_lines().unwrap();

            prop_assert_eq!(
                merged.iter().map(|l| l.quantity).sum::<i64>(),
                lines.iter().map(|(_, q)| q).sum::<i64>()
            );
            let mut seen: Vec<_> = merged.iter().map(|l| l.name.as_str()).collect();
            seen.sort_unstable();
            seen.dedup();
            prop_assert_eq!(seen.len(), merged.len());
        }
    }
}
