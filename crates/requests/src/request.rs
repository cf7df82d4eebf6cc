use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use laundry_core::{Document, DocumentId, DomainError, DomainResult, UserId};
use laundry_inventory::InventoryItemId;
use laundry_orders::OrderId;

laundry_core::document_id!(
    /// Employee request identifier.
    EmployeeRequestId
);

/// Lifecycle: pending → approved | rejected; approved → fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Fulfilled,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Fulfilled => "fulfilled",
        }
    }
}

impl core::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLine {
    pub inventory_item: InventoryItemId,
    pub quantity: i64,
}

/// The manager's decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerApproval {
    pub approved: bool,
    pub approved_by: UserId,
    pub approved_at: DateTime<Utc>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fulfillment {
    pub fulfilled_by: UserId,
    pub fulfilled_at: DateTime<Utc>,
}

const DEFAULT_REJECTION_NOTE: &str = "Request rejected";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRequest {
    id: EmployeeRequestId,
    employee: UserId,
    order: OrderId,
    items: Vec<RequestLine>,
    status: RequestStatus,
    manager_approval: Option<ManagerApproval>,
    fulfillment: Option<Fulfillment>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EmployeeRequest {
    /// Open a pending request. Lines keep the order they were given in.
    pub fn open(
        employee: UserId,
        order: OrderId,
        items: Vec<RequestLine>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::validation("request must contain at least one item"));
        }
        if let Some(line) = items.iter().find(|l| l.quantity < 1) {
            return Err(DomainError::validation(format!(
                "quantity for item {} must be at least 1",
                line.inventory_item
            )));
        }

        let request = Self {
            id: EmployeeRequestId::new(),
            employee,
            order,
            items,
            status: RequestStatus::Pending,
            manager_approval: None,
            fulfillment: None,
            created_at: now,
            updated_at: now,
        };
        request.requested_totals()?;
        Ok(request)
    }

    pub fn id_typed(&self) -> EmployeeRequestId {
        self.id
    }

    pub fn employee(&self) -> UserId {
        self.employee
    }

    pub fn order(&self) -> OrderId {
        self.order
    }

    pub fn items(&self) -> &[RequestLine] {
        &self.items
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn manager_approval(&self) -> Option<&ManagerApproval> {
        self.manager_approval.as_ref()
    }

    pub fn fulfillment(&self) -> Option<&Fulfillment> {
        self.fulfillment.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Pending or approved: the request may still move stock.
    pub fn is_open(&self) -> bool {
        matches!(self.status, RequestStatus::Pending | RequestStatus::Approved)
    }

    pub fn references_item(&self, item: InventoryItemId) -> bool {
        self.items.iter().any(|l| l.inventory_item == item)
    }

    /// Quantity per item, summing lines that name the same item.
    ///
    /// Validation if a per-item total does not fit in an `i64`.
    pub fn requested_totals(&self) -> DomainResult<BTreeMap<InventoryItemId, i64>> {
        let mut totals: BTreeMap<InventoryItemId, i64> = BTreeMap::new();
        for line in &self.items {
            let total = totals.entry(line.inventory_item).or_insert(0);
            *total = total.checked_add(line.quantity).ok_or_else(|| {
                DomainError::validation(format!(
                    "total quantity requested for item {} is too large",
                    line.inventory_item
                ))
            })?;
        }
        Ok(totals)
    }

    pub fn approve(
        &mut self,
        approver: UserId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.decide(true, approver, notes.unwrap_or_default(), now)
    }

    pub fn reject(
        &mut self,
        approver: UserId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let notes = notes
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REJECTION_NOTE.to_string());
        self.decide(false, approver, notes, now)
    }

    fn decide(
        &mut self,
        approved: bool,
        approver: UserId,
        notes: String,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_status(RequestStatus::Pending)?;
        self.status = if approved {
            RequestStatus::Approved
        } else {
            RequestStatus::Rejected
        };
        self.manager_approval = Some(ManagerApproval {
            approved,
            approved_by: approver,
            approved_at: now,
            notes,
        });
        self.updated_at = now;
        Ok(())
    }

    /// Mark as fulfilled. The caller is responsible for the matching stock withdrawals.
    pub fn fulfill(&mut self, fulfiller: UserId, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_status(RequestStatus::Approved)?;
        self.status = RequestStatus::Fulfilled;
        self.fulfillment = Some(Fulfillment {
            fulfilled_by: fulfiller,
            fulfilled_at: now,
        });
        self.updated_at = now;
        Ok(())
    }

    fn ensure_status(&self, expected: RequestStatus) -> DomainResult<()> {
        if self.status != expected {
            return Err(DomainError::invalid_state(format!(
                "request {} is {}, expected {}",
                self.id, self.status, expected
            )));
        }
        Ok(())
    }
}

impl Document for EmployeeRequest {
    const COLLECTION: &'static str = "employee_requests";

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

    fn line(item: InventoryItemId, quantity: i64) -> RequestLine {
        RequestLine {
            inventory_item: item,
            quantity,
        }
    }

    fn pending() -> EmployeeRequest {
        EmployeeRequest::open(
            UserId::new(),
            OrderId::new(),
            vec![line(InventoryItemId::new(), 3)],
            test_time(),
        )
        .unwrap()
    }

    #[test]
    fn open_rejects_empty_and_non_positive_lines() {
        let err = EmployeeRequest::open(UserId::new(), OrderId::new(), vec![], test_time())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = EmployeeRequest::open(
            UserId::new(),
            OrderId::new(),
            vec![line(InventoryItemId::new(), 2), line(InventoryItemId::new(), 0)],
            test_time(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn open_rejects_totals_that_overflow() {
        let item = InventoryItemId::new();
        let err = EmployeeRequest::open(
            UserId::new(),
            OrderId::new(),
            vec![line(item, i64::MAX), line(item, i64::MAX)],
            test_time(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        // Large lines for different items are fine.
        let req = EmployeeRequest::open(
            UserId::new(),
            OrderId::new(),
            vec![line(item, i64::MAX), line(InventoryItemId::new(), i64::MAX)],
            test_time(),
        )
        .unwrap();
        assert_eq!(req.requested_totals().unwrap()[&item], i64::MAX);
    }

    #[test]
    fn stored_request_with_overflowing_totals_is_refused() {
        let item = InventoryItemId::new();
        let mut json = serde_json::to_value(pending()).unwrap();
        json["items"] = serde_json::json!([
            { "inventoryItem": item.to_string(), "quantity": i64::MAX },
            { "inventoryItem": item.to_string(), "quantity": 1 },
        ]);
        let req: EmployeeRequest = serde_json::from_value(json).unwrap();

        assert!(matches!(req.requested_totals(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn approve_records_decision_with_empty_default_note() {
        let mut req = pending();
        let manager = UserId::new();
        req.approve(manager, None, test_time()).unwrap();

        assert_eq!(req.status(), RequestStatus::Approved);
        let approval = req.manager_approval().unwrap();
        assert!(approval.approved);
        assert_eq!(approval.approved_by, manager);
        assert_eq!(approval.notes, "");
    }

    #[test]
    fn reject_uses_default_note() {
        let mut req = pending();
        req.reject(UserId::new(), Some(" ".to_string()), test_time()).unwrap();

        assert_eq!(req.status(), RequestStatus::Rejected);
        let approval = req.manager_approval().unwrap();
        assert!(!approval.approved);
        assert_eq!(approval.notes, "Request rejected");
        assert!(!req.is_open());
    }

    #[test]
    fn decisions_require_pending() {
        let mut req = pending();
        req.approve(UserId::new(), None, test_time()).unwrap();
        assert!(matches!(
            req.approve(UserId::new(), None, test_time()),
            Err(DomainError::InvalidState(_))
        ));
        assert!(matches!(
            req.reject(UserId::new(), None, test_time()),
            Err(DomainError::InvalidState(_))
        ));
    }

    #[test]
    fn fulfill_requires_approved_and_happens_once() {
        let mut req = pending();
        assert!(matches!(
            req.fulfill(UserId::new(), test_time()),
            Err(DomainError::InvalidState(_))
        ));

        req.approve(UserId::new(), Some("ok".to_string()), test_time()).unwrap();
        let admin = UserId::new();
        req.fulfill(admin, test_time()).unwrap();
        assert_eq!(req.status(), RequestStatus::Fulfilled);
        assert_eq!(req.fulfillment().unwrap().fulfilled_by, admin);

        assert!(matches!(
            req.fulfill(admin, test_time()),
            Err(DomainError::InvalidState(_))
        ));
    }

    #[test]
    fn serialized_status_is_lowercase() {
        let json = serde_json::to_value(pending()).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json["items"][0]["inventoryItem"].is_string());
    }

    proptest! {
        #[test]
        fn totals_sum_duplicate_lines(quantities in proptest::collection::vec(1i64..100, 1..10)) {
            let a = InventoryItemId::new();
            let b = InventoryItemId::new();
            let items: Vec<_> = quantities
                .iter()
                .enumerate()
                .map(|(i, q)| line(if i % 2 == 0 { a } else { b }, *q))
                .collect();
            let req = EmployeeRequest::open(UserId::new(), OrderId::new(), items, test_time()).unwrap();

            let totals = req.requested_totals().unwrap();
            prop_assert_eq!(totals.values().sum::<i64>(), quantities.iter().sum::<i64>());
            let expected_a: i64 = quantities.iter().step_by(2).sum();
            prop_assert_eq!(totals[&a], expected_a);
        }
    }
}
