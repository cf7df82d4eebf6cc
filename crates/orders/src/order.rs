use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use laundry_core::{Document, DocumentId, DomainError, DomainResult, UserId};

laundry_core::document_id!(
    /// Customer order identifier.
    OrderId
);

/// Processing state of a customer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    NotStarted,
    Processing,
    Finished,
}

/// Input for placing an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewServiceOrder {
    pub customer: UserId,
    pub notes: Option<String>,
    pub is_paid: bool,
}

/// A customer laundry order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrder {
    id: OrderId,
    customer: UserId,
    assigned_employee: Option<UserId>,
    status: OrderStatus,
    is_paid: bool,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ServiceOrder {
    pub fn place(input: NewServiceOrder, now: DateTime<Utc>) -> Self {
        Self {
            id: OrderId::new(),
            customer: input.customer,
            assigned_employee: None,
            status: OrderStatus::NotStarted,
            is_paid: input.is_paid,
            notes: input
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn customer(&self) -> UserId {
        self.customer
    }

    pub fn assigned_employee(&self) -> Option<UserId> {
        self.assigned_employee
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn is_paid(&self) -> bool {
        self.is_paid
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Hand the order to an employee. Reassignment is allowed until it is finished.
    pub fn assign(&mut self, employee: UserId, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status == OrderStatus::Finished {
            return Err(DomainError::invalid_state(format!(
                "order {} is finished and cannot be reassigned",
                self.id
            )));
        }
        self.assigned_employee = Some(employee);
        if self.status == OrderStatus::NotStarted {
            self.status = OrderStatus::Processing;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn is_assigned_to(&self, employee: UserId) -> bool {
        self.assigned_employee == Some(employee)
    }
}

impl Document for ServiceOrder {
    const COLLECTION: &'static str = "orders";

    fn document_id(&self) -> DocumentId {
        self.id.document_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_time() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn placed() -> ServiceOrder {
        ServiceOrder::place(
            NewServiceOrder {
                customer: UserId::new(),
                notes: Some("  ".to_string()),
                is_paid: false,
            },
            test_time(),
        )
    }

    #[test]
    fn new_order_is_unassigned_and_not_started() {
        let order = placed();
        assert_eq!(order.status(), OrderStatus::NotStarted);
        assert_eq!(order.assigned_employee(), None);
        assert_eq!(order.notes(), None);
    }

    #[test]
    fn assign_moves_order_into_processing() {
        let mut order = placed();
        let employee = UserId::new();
        order.assign(employee, test_time()).unwrap();
        assert!(order.is_assigned_to(employee));
        assert!(!order.is_assigned_to(UserId::new()));
        assert_eq!(order.status(), OrderStatus::Processing);
    }

    #[test]
    fn finished_order_cannot_be_reassigned() {
        let mut order = placed();
        order.status = OrderStatus::Finished;
        let err = order.assign(UserId::new(), test_time()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }
}
