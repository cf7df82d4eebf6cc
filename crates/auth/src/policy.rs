//! Role policy: which roles may perform which operation.
//!
//! One table, consulted before every handler runs its workflow.

use serde::Serialize;

use crate::Role;

use Role::{Admin, Employee, Manager, Supplier};

/// Every gated operation exposed by the API.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ListInventory,
    CreateItem,
    UpdateItem,
    AdjustStock,
    DeleteItem,
    ViewStockAlerts,

    CreateEmployeeRequest,
    ListOwnRequests,
    ListPendingRequests,
    ApproveRequest,
    RejectRequest,
    ListApprovedRequests,
    ViewRequest,
    FulfillRequest,

    CreateReorder,
    ListReorders,
    ListSupplierReorders,
    DecideReorder,
    FulfillReorder,

    RegisterSupplier,
    ListSuppliers,

    PlaceOrder,
    AssignOrder,
    ViewOrder,

    ApplyLeave,
    ListAllLeave,
    ListEmployeeLeave,
    ViewLeave,
    DecideLeave,
    DeleteLeave,
}

impl Operation {
    /// Roles permitted to perform this operation.
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            Operation::ListInventory => &[Admin, Manager, Employee],
            Operation::CreateItem | Operation::UpdateItem | Operation::AdjustStock => {
                &[Admin, Manager]
            }
            Operation::DeleteItem => &[Admin],
            Operation::ViewStockAlerts => &[Admin, Manager],

            Operation::CreateEmployeeRequest | Operation::ListOwnRequests => &[Employee],
            Operation::ListPendingRequests
            | Operation::ApproveRequest
            | Operation::RejectRequest => &[Manager],
            Operation::ListApprovedRequests
            | Operation::ViewRequest
            | Operation::FulfillRequest => &[Admin],

            Operation::CreateReorder | Operation::DecideReorder | Operation::FulfillReorder => {
                &[Admin]
            }
            Operation::ListReorders => &[Admin, Manager],
            Operation::ListSupplierReorders => &[Admin, Manager, Supplier],

            Operation::RegisterSupplier => &[Admin],
            Operation::ListSuppliers => &[Admin, Manager],

            Operation::PlaceOrder | Operation::AssignOrder => &[Admin, Manager],
            Operation::ViewOrder => &[Admin, Manager, Employee],

            Operation::ApplyLeave => &[Employee],
            Operation::ListAllLeave | Operation::DecideLeave => &[Admin, Manager],
            Operation::ListEmployeeLeave | Operation::ViewLeave | Operation::DeleteLeave => {
                &[Admin, Manager, Employee]
            }
        }
    }

    pub fn permits(self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_lifecycle_is_split_across_roles() {
        assert!(Operation::CreateEmployeeRequest.permits(Employee));
        assert!(Operation::ApproveRequest.permits(Manager));
        assert!(Operation::FulfillRequest.permits(Admin));

        assert!(!Operation::ApproveRequest.permits(Admin));
        assert!(!Operation::ApproveRequest.permits(Employee));
        assert!(!Operation::FulfillRequest.permits(Manager));
    }

    #[test]
    fn inventory_mutations_exclude_employees_and_outsiders() {
        for op in [Operation::CreateItem, Operation::UpdateItem, Operation::AdjustStock] {
            assert!(op.permits(Admin));
            assert!(op.permits(Manager));
            assert!(!op.permits(Employee));
            assert!(!op.permits(Role::Customer));
        }
        assert!(!Operation::DeleteItem.permits(Manager));
    }

    #[test]
    fn customers_are_not_granted_any_inventory_operation() {
        let inventory_ops = [
            Operation::ListInventory,
            Operation::CreateItem,
            Operation::UpdateItem,
            Operation::AdjustStock,
            Operation::DeleteItem,
            Operation::FulfillReorder,
            Operation::FulfillRequest,
        ];
        for op in inventory_ops {
            assert!(!op.permits(Role::Customer), "{op:?}");
        }
    }

    #[test]
    fn leave_is_requested_by_employees_and_reviewed_above_them() {
        assert!(Operation::ApplyLeave.permits(Employee));
        assert!(!Operation::ApplyLeave.permits(Manager));

        assert!(Operation::DecideLeave.permits(Manager));
        assert!(Operation::DecideLeave.permits(Admin));
        assert!(!Operation::DecideLeave.permits(Employee));

        for op in [Operation::ViewLeave, Operation::DeleteLeave, Operation::ListEmployeeLeave] {
            assert!(op.permits(Employee));
            assert!(!op.permits(Role::Customer));
            assert!(!op.permits(Supplier));
        }
    }
}
