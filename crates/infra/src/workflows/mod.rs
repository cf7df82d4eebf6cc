//! Multi-document workflows built on the ledger.
//!
//! Each transition reads what it needs, runs the pure domain step, and
//! commits all resulting writes as one versioned batch. Version conflicts
//! are retried from a fresh read.

pub mod employee_requests;
pub mod leave;
pub mod reorders;

pub use employee_requests::EmployeeRequestWorkflow;
pub use leave::LeaveWorkflow;
pub use reorders::{ReorderFulfillment, ReorderWorkflow};
