//! Employee supply requests.
//!
//! An employee asks for stock against an order assigned to them; a manager
//! approves or rejects; an admin fulfills. This crate holds the lifecycle
//! rules only. Stock movement lives in the infra workflows.

pub mod request;

pub use request::{
    EmployeeRequest, EmployeeRequestId, Fulfillment, ManagerApproval, RequestLine, RequestStatus,
};
