//! Employee leave.
//!
//! Employees apply for a window of leave; a manager or admin approves or
//! rejects it. Pending and approved leave of one employee may not overlap.

pub mod leave;

pub use leave::{
    LeaveCalendar, LeaveDecision, LeaveRequest, LeaveRequestId, LeaveStatus, LeaveType, LeaveWindow,
    find_overlap,
};
