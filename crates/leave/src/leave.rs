use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use laundry_core::{Document, DocumentId, DomainError, DomainResult, UserId};

laundry_core::document_id!(
    /// Leave request identifier.
    LeaveRequestId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    Sick,
    Vacation,
    Personal,
    Other,
}

/// Lifecycle: pending → approved | rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
        }
    }

    /// Pending and approved leave hold their window against new applications.
    pub fn holds_window(self) -> bool {
        matches!(self, LeaveStatus::Pending | LeaveStatus::Approved)
    }
}

impl core::fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of reviewing a pending leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveDecision {
    Approved,
    Rejected,
}

/// A span of leave. The end is strictly after the start; both ends are inclusive
/// when checking overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveWindow {
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
}

impl LeaveWindow {
    pub fn new(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> DomainResult<Self> {
        if end_date <= start_date {
            return Err(DomainError::validation("end date must be after start date"));
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    pub fn end_date(&self) -> DateTime<Utc> {
        self.end_date
    }

    /// Windows that share at least one instant, touching ends included.
    pub fn overlaps(&self, other: &LeaveWindow) -> bool {
        self.start_date <= other.end_date && self.end_date >= other.start_date
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    id: LeaveRequestId,
    employee: UserId,
    leave_type: LeaveType,
    #[serde(flatten)]
    window: LeaveWindow,
    reason: String,
    status: LeaveStatus,
    approved_by: Option<UserId>,
    approved_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// Open a pending application. Overlap with existing leave is checked by the caller.
    pub fn apply(
        employee: UserId,
        leave_type: LeaveType,
        window: LeaveWindow,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: LeaveRequestId::new(),
            employee,
            leave_type,
            window,
            reason: reason.map(|r| r.trim().to_string()).unwrap_or_default(),
            status: LeaveStatus::Pending,
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id_typed(&self) -> LeaveRequestId {
        self.id
    }

    pub fn employee(&self) -> UserId {
        self.employee
    }

    pub fn leave_type(&self) -> LeaveType {
        self.leave_type
    }

    pub fn window(&self) -> LeaveWindow {
        self.window
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn status(&self) -> LeaveStatus {
        self.status
    }

    pub fn approved_by(&self) -> Option<UserId> {
        self.approved_by
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Record the reviewer's decision. Only pending leave can be decided.
    pub fn decide(
        &mut self,
        decision: LeaveDecision,
        reviewer: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if self.status != LeaveStatus::Pending {
            return Err(DomainError::invalid_state(format!(
                "leave request {} has already been processed ({})",
                self.id, self.status
            )));
        }
        self.status = match decision {
            LeaveDecision::Approved => LeaveStatus::Approved,
            LeaveDecision::Rejected => LeaveStatus::Rejected,
        };
        self.approved_by = Some(reviewer);
        self.approved_at = Some(now);
        self.updated_at = now;
        Ok(())
    }
}

impl Document for LeaveRequest {
    const COLLECTION: &'static str = "leave_requests";

    fn document_id(&self) -> DocumentId {
        self.id.document_id()
    }
}

/// The first leave of `employee` that still holds its window and overlaps `window`.
pub fn find_overlap<'a>(
    existing: impl IntoIterator<Item = &'a LeaveRequest>,
    employee: UserId,
    window: &LeaveWindow,
) -> Option<&'a LeaveRequest> {
    existing.into_iter().find(|leave| {
        leave.employee == employee && leave.status.holds_window() && leave.window.overlaps(window)
    })
}

/// Per-employee marker rewritten with every application.
///
/// Two applications of one employee both write this document, so only one of
/// them commits against the leave it read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveCalendar {
    employee: UserId,
    applications: u64,
    updated_at: DateTime<Utc>,
}

impl LeaveCalendar {
    pub fn open(employee: UserId, now: DateTime<Utc>) -> Self {
        Self {
            employee,
            applications: 0,
            updated_at: now,
        }
    }

    pub fn document_id_for(employee: UserId) -> DocumentId {
        DocumentId::from_uuid(*employee.as_uuid())
    }

    pub fn applications(&self) -> u64 {
        self.applications
    }

    pub fn record_application(&mut self, now: DateTime<Utc>) {
        self.applications = self.applications.saturating_add(1);
        self.updated_at = now;
    }
}

impl Document for LeaveCalendar {
    const COLLECTION: &'static str = "leave_calendars";

    fn document_id(&self) -> DocumentId {
        Self::document_id_for(self.employee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn day(n: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + n * 86_400, 0).unwrap()
    }

    fn window(from: i64, to: i64) -> LeaveWindow {
        LeaveWindow::new(day(from), day(to)).unwrap()
    }

    fn pending(employee: UserId, from: i64, to: i64) -> LeaveRequest {
        LeaveRequest::apply(employee, LeaveType::Vacation, window(from, to), None, day(0))
    }

    #[test]
    fn end_must_be_after_start() {
        assert!(matches!(
            LeaveWindow::new(day(3), day(3)),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            LeaveWindow::new(day(3), day(2)),
            Err(DomainError::Validation(_))
        ));
        assert!(LeaveWindow::new(day(3), day(3) + Duration::hours(1)).is_ok());
    }

    #[test]
    fn touching_windows_overlap() {
        assert!(window(1, 3).overlaps(&window(3, 5)));
        assert!(window(3, 5).overlaps(&window(1, 3)));
        assert!(!window(1, 3).overlaps(&window(4, 5)));
        assert!(window(1, 10).overlaps(&window(4, 5)));
    }

    #[test]
    fn overlap_ignores_rejected_leave_and_other_employees() {
        let me = UserId::new();
        let colleague = UserId::new();
        let mut rejected = pending(me, 1, 5);
        rejected.decide(LeaveDecision::Rejected, UserId::new(), day(0)).unwrap();
        let theirs = pending(colleague, 1, 5);
        let existing = vec![rejected, theirs];

        assert!(find_overlap(&existing, me, &window(2, 3)).is_none());

        let mut approved = pending(me, 10, 12);
        approved.decide(LeaveDecision::Approved, UserId::new(), day(0)).unwrap();
        let existing = vec![approved];
        let hit = find_overlap(&existing, me, &window(12, 14)).unwrap();
        assert_eq!(hit.status(), LeaveStatus::Approved);
    }

    #[test]
    fn decide_records_reviewer_and_happens_once() {
        let mut leave = pending(UserId::new(), 1, 2);
        let manager = UserId::new();
        leave.decide(LeaveDecision::Approved, manager, day(1)).unwrap();

        assert_eq!(leave.status(), LeaveStatus::Approved);
        assert_eq!(leave.approved_by(), Some(manager));
        assert_eq!(leave.approved_at(), Some(day(1)));

        assert!(matches!(
            leave.decide(LeaveDecision::Rejected, manager, day(2)),
            Err(DomainError::InvalidState(_))
        ));
    }

    #[test]
    fn serialized_window_sits_on_the_request() {
        let leave = LeaveRequest::apply(
            UserId::new(),
            LeaveType::Sick,
            window(1, 2),
            Some("  flu ".to_string()),
            day(0),
        );
        let json = serde_json::to_value(&leave).unwrap();

        assert_eq!(json["leaveType"], "sick");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["reason"], "flu");
        assert!(json["startDate"].is_string());
        assert!(json["endDate"].is_string());
        assert!(json["approvedBy"].is_null());

        let back: LeaveRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, leave);
    }

    #[test]
    fn calendar_is_keyed_by_employee() {
        let employee = UserId::new();
        let mut calendar = LeaveCalendar::open(employee, day(0));
        calendar.record_application(day(1));

        assert_eq!(calendar.applications(), 1);
        assert_eq!(calendar.document_id(), LeaveCalendar::document_id_for(employee));
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(a in 0i64..50, alen in 1i64..10, b in 0i64..50, blen in 1i64..10) {
            let x = window(a, a + alen);
            let y = window(b, b + blen);
            prop_assert_eq!(x.overlaps(&y), y.overlaps(&x));
        }

        #[test]
        fn overlap_matches_shared_days(a in 0i64..50, alen in 1i64..10, b in 0i64..50, blen in 1i64..10) {
            let shared = (a..=a + alen).any(|d| (b..=b + blen).contains(&d));
            prop_assert_eq!(window(a, a + alen).overlaps(&window(b, b + blen)), shared);
        }
    }
}
