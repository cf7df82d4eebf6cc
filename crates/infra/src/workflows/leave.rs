//! Leave workflow: apply, review, withdraw.

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use laundry_core::{UserId, Versioned};
use laundry_leave::{
    LeaveCalendar, LeaveDecision, LeaveRequest, LeaveRequestId, LeaveType, LeaveWindow, find_overlap,
};

use crate::error::{WorkflowError, WorkflowResult};
use crate::repository::{Batch, Documents};
use crate::retry::with_retry;
use crate::store::StoreError;

#[derive(Debug, Clone)]
pub struct LeaveWorkflow {
    docs: Documents,
    commit_attempts: u32,
}

impl LeaveWorkflow {
    pub fn new(docs: Documents, commit_attempts: u32) -> Self {
        Self { docs, commit_attempts }
    }

    /// Submit a pending application for `employee`.
    ///
    /// Conflict if it overlaps any pending or approved leave of the same
    /// employee. The employee's calendar is rewritten in the same batch, so two
    /// concurrent applications cannot both pass the overlap check.
    #[instrument(skip(self, reason), err)]
    pub async fn apply(
        &self,
        employee: UserId,
        leave_type: LeaveType,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        reason: Option<String>,
    ) -> WorkflowResult<LeaveRequest> {
        let window = LeaveWindow::new(start_date, end_date)?;

        with_retry("apply_leave", self.commit_attempts, move || {
            let reason = reason.clone();
            async move {
                let now = Utc::now();
                let calendar = self
                    .docs
                    .get::<LeaveCalendar>(LeaveCalendar::document_id_for(employee))
                    .await?;
                let existing = self.list_where(|l| l.employee() == employee).await?;
                if let Some(clash) = find_overlap(&existing, employee, &window) {
                    return Err(WorkflowError::Conflict(format!(
                        "employee {employee} already has {} leave {} for this period",
                        clash.status(),
                        clash.id_typed()
                    )));
                }

                let leave = LeaveRequest::apply(employee, leave_type, window, reason, now);
                let mut batch = Batch::new();
                batch.insert(&leave)?;
                match calendar {
                    Some(current) => {
                        let mut next = current.doc.clone();
                        next.record_application(now);
                        batch.update(&next, current.expected())?;
                    }
                    None => {
                        let mut fresh = LeaveCalendar::open(employee, now);
                        fresh.record_application(now);
                        batch.insert(&fresh)?;
                    }
                }
                match self.docs.commit(batch).await {
                    Ok(()) => {}
                    // Another first application created the calendar.
                    Err(StoreError::Duplicate(msg)) => return Err(WorkflowError::Concurrency(msg)),
                    Err(e) => return Err(e.into()),
                }

                info!(leave_id = %leave.id_typed(), %employee, "leave requested");
                Ok(leave)
            }
        })
        .await
    }

    #[instrument(skip(self), err)]
    pub async fn decide(
        &self,
        id: LeaveRequestId,
        decision: LeaveDecision,
        reviewer: UserId,
    ) -> WorkflowResult<LeaveRequest> {
        with_retry("decide_leave", self.commit_attempts, move || async move {
            let current = self.load(id).await?;
            let mut leave = current.doc.clone();
            leave.decide(decision, reviewer, Utc::now())?;

            let mut batch = Batch::new();
            batch.update(&leave, current.expected())?;
            self.docs.commit(batch).await?;

            info!(leave_id = %id, %reviewer, status = %leave.status(), "leave decided");
            Ok(leave)
        })
        .await
    }

    /// Remove a leave request. With `owner` set, only that employee's leave
    /// is visible; anyone else's reads as not found.
    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: LeaveRequestId, owner: Option<UserId>) -> WorkflowResult<()> {
        with_retry("delete_leave", self.commit_attempts, move || async move {
            let current = self.load(id).await?;
            if owner.is_some_and(|o| current.doc.employee() != o) {
                return Err(WorkflowError::not_found(format!("leave request {id}")));
            }

            let mut batch = Batch::new();
            batch.delete::<LeaveRequest>(id.document_id(), current.expected());
            self.docs.commit(batch).await?;

            info!(leave_id = %id, "leave deleted");
            Ok(())
        })
        .await
    }

    pub async fn get(&self, id: LeaveRequestId) -> WorkflowResult<LeaveRequest> {
        Ok(self.load(id).await?.into_inner())
    }

    /// Every leave request, newest first.
    pub async fn list_all(&self) -> WorkflowResult<Vec<LeaveRequest>> {
        let mut leave = self.list_where(|_| true).await?;
        newest_first(&mut leave);
        Ok(leave)
    }

    pub async fn list_for_employee(&self, employee: UserId) -> WorkflowResult<Vec<LeaveRequest>> {
        let mut leave = self.list_where(|l| l.employee() == employee).await?;
        newest_first(&mut leave);
        Ok(leave)
    }

    async fn list_where(&self, keep: impl Fn(&LeaveRequest) -> bool) -> WorkflowResult<Vec<LeaveRequest>> {
        Ok(self
            .docs
            .list::<LeaveRequest>()
            .await?
            .into_iter()
            .map(Versioned::into_inner)
            .filter(|l| keep(l))
            .collect())
    }

    async fn load(&self, id: LeaveRequestId) -> WorkflowResult<Versioned<LeaveRequest>> {
        self.docs
            .get::<LeaveRequest>(id.document_id())
            .await?
            .ok_or_else(|| WorkflowError::not_found(format!("leave request {id}")))
    }
}

fn newest_first(leave: &mut [LeaveRequest]) {
    leave.sort_by(|a, b| (b.created_at(), b.id_typed()).cmp(&(a.created_at(), a.id_typed())));
}
