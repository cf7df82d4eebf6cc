//! Employee request workflow: create, manager decision, admin fulfillment.

use chrono::Utc;
use tracing::{info, instrument};

use laundry_core::{UserId, Versioned};
use laundry_inventory::InventoryItem;
use laundry_orders::{OrderId, ServiceOrder};
use laundry_requests::{EmployeeRequest, EmployeeRequestId, RequestLine, RequestStatus};

use crate::error::{WorkflowError, WorkflowResult};
use crate::ledger::StockLedger;
use crate::repository::{Batch, Documents};
use crate::retry::with_retry;

#[derive(Debug, Clone)]
pub struct EmployeeRequestWorkflow {
    docs: Documents,
    ledger: StockLedger,
    commit_attempts: u32,
}

impl EmployeeRequestWorkflow {
    pub fn new(docs: Documents, ledger: StockLedger, commit_attempts: u32) -> Self {
        Self {
            docs,
            ledger,
            commit_attempts,
        }
    }

    /// Open a pending request against an order assigned to `employee`.
    ///
    /// The stock check here is advisory; nothing is reserved. Every referenced
    /// item is rewritten at the version read, so a concurrent delete of one of
    /// them fails either this commit or the delete.
    #[instrument(skip(self, items), fields(line_count = items.len()), err)]
    pub async fn create(
        &self,
        employee: UserId,
        order: OrderId,
        items: Vec<RequestLine>,
    ) -> WorkflowResult<EmployeeRequest> {
        let request = EmployeeRequest::open(employee, order, items, Utc::now())?;

        let assigned = self
            .docs
            .get::<ServiceOrder>(order.document_id())
            .await?
            .filter(|o| o.doc.is_assigned_to(employee));
        if assigned.is_none() {
            return Err(WorkflowError::not_found(format!(
                "order {order} assigned to employee {employee}"
            )));
        }

        let request = &request;
        with_retry("create_request", self.commit_attempts, move || async move {
            let mut batch = Batch::new();
            let ids: Vec<_> = request.items().iter().map(|l| l.inventory_item).collect();
            let items = self
                .ledger
                .plan_references(ids, &mut batch)
                .await?;
            for line in request.items() {
                if let Some(item) = items.get(&line.inventory_item) {
                    item.ensure_available(line.quantity)?;
                }
            }

            batch.insert(request)?;
            self.docs.commit(batch).await?;

            info!(request_id = %request.id_typed(), %employee, %order, "employee request created");
            Ok(request.clone())
        })
        .await
    }

    #[instrument(skip(self, notes), err)]
    pub async fn approve(
        &self,
        id: EmployeeRequestId,
        approver: UserId,
        notes: Option<String>,
    ) -> WorkflowResult<EmployeeRequest> {
        with_retry("approve_request", self.commit_attempts, move || {
            let notes = notes.clone();
            async move {
                let current = self.load(id).await?;
                let mut request = current.doc.clone();
                request.approve(approver, notes, Utc::now())?;
                self.save(&request, &current).await?;
                info!(request_id = %id, %approver, "employee request approved");
                Ok(request)
            }
        })
        .await
    }

    #[instrument(skip(self, notes), err)]
    pub async fn reject(
        &self,
        id: EmployeeRequestId,
        approver: UserId,
        notes: Option<String>,
    ) -> WorkflowResult<EmployeeRequest> {
        with_retry("reject_request", self.commit_attempts, move || {
            let notes = notes.clone();
            async move {
                let current = self.load(id).await?;
                let mut request = current.doc.clone();
                request.reject(approver, notes, Utc::now())?;
                self.save(&request, &current).await?;
                info!(request_id = %id, %approver, "employee request rejected");
                Ok(request)
            }
        })
        .await
    }

    /// Withdraw every requested quantity and mark the request fulfilled, in one batch.
    #[instrument(skip(self), err)]
    pub async fn fulfill(&self, id: EmployeeRequestId, fulfiller: UserId) -> WorkflowResult<EmployeeRequest> {
        with_retry("fulfill_request", self.commit_attempts, move || async move {
            let now = Utc::now();
            let current = self.load(id).await?;
            let mut request = current.doc.clone();
            request.fulfill(fulfiller, now)?;

            let mut batch = Batch::new();
            let changes = self
                .ledger
                .plan_withdrawals(&request.requested_totals()?, &mut batch, now)
                .await?;
            batch.update(&request, current.expected())?;
            self.docs.commit(batch).await?;

            self.ledger.publish_alerts(&changes);
            info!(
                request_id = %id,
                %fulfiller,
                items = changes.len(),
                "employee request fulfilled"
            );
            Ok(request)
        })
        .await
    }

    pub async fn get(&self, id: EmployeeRequestId) -> WorkflowResult<EmployeeRequest> {
        Ok(self.load(id).await?.into_inner())
    }

    /// Requests of one employee (or everyone's when `None`), newest first.
    pub async fn list_for_employee(&self, employee: Option<UserId>) -> WorkflowResult<Vec<EmployeeRequest>> {
        let mut requests = self
            .list_where(|r| employee.is_none_or(|e| r.employee() == e))
            .await?;
        newest_first(&mut requests);
        Ok(requests)
    }

    /// The manager queue, oldest first.
    pub async fn list_pending(&self) -> WorkflowResult<Vec<EmployeeRequest>> {
        let mut requests = self
            .list_where(|r| r.status() == RequestStatus::Pending)
            .await?;
        requests.sort_by_key(|r| (r.created_at(), r.id_typed()));
        Ok(requests)
    }

    /// The admin queue: approved and fulfilled requests, newest first.
    pub async fn list_approved_or_fulfilled(&self) -> WorkflowResult<Vec<EmployeeRequest>> {
        let mut requests = self
            .list_where(|r| matches!(r.status(), RequestStatus::Approved | RequestStatus::Fulfilled))
            .await?;
        newest_first(&mut requests);
        Ok(requests)
    }

    /// Items referenced by a request, in line order. Missing items are skipped.
    pub async fn items_of(&self, request: &EmployeeRequest) -> WorkflowResult<Vec<InventoryItem>> {
        let mut items = Vec::with_capacity(request.items().len());
        for line in request.items() {
            match self.ledger.get_item(line.inventory_item).await {
                Ok(item) => items.push(item),
                Err(WorkflowError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(items)
    }

    async fn list_where(&self, keep: impl Fn(&EmployeeRequest) -> bool) -> WorkflowResult<Vec<EmployeeRequest>> {
        Ok(self
            .docs
            .list::<EmployeeRequest>()
            .await?
            .into_iter()
            .map(Versioned::into_inner)
            .filter(|r| keep(r))
            .collect())
    }

    async fn load(&self, id: EmployeeRequestId) -> WorkflowResult<Versioned<EmployeeRequest>> {
        self.docs
            .get::<EmployeeRequest>(id.document_id())
            .await?
            .ok_or_else(|| WorkflowError::not_found(format!("employee request {id}")))
    }

    async fn save(&self, request: &EmployeeRequest, read: &Versioned<EmployeeRequest>) -> WorkflowResult<()> {
        let mut batch = Batch::new();
        batch.update(request, read.expected())?;
        Ok(self.docs.commit(batch).await?)
    }
}

fn newest_first(requests: &mut [EmployeeRequest]) {
    requests.sort_by(|a, b| (b.created_at(), b.id_typed()).cmp(&(a.created_at(), a.id_typed())));
}
