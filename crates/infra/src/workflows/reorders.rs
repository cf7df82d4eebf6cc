//! Supplier reorder workflow: open, decide, fulfill into the ledger.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument};

use laundry_core::Versioned;
use laundry_inventory::InventoryItem;
use laundry_parties::{Supplier, SupplierId};
use laundry_reorder::{NewReorder, ReorderDecision, SupplierOrder, SupplierOrderId};

use crate::error::{WorkflowError, WorkflowResult};
use crate::ledger::StockLedger;
use crate::repository::{Batch, Documents};
use crate::retry::with_retry;

/// A fulfilled reorder together with the ledger entries it touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderFulfillment {
    pub order: SupplierOrder,
    pub items: Vec<InventoryItem>,
    pub created_items: usize,
}

#[derive(Debug, Clone)]
pub struct ReorderWorkflow {
    docs: Documents,
    ledger: StockLedger,
    commit_attempts: u32,
}

impl ReorderWorkflow {
    pub fn new(docs: Documents, ledger: StockLedger, commit_attempts: u32) -> Self {
        Self {
            docs,
            ledger,
            commit_attempts,
        }
    }

    #[instrument(skip(self, input), fields(supplier = %input.supplier, line_count = input.items.len()), err)]
    pub async fn create(&self, input: NewReorder) -> WorkflowResult<SupplierOrder> {
        let supplier = input.supplier;
        let order = SupplierOrder::open(input, Utc::now())?;

        if self.docs.get::<Supplier>(supplier.document_id()).await?.is_none() {
            return Err(WorkflowError::not_found(format!("supplier {supplier}")));
        }

        let mut batch = Batch::new();
        batch.insert(&order)?;
        self.docs.commit(batch).await?;

        info!(reorder_id = %order.id_typed(), %supplier, "reorder request created");
        Ok(order)
    }

    #[instrument(skip(self), err)]
    pub async fn decide(&self, id: SupplierOrderId, decision: ReorderDecision) -> WorkflowResult<SupplierOrder> {
        with_retry("decide_reorder", self.commit_attempts, move || async move {
            let current = self.load(id).await?;
            let mut order = current.doc.clone();
            order.decide(decision, Utc::now())?;

            let mut batch = Batch::new();
            batch.update(&order, current.expected())?;
            self.docs.commit(batch).await?;

            info!(reorder_id = %id, status = %order.status(), "reorder request decided");
            Ok(order)
        })
        .await
    }

    /// Restock every line by name and mark the reorder fulfilled, in one batch.
    #[instrument(skip(self), err)]
    pub async fn fulfill(&self, id: SupplierOrderId) -> WorkflowResult<ReorderFulfillment> {
        with_retry("fulfill_reorder", self.commit_attempts, move || async move {
            let now = Utc::now();
            let current = self.load(id).await?;
            let mut order = current.doc.clone();
            order.fulfill(now)?;

            let mut batch = Batch::new();
            let changes = self
                .ledger
                .plan_restock(&order.restock_lines()?, Some(order.supplier()), &mut batch, now)
                .await?;
            batch.update(&order, current.expected())?;
            self.ledger.commit_allowing_retry(batch).await?;

            self.ledger.publish_alerts(&changes);
            let created_items = changes.iter().filter(|c| c.previous.is_none()).count();
            info!(
                reorder_id = %id,
                restocked = changes.len() - created_items,
                created = created_items,
                "reorder request fulfilled"
            );
            Ok(ReorderFulfillment {
                order,
                items: changes.into_iter().map(|c| c.item).collect(),
                created_items,
            })
        })
        .await
    }

    pub async fn get(&self, id: SupplierOrderId) -> WorkflowResult<SupplierOrder> {
        Ok(self.load(id).await?.into_inner())
    }

    /// All reorders, newest first.
    pub async fn list(&self) -> WorkflowResult<Vec<SupplierOrder>> {
        let mut orders: Vec<_> = self
            .docs
            .list::<SupplierOrder>()
            .await?
            .into_iter()
            .map(Versioned::into_inner)
            .collect();
        orders.sort_by(|a, b| (b.created_at(), b.id_typed()).cmp(&(a.created_at(), a.id_typed())));
        Ok(orders)
    }

    /// Reorders addressed to one supplier, newest first. NotFound if there are none.
    pub async fn list_by_supplier(&self, supplier: SupplierId) -> WorkflowResult<Vec<SupplierOrder>> {
        let orders: Vec<_> = self
            .list()
            .await?
            .into_iter()
            .filter(|o| o.supplier() == supplier)
            .collect();
        if orders.is_empty() {
            return Err(WorkflowError::not_found(format!(
                "reorder requests for supplier {supplier}"
            )));
        }
        Ok(orders)
    }

    async fn load(&self, id: SupplierOrderId) -> WorkflowResult<Versioned<SupplierOrder>> {
        self.docs
            .get::<SupplierOrder>(id.document_id())
            .await?
            .ok_or_else(|| WorkflowError::not_found(format!("reorder request {id}")))
    }
}
