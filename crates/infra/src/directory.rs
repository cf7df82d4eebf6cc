//! Suppliers and customer orders: the records the workflows look up.

use chrono::Utc;
use tracing::{info, instrument};

use laundry_core::{UserId, Versioned};
use laundry_orders::{NewServiceOrder, OrderId, ServiceOrder};
use laundry_parties::{NewSupplier, Supplier, SupplierId};

use crate::error::{WorkflowError, WorkflowResult};
use crate::repository::{Batch, Documents};
use crate::retry::with_retry;
use crate::store::StoreError;

#[derive(Debug, Clone)]
pub struct Directory {
    docs: Documents,
    commit_attempts: u32,
}

impl Directory {
    pub fn new(docs: Documents, commit_attempts: u32) -> Self {
        Self { docs, commit_attempts }
    }

    #[instrument(skip(self, input), fields(email = %input.email), err)]
    pub async fn register_supplier(&self, input: NewSupplier) -> WorkflowResult<Supplier> {
        let supplier = Supplier::register(input, Utc::now())?;

        let mut batch = Batch::new();
        batch.insert(&supplier)?;
        match self.docs.commit(batch).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                return Err(WorkflowError::conflict(format!(
                    "a supplier with email {} already exists",
                    supplier.email()
                )));
            }
            Err(e) => return Err(e.into()),
        }

        info!(supplier_id = %supplier.id_typed(), company = %supplier.company_name(), "supplier registered");
        Ok(supplier)
    }

    pub async fn get_supplier(&self, id: SupplierId) -> WorkflowResult<Supplier> {
        self.docs
            .get::<Supplier>(id.document_id())
            .await?
            .map(Versioned::into_inner)
            .ok_or_else(|| WorkflowError::not_found(format!("supplier {id}")))
    }

    /// All suppliers, ordered by company name.
    pub async fn list_suppliers(&self) -> WorkflowResult<Vec<Supplier>> {
        let mut suppliers: Vec<_> = self
            .docs
            .list::<Supplier>()
            .await?
            .into_iter()
            .map(Versioned::into_inner)
            .collect();
        suppliers.sort_by(|a, b| a.company_name().cmp(b.company_name()));
        Ok(suppliers)
    }

    #[instrument(skip(self, input), fields(customer = %input.customer), err)]
    pub async fn place_order(&self, input: NewServiceOrder) -> WorkflowResult<ServiceOrder> {
        let order = ServiceOrder::place(input, Utc::now());

        let mut batch = Batch::new();
        batch.insert(&order)?;
        self.docs.commit(batch).await?;

        info!(order_id = %order.id_typed(), "order placed");
        Ok(order)
    }

    #[instrument(skip(self), err)]
    pub async fn assign_order(&self, id: OrderId, employee: UserId) -> WorkflowResult<ServiceOrder> {
        with_retry("assign_order", self.commit_attempts, move || async move {
            let current = self.load_order(id).await?;
            let mut order = current.doc.clone();
            order.assign(employee, Utc::now())?;

            let mut batch = Batch::new();
            batch.update(&order, current.expected())?;
            self.docs.commit(batch).await?;

            info!(order_id = %id, %employee, "order assigned");
            Ok(order)
        })
        .await
    }

    pub async fn get_order(&self, id: OrderId) -> WorkflowResult<ServiceOrder> {
        Ok(self.load_order(id).await?.into_inner())
    }

    async fn load_order(&self, id: OrderId) -> WorkflowResult<Versioned<ServiceOrder>> {
        self.docs
            .get::<ServiceOrder>(id.document_id())
            .await?
            .ok_or_else(|| WorkflowError::not_found(format!("order {id}")))
    }
}
