//! Stock ledger: the persisted inventory and every way it changes.
//!
//! Manual operations (create, update, adjust, delete) commit on their own.
//! Workflows call `plan_withdrawals` / `plan_restock` to stage item writes into
//! their own batch, commit, then hand the changes back to `publish_alerts`.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use laundry_core::Versioned;
use laundry_inventory::{
    InventoryItem, InventoryItemId, ItemUpdate, NewInventoryItem, RestockLine, StockStatus,
};
use laundry_parties::{Supplier, SupplierId};
use laundry_requests::EmployeeRequest;

use crate::error::{WorkflowError, WorkflowResult};
use crate::notify::{StockAlert, StockAlertSink};
use crate::repository::{Batch, Documents};
use crate::retry::with_retry;

/// An item write staged in a batch, with the tier it started from.
///
/// `previous` is `None` for an item created by the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockChange {
    pub previous: Option<StockStatus>,
    pub item: InventoryItem,
}

#[derive(Clone)]
pub struct StockLedger {
    docs: Documents,
    alerts: Arc<dyn StockAlertSink>,
    commit_attempts: u32,
}

impl StockLedger {
    pub fn new(docs: Documents, alerts: Arc<dyn StockAlertSink>, commit_attempts: u32) -> Self {
        Self {
            docs,
            alerts,
            commit_attempts,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, id: InventoryItemId) -> WorkflowResult<InventoryItem> {
        Ok(self.load(id).await?.into_inner())
    }

    /// All items, ordered by name.
    pub async fn list_items(&self) -> WorkflowResult<Vec<InventoryItem>> {
        let mut items: Vec<_> = self
            .docs
            .list::<InventoryItem>()
            .await?
            .into_iter()
            .map(Versioned::into_inner)
            .collect();
        items.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(items)
    }

    #[instrument(skip(self, input), fields(name = %input.name), err)]
    pub async fn create_item(&self, input: NewInventoryItem) -> WorkflowResult<InventoryItem> {
        if let Some(supplier) = input.supplier {
            self.require_supplier(supplier).await?;
        }
        let item = InventoryItem::create(input, Utc::now())?;
        self.ensure_name_free(item.name(), None).await?;

        let mut batch = Batch::new();
        batch.insert(&item)?;
        self.docs.commit(batch).await?;

        info!(item_id = %item.id_typed(), item = %item.name(), status = %item.status(), "inventory item created");
        Ok(item)
    }

    #[instrument(skip(self, update), err)]
    pub async fn update_item(&self, id: InventoryItemId, update: ItemUpdate) -> WorkflowResult<InventoryItem> {
        if update.is_empty() {
            return Err(WorkflowError::Validation("update must change at least one field".to_string()));
        }
        if let Some(supplier) = update.supplier {
            self.require_supplier(supplier).await?;
        }

        with_retry("update_item", self.commit_attempts, move || {
            let update = update.clone();
            async move {
                let current = self.load(id).await?;
                let previous = current.doc.status();
                let mut item = current.doc.clone();
                item.apply_update(update, Utc::now())?;
                if item.name() != current.doc.name() {
                    self.ensure_name_free(item.name(), Some(id)).await?;
                }

                let mut batch = Batch::new();
                batch.update(&item, current.expected())?;
                self.docs.commit(batch).await?;

                self.publish_alerts(&[StockChange {
                    previous: Some(previous),
                    item: item.clone(),
                }]);
                info!(item_id = %id, status = %item.status(), "inventory item updated");
                Ok(item)
            }
        })
        .await
    }

    #[instrument(skip(self), err)]
    pub async fn adjust_stock(&self, id: InventoryItemId, delta: i64) -> WorkflowResult<InventoryItem> {
        with_retry("adjust_stock", self.commit_attempts, move || async move {
            let current = self.load(id).await?;
            let previous = current.doc.status();
            let mut item = current.doc.clone();
            item.adjust(delta, Utc::now())?;

            let mut batch = Batch::new();
            batch.update(&item, current.expected())?;
            self.docs.commit(batch).await?;

            self.publish_alerts(&[StockChange {
                previous: Some(previous),
                item: item.clone(),
            }]);
            info!(item_id = %id, delta, current_stock = item.current_stock(), status = %item.status(), "stock adjusted");
            Ok(item)
        })
        .await
    }

    /// Delete an item unless an open employee request still needs it.
    ///
    /// Request creation rewrites every item it references (see
    /// [`StockLedger::plan_references`]), so a request committed after the scan
    /// fails this delete's version check and the scan runs again.
    #[instrument(skip(self), err)]
    pub async fn delete_item(&self, id: InventoryItemId) -> WorkflowResult<()> {
        with_retry("delete_item", self.commit_attempts, move || async move {
            let current = self.load(id).await?;

            let blocking = self
                .docs
                .list::<EmployeeRequest>()
                .await?
                .into_iter()
                .find(|r| r.doc.is_open() && r.doc.references_item(id));
            if let Some(request) = blocking {
                return Err(WorkflowError::conflict(format!(
                    "{} is referenced by open request {}",
                    current.doc.name(),
                    request.doc.id_typed()
                )));
            }

            let mut batch = Batch::new();
            batch.delete::<InventoryItem>(id.document_id(), current.expected());
            self.docs.commit(batch).await?;

            info!(item_id = %id, item = %current.doc.name(), "inventory item deleted");
            Ok(())
        })
        .await
    }

    /// Stage an unchanged rewrite of each item at the version just read.
    ///
    /// The batch then fails if any of the items is changed or deleted before it
    /// commits. Returns the items as read, keyed by id.
    pub async fn plan_references(
        &self,
        ids: impl IntoIterator<Item = InventoryItemId>,
        batch: &mut Batch,
    ) -> WorkflowResult<BTreeMap<InventoryItemId, InventoryItem>> {
        let mut items = BTreeMap::new();
        for id in ids {
            if items.contains_key(&id) {
                continue;
            }
            let current = self.load(id).await?;
            batch.update(&current.doc, current.expected())?;
            items.insert(id, current.into_inner());
        }
        Ok(items)
    }

    /// Add `line.quantity` to the item named `line.name`, creating it if the name is new.
    #[instrument(skip(self, line), fields(name = %line.name, quantity = line.quantity), err)]
    pub async fn find_or_create_by_name(
        &self,
        line: RestockLine,
        supplier: Option<SupplierId>,
    ) -> WorkflowResult<InventoryItem> {
        let lines: &[RestockLine] = &[line];
        with_retry("find_or_create_by_name", self.commit_attempts, move || async move {
            let mut batch = Batch::new();
            let changes = self.plan_restock(lines, supplier, &mut batch, Utc::now()).await?;
            self.commit_allowing_retry(batch).await?;
            self.publish_alerts(&changes);
            changes
                .into_iter()
                .next()
                .map(|c| c.item)
                .ok_or_else(|| WorkflowError::Internal("restock produced no ledger entry".to_string()))
        })
        .await
    }

    /// Stage withdrawals of `totals` into `batch`.
    ///
    /// NotFound if an item is gone; Conflict if any total exceeds the stock on hand.
    pub async fn plan_withdrawals(
        &self,
        totals: &BTreeMap<InventoryItemId, i64>,
        batch: &mut Batch,
        now: DateTime<Utc>,
    ) -> WorkflowResult<Vec<StockChange>> {
        let mut changes = Vec::with_capacity(totals.len());
        for (&id, &quantity) in totals {
            let current = self.load(id).await?;
            let previous = current.doc.status();
            let mut item = current.doc.clone();
            item.withdraw(quantity, now)?;
            batch.update(&item, current.expected())?;
            changes.push(StockChange {
                previous: Some(previous),
                item,
            });
        }
        Ok(changes)
    }

    /// Stage restocks into `batch`, resolving each line by exact name.
    ///
    /// Lines with the same name must already be merged.
    pub async fn plan_restock(
        &self,
        lines: &[RestockLine],
        supplier: Option<SupplierId>,
        batch: &mut Batch,
        now: DateTime<Utc>,
    ) -> WorkflowResult<Vec<StockChange>> {
        let mut changes = Vec::with_capacity(lines.len());
        for line in lines {
            let change = match self.docs.find_by_key::<InventoryItem>(line.name.trim()).await? {
                Some(current) => {
                    let previous = current.doc.status();
                    let mut item = current.doc.clone();
                    item.restock(line.quantity, now)?;
                    batch.update(&item, current.expected())?;
                    StockChange {
                        previous: Some(previous),
                        item,
                    }
                }
                None => {
                    let item = InventoryItem::from_restock(line, supplier, now)?;
                    batch.insert(&item)?;
                    StockChange { previous: None, item }
                }
            };
            changes.push(change);
        }
        Ok(changes)
    }

    /// Commit a batch that may insert new items by name.
    ///
    /// A duplicate name here means a concurrent writer created the same item
    /// first, so the attempt is retried from a fresh read.
    pub async fn commit_allowing_retry(&self, batch: Batch) -> WorkflowResult<()> {
        match self.docs.commit(batch).await {
            Ok(()) => Ok(()),
            Err(crate::store::StoreError::Duplicate(msg)) => Err(WorkflowError::Concurrency(msg)),
            Err(e) => Err(e.into()),
        }
    }

    /// Publish an alert for every change that dropped into a reorder tier.
    pub fn publish_alerts(&self, changes: &[StockChange]) {
        let now = Utc::now();
        for change in changes {
            if let Some(previous) = change.previous {
                if let Some(alert) = StockAlert::for_transition(previous, &change.item, now) {
                    self.alerts.publish(alert);
                }
            }
        }
    }

    async fn load(&self, id: InventoryItemId) -> WorkflowResult<Versioned<InventoryItem>> {
        self.docs
            .get::<InventoryItem>(id.document_id())
            .await?
            .ok_or_else(|| WorkflowError::not_found(format!("inventory item {id}")))
    }

    async fn ensure_name_free(&self, name: &str, except: Option<InventoryItemId>) -> WorkflowResult<()> {
        match self.docs.find_by_key::<InventoryItem>(name).await? {
            Some(existing) if Some(existing.doc.id_typed()) != except => Err(WorkflowError::conflict(format!(
                "an inventory item named {name} already exists"
            ))),
            _ => Ok(()),
        }
    }

    async fn require_supplier(&self, id: SupplierId) -> WorkflowResult<()> {
        self.docs
            .get::<Supplier>(id.document_id())
            .await?
            .map(|_| ())
            .ok_or_else(|| WorkflowError::not_found(format!("supplier {id}")))
    }
}

impl core::fmt::Debug for StockLedger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StockLedger")
            .field("commit_attempts", &self.commit_attempts)
            .finish_non_exhaustive()
    }
}
