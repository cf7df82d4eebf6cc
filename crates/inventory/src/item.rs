use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use laundry_core::{Document, DocumentId, DomainError, DomainResult};
use laundry_parties::SupplierId;

use crate::status::{StockStatus, derive_status};

laundry_core::document_id!(
    /// Inventory item identifier.
    InventoryItemId
);

/// Inventory category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Cleaning,
    Packaging,
    #[serde(rename = "Personal Care")]
    PersonalCare,
    Linens,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Cleaning,
        Category::Packaging,
        Category::PersonalCare,
        Category::Linens,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Cleaning => "Cleaning",
            Category::Packaging => "Packaging",
            Category::PersonalCare => "Personal Care",
            Category::Linens => "Linens",
            Category::Other => "Other",
        }
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::validation(format!("unknown category: {s}")))
    }
}

/// Unit of measure for stock quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Liters,
    Pieces,
    Kg,
    Boxes,
    Units,
}

impl Unit {
    pub const ALL: [Unit; 5] = [Unit::Liters, Unit::Pieces, Unit::Kg, Unit::Boxes, Unit::Units];

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Liters => "liters",
            Unit::Pieces => "pieces",
            Unit::Kg => "kg",
            Unit::Boxes => "boxes",
            Unit::Units => "units",
        }
    }
}

impl FromStr for Unit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Unit::ALL
            .into_iter()
            .find(|u| u.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::validation(format!("unknown unit: {s}")))
    }
}

/// Input for creating an item by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInventoryItem {
    pub name: String,
    pub category: Category,
    pub current_stock: i64,
    pub reorder_level: i64,
    pub unit: Unit,
    pub supplier: Option<SupplierId>,
}

/// Manual edit. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub current_stock: Option<i64>,
    pub reorder_level: Option<i64>,
    pub unit: Option<Unit>,
    pub supplier: Option<SupplierId>,
}

impl ItemUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ItemUpdate::default()
    }
}

/// One delivered line that lands in the ledger by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestockLine {
    pub name: String,
    pub category: Category,
    pub quantity: i64,
    pub unit: Unit,
}

/// Reorder level for an item first created by a delivery: `ceil(0.3 * quantity)`, at least 1.
pub fn restock_reorder_level(quantity: i64) -> i64 {
    (quantity.saturating_mul(3).saturating_add(9) / 10).max(1)
}

/// A stock ledger entry.
///
/// `status` is stored for readers of the document but is rewritten from
/// `derive_status` on every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    id: InventoryItemId,
    name: String,
    category: Category,
    current_stock: i64,
    reorder_level: i64,
    unit: Unit,
    supplier: Option<SupplierId>,
    last_restocked: DateTime<Utc>,
    status: StockStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn create(input: NewInventoryItem, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = validate_name(&input.name)?;
        validate_stock(input.current_stock)?;
        validate_reorder_level(input.reorder_level)?;

        Ok(Self {
            id: InventoryItemId::new(),
            name,
            category: input.category,
            current_stock: input.current_stock,
            reorder_level: input.reorder_level,
            unit: input.unit,
            supplier: input.supplier,
            last_restocked: now,
            status: derive_status(input.current_stock, input.reorder_level),
            created_at: now,
            updated_at: now,
        })
    }

    /// New entry for a delivered name that the ledger has never seen.
    pub fn from_restock(
        line: &RestockLine,
        supplier: Option<SupplierId>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        validate_quantity(line.quantity)?;
        Self::create(
            NewInventoryItem {
                name: line.name.clone(),
                category: line.category,
                current_stock: line.quantity,
                reorder_level: restock_reorder_level(line.quantity),
                unit: line.unit,
                supplier,
            },
            now,
        )
    }

    pub fn id_typed(&self) -> InventoryItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn current_stock(&self) -> i64 {
        self.current_stock
    }

    pub fn reorder_level(&self) -> i64 {
        self.reorder_level
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn supplier(&self) -> Option<SupplierId> {
        self.supplier
    }

    pub fn last_restocked(&self) -> DateTime<Utc> {
        self.last_restocked
    }

    pub fn status(&self) -> StockStatus {
        derive_status(self.current_stock, self.reorder_level)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Apply a manual edit. Every field is validated before anything changes.
    pub fn apply_update(&mut self, update: ItemUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        let name = update.name.as_deref().map(validate_name).transpose()?;
        if let Some(stock) = update.current_stock {
            validate_stock(stock)?;
        }
        if let Some(level) = update.reorder_level {
            validate_reorder_level(level)?;
        }

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(stock) = update.current_stock {
            self.current_stock = stock;
        }
        if let Some(level) = update.reorder_level {
            self.reorder_level = level;
        }
        if let Some(unit) = update.unit {
            self.unit = unit;
        }
        if let Some(supplier) = update.supplier {
            self.supplier = Some(supplier);
        }
        self.touch(now);
        Ok(())
    }

    /// Signed manual correction.
    pub fn adjust(&mut self, delta: i64, now: DateTime<Utc>) -> DomainResult<()> {
        if delta == 0 {
            return Err(DomainError::validation("delta cannot be zero"));
        }
        let new_stock = self
            .current_stock
            .checked_add(delta)
            .ok_or_else(|| DomainError::validation("delta out of range"))?;
        if new_stock < 0 {
            return Err(DomainError::conflict(format!(
                "stock for {} cannot go negative (current: {}, delta: {delta})",
                self.name, self.current_stock
            )));
        }
        self.current_stock = new_stock;
        self.touch(now);
        Ok(())
    }

    /// Take stock out for a fulfilled request.
    pub fn withdraw(&mut self, quantity: i64, now: DateTime<Utc>) -> DomainResult<()> {
        validate_quantity(quantity)?;
        self.ensure_available(quantity)?;
        self.current_stock -= quantity;
        self.touch(now);
        Ok(())
    }

    /// Put delivered stock in.
    pub fn restock(&mut self, quantity: i64, now: DateTime<Utc>) -> DomainResult<()> {
        validate_quantity(quantity)?;
        self.current_stock = self
            .current_stock
            .checked_add(quantity)
            .ok_or_else(|| DomainError::validation("quantity out of range"))?;
        self.last_restocked = now;
        self.touch(now);
        Ok(())
    }

    /// Conflict if fewer than `quantity` units are on hand.
    pub fn ensure_available(&self, quantity: i64) -> DomainResult<()> {
        if quantity > self.current_stock {
            return Err(DomainError::conflict(format!(
                "not enough stock for {} (requested: {quantity}, available: {})",
                self.name, self.current_stock
            )));
        }
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.status = derive_status(self.current_stock, self.reorder_level);
        self.updated_at = now;
    }
}

impl Document for InventoryItem {
    const COLLECTION: &'static str = "inventory";

    fn document_id(&self) -> DocumentId {
        self.id.document_id()
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.name.clone())
    }
}

fn validate_name(name: &str) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn validate_stock(stock: i64) -> DomainResult<()> {
    if stock < 0 {
        return Err(DomainError::validation("currentStock cannot be negative"));
    }
    Ok(())
}

fn validate_reorder_level(level: i64) -> DomainResult<()> {
    if level < 1 {
        return Err(DomainError::validation("reorderLevel must be at least 1"));
    }
    Ok(())
}

fn validate_quantity(quantity: i64) -> DomainResult<()> {
    if quantity < 1 {
        return Err(DomainError::validation("quantity must be at least 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_time() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn detergent(stock: i64, level: i64) -> InventoryItem {
        InventoryItem::create(
            NewInventoryItem {
                name: " Detergent ".to_string(),
                category: Category::Cleaning,
                current_stock: stock,
                reorder_level: level,
                unit: Unit::Liters,
                supplier: None,
            },
            test_time(),
        )
        .unwrap()
    }

    #[test]
    fn create_trims_name_and_derives_status() {
        let item = detergent(5, 10);
        assert_eq!(item.name(), "Detergent");
        assert_eq!(item.status(), StockStatus::Low);
        assert_eq!(item.unique_key().as_deref(), Some("Detergent"));
    }

    #[test]
    fn create_rejects_out_of_range_values() {
        let base = NewInventoryItem {
            name: "Hangers".to_string(),
            category: Category::Packaging,
            current_stock: 1,
            reorder_level: 1,
            unit: Unit::Pieces,
            supplier: None,
        };

        for bad in [
            NewInventoryItem { name: "   ".to_string(), ..base.clone() },
            NewInventoryItem { current_stock: -1, ..base.clone() },
            NewInventoryItem { reorder_level: 0, ..base.clone() },
        ] {
            assert!(matches!(
                InventoryItem::create(bad, test_time()),
                Err(DomainError::Validation(_))
            ));
        }
    }

    #[test]
    fn withdraw_beyond_stock_is_conflict_and_leaves_item_untouched() {
        let mut item = detergent(5, 10);
        let before = item.clone();
        let err = item.withdraw(6, test_time()).unwrap_err();
        assert_eq!(
            err,
            DomainError::conflict("not enough stock for Detergent (requested: 6, available: 5)")
        );
        assert_eq!(item, before);
    }

    #[test]
    fn withdraw_to_zero_is_critical() {
        let mut item = detergent(5, 10);
        item.withdraw(5, test_time()).unwrap();
        assert_eq!(item.current_stock(), 0);
        assert_eq!(item.status(), StockStatus::Critical);
    }

    #[test]
    fn adjust_rejects_zero_and_negative_results() {
        let mut item = detergent(3, 10);
        assert!(matches!(item.adjust(0, test_time()), Err(DomainError::Validation(_))));
        assert!(matches!(item.adjust(-4, test_time()), Err(DomainError::Conflict(_))));
        item.adjust(-3, test_time()).unwrap();
        assert_eq!(item.current_stock(), 0);
    }

    #[test]
    fn restock_sets_last_restocked() {
        let mut item = detergent(1, 10);
        let later = test_time() + chrono::Duration::days(2);
        item.restock(30, later).unwrap();
        assert_eq!(item.current_stock(), 31);
        assert_eq!(item.last_restocked(), later);
        assert_eq!(item.status(), StockStatus::High);
    }

    #[test]
    fn update_is_all_or_nothing() {
        let mut item = detergent(5, 10);
        let before = item.clone();
        let err = item
            .apply_update(
                ItemUpdate {
                    name: Some("Softener".to_string()),
                    reorder_level: Some(0),
                    ..ItemUpdate::default()
                },
                test_time(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(item, before);
    }

    #[test]
    fn update_recomputes_status() {
        let mut item = detergent(5, 10);
        item.apply_update(
            ItemUpdate {
                reorder_level: Some(2),
                ..ItemUpdate::default()
            },
            test_time(),
        )
        .unwrap();
        assert_eq!(item.status(), StockStatus::Adequate);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["status"], "Adequate");
        assert_eq!(json["reorderLevel"], 2);
    }

    #[test]
    fn restocked_new_name_gets_thirty_percent_reorder_level() {
        let line = RestockLine {
            name: "Bleach".to_string(),
            category: Category::Cleaning,
            quantity: 20,
            unit: Unit::Liters,
        };
        let item = InventoryItem::from_restock(&line, None, test_time()).unwrap();
        assert_eq!(item.current_stock(), 20);
        assert_eq!(item.reorder_level(), 6);
        assert_eq!(item.status(), StockStatus::High);
    }

    #[test]
    fn category_and_unit_parse_their_labels() {
        assert_eq!("personal care".parse::<Category>().unwrap(), Category::PersonalCare);
        assert_eq!("KG".parse::<Unit>().unwrap(), Unit::Kg);
        assert!(matches!("Soap".parse::<Category>(), Err(DomainError::Validation(_))));
        assert!(matches!("gallons".parse::<Unit>(), Err(DomainError::Validation(_))));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Adjust(i64),
        Withdraw(i64),
        Restock(i64),
        SetLevel(i64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (-50i64..50).prop_map(Op::Adjust),
            (-5i64..50).prop_map(Op::Withdraw),
            (-5i64..50).prop_map(Op::Restock),
            (-5i64..50).prop_map(Op::SetLevel),
        ]
    }

    proptest! {
        #[test]
        fn reorder_level_is_ceiling_of_thirty_percent(q in 1i64..1_000_000) {
            let level = restock_reorder_level(q);
            prop_assert!(level * 10 >= q * 3);
            prop_assert!((level - 1) * 10 < q * 3);
        }

        #[test]
        fn every_mutation_keeps_status_derived_and_stock_non_negative(
            stock in 0i64..100,
            level in 1i64..50,
            ops in proptest::collection::vec(op_strategy(), 0..40),
        ) {
            let mut item = detergent(stock, level);
            for op in ops {
                let _ = match op {
                    Op::Adjust(d) => item.adjust(d, test_time()),
                    Op::Withdraw(q) => item.withdraw(q, test_time()),
                    Op::Restock(q) => item.restock(q, test_time()),
                    Op::SetLevel(l) => item.apply_update(
                        ItemUpdate { reorder_level: Some(l), ..ItemUpdate::default() },
                        test_time(),
                    ),
                };
                prop_assert!(item.current_stock() >= 0);
                prop_assert!(item.reorder_level() >= 1);
                prop_assert_eq!(item.status, derive_status(item.current_stock(), item.reorder_level()));
            }
        }
    }
}
