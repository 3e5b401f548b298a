//! Pharmacy inventory store.
//!
//! [`InventoryStore`] is the seam to whatever document store holds stock
//! levels. [`InMemoryInventory`] backs tests and the FFI object.

use std::collections::HashMap;

use thiserror::Error;

use crate::models::{AdjustmentReason, DosageForm, InventoryAdjustment, InventoryItem, StockUnit};

/// Inventory errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("Inventory item not found: {0}")]
    NotFound(String),

    #[error("Adjustment of {change} would take {item_id} below zero (on hand: {on_hand})")]
    Underflow {
        item_id: String,
        on_hand: u32,
        change: i64,
    },
}

pub type InventoryResult<T> = Result<T, InventoryError>;

/// Read/write access to stocked items.
pub trait InventoryStore {
    /// All items, ordered by name.
    fn items(&self) -> Vec<InventoryItem>;

    /// Item by id.
    fn get(&self, item_id: &str) -> Option<InventoryItem>;

    /// Insert or replace an item.
    fn upsert(&mut self, item: InventoryItem);

    /// Apply a signed quantity change and record it.
    fn adjust_quantity(
        &mut self,
        item_id: &str,
        quantity_change: i64,
        reason: AdjustmentReason,
    ) -> InventoryResult<InventoryAdjustment>;
}

/// Items whose name or generic name contains `term`.
pub fn search<S: InventoryStore + ?Sized>(store: &S, term: &str) -> Vec<InventoryItem> {
    store
        .items()
        .into_iter()
        .filter(|item| item.matches_search(term))
        .collect()
}

/// Items at or below their reorder threshold.
pub fn low_stock<S: InventoryStore + ?Sized>(store: &S) -> Vec<InventoryItem> {
    store
        .items()
        .into_iter()
        .filter(InventoryItem::is_low_stock)
        .collect()
}

/// In-memory store with an append-only adjustment log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventory {
    items: HashMap<String, InventoryItem>,
    log: Vec<InventoryAdjustment>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the standard sample formulary.
    pub fn sample() -> Self {
        let mut store = Self::new();
        for item in sample_items() {
            store.upsert(item);
        }
        store
    }

    /// Adjustments in the order they were applied.
    pub fn adjustments(&self) -> &[InventoryAdjustment] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl InventoryStore for InMemoryInventory {
    fn items(&self) -> Vec<InventoryItem> {
        let mut items: Vec<InventoryItem> = self.items.values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        items
    }

    fn get(&self, item_id: &str) -> Option<InventoryItem> {
        self.items.get(item_id).cloned()
    }

    fn upsert(&mut self, item: InventoryItem) {
        self.items.insert(item.id.clone(), item);
    }

    fn adjust_quantity(
        &mut self,
        item_id: &str,
        quantity_change: i64,
        reason: AdjustmentReason,
    ) -> InventoryResult<InventoryAdjustment> {
        let item = self
            .items
            .get_mut(item_id)
            .ok_or_else(|| InventoryError::NotFound(item_id.to_string()))?;

        let updated = i64::from(item.quantity) + quantity_change;
        let quantity = u32::try_from(updated).map_err(|_| InventoryError::Underflow {
            item_id: item_id.to_string(),
            on_hand: item.quantity,
            change: quantity_change,
        })?;

        let now = chrono::Utc::now().to_rfc3339();
        item.quantity = quantity;
        item.updated_at = now.clone();

        let adjustment = InventoryAdjustment {
            adjustment_id: uuid::Uuid::new_v4().to_string(),
            item_id: item_id.to_string(),
            quantity_change,
            reason,
            timestamp: now,
        };
        tracing::info!(
            item_id,
            quantity_change,
            quantity,
            reason = ?reason,
            "Inventory adjusted"
        );
        self.log.push(adjustment.clone());
        Ok(adjustment)
    }
}

/// Descriptive fields of a sample item: (generic name, manufacturer, description).
type SampleLabels<'a> = (&'a str, &'a str, &'a str);

fn sample_item(
    name: &str,
    dosage: &str,
    form: DosageForm,
    unit: StockUnit,
    stock: (u32, u32, u32),
    labels: SampleLabels<'_>,
) -> InventoryItem {
    let (quantity, min_threshold, max_stock) = stock;
    let (generic_name, manufacturer, description) = labels;
    let mut item = InventoryItem::new(name, dosage, form, unit, quantity);
    item.generic_name = Some(generic_name.to_string());
    item.min_threshold = min_threshold;
    item.max_stock = max_stock;
    item.manufacturer = Some(manufacturer.to_string());
    item.description = Some(description.to_string());
    item
}

/// The sample formulary: (quantity, min threshold, max stock) per item.
fn sample_items() -> Vec<InventoryItem> {
    use DosageForm::*;
    vec![
        sample_item(
            "Metformin",
            "500mg",
            Tablet,
            StockUnit::Tablets,
            (150, 50, 200),
            ("Metformin Hydrochloride", "Generic", "Oral diabetes medicine"),
        ),
        sample_item(
            "Lisinopril",
            "10mg",
            Tablet,
            StockUnit::Tablets,
            (75, 30, 100),
            ("Lisinopril", "Generic", "ACE inhibitor for blood pressure"),
        ),
        sample_item(
            "Albuterol Inhaler",
            "90mcg",
            Inhaler,
            StockUnit::Units,
            (25, 10, 50),
            ("Albuterol Sulfate", "Various", "Bronchodilator for asthma"),
        ),
        sample_item(
            "Amoxicillin",
            "500mg",
            Capsule,
            StockUnit::Capsules,
            (200, 40, 300),
            ("Amoxicillin", "Generic", "Antibiotic for bacterial infections"),
        ),
        sample_item(
            "Ibuprofen",
            "400mg",
            Tablet,
            StockUnit::Tablets,
            (120, 25, 150),
            ("Ibuprofen", "Generic", "NSAID for pain and inflammation"),
        ),
        sample_item(
            "Omeprazole",
            "20mg",
            Capsule,
            StockUnit::Capsules,
            (90, 20, 120),
            ("Omeprazole", "Generic", "Proton pump inhibitor for acid reflux"),
        ),
        sample_item(
            "Aspirin",
            "81mg",
            Tablet,
            StockUnit::Tablets,
            (180, 35, 250),
            ("Acetylsalicylic Acid", "Generic", "Antiplatelet medication"),
        ),
        sample_item(
            "Prednisone",
            "5mg",
            Tablet,
            StockUnit::Tablets,
            (60, 15, 80),
            ("Prednisone", "Generic", "Corticosteroid for inflammation"),
        ),
    ]
}
