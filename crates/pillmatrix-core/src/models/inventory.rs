//! Pharmacy inventory models.

use serde::{Deserialize, Serialize};

/// Physical form of a stocked product.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DosageForm {
    Tablet,
    Capsule,
    Liquid,
    Injection,
    Topical,
    Inhaler,
}

/// Unit the stock quantity is counted in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StockUnit {
    Tablets,
    Capsules,
    Ml,
    Mg,
    Units,
}

/// A single stocked product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    /// Store identifier
    pub id: String,
    /// Display/brand name
    pub name: String,
    /// Generic (INN) name
    pub generic_name: Option<String>,
    /// Strength (e.g., "500mg")
    pub dosage: String,
    pub form: DosageForm,
    /// Units on hand
    pub quantity: u32,
    pub unit: StockUnit,
    /// Low-stock threshold (inclusive)
    pub min_threshold: u32,
    pub max_stock: u32,
    pub price: Option<f64>,
    pub expiry_date: Option<String>,
    pub batch_number: Option<String>,
    pub manufacturer: Option<String>,
    pub description: Option<String>,
    /// RFC 3339
    pub created_at: String,
    /// RFC 3339
    pub updated_at: String,
}

impl InventoryItem {
    /// Create a new item with required fields and a fresh id.
    pub fn new(
        name: impl Into<String>,
        dosage: impl Into<String>,
        form: DosageForm,
        unit: StockUnit,
        quantity: u32,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            generic_name: None,
            dosage: dosage.into(),
            form,
            quantity,
            unit,
            min_threshold: 0,
            max_stock: quantity,
            price: None,
            expiry_date: None,
            batch_number: None,
            manufacturer: None,
            description: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// At or below the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_threshold
    }

    /// Case-insensitive equality on name or generic name.
    pub fn matches_name(&self, medication_name: &str) -> bool {
        let wanted = medication_name.trim().to_lowercase();
        self.name.to_lowercase() == wanted
            || self
                .generic_name
                .as_ref()
                .is_some_and(|g| g.to_lowercase() == wanted)
    }

    /// Case-insensitive substring on name or generic name.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term)
            || self
                .generic_name
                .as_ref()
                .is_some_and(|g| g.to_lowercase().contains(&term))
    }
}

/// Why a stock level changed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    StockAddition,
    PrescriptionFulfilled,
    Adjustment,
}

/// Audit record of one stock change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryAdjustment {
    pub adjustment_id: String,
    pub item_id: String,
    /// Signed change applied to the quantity
    pub quantity_change: i64,
    pub reason: AdjustmentReason,
    /// RFC 3339
    pub timestamp: String,
}
