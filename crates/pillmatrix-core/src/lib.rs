//! PillMatrix Core Library
//!
//! Prescription digitization and pharmacy fulfillment for the PillMatrix
//! clinic app.
//!
//! # Architecture
//!
//! ```text
//! Prescription image → OCR text → Medication Line Parser
//!                                         │
//!                              [ParseResult: editable rows]
//!                                         │
//!                                 Doctor reviews/edits
//!                                         │
//!                               PrescriptionDraft → Prescription (pending)
//!                                         │
//!                                 Pharmacist queue
//!                                         │
//!                     ┌───────────────────▼───────────────────┐
//!                     │            Fulfillment                │
//!                     │  qty = days × doses/day (0 = skip)    │
//!                     │  check all lines, then deduct         │
//!                     └───────────────────┬───────────────────┘
//!                                         │
//!                                     Delivered
//! ```
//!
//! # Core Principle
//!
//! **Parsing never fails.** Unreadable text yields an empty result and the
//! form falls back to a blank editable row; the doctor always has the last word.
//!
//! # Modules
//!
//! - [`models`]: Domain types (ParsedMedication, Prescription, InventoryItem, etc.)
//! - [`parser`]: Heuristic line parser for recognized prescription text
//! - [`dosage`]: Dose quantity calculator
//! - [`inventory`]: Inventory store seam and in-memory store
//! - [`fulfillment`]: Availability checks and all-or-nothing delivery

pub mod dosage;
pub mod fulfillment;
pub mod inventory;
pub mod models;
pub mod parser;

// Re-export commonly used types
pub use dosage::calculate_dose_quantity;
pub use fulfillment::{check_availability, deliver, plan_delivery, Availability, DeliveryPlan};
pub use inventory::{InMemoryInventory, InventoryStore};
pub use models::{
    InventoryItem, ParseResult, ParsedMedication, Prescription, PrescriptionDraft,
    PrescriptionStatus,
};
pub use parser::{parse_medications, MedicationParser, ParserConfig};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use models::{DosageForm, InventoryAdjustment, Participant, StockUnit};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PillMatrixError {
    #[error("Inventory error: {0}")]
    InventoryError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Fulfillment error: {0}")]
    FulfillmentError(String),
}

impl From<inventory::InventoryError> for PillMatrixError {
    fn from(e: inventory::InventoryError) -> Self {
        match e {
            inventory::InventoryError::NotFound(id) => PillMatrixError::NotFound(id),
            other => PillMatrixError::InventoryError(other.to_string()),
        }
    }
}

impl From<fulfillment::FulfillmentError> for PillMatrixError {
    fn from(e: fulfillment::FulfillmentError) -> Self {
        PillMatrixError::FulfillmentError(e.to_string())
    }
}

impl From<models::PrescriptionError> for PillMatrixError {
    fn from(e: models::PrescriptionError) -> Self {
        PillMatrixError::InvalidInput(e.to_string())
    }
}

impl From<parser::ConfigError> for PillMatrixError {
    fn from(e: parser::ConfigError) -> Self {
        PillMatrixError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for PillMatrixError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        PillMatrixError::InventoryError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Free Functions (exported to FFI)
// =========================================================================

/// Parse recognized prescription text into medications, diagnosis and notes.
#[uniffi::export]
pub fn parse_prescription_text(text: String) -> FfiParseResult {
    parse_medications(&text).into()
}

/// Parse with a JSON parser configuration; missing fields take their defaults.
#[uniffi::export]
pub fn parse_prescription_text_with_config(
    text: String,
    config_json: String,
) -> Result<FfiParseResult, PillMatrixError> {
    let parser = MedicationParser::with_config(ParserConfig::from_json(&config_json)?)?;
    Ok(parser.parse(&text).into())
}

/// Number of doses needed for a frequency over a duration (0 = not computable).
#[uniffi::export]
pub fn required_dose_quantity(frequency: String, duration: String) -> u32 {
    calculate_dose_quantity(&frequency, &duration)
}

/// Create an empty in-memory inventory.
#[uniffi::export]
pub fn open_inventory_in_memory() -> Arc<PillMatrixCore> {
    Arc::new(PillMatrixCore {
        inventory: Arc::new(Mutex::new(InMemoryInventory::new())),
    })
}

/// Create an in-memory inventory seeded with the sample formulary.
#[uniffi::export]
pub fn open_sample_inventory() -> Arc<PillMatrixCore> {
    Arc::new(PillMatrixCore {
        inventory: Arc::new(Mutex::new(InMemoryInventory::sample())),
    })
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe inventory wrapper for FFI.
#[derive(uniffi::Object)]
pub struct PillMatrixCore {
    inventory: Arc<Mutex<InMemoryInventory>>,
}

#[uniffi::export]
impl PillMatrixCore {
    /// Add or update an inventory item. An empty id gets a fresh one.
    pub fn upsert_inventory_item(
        &self,
        item: FfiInventoryItem,
    ) -> Result<FfiInventoryItem, PillMatrixError> {
        if item.name.trim().is_empty() {
            return Err(PillMatrixError::InvalidInput(
                "Inventory item name is required".into(),
            ));
        }

        let mut store = self.inventory.lock()?;
        let mut stored: InventoryItem = item.into();
        stored.updated_at = chrono::Utc::now().to_rfc3339();
        if let Some(existing) = store.get(&stored.id) {
            stored.created_at = existing.created_at;
        }
        store.upsert(stored.clone());
        Ok(stored.into())
    }

    /// Get an inventory item by id.
    pub fn get_inventory_item(
        &self,
        item_id: String,
    ) -> Result<Option<FfiInventoryItem>, PillMatrixError> {
        let store = self.inventory.lock()?;
        Ok(store.get(&item_id).map(|i| i.into()))
    }

    /// Search inventory by name or generic name.
    pub fn search_inventory(&self, term: String) -> Result<Vec<FfiInventoryItem>, PillMatrixError> {
        let store = self.inventory.lock()?;
        let items = inventory::search(&*store, &term);
        Ok(items.into_iter().map(|i| i.into()).collect())
    }

    /// Items at or below their reorder threshold.
    pub fn low_stock_items(&self) -> Result<Vec<FfiInventoryItem>, PillMatrixError> {
        let store = self.inventory.lock()?;
        let items = inventory::low_stock(&*store);
        Ok(items.into_iter().map(|i| i.into()).collect())
    }

    /// Check stock for one medication.
    pub fn check_availability(
        &self,
        medication_name: String,
        required: u32,
    ) -> Result<FfiAvailability, PillMatrixError> {
        let store = self.inventory.lock()?;
        Ok(check_availability(&*store, &medication_name, required).into())
    }

    /// Save the reviewed parse as a prescription and deliver it from stock.
    ///
    /// Nothing is deducted unless every line can be covered.
    pub fn deliver_prescription(
        &self,
        request: FfiDeliveryRequest,
    ) -> Result<FfiDelivery, PillMatrixError> {
        let result = ParseResult::from(request.parse_result);
        let mut prescription = PrescriptionDraft::from_parse_result(&result, &request.source_text)
            .into_prescription(&request.patient.into(), &request.doctor.into())?;

        let mut store = self.inventory.lock()?;
        let adjustments = deliver(&mut prescription, &mut *store, &request.pharmacist.into())?;
        Ok(FfiDelivery {
            prescription_id: prescription.id,
            adjustments: adjustments.into_iter().map(|a| a.into()).collect(),
        })
    }

    /// Parse result rows for the edit form, with one blank row when empty.
    pub fn editable_medications(&self, result: FfiParseResult) -> Vec<FfiParsedMedication> {
        ParseResult::from(result)
            .editable_medications()
            .into_iter()
            .map(|m| m.into())
            .collect()
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe parsed medication.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiParsedMedication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
}

impl From<ParsedMedication> for FfiParsedMedication {
    fn from(m: ParsedMedication) -> Self {
        Self {
            name: m.name,
            dosage: m.dosage,
            frequency: m.frequency,
            duration: m.duration,
        }
    }
}

impl From<FfiParsedMedication> for ParsedMedication {
    fn from(m: FfiParsedMedication) -> Self {
        ParsedMedication {
            name: m.name,
            dosage: m.dosage,
            frequency: m.frequency,
            duration: m.duration,
        }
    }
}

/// FFI-safe parse result.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiParseResult {
    pub medications: Vec<FfiParsedMedication>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
}

impl From<ParseResult> for FfiParseResult {
    fn from(r: ParseResult) -> Self {
        Self {
            medications: r.medications.into_iter().map(|m| m.into()).collect(),
            diagnosis: r.diagnosis,
            notes: r.notes,
        }
    }
}

impl From<FfiParseResult> for ParseResult {
    fn from(r: FfiParseResult) -> Self {
        ParseResult {
            medications: r.medications.into_iter().map(|m| m.into()).collect(),
            diagnosis: r.diagnosis,
            notes: r.notes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiDosageForm {
    Tablet,
    Capsule,
    Liquid,
    Injection,
    Topical,
    Inhaler,
}

impl From<DosageForm> for FfiDosageForm {
    fn from(form: DosageForm) -> Self {
        match form {
            DosageForm::Tablet => Self::Tablet,
            DosageForm::Capsule => Self::Capsule,
            DosageForm::Liquid => Self::Liquid,
            DosageForm::Injection => Self::Injection,
            DosageForm::Topical => Self::Topical,
            DosageForm::Inhaler => Self::Inhaler,
        }
    }
}

impl From<FfiDosageForm> for DosageForm {
    fn from(form: FfiDosageForm) -> Self {
        match form {
            FfiDosageForm::Tablet => Self::Tablet,
            FfiDosageForm::Capsule => Self::Capsule,
            FfiDosageForm::Liquid => Self::Liquid,
            FfiDosageForm::Injection => Self::Injection,
            FfiDosageForm::Topical => Self::Topical,
            FfiDosageForm::Inhaler => Self::Inhaler,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiStockUnit {
    Tablets,
    Capsules,
    Ml,
    Mg,
    Units,
}

impl From<StockUnit> for FfiStockUnit {
    fn from(unit: StockUnit) -> Self {
        match unit {
            StockUnit::Tablets => Self::Tablets,
            StockUnit::Capsules => Self::Capsules,
            StockUnit::Ml => Self::Ml,
            StockUnit::Mg => Self::Mg,
            StockUnit::Units => Self::Units,
        }
    }
}

impl From<FfiStockUnit> for StockUnit {
    fn from(unit: FfiStockUnit) -> Self {
        match unit {
            FfiStockUnit::Tablets => Self::Tablets,
            FfiStockUnit::Capsules => Self::Capsules,
            FfiStockUnit::Ml => Self::Ml,
            FfiStockUnit::Mg => Self::Mg,
            FfiStockUnit::Units => Self::Units,
        }
    }
}

/// FFI-safe inventory item.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiInventoryItem {
    pub id: String,
    pub name: String,
    pub generic_name: Option<String>,
    pub dosage: String,
    pub form: FfiDosageForm,
    pub quantity: u32,
    pub unit: FfiStockUnit,
    pub min_threshold: u32,
    pub max_stock: u32,
    pub price: Option<f64>,
    pub expiry_date: Option<String>,
    pub batch_number: Option<String>,
    pub manufacturer: Option<String>,
    pub description: Option<String>,
    pub is_low_stock: bool,
}

impl From<InventoryItem> for FfiInventoryItem {
    fn from(item: InventoryItem) -> Self {
        let is_low_stock = item.is_low_stock();
        Self {
            id: item.id,
            name: item.name,
            generic_name: item.generic_name,
            dosage: item.dosage,
            form: item.form.into(),
            quantity: item.quantity,
            unit: item.unit.into(),
            min_threshold: item.min_threshold,
            max_stock: item.max_stock,
            price: item.price,
            expiry_date: item.expiry_date,
            batch_number: item.batch_number,
            manufacturer: item.manufacturer,
            description: item.description,
            is_low_stock,
        }
    }
}

impl From<FfiInventoryItem> for InventoryItem {
    fn from(item: FfiInventoryItem) -> Self {
        let mut stored = InventoryItem::new(
            item.name,
            item.dosage,
            item.form.into(),
            item.unit.into(),
            item.quantity,
        );
        if !item.id.is_empty() {
            stored.id = item.id;
        }
        stored.generic_name = item.generic_name;
        stored.min_threshold = item.min_threshold;
        stored.max_stock = item.max_stock;
        stored.price = item.price;
        stored.expiry_date = item.expiry_date;
        stored.batch_number = item.batch_number;
        stored.manufacturer = item.manufacturer;
        stored.description = item.description;
        stored
    }
}

/// FFI-safe availability check.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiAvailability {
    pub available: bool,
    pub available_quantity: u32,
    pub item_id: Option<String>,
    pub suggestions: Vec<String>,
}

impl From<Availability> for FfiAvailability {
    fn from(a: Availability) -> Self {
        Self {
            available: a.available,
            available_quantity: a.available_quantity,
            item_id: a.item_id,
            suggestions: a.suggestions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiParticipant {
    pub id: String,
    pub name: String,
}

impl From<FfiParticipant> for Participant {
    fn from(p: FfiParticipant) -> Self {
        Participant::new(p.id, p.name)
    }
}

/// Reviewed parse plus the people involved in the delivery.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiDeliveryRequest {
    pub source_text: String,
    pub parse_result: FfiParseResult,
    pub patient: FfiParticipant,
    pub doctor: FfiParticipant,
    pub pharmacist: FfiParticipant,
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiAdjustment {
    pub item_id: String,
    pub quantity_change: i64,
}

impl From<InventoryAdjustment> for FfiAdjustment {
    fn from(a: InventoryAdjustment) -> Self {
        Self {
            item_id: a.item_id,
            quantity_change: a.quantity_change,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiDelivery {
    pub prescription_id: String,
    pub adjustments: Vec<FfiAdjustment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, quantity: u32) -> FfiInventoryItem {
        FfiInventoryItem {
            id: String::new(),
            name: name.into(),
            generic_name: None,
            dosage: "250mg".into(),
            form: FfiDosageForm::Capsule,
            quantity,
            unit: FfiStockUnit::Capsules,
            min_threshold: 20,
            max_stock: 100,
            price: Some(4.5),
            expiry_date: None,
            batch_number: Some("B-104".into()),
            manufacturer: None,
            description: None,
            is_low_stock: false,
        }
    }

    #[test]
    fn test_parse_prescription_text() {
        let result = parse_prescription_text("Amoxicillin 500mg BD x 5 days".into());
        assert_eq!(result.medications.len(), 1);
        assert_eq!(result.medications[0].frequency, "Twice daily");
        assert_eq!(result.medications[0].duration, "5 days");
    }

    #[test]
    fn test_parse_with_config() {
        let config = r#"{"extra_frequencies": [{"keyword": "q8h", "expansion": "Every 8 hours"}]}"#;
        let result =
            parse_prescription_text_with_config("Cefuroxime 250mg q8h".into(), config.into())
                .unwrap();
        assert_eq!(result.medications[0].frequency, "Every 8 hours");

        assert!(matches!(
            parse_prescription_text_with_config("Cefuroxime 250mg".into(), "{oops".into()),
            Err(PillMatrixError::InvalidInput(_))
        ));
    }

    fn participant(id: &str, name: &str) -> FfiParticipant {
        FfiParticipant {
            id: id.into(),
            name: name.into(),
        }
    }

    fn delivery_request(text: &str, parse_result: FfiParseResult) -> FfiDeliveryRequest {
        FfiDeliveryRequest {
            source_text: text.into(),
            parse_result,
            patient: participant("pat-1", "Jane Doe"),
            doctor: participant("doc-1", "Dr. Smith"),
            pharmacist: participant("ph-1", "Sam Pharmacist"),
        }
    }

    #[test]
    fn test_deliver_prescription() {
        let core = open_sample_inventory();
        let text = "Diagnosis: Sinusitis\nAmoxicillin 500mg BD x 5 days";

        let delivery = core
            .deliver_prescription(delivery_request(text, parse_prescription_text(text.into())))
            .unwrap();
        assert!(!delivery.prescription_id.is_empty());
        assert_eq!(delivery.adjustments.len(), 1);
        assert_eq!(delivery.adjustments[0].quantity_change, -10);

        let amoxicillin = core.search_inventory("amoxicillin".into()).unwrap();
        assert_eq!(amoxicillin[0].quantity, 190);
    }

    #[test]
    fn test_deliver_prescription_errors() {
        let core = open_sample_inventory();

        // No diagnosis
        let text = "Amoxicillin 500mg BD x 5 days";
        assert!(matches!(
            core.deliver_prescription(delivery_request(text, parse_prescription_text(text.into()))),
            Err(PillMatrixError::InvalidInput(_))
        ));

        let text = "Dx: Asthma\nAlbuterol Inhaler 90mcg QID x 30 days";
        assert!(matches!(
            core.deliver_prescription(delivery_request(text, parse_prescription_text(text.into()))),
            Err(PillMatrixError::FulfillmentError(_))
        ));
        let inhaler = core.search_inventory("albuterol".into()).unwrap();
        assert_eq!(inhaler[0].quantity, 25);
    }

    #[test]
    fn test_required_dose_quantity() {
        assert_eq!(required_dose_quantity("Twice daily".into(), "2 weeks".into()), 28);
        assert_eq!(required_dose_quantity("As needed".into(), "30 days".into()), 0);
    }

    #[test]
    fn test_upsert_and_get() {
        let core = open_inventory_in_memory();

        let stored = core.upsert_inventory_item(item("Cefalexin", 15)).unwrap();
        assert!(!stored.id.is_empty());
        assert!(stored.is_low_stock);

        let fetched = core.get_inventory_item(stored.id.clone()).unwrap().unwrap();
        assert_eq!(fetched.batch_number.as_deref(), Some("B-104"));

        let mut restocked = fetched;
        restocked.quantity = 90;
        core.upsert_inventory_item(restocked).unwrap();
        assert_eq!(core.search_inventory("cefa".into()).unwrap().len(), 1);
        assert!(core.low_stock_items().unwrap().is_empty());

        assert!(core.get_inventory_item("missing".into()).unwrap().is_none());
    }

    #[test]
    fn test_upsert_requires_name() {
        let core = open_inventory_in_memory();
        assert!(matches!(
            core.upsert_inventory_item(item("  ", 10)),
            Err(PillMatrixError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_sample_inventory_availability() {
        let core = open_sample_inventory();

        let found = core.check_availability("Metformin".into(), 60).unwrap();
        assert!(found.available);

        let missing = core.check_availability("Metformn".into(), 60).unwrap();
        assert!(!missing.available);
        assert_eq!(missing.suggestions.first().map(String::as_str), Some("Metformin"));
    }

    #[test]
    fn test_editable_medications() {
        let core = open_inventory_in_memory();
        let rows = core.editable_medications(parse_prescription_text("Rx".into()));
        assert_eq!(rows.len(), 1);
        assert!(rows[0].name.is_empty());
        assert!(rows[0].frequency.is_empty());
    }
}
