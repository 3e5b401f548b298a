//! Prescription fulfillment against pharmacy inventory.
//!
//! Delivery is all-or-nothing: [`plan_delivery`] checks every line before
//! [`deliver`] deducts anything, and a store write that fails midway reverses
//! the deductions already made. Lines whose quantity cannot be computed
//! (0 from the calculator) are carried through untouched.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, normalized_levenshtein};
use thiserror::Error;

use crate::dosage::calculate_dose_quantity;
use crate::inventory::{InventoryError, InventoryStore};
use crate::models::{
    AdjustmentReason, InventoryAdjustment, Participant, Prescription, PrescriptionError,
    PrescriptionStatus,
};

/// Minimum similarity for an inventory name to be offered as a suggestion.
pub const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Maximum number of suggestions returned for an unmatched name.
pub const MAX_SUGGESTIONS: usize = 3;

/// Fulfillment errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FulfillmentError {
    #[error("Prescription is {0:?} and cannot be delivered")]
    NotDeliverable(PrescriptionStatus),

    #[error("Insufficient stock: {}", join_shortages(.0))]
    InsufficientStock(Vec<Shortage>),

    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    #[error("Prescription error: {0}")]
    Prescription(#[from] PrescriptionError),
}

pub type FulfillmentResult<T> = Result<T, FulfillmentError>;

/// Stock check for one medication name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Availability {
    pub available: bool,
    pub available_quantity: u32,
    /// Matched inventory item, if any
    pub item_id: Option<String>,
    /// Close inventory names when nothing matched exactly, best first
    pub suggestions: Vec<String>,
}

/// A medication that cannot be covered by stock on hand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Shortage {
    pub medication_name: String,
    pub available: u32,
    pub required: u32,
}

impl fmt::Display for Shortage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} available, {} needed",
            self.medication_name, self.available, self.required
        )
    }
}

fn join_shortages(shortages: &[Shortage]) -> String {
    shortages
        .iter()
        .map(Shortage::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// What delivery will do with one medication line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LineStatus {
    /// Deduct `quantity` from this item
    Deduct { item_id: String },
    /// Quantity could not be computed; nothing is deducted
    NotComputed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryLine {
    pub medication_name: String,
    pub quantity: u32,
    pub status: LineStatus,
}

/// Checked plan for delivering a prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryPlan {
    pub prescription_id: String,
    pub lines: Vec<DeliveryLine>,
}

impl DeliveryPlan {
    /// (item id, quantity) pairs to deduct, in line order.
    pub fn deductions(&self) -> impl Iterator<Item = (&str, u32)> {
        self.lines.iter().filter_map(|line| match &line.status {
            LineStatus::Deduct { item_id } => Some((item_id.as_str(), line.quantity)),
            LineStatus::NotComputed => None,
        })
    }
}

/// Look up a medication by exact name and compare against `required`.
pub fn check_availability<S: InventoryStore + ?Sized>(
    store: &S,
    medication_name: &str,
    required: u32,
) -> Availability {
    let items = store.items();

    if let Some(item) = items.iter().find(|i| i.matches_name(medication_name)) {
        return Availability {
            available: item.quantity >= required,
            available_quantity: item.quantity,
            item_id: Some(item.id.clone()),
            suggestions: Vec::new(),
        };
    }

    let query = medication_name.trim().to_lowercase();
    let mut scored: Vec<(f64, &str)> = items
        .iter()
        .map(|i| (fuzzy_match(&query, &i.name.to_lowercase()), i.name.as_str()))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    Availability {
        available: false,
        available_quantity: 0,
        item_id: None,
        suggestions: scored
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, name)| name.to_string())
            .collect(),
    }
}

/// Check every medication line of an open prescription against stock.
pub fn plan_delivery<S: InventoryStore + ?Sized>(
    prescription: &Prescription,
    store: &S,
) -> FulfillmentResult<DeliveryPlan> {
    if !prescription.status.is_open() {
        return Err(FulfillmentError::NotDeliverable(prescription.status));
    }

    // Quantity already claimed by earlier lines, per item
    let mut claimed: HashMap<String, u32> = HashMap::new();
    let mut lines = Vec::with_capacity(prescription.medications.len());
    let mut shortages = Vec::new();

    for medication in &prescription.medications {
        let quantity = calculate_dose_quantity(&medication.frequency, &medication.duration);
        if quantity == 0 {
            lines.push(DeliveryLine {
                medication_name: medication.name.clone(),
                quantity,
                status: LineStatus::NotComputed,
            });
            continue;
        }

        let availability = check_availability(store, &medication.name, quantity);
        let item_id = match availability.item_id {
            Some(item_id) => item_id,
            None => {
                tracing::warn!(
                    medication = %medication.name,
                    required = quantity,
                    "Medication not stocked"
                );
                shortages.push(Shortage {
                    medication_name: medication.name.clone(),
                    available: 0,
                    required: quantity,
                });
                continue;
            }
        };

        let already = claimed.get(&item_id).copied().unwrap_or(0);
        let remaining = availability.available_quantity.saturating_sub(already);
        if remaining < quantity {
            tracing::warn!(
                medication = %medication.name,
                available = remaining,
                required = quantity,
                "Insufficient stock"
            );
            shortages.push(Shortage {
                medication_name: medication.name.clone(),
                available: remaining,
                required: quantity,
            });
            continue;
        }

        claimed.insert(item_id.clone(), already + quantity);
        lines.push(DeliveryLine {
            medication_name: medication.name.clone(),
            quantity,
            status: LineStatus::Deduct { item_id },
        });
    }

    if !shortages.is_empty() {
        return Err(FulfillmentError::InsufficientStock(shortages));
    }

    Ok(DeliveryPlan {
        prescription_id: prescription.id.clone(),
        lines,
    })
}

/// Deduct stock for every computed line and mark the prescription delivered.
pub fn deliver<S: InventoryStore + ?Sized>(
    prescription: &mut Prescription,
    store: &mut S,
    pharmacist: &Participant,
) -> FulfillmentResult<Vec<InventoryAdjustment>> {
    let plan = plan_delivery(prescription, store)?;

    let mut adjustments = Vec::new();
    for (item_id, quantity) in plan.deductions() {
        match store.adjust_quantity(
            item_id,
            -i64::from(quantity),
            AdjustmentReason::PrescriptionFulfilled,
        ) {
            Ok(adjustment) => adjustments.push(adjustment),
            Err(e) => {
                roll_back(store, &adjustments);
                return Err(e.into());
            }
        }
    }

    if let Err(e) = prescription.transition(PrescriptionStatus::Delivered, pharmacist) {
        roll_back(store, &adjustments);
        return Err(e.into());
    }
    tracing::info!(
        prescription_id = %prescription.id,
        deductions = adjustments.len(),
        "Prescription delivered"
    );
    Ok(adjustments)
}

/// Reverse applied deductions, newest first.
fn roll_back<S: InventoryStore + ?Sized>(store: &mut S, applied: &[InventoryAdjustment]) {
    for adjustment in applied.iter().rev() {
        let restore = -adjustment.quantity_change;
        if let Err(e) =
            store.adjust_quantity(&adjustment.item_id, restore, AdjustmentReason::Adjustment)
        {
            tracing::error!(
                item_id = %adjustment.item_id,
                quantity_change = restore,
                error = %e,
                "Failed to restore stock after aborted delivery"
            );
        }
    }
    if !applied.is_empty() {
        tracing::warn!(restored = applied.len(), "Delivery aborted; deductions reversed");
    }
}

/// Calculate fuzzy match score between two strings.
fn fuzzy_match(a: &str, b: &str) -> f64 {
    let jw = jaro_winkler(a, b);
    let lev = normalized_levenshtein(a, b);

    jw * 0.6 + lev * 0.4
}
