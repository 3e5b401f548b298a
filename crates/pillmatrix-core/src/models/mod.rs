//! Domain models for the PillMatrix prescription core.

mod inventory;
mod medication;
mod prescription;

pub use inventory::*;
pub use medication::*;
pub use prescription::*;
