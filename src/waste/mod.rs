//! Pouch material waste estimation
//!
//! - `request`: loosely-typed input as posted by the browser
//! - `validation`: presence, positivity and geometry resolution
//! - `tiers`: run-size waste tiers and fixed stage fractions
//! - `calculator`: areas, per-stage waste, mass conversion
//!
//! The whole module is pure and synchronous; nothing here performs I/O.

pub mod calculator;
pub mod request;
pub mod tiers;
pub mod validation;

pub use calculator::{
    area_to_kg, calculate, compute_breakdown, CalculationError, StageWaste, WasteBreakdown,
    WasteCalculationResult,
};
pub use request::{QuantityType, WasteCalculationRequest};
pub use tiers::{tier_for_quantity, WasteTier};
pub use validation::{validate, PouchGeometry, PouchSpec, RunQuantity, ValidationError};
