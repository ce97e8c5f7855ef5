//! Request validation
//!
//! Converts a loosely-typed [`WasteCalculationRequest`] into a [`PouchSpec`]
//! whose fields are all present, finite and strictly positive. Presence is
//! checked for every field first (unconditional, then geometry, then quantity)
//! so the reported field is the first one a user would need to fill in.

use thiserror::Error;

use super::request::{QuantityType, WasteCalculationRequest};

/// Largest integer an f64 represents exactly (2^53)
const MAX_EXACT_QUANTITY: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Field {field} must be a positive number")]
    NotPositive { field: &'static str },

    #[error("Field {field} must be a whole number")]
    NotWholeNumber { field: &'static str },
}

impl ValidationError {
    /// Name of the offending request field (camelCase, as posted)
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::NotPositive { field }
            | ValidationError::NotWholeNumber { field } => field,
        }
    }
}

/// Pouch construction, resolved with five-panel taking precedence over gusset
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PouchGeometry {
    FivePanel { side_panel_width_mm: f64 },
    Gusseted { gusset_size_mm: f64 },
    Flat,
}

impl PouchGeometry {
    /// Flat film area of one pouch in mm²
    pub fn area_mm2(&self, height_mm: f64, width_mm: f64) -> f64 {
        match *self {
            PouchGeometry::FivePanel { side_panel_width_mm } => {
                height_mm * (width_mm + 2.0 * side_panel_width_mm)
            }
            PouchGeometry::Gusseted { gusset_size_mm } => height_mm * (width_mm + gusset_size_mm),
            PouchGeometry::Flat => height_mm * width_mm,
        }
    }
}

/// Production run size
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunQuantity {
    Pouches(u64),
    LaminateWeightKg(f64),
}

/// Fully validated pouch specification
#[derive(Debug, Clone, PartialEq)]
pub struct PouchSpec {
    pub height_mm: f64,
    pub width_mm: f64,
    pub geometry: PouchGeometry,
    pub laminate_structure: String,
    pub gsm: f64,
    pub quantity: RunQuantity,
}

pub fn validate(request: &WasteCalculationRequest) -> Result<PouchSpec, ValidationError> {
    // Step 1: unconditionally required fields
    let height = require(request.pouch_height_mm, "pouchHeightMm")?;
    let width = require(request.pouch_width_mm, "pouchWidthMm")?;
    let has_gusset = require(request.has_gusset, "hasGusset")?;
    let is_five_panel = require(request.is_five_panel, "isFivePanel")?;
    let laminate_structure = request
        .laminate_structure
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::MissingField { field: "laminateStructure" })?;
    let gsm = require(request.gsm_area_density, "gsmAreaDensity")?;
    let quantity_type = require(request.quantity_type, "quantityType")?;

    // Step 2: geometry-dependent fields
    let gusset_size = if has_gusset {
        Some(require(request.gusset_size_mm, "gussetSizeMm")?)
    } else {
        None
    };
    let side_panel_width = if is_five_panel {
        Some(require(request.side_panel_width_mm, "sidePanelWidthMm")?)
    } else {
        None
    };

    // Step 3: quantity-dependent fields
    let raw_quantity = match quantity_type {
        QuantityType::Pouches => require(request.pouches_quantity, "pouchesQuantity")?,
        QuantityType::Laminate => require(request.laminate_weight_kg, "laminateWeightKg")?,
    };

    // Step 4: positivity and integrality
    positive(height, "pouchHeightMm")?;
    positive(width, "pouchWidthMm")?;
    positive(gsm, "gsmAreaDensity")?;

    let geometry = match (side_panel_width, gusset_size) {
        (Some(side), gusset) => {
            positive(side, "sidePanelWidthMm")?;
            if gusset.is_some() {
                tracing::debug!("Both five-panel and gusset set; using five-panel geometry");
            }
            PouchGeometry::FivePanel { side_panel_width_mm: side }
        }
        (None, Some(gusset)) => {
            positive(gusset, "gussetSizeMm")?;
            PouchGeometry::Gusseted { gusset_size_mm: gusset }
        }
        (None, None) => PouchGeometry::Flat,
    };

    let quantity = match quantity_type {
        QuantityType::Pouches => {
            positive(raw_quantity, "pouchesQuantity")?;
            if raw_quantity.fract() != 0.0 || raw_quantity > MAX_EXACT_QUANTITY {
                return Err(ValidationError::NotWholeNumber { field: "pouchesQuantity" });
            }
            RunQuantity::Pouches(raw_quantity as u64)
        }
        QuantityType::Laminate => {
            positive(raw_quantity, "laminateWeightKg")?;
            RunQuantity::LaminateWeightKg(raw_quantity)
        }
    };

    Ok(PouchSpec {
        height_mm: height,
        width_mm: width,
        geometry,
        laminate_structure: laminate_structure.to_string(),
        gsm,
        quantity,
    })
}

fn require<T>(value: Option<T>, field: &'static str) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::MissingField { field })
}

fn positive(value: f64, field: &'static str) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NotPositive { field })
    }
}
