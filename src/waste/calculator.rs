//! Pouch waste calculation
//!
//! Pipeline: validate → pouch area → total run area and effective quantity →
//! tier lookup → per-stage waste area → mass conversion → rounded result.
//!
//! All arithmetic happens on unrounded values in [`WasteBreakdown`]; rounding
//! is applied once when the [`WasteCalculationResult`] is assembled.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::request::WasteCalculationRequest;
use super::tiers::{
    tier_for_quantity, WasteTier, LAMINATION_DISPLAY_PERCENTAGE, LAMINATION_WASTE_FRACTION,
    SLITTING_DISPLAY_PERCENTAGE, SLITTING_WASTE_FRACTION,
};
use super::validation::{validate, PouchSpec, RunQuantity, ValidationError};

const MM2_PER_M2: f64 = 1_000_000.0;
const GRAMS_PER_KG: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Computation produced a non-finite {quantity}; check input magnitudes")]
    Computation { quantity: &'static str },
}

/// Waste for a single production stage (or the total)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageWaste {
    pub area_m2: f64,
    pub mass_kg: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteCalculationResult {
    pub pouch_area_mm2: f64,
    pub pouch_area_m2: f64,
    pub total_area_m2: f64,
    pub total_laminate_kg: f64,
    pub calculated_pouches: u64,
    pub waste_tier: u8,
    pub laminate_structure: String,
    pub printing: StageWaste,
    pub lamination: StageWaste,
    pub slitting: StageWaste,
    pub pouching: StageWaste,
    pub total: StageWaste,
}

/// Unrounded intermediate values of a calculation
#[derive(Debug, Clone, PartialEq)]
pub struct WasteBreakdown {
    pub pouch_area_mm2: f64,
    pub pouch_area_m2: f64,
    pub total_area_m2: f64,
    pub effective_quantity: u64,
    pub tier: &'static WasteTier,
    pub gsm: f64,
    pub printing_m2: f64,
    pub lamination_m2: f64,
    pub slitting_m2: f64,
    pub pouching_m2: f64,
    pub total_waste_m2: f64,
}

impl WasteBreakdown {
    /// Convert an area in m² to kg using the laminate's area density
    pub fn mass_kg(&self, area_m2: f64) -> f64 {
        area_to_kg(area_m2, self.gsm)
    }

    pub fn total_laminate_kg(&self) -> f64 {
        self.mass_kg(self.total_area_m2)
    }

    pub fn total_waste_percentage(&self) -> f64 {
        self.total_waste_m2 / self.total_area_m2 * 100.0
    }
}

/// Validate a request and compute its waste estimate
pub fn calculate(request: &WasteCalculationRequest) -> Result<WasteCalculationResult, CalculationError> {
    let spec = validate(request)?;
    let breakdown = compute_breakdown(&spec)?;

    tracing::debug!(
        tier = breakdown.tier.tier,
        effective_quantity = breakdown.effective_quantity,
        total_area_m2 = breakdown.total_area_m2,
        "Computed pouch waste"
    );

    assemble_result(&spec, &breakdown)
}

/// Compute unrounded areas and quantities for a validated spec
pub fn compute_breakdown(spec: &PouchSpec) -> Result<WasteBreakdown, CalculationError> {
    let pouch_area_mm2 = finite(spec.geometry.area_mm2(spec.height_mm, spec.width_mm), "pouch area")?;
    let pouch_area_m2 = pouch_area_mm2 / MM2_PER_M2;
    if pouch_area_m2 <= 0.0 {
        // Underflow from tiny dimensions
        return Err(CalculationError::Computation { quantity: "pouch area" });
    }

    let (total_area_m2, effective_quantity) = match spec.quantity {
        RunQuantity::Pouches(count) => (pouch_area_m2 * count as f64, count),
        RunQuantity::LaminateWeightKg(kg) => {
            let total = finite(kg * GRAMS_PER_KG / spec.gsm, "total laminate area")?;
            let pouches = finite((total / pouch_area_m2).round_ties_even(), "pouch count")?;
            if pouches >= u64::MAX as f64 {
                return Err(CalculationError::Computation { quantity: "pouch count" });
            }
            (total, pouches as u64)
        }
    };
    let total_area_m2 = finite(total_area_m2, "total laminate area")?;

    let tier = tier_for_quantity(effective_quantity);

    let printing_m2 = total_area_m2 * tier.printing_fraction;
    let lamination_m2 = total_area_m2 * LAMINATION_WASTE_FRACTION;
    let slitting_m2 = total_area_m2 * SLITTING_WASTE_FRACTION;
    let pouching_m2 = total_area_m2 * tier.pouching_fraction;
    let total_waste_m2 = finite(
        printing_m2 + lamination_m2 + slitting_m2 + pouching_m2,
        "total waste area",
    )?;

    Ok(WasteBreakdown {
        pouch_area_mm2,
        pouch_area_m2,
        total_area_m2,
        effective_quantity,
        tier,
        gsm: spec.gsm,
        printing_m2,
        lamination_m2,
        slitting_m2,
        pouching_m2,
        total_waste_m2,
    })
}

fn assemble_result(
    spec: &PouchSpec,
    b: &WasteBreakdown,
) -> Result<WasteCalculationResult, CalculationError> {
    let stage = |area_m2: f64, percentage: f64| StageWaste {
        area_m2: round_to(area_m2, 2),
        mass_kg: round_to(b.mass_kg(area_m2), 2),
        percentage: round_to(percentage, 2),
    };

    let total_laminate_kg = finite(b.total_laminate_kg(), "total laminate mass")?;
    finite(b.mass_kg(b.total_waste_m2), "total waste mass")?;

    Ok(WasteCalculationResult {
        pouch_area_mm2: round_to(b.pouch_area_mm2, 2),
        pouch_area_m2: round_to(b.pouch_area_m2, 4),
        total_area_m2: round_to(b.total_area_m2, 2),
        total_laminate_kg: round_to(total_laminate_kg, 2),
        calculated_pouches: b.effective_quantity,
        waste_tier: b.tier.tier,
        laminate_structure: spec.laminate_structure.clone(),
        printing: stage(b.printing_m2, b.tier.printing_fraction * 100.0),
        lamination: stage(b.lamination_m2, LAMINATION_DISPLAY_PERCENTAGE),
        slitting: stage(b.slitting_m2, SLITTING_DISPLAY_PERCENTAGE),
        pouching: stage(b.pouching_m2, b.tier.pouching_fraction * 100.0),
        total: stage(b.total_waste_m2, b.total_waste_percentage()),
    })
}

/// Mass in kg of `area_m2` square meters at `gsm` grams per square meter
pub fn area_to_kg(area_m2: f64, gsm: f64) -> f64 {
    area_m2 * gsm / GRAMS_PER_KG
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    if !scaled.is_finite() {
        // Magnitudes this large carry no fractional digits
        return value;
    }
    scaled.round() / factor
}

fn finite(value: f64, quantity: &'static str) -> Result<f64, CalculationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalculationError::Computation { quantity })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waste::request::QuantityType;
    use approx::assert_relative_eq;

    fn request(height: f64, width: f64, quantity: f64) -> WasteCalculationRequest {
        WasteCalculationRequest {
            pouch_height_mm: Some(height),
            pouch_width_mm: Some(width),
            has_gusset: Some(false),
            is_five_panel: Some(false),
            laminate_structure: Some("PET12/ALU9/PE80".to_string()),
            gsm_area_density: Some(40.0),
            quantity_type: Some(QuantityType::Pouches),
            pouches_quantity: Some(quantity),
            ..Default::default()
        }
    }

    #[test]
    fn test_reference_scenario() {
        // 200 × 150 mm flat pouch, 40 gsm, 5000 pouches
        let result = calculate(&request(200.0, 150.0, 5000.0)).unwrap();

        assert_eq!(result.pouch_area_mm2, 30000.00);
        assert_eq!(result.pouch_area_m2, 0.03);
        assert_eq!(result.total_area_m2, 150.00);
        assert_eq!(result.total_laminate_kg, 6.00);
        assert_eq!(result.calculated_pouches, 5000);
        assert_eq!(result.waste_tier, 1);

        assert_eq!(result.printing.area_m2, 300.00);
        assert_eq!(result.printing.mass_kg, 12.00);
        assert_eq!(result.printing.percentage, 200.00);

        assert_eq!(result.lamination.area_m2, 30.00);
        assert_eq!(result.lamination.percentage, 2.0);
        assert_eq!(result.slitting.area_m2, 22.50);
        assert_eq!(result.slitting.percentage, 0.75);
        assert_eq!(result.pouching.area_m2, 300.00);

        // 300 + 30 + 22.5 + 300
        assert_eq!(result.total.area_m2, 652.50);
        assert_eq!(result.total.mass_kg, 26.10);
        assert_eq!(result.total.percentage, 435.00);
        assert_eq!(result.laminate_structure, "PET12/ALU9/PE80");
    }

    #[test]
    fn test_gusseted_area() {
        let req = WasteCalculationRequest {
            has_gusset: Some(true),
            gusset_size_mm: Some(60.0),
            ..request(200.0, 150.0, 1000.0)
        };
        let result = calculate(&req).unwrap();
        assert_eq!(result.pouch_area_mm2, 200.0 * (150.0 + 60.0));
        assert_eq!(result.pouch_area_m2, 0.042);
    }

    #[test]
    fn test_five_panel_area_ignores_gusset() {
        let req = WasteCalculationRequest {
            has_gusset: Some(true),
            gusset_size_mm: Some(60.0),
            is_five_panel: Some(true),
            side_panel_width_mm: Some(40.0),
            ..request(250.0, 120.0, 1000.0)
        };
        let result = calculate(&req).unwrap();
        assert_eq!(result.pouch_area_mm2, 250.0 * (120.0 + 2.0 * 40.0));
    }

    #[test]
    fn test_laminate_quantity_derives_pouch_count() {
        // 6 kg at 40 gsm = 150 m² = 5000 pouches of 0.03 m²
        let req = WasteCalculationRequest {
            quantity_type: Some(QuantityType::Laminate),
            pouches_quantity: None,
            laminate_weight_kg: Some(6.0),
            ..request(200.0, 150.0, 0.0)
        };
        let result = calculate(&req).unwrap();
        assert_eq!(result.total_area_m2, 150.0);
        assert_eq!(result.calculated_pouches, 5000);
        assert_eq!(result.total_laminate_kg, 6.0);
        assert_eq!(result.waste_tier, 1);
    }

    #[test]
    fn test_laminate_pouch_count_rounds_to_nearest() {
        // 1 kg at 40 gsm = 25 m²; 25 / 0.03 = 833.33 → 833
        let req = WasteCalculationRequest {
            quantity_type: Some(QuantityType::Laminate),
            laminate_weight_kg: Some(1.0),
            ..request(200.0, 150.0, 1.0)
        };
        let result = calculate(&req).unwrap();
        assert_eq!(result.calculated_pouches, 833);
        assert_relative_eq!(result.total_area_m2, 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_tier_selection_at_boundaries() {
        let tier_of = |qty: f64| calculate(&request(100.0, 100.0, qty)).unwrap();

        let r = tier_of(10_000.0);
        assert_eq!(r.waste_tier, 1);
        assert_eq!(r.printing.percentage, 200.0);

        let r = tier_of(10_001.0);
        assert_eq!(r.waste_tier, 2);
        assert_eq!(r.printing.percentage, 30.0);
        assert_eq!(r.pouching.percentage, 20.0);

        assert_eq!(tier_of(50_000.0).waste_tier, 2);

        let r = tier_of(50_001.0);
        assert_eq!(r.waste_tier, 3);
        assert_eq!(r.printing.percentage, 10.0);
        assert_eq!(r.pouching.percentage, 10.0);
    }

    #[test]
    fn test_total_waste_is_exact_stage_sum() {
        let spec = validate(&request(173.0, 91.0, 23_457.0)).unwrap();
        let b = compute_breakdown(&spec).unwrap();
        assert_eq!(
            b.total_waste_m2,
            b.printing_m2 + b.lamination_m2 + b.slitting_m2 + b.pouching_m2
        );
    }

    #[test]
    fn test_mass_conversion() {
        assert_relative_eq!(area_to_kg(150.0, 40.0), 6.0, epsilon = 1e-12);
        assert_relative_eq!(area_to_kg(1.0, 1000.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_idempotent() {
        let req = request(210.0, 140.0, 12_345.0);
        assert_eq!(calculate(&req).unwrap(), calculate(&req).unwrap());
    }

    #[test]
    fn test_validation_errors_propagate() {
        let req = WasteCalculationRequest {
            has_gusset: Some(true),
            ..request(200.0, 150.0, 5000.0)
        };
        match calculate(&req) {
            Err(CalculationError::Validation(e)) => assert_eq!(e.field(), "gussetSizeMm"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_overflow_is_computation_error() {
        let req = request(f64::MAX, f64::MAX, 5000.0);
        assert_eq!(
            calculate(&req),
            Err(CalculationError::Computation { quantity: "pouch area" })
        );
    }

    #[test]
    fn test_huge_finite_run_stays_finite() {
        // Totals near f64::MAX overflow when scaled for rounding
        let req = WasteCalculationRequest {
            pouch_height_mm: Some(1e150),
            pouch_width_mm: Some(1e144),
            gsm_area_density: Some(1.0),
            quantity_type: Some(QuantityType::Laminate),
            pouches_quantity: None,
            laminate_weight_kg: Some(1e304),
            ..request(1.0, 1.0, 1.0)
        };
        let result = calculate(&req).unwrap();

        assert_relative_eq!(result.total_area_m2, 1e307, max_relative = 1e-12);
        assert_relative_eq!(result.total.area_m2, 5.5e306, max_relative = 1e-12);
        assert_eq!(result.waste_tier, 3);
        for stage in [&result.printing, &result.lamination, &result.slitting, &result.pouching, &result.total] {
            assert!(stage.area_m2.is_finite());
            assert!(stage.mass_kg.is_finite());
        }

        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("null"), "non-finite value serialized: {}", json);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(0.03456, 4), 0.0346);
        assert_eq!(round_to(652.5, 2), 652.5);
        assert_eq!(round_to(1e307, 2), 1e307);
    }
}
