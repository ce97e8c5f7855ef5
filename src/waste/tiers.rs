//! Production-volume waste tiers
//!
//! Maps the effective pouch count of a run to the scrap fractions applied at
//! the printing and pouching stages. Lamination and slitting use fixed
//! fractions regardless of run size.
//!
//! Fractions multiply the total laminate area directly: tier 1's 2.00 means
//! twice the run area is scrapped at each of those stages. The table reads
//! like percentages (2% / 0.3% ...) but downstream figures use these
//! magnitudes; do not rescale without coordinating.

/// Waste fractions for one run-size bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WasteTier {
    pub tier: u8,
    /// Inclusive upper bound on effective quantity; `None` for the last tier
    pub max_quantity: Option<u64>,
    pub printing_fraction: f64,
    pub pouching_fraction: f64,
}

static WASTE_TIERS: &[WasteTier] = &[
    WasteTier { tier: 1, max_quantity: Some(10_000), printing_fraction: 2.00, pouching_fraction: 2.00 },
    WasteTier { tier: 2, max_quantity: Some(50_000), printing_fraction: 0.30, pouching_fraction: 0.20 },
    WasteTier { tier: 3, max_quantity: None, printing_fraction: 0.10, pouching_fraction: 0.10 },
];

pub const LAMINATION_WASTE_FRACTION: f64 = 0.20;
pub const SLITTING_WASTE_FRACTION: f64 = 0.15;

// Percentages shown to users for lamination and slitting. Not derived from
// the fractions above (20% and 15%).
pub const LAMINATION_DISPLAY_PERCENTAGE: f64 = 2.0;
pub const SLITTING_DISPLAY_PERCENTAGE: f64 = 0.75;

/// Find the tier for an effective pouch count.
///
/// # Examples
/// ```
/// use pouch_advisor::waste::tiers::tier_for_quantity;
///
/// assert_eq!(tier_for_quantity(10_000).tier, 1);
/// assert_eq!(tier_for_quantity(10_001).tier, 2);
/// assert_eq!(tier_for_quantity(50_001).tier, 3);
/// ```
pub fn tier_for_quantity(quantity: u64) -> &'static WasteTier {
    WASTE_TIERS
        .iter()
        .find(|t| t.max_quantity.map_or(true, |max| quantity <= max))
        .unwrap_or(&WASTE_TIERS[WASTE_TIERS.len() - 1])
}
