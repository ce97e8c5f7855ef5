//! Waste calculation request as received from the browser.
//!
//! Every field is optional at this level so that a missing value can be
//! reported by name during validation instead of failing deserialization.
//! HTML forms post numbers as strings and flags as `"yes"`, so the
//! deserializers here accept both shapes.

use serde::{Deserialize, Deserializer, Serialize};

/// Which quantity field is authoritative for the run size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityType {
    Pouches,
    Laminate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteCalculationRequest {
    #[serde(default, deserialize_with = "lenient_number")]
    pub pouch_height_mm: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub pouch_width_mm: Option<f64>,

    #[serde(default, deserialize_with = "lenient_flag")]
    pub has_gusset: Option<bool>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub gusset_size_mm: Option<f64>,

    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_five_panel: Option<bool>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub side_panel_width_mm: Option<f64>,

    #[serde(default)]
    pub laminate_structure: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub gsm_area_density: Option<f64>,

    #[serde(default)]
    pub quantity_type: Option<QuantityType>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub pouches_quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub laminate_weight_kg: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberRepr {
    Number(f64),
    Text(String),
}

/// Accepts `true`/`false` or a string; only `"yes"` and `"true"` count as set
fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<FlagRepr>::deserialize(deserializer)?;
    Ok(raw.map(|flag| match flag {
        FlagRepr::Bool(b) => b,
        FlagRepr::Text(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("yes") || s.eq_ignore_ascii_case("true")
        }
    }))
}

/// Accepts a JSON number or a numeric string; an empty string is treated as absent
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<NumberRepr>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(NumberRepr::Number(n)) => Ok(Some(n)),
        Some(NumberRepr::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<f64>()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("'{}' is not a number", s)))
        }
    }
}
