// Page handlers for HTML rendering with Askama

use askama::Template;
use axum::response::{Html, IntoResponse};

// ============================================================================
// Index Page
// ============================================================================

const PRODUCT_CATEGORIES: &[&str] = &[
    "Snacks",
    "Coffee",
    "Confectionery",
    "Dairy",
    "Frozen Food",
    "Pet Food",
    "Pharmaceuticals",
    "Personal Care",
    "Liquids",
];

const PRINTING_TYPES: &[&str] = &["Rotogravure", "Flexographic", "Digital"];

const LAYER_OPTIONS: &[&str] = &["2", "3", "4", "5"];

const LANGUAGES: &[&str] = &["English", "Hindi"];

#[derive(Template)]
#[template(path = "pages/index.html")]
pub struct IndexTemplate {
    pub title: String,
    pub product_categories: Vec<&'static str>,
    pub printing_types: Vec<&'static str>,
    pub layer_options: Vec<&'static str>,
    pub languages: Vec<&'static str>,
}

pub async fn index_page() -> impl IntoResponse {
    let template = IndexTemplate {
        title: "Flexible Packaging Advisor".to_string(),
        product_categories: PRODUCT_CATEGORIES.to_vec(),
        printing_types: PRINTING_TYPES.to_vec(),
        layer_options: LAYER_OPTIONS.to_vec(),
        languages: LANGUAGES.to_vec(),
    };
    Html(template.render().unwrap_or_else(|e| {
        format!("Template error: {}", e)
    }))
}
