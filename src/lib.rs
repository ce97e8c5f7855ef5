//! Pouch Advisor
//!
//! Flexible-packaging helper service:
//! - `waste/`: pouch material waste estimation (pure, synchronous)
//! - `prompts`: recommendation and follow-up prompt construction
//! - `conversation`: recommendation sessions and their TTL-bounded store
//! - `ai_client`: text generation provider seam and Gemini client
//! - `api_server` / `web/`: Axum HTTP surface and index page
//!
//! The server stack is behind the `api` feature (on by default); the waste
//! engine and prompt builder build without it.

pub mod conversation;
pub mod prompts;
pub mod waste;

#[cfg(feature = "api")]
pub mod ai_client;

#[cfg(feature = "api")]
pub mod api_server;

#[cfg(feature = "api")]
pub mod config;

#[cfg(feature = "api")]
pub mod markdown;

#[cfg(feature = "api")]
pub mod web;

// Re-export commonly used types
pub use waste::{calculate, CalculationError, ValidationError, WasteCalculationRequest, WasteCalculationResult};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
