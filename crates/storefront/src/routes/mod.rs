//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                  - Landing page (video + product cards)
//! POST /buy/{product_id}  - Purchase form submission
//! GET  /thank-you         - Purchase confirmation page
//! GET  /health            - Health check (registered in main)
//! ```

pub mod buy;
pub mod home;
pub mod pages;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/buy/{product_id}", post(buy::submit))
        .route("/thank-you", get(pages::thank_you))
}
