//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: repository and renderer wiring
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: form DTOs, binding, and JSON mapping helpers
//! - `view.rs`: view outcomes and their rendering
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;
pub mod view;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: services::AppServices) -> Router {
    let services = Arc::new(services);

    routes::router().layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn(middleware::request_id))
            .layer(Extension(services)),
    )
}
