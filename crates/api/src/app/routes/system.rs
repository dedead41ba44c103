use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode};

use crate::app::services::AppServices;
use crate::app::view::View;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn welcome(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    services.respond(View::new("welcome").into())
}
