use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::dto;
use crate::app::errors::AppError;
use crate::app::services::AppServices;
use crate::app::view::View;

/// HTML-style listing rendered through the view renderer.
pub async fn show_vet_list(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<axum::response::Response, AppError> {
    let vets = services.vets.find_all().await?;
    let items = vets.iter().map(dto::vet_to_json).collect::<Vec<_>>();
    Ok(services.respond(View::new("vets/vetList").with("vets", items).into()))
}

/// Machine-readable listing: `{"vetList": [...]}`.
pub async fn show_resources_vet_list(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<axum::response::Response, AppError> {
    let vets = services.vets.find_all().await?;
    let items = vets.iter().map(dto::vet_to_json).collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(serde_json::json!({ "vetList": items }))).into_response())
}
