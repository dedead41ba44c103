use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use petclinic_core::DomainError;
use petclinic_infra::RepositoryError;

/// Failures that abort a request instead of re-rendering a form.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::Domain(DomainError::not_found(what))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::Domain(DomainError::InvalidId(msg)) => {
                json_error(StatusCode::NOT_FOUND, "not_found", msg)
            }
            AppError::Domain(DomainError::NotFound(what)) => {
                json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
            }
            AppError::Repository(RepositoryError::NotFound(what)) => {
                json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
            }
            AppError::Repository(e) => {
                tracing::error!(error = %e, "storage failure");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
            }
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
