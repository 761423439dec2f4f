use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// ApiError
///
/// Failure of a data operation behind an already-authorized request. Every
/// variant renders as a JSON `{ "error": ... }` body so the admin views can
/// show the message instead of failing silently.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("database unavailable")]
    Database(#[from] sqlx::Error),
    #[error("storage unavailable")]
    Storage(String),
    #[error("identity provider unavailable")]
    Upstream(String),
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) | ApiError::NotConfigured(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Storage(_) | ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Details stay in the logs; clients get the display message only.
        match &self {
            ApiError::Database(e) => tracing::error!("database error: {:?}", e),
            ApiError::Storage(e) => tracing::error!("storage error: {}", e),
            ApiError::Upstream(e) => tracing::error!("identity provider error: {}", e),
            ApiError::NotConfigured(what) => tracing::error!("{} is not configured", what),
            _ => {}
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
