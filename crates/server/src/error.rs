use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use showscout_core::error::{ApiError, ErrorEnvelope};

/// Newtype wrapper so we can implement `IntoResponse` in this crate.
pub struct AppError(pub ApiError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let envelope = ErrorEnvelope::from(&self.0);
        (status, Json(envelope)).into_response()
    }
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        Self(e)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        Self(ApiError::Internal(format!("db error: {e}")))
    }
}
