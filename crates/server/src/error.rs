use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{ephemeris::EphemerisError, event_resolver::ResolvedEvent};
use thiserror::Error;
use tracing::error;
use utils::{date_key::InvalidDateFormat, response::ApiResponse};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),
    #[error(transparent)]
    InvalidDate(#[from] InvalidDateFormat),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ApiError::Ephemeris(err) => match err {
                EphemerisError::InvalidDate(_) => (StatusCode::BAD_REQUEST, "InvalidDateFormat"),
                EphemerisError::ContentRejected(_) => (StatusCode::BAD_REQUEST, "ContentRejected"),
                EphemerisError::GenerationExhausted { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "GenerationExhausted")
                }
                EphemerisError::PersistenceFailure { .. } | EphemerisError::Store(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "PersistenceFailure")
                }
            },
            ApiError::InvalidDate(_) => (StatusCode::BAD_REQUEST, "InvalidDateFormat"),
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
        };

        if status_code.is_server_error() {
            error!(error_type, error = %self, "Request failed");
        }

        let error_message = match &self {
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::Database(_) => "Database error".to_string(),
            _ => self.to_string(),
        };

        // A resolved but unstored event is still worth showing.
        if let ApiError::Ephemeris(EphemerisError::PersistenceFailure { event, .. }) = &self {
            let response = ApiResponse::<(), ResolvedEvent>::error_with_data(&error_message, event.clone());
            return (status_code, Json(response)).into_response();
        }

        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}
