//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use emberfall_core::error::EngineError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),

    /// Engine failure during startup (seeding, bootstrap reads).
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `EngineError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            EngineError::NoAction => (StatusCode::BAD_REQUEST, "no_action"),
            EngineError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            EngineError::CharacterNotFound(_) => (StatusCode::NOT_FOUND, "character_not_found"),
            EngineError::InvalidPhase(_) => (StatusCode::CONFLICT, "invalid_phase"),
            EngineError::Transport(_) => (StatusCode::BAD_GATEWAY, "transport_error"),
            EngineError::Parse(_) => (StatusCode::BAD_GATEWAY, "unusable_payload"),
            EngineError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
        };

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use uuid::Uuid;

    fn status_of(err: EngineError) -> StatusCode {
        let response = ApiError(err).into_response();
        response.status()
    }

    #[test]
    fn test_no_action_maps_to_400() {
        assert_eq!(status_of(EngineError::NoAction), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_character_not_found_maps_to_404() {
        assert_eq!(
            status_of(EngineError::CharacterNotFound(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_invalid_phase_maps_to_409() {
        assert_eq!(
            status_of(EngineError::InvalidPhase("mid-round".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_validation_maps_to_400() {
        assert_eq!(
            status_of(EngineError::Validation("bad input".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_transport_and_parse_map_to_502() {
        assert_eq!(
            status_of(EngineError::Transport("timed out".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(EngineError::Parse("no json".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_store_maps_to_500() {
        assert_eq!(
            status_of(EngineError::Store("db down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
