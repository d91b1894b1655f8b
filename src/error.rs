//! API error type — maps service failures onto HTTP statuses.
//!
//! Conflict on a duplicate achievement unlock never appears here: it is
//! absorbed inside achievement storage (`INSERT OR IGNORE`), so handlers
//! only ever see the four variants below.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or missing fields/identifiers in the request.
    #[error("validation: {0}")]
    Validation(String),

    /// Referenced user or meal does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A downstream collaborator (AI endpoint) is unreachable or timed out.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn statuses_match_error_kinds() {
        let cases = [
            (
                ApiError::Validation("calories must be >= 0".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::NotFound("meal abc".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Unavailable("coach endpoint".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
