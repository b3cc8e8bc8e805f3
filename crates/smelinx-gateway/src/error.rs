// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from domain errors to HTTP responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use smelinx_core::SmelinxError;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error returned by gateway handlers and middleware.
#[derive(Debug)]
pub enum ApiError {
    Domain(SmelinxError),
    /// The request body was not valid JSON for the endpoint.
    Payload(String),
}

impl From<SmelinxError> for ApiError {
    fn from(err: SmelinxError) -> Self {
        Self::Domain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Payload(rejection.body_text())
    }
}

impl ApiError {
    /// Status code and client-facing message. Internal details stay in the log.
    fn parts(&self) -> (StatusCode, String) {
        match self {
            Self::Payload(_) => (StatusCode::BAD_REQUEST, "invalid payload".to_string()),
            Self::Domain(err) => match err {
                SmelinxError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                SmelinxError::NotFound { entity, .. } => {
                    (StatusCode::NOT_FOUND, format!("{entity} not found"))
                }
                SmelinxError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
                SmelinxError::Unauthorized => {
                    (StatusCode::UNAUTHORIZED, "unauthorized".to_string())
                }
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.parts();
        match &self {
            Self::Payload(detail) => tracing::debug!(%detail, "rejected request payload"),
            Self::Domain(err) if status.is_server_error() => {
                tracing::error!(error = %err, "request failed")
            }
            Self::Domain(_) => {}
        }
        (status, Json(ErrorResponse { error })).into_response()
    }
}
