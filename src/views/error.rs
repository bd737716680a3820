//! View errors
//!
//! Only [`ViewError`] escapes a handler. Everything a user can cause
//! (validation, missing content, authorization) becomes a fail envelope
//! instead, see [`crate::views::ActionFailure`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::theme::TemplateError;

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// A view is missing something it needs: a template for a format, a
    /// redirect target, a view name
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    Template(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<TemplateError> for ViewError {
    fn from(e: TemplateError) -> Self {
        Self::Template(e.to_string())
    }
}

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        tracing::error!("View failed: {}", self);
        let body = match &self {
            ViewError::Configuration(msg) => ApiError::new("CONFIGURATION_ERROR", msg.clone()),
            ViewError::Template(_) => ApiError::new("TEMPLATE_ERROR", "Failed to render page"),
            ViewError::Internal(_) => ApiError::internal_error("Internal server error"),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_error_is_500() {
        let response = ViewError::Configuration("Format not allowed: pdf".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_api_error_status() {
        assert_eq!(
            ApiError::not_found("gone").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::internal_error("boom").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
