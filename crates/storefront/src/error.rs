//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! and renders a user-visible error page instead of propagating a bare
//! failure. All route handlers should return `Result<T, AppError>`.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::commerce::CommerceError;
use crate::filters;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Commerce API operation failed.
    #[error("Commerce error: {0}")]
    Commerce(#[from] CommerceError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Full-page error template (pt-BR copy, matching the storefront locale).
#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    message: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server-side failures to Sentry
        if matches!(self, Self::Commerce(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Commerce(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to visitors
        let message = match &self {
            Self::Commerce(_) => {
                "Não foi possível carregar as informações da loja. Tente novamente em instantes."
            }
            Self::NotFound(_) => "Página não encontrada.",
            Self::BadRequest(_) => "Requisição inválida.",
            Self::Internal(_) => "Erro interno. Tente novamente mais tarde.",
        };

        let page = ErrorTemplate { message };
        page.render().map_or_else(
            |render_err| {
                tracing::error!(error = %render_err, "failed to render error page");
                (status, message).into_response()
            },
            |html| (status, Html(html)).into_response(),
        )
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
