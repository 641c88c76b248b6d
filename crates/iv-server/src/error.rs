//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`iv_core::Error`] so that route handlers
//! can return `Result<T, AppError>` directly. Bodies are plain text. Faults
//! never expose their underlying cause to the client; the detail stays in
//! the log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Body returned for faults when the handler did not supply its own.
const GENERIC_FAULT_MESSAGE: &str = "Internal server error";

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: iv_core::Error,
    fault_message: Option<&'static str>,
}

impl AppError {
    pub fn new(inner: iv_core::Error) -> Self {
        Self {
            inner,
            fault_message: None,
        }
    }

    /// Set the client-facing body used if this error turns out to be a fault.
    pub fn with_fault_message(mut self, message: &'static str) -> Self {
        self.fault_message = Some(message);
        self
    }
}

impl From<iv_core::Error> for AppError {
    fn from(e: iv_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = if status.is_server_error() {
            tracing::debug!(status = %status, error = %self.inner, "Translating fault to response");
            self.fault_message.unwrap_or(GENERIC_FAULT_MESSAGE).to_string()
        } else {
            self.inner.to_string()
        };

        (status, body).into_response()
    }
}
