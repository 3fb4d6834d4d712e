//! Error-to-HTTP response conversion.
//!
//! Handlers return `Result<T, AppError>`. A route may attach a fixed summary,
//! which then becomes `error` in the body while the underlying message moves
//! to `details`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: gallery_common::Error,
    summary: Option<&'static str>,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: gallery_common::Error) -> Self {
        Self {
            inner,
            summary: None,
            request_id: None,
        }
    }

    pub fn with_summary(mut self, summary: &'static str) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = Some(id);
        self
    }
}

impl From<gallery_common::Error> for AppError {
    fn from(e: gallery_common::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                request_id = self.request_id.as_deref().unwrap_or("-"),
                "Server error in API handler"
            );
        }

        let message = self.inner.to_string();
        let body = match self.summary {
            Some(summary) => json!({
                "error": summary,
                "details": message,
                "code": self.inner.code(),
                "request_id": self.request_id,
            }),
            None => json!({
                "error": message,
                "code": self.inner.code(),
                "request_id": self.request_id,
            }),
        };

        (status, axum::Json(body)).into_response()
    }
}
