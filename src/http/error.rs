//! HTTP error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::{ErrorKind, HumidorError};

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    /// Logged for server errors, never sent to the client
    detail: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "BAD_REQUEST",
            message: message.into(),
            detail: None,
        }
    }

    /// A request the extractors refused, keeping the status they chose.
    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        let code = match status {
            StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
            _ => "BAD_REQUEST",
        };
        Self {
            status,
            code,
            message: message.into(),
            detail: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<HumidorError> for ApiError {
    fn from(e: HumidorError) -> Self {
        match e.kind() {
            ErrorKind::Validation => Self {
                status: StatusCode::BAD_REQUEST,
                code: "VALIDATION_ERROR",
                message: match e {
                    HumidorError::Validation(message) => message,
                    other => other.to_string(),
                },
                detail: None,
            },
            ErrorKind::NotFound => Self {
                status: StatusCode::NOT_FOUND,
                code: "NOT_FOUND",
                message: e.to_string(),
                detail: None,
            },
            ErrorKind::Storage => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "INTERNAL_SERVER_ERROR",
                message: "internal error".to_string(),
                detail: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status,
                code = self.code,
                detail = self.detail.as_deref().unwrap_or(""),
                "request failed"
            );
        }
        let body = ErrorBody {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
