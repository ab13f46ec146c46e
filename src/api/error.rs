use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

pub fn ok<T: Serialize>(result: T) -> Response {
    Json(result).into_response()
}

/// Expected non-result (not found, duplicate, limit reached). Still a 200.
pub fn message(text: impl Into<String>) -> Response {
    Json(json!({ "message": text.into() })).into_response()
}

#[derive(Debug)]
pub struct HandlerErr {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }
}

impl From<anyhow::Error> for HandlerErr {
    fn from(e: anyhow::Error) -> Self {
        HandlerErr::internal("store_failed", format!("{e:#}"))
    }
}

impl IntoResponse for HandlerErr {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, message = %self.message, "request failed");
        } else {
            tracing::warn!(code = self.code, message = %self.message, "request rejected");
        }
        let mut error = json!({
            "code": self.code,
            "message": self.message,
        });
        if let Some(d) = self.details {
            error["details"] = d;
        }
        (self.status, Json(error)).into_response()
    }
}
