use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

use crate::domain::error::TodoError;
use crate::reporting;

/// Uniform body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Meta {
    pub per_page: i64,
    pub page: i64,
    #[serde(rename = "pageCount")]
    pub page_count: i64,
    #[serde(rename = "totalCount")]
    pub total_count: i64,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self { Self::success(StatusCode::OK, message, Some(data)) }

    pub fn created(message: impl Into<String>, data: T) -> Self { Self::success(StatusCode::CREATED, message, Some(data)) }

    pub fn list(message: impl Into<String>, data: T, meta: Meta) -> Self {
        Self { meta: Some(meta), ..Self::ok(message, data) }
    }

    fn success(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self { success: true, code: status.as_u16(), message: message.into(), data, meta: None }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, axum::Json(self)).into_response()
    }
}

/// Failures as the HTTP layer reports them. Internal detail is logged, never returned.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Item not found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("Validation failed")]
    Validation(BTreeMap<String, String>),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TodoError> for ApiError {
    fn from(e: TodoError) -> Self {
        match e {
            TodoError::NotFound | TodoError::InvalidId(_) => ApiError::NotFound,
            TodoError::Internal(source) => {
                tracing::error!(error = ?source, "todo operation failed");
                reporting::capture_error(&source);
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status().as_u16();
        let message = self.to_string();
        let data = match self {
            ApiError::Validation(fields) => serde_json::to_value(fields).ok(),
            _ => None,
        };
        ApiResponse::<Value> { success: false, code, message, data, meta: None }.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failures_hide_their_detail() {
        let err = ApiError::from(TodoError::Internal(anyhow::anyhow!("disk full at /var/db")));
        assert!(matches!(err, ApiError::Internal));
        assert_eq!(err.to_string(), "Internal server error");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn store_failures_are_reported() {
        let events = sentry::test::with_captured_events(|| {
            let _ = ApiError::from(TodoError::Internal(anyhow::anyhow!("disk full")));
            let _ = ApiError::from(TodoError::NotFound);
        });
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn malformed_ids_read_as_missing() {
        assert!(matches!(ApiError::from(TodoError::InvalidId("x".into())), ApiError::NotFound));
        assert!(matches!(ApiError::from(TodoError::NotFound), ApiError::NotFound));
    }

    #[test]
    fn meta_uses_wire_names() {
        let meta = Meta { per_page: 10, page: 1, page_count: 3, total_count: 25 };
        let json = serde_json::to_value(ApiResponse::list("Get All Todo", Vec::<u8>::new(), meta)).unwrap();
        assert_eq!(json["meta"], serde_json::json!({ "per_page": 10, "page": 1, "pageCount": 3, "totalCount": 25 }));
        assert_eq!(json["code"], 200);
        assert_eq!(json["success"], true);
    }

    #[test]
    fn meta_is_omitted_outside_lists() {
        let json = serde_json::to_value(ApiResponse::ok("Get Todo", 1)).unwrap();
        assert!(json.get("meta").is_none());
    }
}
