//! The HTTP error envelope (§7): every error kind the core distinguishes
//! collapses to one of two wire shapes — 401 for anything authentication
//! related, 500 for everything else — with a coarse, oracle-resistant
//! message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "UPPERCASE")]
enum Status {
    Ok,
    Err,
}

#[derive(Debug, Serialize)]
pub struct JsonResponse<T> {
    status: Status,
    data: T,
}

impl<T> JsonResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { status: Status::Ok, data }
    }
}

#[derive(Debug, Serialize)]
struct ErrorMessage {
    message: String,
}

#[derive(Debug)]
pub enum ApiError {
    Unauthenticated(String),
    Other(String),
}

impl ApiError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthenticated(message) => (StatusCode::UNAUTHORIZED, message),
            ApiError::Other(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (
            status,
            Json(JsonResponse {
                status: Status::Err,
                data: ErrorMessage { message },
            }),
        )
            .into_response()
    }
}

impl From<fairstake_storage::StorageError> for ApiError {
    fn from(err: fairstake_storage::StorageError) -> Self {
        tracing::error!(%err, "storage error");
        ApiError::other("a storage error occurred")
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
