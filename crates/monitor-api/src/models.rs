//! Response envelope for the Read API, matching the teacher's
//! success/error `ApiResponse<T>` convention (`api/src/models.rs`),
//! generalized to the monitoring core's payloads.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Standard success/error envelope wrapping every Read API response body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// `true` iff `data` is present.
    pub success: bool,
    /// The payload, present on success.
    pub data: Option<T>,
    /// The error detail, present on failure.
    pub error: Option<ErrorBody>,
}

/// Error detail carried by a failed [`ApiResponse`].
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Short machine-readable category.
    pub code: String,
    /// Human-readable detail.
    pub message: String,
}

impl<T> ApiResponse<T> {
    /// Wrap a successful payload.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// A Read API failure. Per §7, caller input errors are always 4xx — this
/// type's `IntoResponse` never produces a 5xx for anything constructed via
/// [`ApiError::bad_request`] or [`ApiError::not_found`].
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// A malformed or semantically invalid query/path parameter.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "invalid_request",
            message: message.into(),
        }
    }

    /// A referenced resource (service, operation id) does not exist.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "not_found",
            message: message.into(),
        }
    }

    /// The store failed beneath a well-formed request. Not a caller error,
    /// but still reported through the same envelope.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal_error",
            message: message.into(),
        }
    }
}

impl From<monitor_common::MonitorError> for ApiError {
    fn from(err: monitor_common::MonitorError) -> Self {
        use monitor_common::MonitorError::*;
        match err {
            UnknownService(s) => ApiError::not_found(format!("unknown service: {s}")),
            InvalidRequest(msg) => ApiError::bad_request(msg),
            InvalidConfig(msg) => ApiError::internal(msg),
            Store(msg) => ApiError::internal(msg),
            BrokerUnavailable(msg) => ApiError::internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code: self.code.to_string(),
                message: self.message,
            }),
        };
        (self.status, Json(body)).into_response()
    }
}

/// Shorthand result type for route handlers.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;
