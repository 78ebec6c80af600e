use axum::{
    Json,
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub mod favorites;
pub mod home;
pub mod search;
pub mod titles;

/// Result alias for JSON payloads that map API errors automatically.
pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Result alias for JSON payloads that also customize the HTTP status code.
pub type ApiResponse<T> = Result<(StatusCode, Json<T>), ApiError>;

/// Machine-readable error codes carried next to the message.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationFailed,
    MethodNotAllowed,
    ResourceNotFound,
    SearchSuperseded,
    InternalServerError,
}

impl ErrorCode {
    fn default_status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,
            ErrorCode::SearchSuperseded => StatusCode::CONFLICT,
            ErrorCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error envelope returned to HTTP clients: `{ "error": "...", "code": "..." }`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: ErrorCode,
}

/// Canonical API error that converts into the shared JSON envelope.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    #[source]
    source: Option<anyhow::Error>,
    status: StatusCode,
    code: ErrorCode,
    message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            source: None,
            status: code.default_status(),
            code,
            message: message.into(),
        }
    }

    /// Build a validation/parameter error (HTTP 400).
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    /// Build a resource-not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceNotFound, message)
    }

    /// Build a method-not-allowed error (HTTP 405).
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MethodNotAllowed, message)
    }

    /// A newer search from the same session started first (HTTP 409).
    pub fn superseded(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SearchSuperseded, message)
    }

    /// Build an internal server error that logs the provided source.
    pub fn internal_with_source(err: impl Into<anyhow::Error>) -> Self {
        Self {
            source: Some(err.into()),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: ErrorCode::InternalServerError,
            message: "internal server error".to_string(),
        }
    }

    /// Expose the HTTP status code for logging/tests.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Expose the machine-readable code for logging/tests.
    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError {
            source,
            status,
            code,
            message,
        } = self;

        if status.is_server_error() {
            if let Some(err) = &source {
                tracing::error!(
                    error = %err,
                    code = ?code,
                    status = %status,
                    message = message.as_str(),
                    "api error (critical)"
                );
            } else {
                tracing::error!(
                    code = ?code,
                    status = %status,
                    message = message.as_str(),
                    "api error (critical)"
                );
            }
        } else {
            tracing::warn!(
                code = ?code,
                status = %status,
                message = message.as_str(),
                "api error"
            );
        }

        let payload = ErrorResponse {
            error: message,
            code,
        };
        let mut response = (status, Json(payload)).into_response();
        response
            .extensions_mut()
            .insert(ErrorEnvelopeApplied::default());
        response
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal_with_source(err)
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct ErrorEnvelopeApplied;

/// Middleware that rewrites Axum default errors into the shared envelope.
pub async fn ensure_error_envelope(req: Request<Body>, next: Next) -> Response {
    let response = next.run(req).await;
    let status = response.status();

    if response.extensions().get::<ErrorEnvelopeApplied>().is_some() {
        return response;
    }

    match status {
        StatusCode::METHOD_NOT_ALLOWED => {
            ApiError::method_not_allowed("method not allowed").into_response()
        }
        StatusCode::NOT_FOUND => ApiError::not_found("route not found").into_response(),
        _ => response,
    }
}

/// Fallback handler ensuring unknown routes return the API envelope.
pub async fn fallback_handler() -> ApiError {
    ApiError::not_found("route not found")
}
