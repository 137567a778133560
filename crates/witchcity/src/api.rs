//! Uniform JSON envelope and error-kind mapping shared by every feature router.
//!
//! Feature services return their own error enums; each exposes an [`ErrorKind`] so the
//! transport layer can pick a status code without inspecting message text.

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    Conflict,
    Unauthorized,
    Unhandled,
}

impl ErrorKind {
    pub const fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Unhandled => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Implemented by feature errors so handlers can convert them into [`ApiError`].
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}

/// Envelope wrapping every JSON response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
            timestamp: Utc::now(),
        }
    }
}

/// Successful response with an explicit status code.
pub struct Envelope<T>(pub StatusCode, pub ApiResponse<T>);

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self(StatusCode::OK, ApiResponse::ok(data))
    }

    pub fn created(data: T) -> Self {
        Self(StatusCode::CREATED, ApiResponse::ok(data))
    }

    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self(self.0, self.1.with_message(message))
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

/// One page of an ordered listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

impl<T> PagedResult<T> {
    /// Slice an already-ordered collection; `page` is 1-based.
    pub fn paginate(items: Vec<T>, page: usize, page_size: usize) -> Self {
        let total_count = items.len();
        let page = page.max(1);
        let page_size = page_size.max(1);
        let items = items
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .collect();

        Self {
            items,
            total_count,
            page,
            page_size,
            total_pages: total_count.div_ceil(page_size),
        }
    }
}

/// Error leaving a handler, rendered with the failure envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn from_error<E>(error: E) -> Self
    where
        E: Classify + std::fmt::Display,
    {
        Self::new(error.kind(), error.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();
        let mut body = if self.kind == ErrorKind::Unhandled {
            tracing::error!(error = %self.message, "unhandled error while serving request");
            ApiResponse::failure("An unexpected error occurred")
        } else {
            ApiResponse::failure(self.message)
        };
        body.message = self.detail;

        (status, Json(body)).into_response()
    }
}

/// JSON request body; malformed or mistyped payloads are rejected with the failure envelope.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| ApiJson(value))
            .map_err(|rejection| ApiError::new(ErrorKind::Validation, rejection.body_text()))
    }
}

/// JSON request body that may be omitted. An empty body yields `None`; anything else must
/// deserialize into `T`.
pub struct OptionalApiJson<T>(pub Option<T>);

#[axum::async_trait]
impl<T, S> FromRequest<S> for OptionalApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::new(ErrorKind::Validation, rejection.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalApiJson(None));
        }

        serde_json::from_slice(&bytes)
            .map(|value| OptionalApiJson(Some(value)))
            .map_err(|err| {
                ApiError::new(ErrorKind::Validation, "Failed to parse the request body as JSON")
                    .with_detail(err.to_string())
            })
    }
}

/// Query-string parameters, rejected with the failure envelope when they do not parse.
pub struct ApiQuery<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ApiQuery(value))
            .map_err(|rejection| ApiError::new(ErrorKind::Validation, rejection.body_text()))
    }
}
