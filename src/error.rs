//! Error taxonomy: store failures, service signals, and their HTTP projection.
//!
//! The service raises `ServiceError::NotFound` and `ServiceError::Invalid`
//! itself and forwards every store failure untouched as `ServiceError::Store`. `ApiError` classifies both
//! into a status code and message; `ApiFailure` renders the JSON envelope
//! `{statusCode, timestamp, path, method, message, errors?}`.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts},
    http::{request::Parts, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

use crate::validation::FieldError;

/// Failures surfaced by a `ChallengeStore`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violation on {}", .fields.join(", "))]
    UniqueViolation { fields: Vec<String> },
    #[error("record not found")]
    RecordNotFound,
    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Signals produced by `ChallengeService`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The requested record does not exist. `context` is the attempted id, if any.
    #[error("{message}")]
    NotFound { message: String, context: Option<String> },
    /// Input that would break a record invariant; never reaches the store.
    #[error("Validation failed")]
    Invalid { errors: Vec<FieldError> },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn empty_store() -> Self {
        ServiceError::NotFound { message: "No challenges found".into(), context: None }
    }

    pub fn missing_id(raw_id: &str) -> Self {
        ServiceError::NotFound {
            message: format!("Challenge with ID {raw_id} not found"),
            context: Some(raw_id.to_string()),
        }
    }

    pub fn empty_title() -> Self {
        ServiceError::Invalid { errors: vec![FieldError::title_required()] }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// HTTP-facing classification of a failure. `detail` is logged, never returned.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub errors: Option<Value>,
    pub detail: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), errors: None, detail: None }
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "Validation failed".into(),
            errors: Some(json!(errors)),
            detail: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// Unparseable or mistyped bodies keep axum's status (400/415/422).
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            detail: Some(rejection.body_text()),
            ..Self::new(rejection.status(), "Invalid JSON body")
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { fields } => {
                let field = if fields.is_empty() { json!("unknown field") } else { json!(fields) };
                ApiError {
                    errors: Some(json!({ "field": field })),
                    ..ApiError::new(StatusCode::BAD_REQUEST, "Unique constraint violation")
                }
            }
            StoreError::RecordNotFound => ApiError::not_found("Record not found"),
            StoreError::Backend(detail) => ApiError::internal(detail),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound { message, .. } => ApiError::not_found(message),
            ServiceError::Invalid { errors } => ApiError::validation(errors),
            ServiceError::Store(store) => store.into(),
        }
    }
}

/// Method and path of the request being served; feeds the error envelope.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub method: Method,
    pub path: String,
}

impl RequestMeta {
    pub fn fail(&self, err: impl Into<ApiError>) -> ApiFailure {
        ApiFailure { meta: self.clone(), error: err.into() }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestMeta {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        Ok(Self { method: parts.method.clone(), path })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub status_code: u16,
    pub timestamp: String,
    pub path: String,
    pub method: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

/// A classified failure bound to the request that produced it.
#[derive(Debug)]
pub struct ApiFailure {
    pub meta: RequestMeta,
    pub error: ApiError,
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let ApiFailure { meta, error: err } = self;
        if let Some(detail) = &err.detail {
            error!(target: "challenge_picker", method = %meta.method, path = %meta.path, %detail, "Request failed");
        }
        error!(
            target: "challenge_picker",
            "HTTP Error: {} {} | Status: {} | Message: {}",
            meta.method,
            meta.path,
            err.status.as_u16(),
            err.message
        );

        let body = ErrorEnvelope {
            status_code: err.status.as_u16(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            path: meta.path,
            method: meta.method.to_string(),
            message: err.message,
            errors: err.errors,
        };
        (err.status, Json(body)).into_response()
    }
}
