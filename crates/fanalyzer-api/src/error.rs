//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{BytesRejection, JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Box a store error. Used as `.map_err(ApiError::store)`.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Internal(Box::new(e))
  }
}

impl From<fanalyzer_core::Error> for ApiError {
  fn from(e: fanalyzer_core::Error) -> Self {
    use fanalyzer_core::Error as E;
    match e {
      E::Validation(m) => ApiError::Validation(m),
      E::NotFound(m) => ApiError::NotFound(m),
      E::Conflict(m) => ApiError::Conflict(m),
      other => ApiError::Internal(Box::new(other)),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { ApiError::Validation(r.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self { ApiError::Validation(r.body_text()) }
}

impl From<BytesRejection> for ApiError {
  fn from(r: BytesRejection) -> Self { ApiError::Validation(r.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Internal(e) => {
        error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

/// Unwrap a required input field or fail with a validation error.
pub fn required<T>(value: Option<T>, message: &str) -> Result<T, ApiError> {
  value.ok_or_else(|| ApiError::Validation(message.to_owned()))
}

/// Like [`required`], treating blank strings as missing.
pub fn required_str(value: Option<String>, message: &str) -> Result<String, ApiError> {
  match value {
    Some(v) if !v.trim().is_empty() => Ok(v),
    _ => Err(ApiError::Validation(message.to_owned())),
  }
}
