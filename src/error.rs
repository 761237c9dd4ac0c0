//! Error types. Service failures never reach the learner as-is; they are
//! logged and replaced by friendly fallbacks in `logic`.

use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;
use uuid::Uuid;

use crate::protocol::ErrorOut;

/// Failure talking to the hosted AI service.
#[derive(Debug, Error)]
pub enum AiError {
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("AI service HTTP {status}: {message}")]
  Status { status: u16, message: String },
  #[error("malformed response: {0}")]
  Decode(String),
  #[error("empty response")]
  Empty,
}

/// Fatal startup problems. There is no degraded mode.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("OPENAI_API_KEY environment variable not set")]
  MissingApiKey,
  #[error("failed to build HTTP client: {0}")]
  Client(#[from] reqwest::Error),
}

/// Errors surfaced by the HTTP API.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unknown session: {0}")]
  UnknownSession(Uuid),
  #[error("{0}")]
  BadRequest(String),
  #[error("not found: {0}")]
  NotFound(String),
  #[error("internal error: {0}")]
  Internal(String),
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> axum::response::Response {
    let status = match &self {
      ApiError::UnknownSession(_) | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorOut { message: self.to_string() })).into_response()
  }
}
