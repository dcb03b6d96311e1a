//! API error type and [`axum::response::IntoResponse`] implementation.

use agora_core::store::StoreError;
use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Where a client is sent after a rejected ballot.
pub const LISTING_PATH: &str = "/questions";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("missing or empty identity header")]
  Unauthorized,

  /// The ballot named no choice, or one that does not belong to the question.
  #[error("{0}")]
  InvalidChoice(String),

  #[error("{0}")]
  VotingClosed(String),

  /// The store failed in a way that may succeed on a later attempt.
  #[error("temporarily unavailable: {0}")]
  Transient(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error by whether retrying could help.
  pub fn store<E: StoreError>(e: E) -> Self {
    if e.is_transient() {
      ApiError::Transient(Box::new(e))
    } else {
      ApiError::Store(Box::new(e))
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::Unauthorized => {
        (StatusCode::UNAUTHORIZED, json!({ "error": self.to_string() }))
      }
      ApiError::InvalidChoice(m) => {
        (StatusCode::UNPROCESSABLE_ENTITY, json!({ "error": m }))
      }
      ApiError::VotingClosed(m) => (
        StatusCode::FORBIDDEN,
        json!({ "error": m, "redirect": LISTING_PATH }),
      ),
      ApiError::Transient(e) => {
        (StatusCode::SERVICE_UNAVAILABLE, json!({ "error": e.to_string() }))
      }
      ApiError::Store(e) => {
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": e.to_string() }))
      }
    };
    (status, Json(body)).into_response()
  }
}
