//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("validation failed on {field}: {constraint}")]
  Validation { field: &'static str, constraint: String },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<gatepass_core::Error> for ApiError {
  fn from(e: gatepass_core::Error) -> Self {
    use gatepass_core::Error as E;
    match e {
      E::Validation { field, constraint } => {
        ApiError::Validation { field, constraint }
      }
      E::NotFound(id) => ApiError::NotFound(format!("credential {id} not found")),
      other => ApiError::Store(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, json!({ "error": m }))
      }
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, json!({ "error": m }))
      }
      ApiError::Validation { field, constraint } => (
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({ "error": constraint, "field": field }),
      ),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store error while handling request");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          json!({ "error": "internal error" }),
        )
      }
    };
    (status, Json(body)).into_response()
  }
}
