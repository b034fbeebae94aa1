//! Handler for the public `/verify/:id` endpoint.
//!
//! This is the gate-facing surface: the credential id acts as the
//! capability, so the response carries only what a gate display needs.
//! The national id / registration number never appears here, and store
//! failures surface as 503 without internal detail.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use gatepass_core::{
  credential::CredentialKind,
  store::{AuditLog, CredentialStore},
  verify::{DenyReason, Verdict, evaluate},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct VerifyParams {
  /// Evaluate the verdict at this instant instead of the current time.
  pub at: Option<DateTime<Utc>>,
}

/// The public projection of a verification verdict.
#[derive(Debug, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum VerifyResponse {
  Authorized {
    kind:          CredentialKind,
    display_name:  String,
    plate:         Option<String>,
    contact_phone: String,
  },
  Denied {
    reason: DenyReason,
  },
  NotFound,
}

/// `GET /verify/:id[?at=<rfc3339>]`
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<VerifyParams>,
) -> Response
where
  S: CredentialStore + AuditLog + Send + Sync + 'static,
{
  let credential = match state.store.get(id).await {
    Ok(credential) => credential,
    Err(e) => {
      tracing::error!(credential_id = %id, error = %e, "verification lookup failed");
      return (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": "verification unavailable, try again" })),
      )
        .into_response();
    }
  };

  let now = params.at.unwrap_or_else(Utc::now);
  match evaluate(credential, now) {
    Verdict::Authorized { credential } => {
      let plate = credential.plate().map(str::to_owned);
      (
        StatusCode::OK,
        Json(VerifyResponse::Authorized {
          kind: credential.kind,
          display_name: credential.display_name,
          plate,
          contact_phone: credential.contact_phone,
        }),
      )
        .into_response()
    }
    Verdict::Denied { reason } => {
      (StatusCode::OK, Json(VerifyResponse::Denied { reason })).into_response()
    }
    Verdict::NotFound => {
      (StatusCode::NOT_FOUND, Json(VerifyResponse::NotFound)).into_response()
    }
  }
}
