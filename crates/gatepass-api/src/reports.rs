//! Handlers for `/reports` endpoints.

use axum::{Json, extract::State};
use chrono::Utc;
use gatepass_core::{
  credential::Credential,
  query::CredentialCounts,
  store::{AuditLog, CredentialStore},
};

use crate::{AppState, error::ApiError};

/// `GET /reports/counts` — dashboard headline numbers.
pub async fn counts<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<CredentialCounts>, ApiError>
where
  S: CredentialStore + AuditLog + Send + Sync + 'static,
{
  Ok(Json(state.reports.counts(Utc::now()).await?))
}

/// `GET /reports/expiring` — visitor credentials ending within the
/// reporting window, soonest first.
pub async fn expiring<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Credential>>, ApiError>
where
  S: CredentialStore + AuditLog + Send + Sync + 'static,
{
  Ok(Json(state.reports.expiring_soon(Utc::now()).await?))
}
