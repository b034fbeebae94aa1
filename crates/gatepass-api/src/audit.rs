//! Handler for the `/audit` endpoint.

use axum::{
  Json,
  extract::{Query, State},
};
use gatepass_core::{
  query::ActivityView,
  store::{AuditLog, CredentialStore},
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 200;

#[derive(Debug, Deserialize, Default)]
pub struct AuditParams {
  pub limit: Option<usize>,
}

/// `GET /audit[?limit=<n>]` — the most recent audit entries, newest first.
pub async fn recent<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<AuditParams>,
) -> Result<Json<Vec<ActivityView>>, ApiError>
where
  S: CredentialStore + AuditLog + Send + Sync + 'static,
{
  let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
  let entries = state.reports.recent_activity(limit).await?;
  Ok(Json(entries))
}
