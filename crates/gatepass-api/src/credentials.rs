//! Handlers for `/credentials` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/credentials` | Optional `?kind=`, `?status=`, `?name=` |
//! | `POST`   | `/credentials` | Body: a credential draft |
//! | `GET`    | `/credentials/:id` | 404 if not found |
//! | `PUT`    | `/credentials/:id` | Full-draft replace; kind is immutable |
//! | `DELETE` | `/credentials/:id` | 204 on success |
//! | `POST`   | `/credentials/:id/block` | Body: `{"blocked":true}` |
//!
//! Every mutating route requires the `x-operator-id` header.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use gatepass_core::{
  credential::{Credential, CredentialDraft, CredentialKind, CredentialStatus},
  store::{AuditLog, CredentialFilter, CredentialStore},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, Operator, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub kind:   Option<CredentialKind>,
  pub status: Option<CredentialStatus>,
  /// Case-insensitive substring match over display names.
  pub name:   Option<String>,
}

/// `GET /credentials[?kind=...][&status=...][&name=...]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Credential>>, ApiError>
where
  S: CredentialStore + AuditLog + Send + Sync + 'static,
{
  let filter = CredentialFilter {
    kind:   params.kind,
    status: params.status,
    name:   params.name,
  };
  let credentials = CredentialStore::list(&*state.store, &filter)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(credentials))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /credentials` — body: a [`CredentialDraft`].
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Operator(operator): Operator,
  Json(draft): Json<CredentialDraft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CredentialStore + AuditLog + Send + Sync + 'static,
{
  let credential = state.lifecycle.create(draft, &operator).await?;
  Ok((StatusCode::CREATED, Json(credential)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /credentials/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Credential>, ApiError>
where
  S: CredentialStore + AuditLog + Send + Sync + 'static,
{
  let credential = state
    .store
    .get(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("credential {id} not found")))?;
  Ok(Json(credential))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /credentials/:id` — body: a full [`CredentialDraft`].
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Operator(operator): Operator,
  Json(draft): Json<CredentialDraft>,
) -> Result<Json<Credential>, ApiError>
where
  S: CredentialStore + AuditLog + Send + Sync + 'static,
{
  let credential = state.lifecycle.update(id, draft, &operator).await?;
  Ok(Json(credential))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /credentials/:id`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Operator(operator): Operator,
) -> Result<StatusCode, ApiError>
where
  S: CredentialStore + AuditLog + Send + Sync + 'static,
{
  state.lifecycle.delete(id, &operator).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Block / unblock ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BlockBody {
  pub blocked: bool,
}

/// `POST /credentials/:id/block` — body: `{"blocked":true}` or `{"blocked":false}`.
pub async fn block<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Operator(operator): Operator,
  Json(body): Json<BlockBody>,
) -> Result<Json<Credential>, ApiError>
where
  S: CredentialStore + AuditLog + Send + Sync + 'static,
{
  let credential = state.lifecycle.set_blocked(id, body.blocked, &operator).await?;
  Ok(Json(credential))
}
