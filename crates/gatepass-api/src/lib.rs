//! JSON REST API for Gatepass.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`gatepass_core::store::CredentialStore`] and
//! [`gatepass_core::store::AuditLog`]. Auth, TLS, and transport concerns are
//! the caller's responsibility; the only identity carried here is the
//! `x-operator-id` header required on mutating routes.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", gatepass_api::api_router(AppState::new(store)))
//! ```

pub mod audit;
pub mod credentials;
pub mod error;
pub mod reports;
pub mod verify;

use std::sync::Arc;

use axum::{
  Router,
  extract::FromRequestParts,
  http::request::Parts,
  routing::{get, post},
};
use gatepass_core::{
  lifecycle::LifecycleManager,
  query::Reports,
  store::{AuditLog, CredentialStore},
};

pub use error::ApiError;

/// Header naming the acting operator on mutating routes.
pub const OPERATOR_HEADER: &str = "x-operator-id";

// ─── State ───────────────────────────────────────────────────────────────────

/// Shared handler state: the store plus the single lifecycle manager and the
/// read-side facade built over it.
pub struct AppState<S> {
  pub store:     Arc<S>,
  pub lifecycle: Arc<LifecycleManager<S>>,
  pub reports:   Arc<Reports<S>>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:     self.store.clone(),
      lifecycle: self.lifecycle.clone(),
      reports:   self.reports.clone(),
    }
  }
}

impl<S> AppState<S>
where
  S: CredentialStore + AuditLog + Send + Sync + 'static,
{
  pub fn new(store: Arc<S>) -> Self {
    Self {
      lifecycle: Arc::new(LifecycleManager::new(store.clone())),
      reports:   Arc::new(Reports::new(store.clone())),
      store,
    }
  }
}

// ─── Operator extractor ──────────────────────────────────────────────────────

/// The acting operator, read from the `x-operator-id` header. Mutations
/// without it are rejected before any handler logic runs.
pub struct Operator(pub String);

impl<St: Send + Sync> FromRequestParts<St> for Operator {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &St,
  ) -> Result<Self, Self::Rejection> {
    let operator = parts
      .headers
      .get(OPERATOR_HEADER)
      .and_then(|v| v.to_str().ok())
      .map(str::trim)
      .filter(|v| !v.is_empty())
      .ok_or_else(|| {
        ApiError::BadRequest(format!("missing {OPERATOR_HEADER} header"))
      })?;
    Ok(Operator(operator.to_string()))
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: CredentialStore + AuditLog + Send + Sync + 'static,
{
  Router::new()
    // Credential lifecycle
    .route(
      "/credentials",
      get(credentials::list::<S>).post(credentials::create::<S>),
    )
    .route(
      "/credentials/{id}",
      get(credentials::get_one::<S>)
        .put(credentials::update::<S>)
        .delete(credentials::delete_one::<S>),
    )
    .route("/credentials/{id}/block", post(credentials::block::<S>))
    // Public verification
    .route("/verify/{id}", get(verify::handler::<S>))
    // Read-side views
    .route("/audit", get(audit::recent::<S>))
    .route("/reports/counts", get(reports::counts::<S>))
    .route("/reports/expiring", get(reports::expiring::<S>))
    .with_state(state)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use chrono::{Duration, Utc};
  use gatepass_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  async fn make_state() -> AppState<SqliteStore> {
    AppState::new(Arc::new(
      SqliteStore::open_in_memory().await.expect("in-memory store"),
    ))
  }

  async fn request(
    state: AppState<SqliteStore>,
    method: &str,
    uri: &str,
    operator: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(op) = operator {
      builder = builder.header(OPERATOR_HEADER, op);
    }
    let req = match body {
      Some(body) => builder
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp = api_router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  fn visitor_body(name: &str) -> Value {
    let now = Utc::now();
    json!({
      "kind": "visitor",
      "display_name": name,
      "contact_phone": "11987654321",
      "id_number": "12345678900",
      "plate": "abc1234",
      "vehicle_model": "Onix",
      "vehicle_color": "Prata",
      "valid_from": (now - Duration::hours(1)).to_rfc3339(),
      "valid_until": (now + Duration::hours(8)).to_rfc3339(),
    })
  }

  fn employee_body(name: &str) -> Value {
    json!({
      "kind": "employee",
      "display_name": name,
      "contact_phone": "1133334444",
      "id_number": "EMP-042",
      "plate": "xyz9876",
    })
  }

  // ── Credentials ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_then_get_returns_normalized_credential() {
    let state = make_state().await;

    let (status, created) = request(
      state.clone(),
      "POST",
      "/credentials",
      Some("op-1"),
      Some(visitor_body("Ana Souza")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "active");
    assert_eq!(created["contact_phone"], "(11) 98765-4321");
    assert_eq!(created["vehicle"]["plate"], "ABC-1234");
    assert_eq!(created["external_ref"]["kind"], "national_id");
    assert_eq!(created["external_ref"]["value"], "123.456.789-00");

    let id = created["credential_id"].as_str().unwrap();
    let (status, fetched) =
      request(state, "GET", &format!("/credentials/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["display_name"], "Ana Souza");
  }

  #[tokio::test]
  async fn mutation_without_operator_header_is_rejected() {
    let state = make_state().await;
    let (status, body) = request(
      state.clone(),
      "POST",
      "/credentials",
      None,
      Some(visitor_body("Ana Souza")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("x-operator-id"));

    // Nothing was written.
    let (_, listed) = request(state, "GET", "/credentials", None, None).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);
  }

  #[tokio::test]
  async fn invalid_draft_names_the_failing_field() {
    let state = make_state().await;
    let mut body = visitor_body("Ana Souza");
    body["contact_phone"] = json!("123");

    let (status, resp) =
      request(state, "POST", "/credentials", Some("op-1"), Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp["field"], "contact_phone");
  }

  #[tokio::test]
  async fn list_filters_by_kind_and_status() {
    let state = make_state().await;
    request(
      state.clone(),
      "POST",
      "/credentials",
      Some("op-1"),
      Some(visitor_body("Ana Souza")),
    )
    .await;
    let (_, employee) = request(
      state.clone(),
      "POST",
      "/credentials",
      Some("op-1"),
      Some(employee_body("Bruno Lima")),
    )
    .await;
    let employee_id = employee["credential_id"].as_str().unwrap();
    request(
      state.clone(),
      "POST",
      &format!("/credentials/{employee_id}/block"),
      Some("op-1"),
      Some(json!({ "blocked": true })),
    )
    .await;

    let (_, visitors) =
      request(state.clone(), "GET", "/credentials?kind=visitor", None, None).await;
    assert_eq!(visitors.as_array().unwrap().len(), 1);

    let (_, blocked) =
      request(state, "GET", "/credentials?status=blocked", None, None).await;
    assert_eq!(blocked.as_array().unwrap().len(), 1);
    assert_eq!(blocked[0]["display_name"], "Bruno Lima");
  }

  #[tokio::test]
  async fn update_cannot_change_kind() {
    let state = make_state().await;
    let (_, created) = request(
      state.clone(),
      "POST",
      "/credentials",
      Some("op-1"),
      Some(visitor_body("Ana Souza")),
    )
    .await;
    let id = created["credential_id"].as_str().unwrap();

    let (status, resp) = request(
      state,
      "PUT",
      &format!("/credentials/{id}"),
      Some("op-1"),
      Some(employee_body("Ana Souza")),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp["field"], "kind");
  }

  // ── Verification ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn verify_exposes_only_the_public_projection() {
    let state = make_state().await;
    let (_, created) = request(
      state.clone(),
      "POST",
      "/credentials",
      Some("op-1"),
      Some(visitor_body("Ana Souza")),
    )
    .await;
    let id = created["credential_id"].as_str().unwrap();

    let (status, verdict) =
      request(state, "GET", &format!("/verify/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verdict["result"], "authorized");
    assert_eq!(verdict["display_name"], "Ana Souza");
    assert_eq!(verdict["plate"], "ABC-1234");
    // The national id must never leave the management surface.
    assert!(verdict.get("external_ref").is_none());
    assert!(verdict.get("id_number").is_none());
  }

  #[tokio::test]
  async fn verify_blocked_credential_is_denied() {
    let state = make_state().await;
    let (_, created) = request(
      state.clone(),
      "POST",
      "/credentials",
      Some("op-1"),
      Some(visitor_body("Ana Souza")),
    )
    .await;
    let id = created["credential_id"].as_str().unwrap();
    request(
      state.clone(),
      "POST",
      &format!("/credentials/{id}/block"),
      Some("op-1"),
      Some(json!({ "blocked": true })),
    )
    .await;

    let (status, verdict) =
      request(state, "GET", &format!("/verify/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verdict["result"], "denied");
    assert_eq!(verdict["reason"], "blocked");
  }

  #[tokio::test]
  async fn verify_unknown_id_is_404() {
    let state = make_state().await;
    let id = uuid::Uuid::new_v4();
    let (status, verdict) =
      request(state, "GET", &format!("/verify/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(verdict["result"], "not_found");
  }

  #[tokio::test]
  async fn verify_honors_the_at_parameter() {
    let state = make_state().await;
    let (_, created) = request(
      state.clone(),
      "POST",
      "/credentials",
      Some("op-1"),
      Some(visitor_body("Ana Souza")),
    )
    .await;
    let id = created["credential_id"].as_str().unwrap();
    let until = created["valid_until"].as_str().unwrap();
    let after = (chrono::DateTime::parse_from_rfc3339(until).unwrap()
      + Duration::seconds(1))
    .to_rfc3339();

    let (status, verdict) = request(
      state,
      "GET",
      &format!("/verify/{id}?at={}", urlencode(&after)),
      None,
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verdict["result"], "denied");
    assert_eq!(verdict["reason"], "expired");
  }

  #[tokio::test]
  async fn deleted_credential_verifies_as_not_found() {
    let state = make_state().await;
    let (_, created) = request(
      state.clone(),
      "POST",
      "/credentials",
      Some("op-1"),
      Some(visitor_body("Ana Souza")),
    )
    .await;
    let id = created["credential_id"].as_str().unwrap();

    let (status, _) = request(
      state.clone(),
      "DELETE",
      &format!("/credentials/{id}"),
      Some("op-1"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) =
      request(state, "GET", &format!("/verify/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Read-side views ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn audit_lists_mutations_newest_first_with_operator_labels() {
    let state = make_state().await;
    let (_, created) = request(
      state.clone(),
      "POST",
      "/credentials",
      Some("op-1"),
      Some(visitor_body("Ana Souza")),
    )
    .await;
    let id = created["credential_id"].as_str().unwrap();
    request(
      state.clone(),
      "POST",
      &format!("/credentials/{id}/block"),
      Some("op-2"),
      Some(json!({ "blocked": true })),
    )
    .await;

    let (status, entries) = request(state, "GET", "/audit", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["action"], "block");
    assert_eq!(entries[0]["operator_label"], "op-2");
    assert_eq!(entries[1]["action"], "create");
    assert!(entries[1]["details"].as_str().unwrap().contains("Ana Souza"));
  }

  #[tokio::test]
  async fn counts_reflect_current_store_state() {
    let state = make_state().await;
    request(
      state.clone(),
      "POST",
      "/credentials",
      Some("op-1"),
      Some(visitor_body("Ana Souza")),
    )
    .await;
    request(
      state.clone(),
      "POST",
      "/credentials",
      Some("op-1"),
      Some(employee_body("Bruno Lima")),
    )
    .await;

    let (status, counts) =
      request(state, "GET", "/reports/counts", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(counts["employees"], 1);
    assert_eq!(counts["visitors"], 1);
    assert_eq!(counts["active"], 2);
    assert_eq!(counts["blocked"], 0);
    assert_eq!(counts["vehicles"], 2);
  }

  #[tokio::test]
  async fn expiring_report_lists_visitors_inside_the_window() {
    let state = make_state().await;
    let now = Utc::now();

    let mut soon = visitor_body("Expires Soon");
    soon["valid_until"] = json!((now + Duration::minutes(30)).to_rfc3339());
    request(state.clone(), "POST", "/credentials", Some("op-1"), Some(soon)).await;

    let mut far = visitor_body("Expires Far");
    far["valid_until"] = json!((now + Duration::hours(6)).to_rfc3339());
    request(state.clone(), "POST", "/credentials", Some("op-1"), Some(far)).await;

    let (status, expiring) =
      request(state, "GET", "/reports/expiring", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let expiring = expiring.as_array().unwrap();
    assert_eq!(expiring.len(), 1);
    assert_eq!(expiring[0]["display_name"], "Expires Soon");
  }

  fn urlencode(s: &str) -> String {
    s.replace('+', "%2B").replace(':', "%3A")
  }
}
