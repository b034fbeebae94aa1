//! The verification engine: (credential, now) → verdict.
//!
//! Verification is pure and side-effect-free. It never mutates status, even
//! when it detects an expired visitor window — expiry is a computed state,
//! not a stored one. Denial is a normal, successful return value, never an
//! error; errors are reserved for inability to compute a verdict at all.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  credential::{Credential, CredentialKind, CredentialStatus},
  store::CredentialStore,
};

/// Why a present credential was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
  Blocked,
  NotYetValid,
  Expired,
}

/// The outcome of a verification check.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Verdict {
  /// Includes a snapshot of the credential as evaluated.
  Authorized { credential: Credential },
  Denied { reason: DenyReason },
  NotFound,
}

impl Verdict {
  pub fn is_authorized(&self) -> bool {
    matches!(self, Self::Authorized { .. })
  }
}

/// Evaluate the decision table. The precedence order is a contract:
///
/// 1. missing credential → `NotFound`
/// 2. `Blocked` → `Denied { Blocked }`, even inside a valid window
/// 3. visitor before `valid_from` → `Denied { NotYetValid }`
/// 4. visitor strictly after `valid_until` → `Denied { Expired }` — at the
///    instant equal to `valid_until` the credential is still authorized
/// 5. otherwise → `Authorized`
///
/// Employees carry no window and are authorized for any `now` unless
/// blocked.
pub fn evaluate(credential: Option<Credential>, now: DateTime<Utc>) -> Verdict {
  let Some(credential) = credential else {
    return Verdict::NotFound;
  };

  if credential.status == CredentialStatus::Blocked {
    return Verdict::Denied { reason: DenyReason::Blocked };
  }

  if credential.kind == CredentialKind::Visitor {
    if let Some(from) = credential.valid_from
      && now < from
    {
      return Verdict::Denied { reason: DenyReason::NotYetValid };
    }
    if let Some(until) = credential.valid_until
      && now > until
    {
      return Verdict::Denied { reason: DenyReason::Expired };
    }
  }

  Verdict::Authorized { credential }
}

// ─── Store-backed verifier ───────────────────────────────────────────────────

/// Read-only wrapper that resolves a credential id against the store and
/// applies [`evaluate`]. Safe to call concurrently with lifecycle mutations;
/// it observes only committed aggregates.
pub struct Verifier<S> {
  store: Arc<S>,
}

impl<S: CredentialStore> Verifier<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  /// `now` is injected so callers (and tests) control the clock.
  pub async fn verify(
    &self,
    id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<Verdict, S::Error> {
    Ok(evaluate(self.store.get(id).await?, now))
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};
  use uuid::Uuid;

  use super::*;
  use crate::credential::ExternalRef;

  fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, h, m, s).unwrap()
  }

  fn visitor(window: (Option<DateTime<Utc>>, Option<DateTime<Utc>>)) -> Credential {
    Credential {
      credential_id: Uuid::new_v4(),
      kind:          CredentialKind::Visitor,
      display_name:  "Ana Souza".to_string(),
      contact_phone: "(11) 98765-4321".to_string(),
      external_ref:  ExternalRef::NationalId("123.456.789-00".to_string()),
      status:        CredentialStatus::Active,
      valid_from:    window.0,
      valid_until:   window.1,
      vehicle:       None,
      created_at:    at(0, 0, 0),
    }
  }

  fn employee() -> Credential {
    Credential {
      kind: CredentialKind::Employee,
      external_ref: ExternalRef::Registration("EMP-042".to_string()),
      valid_from: None,
      valid_until: None,
      ..visitor((None, None))
    }
  }

  #[test]
  fn missing_credential_is_not_found() {
    assert!(matches!(evaluate(None, at(12, 0, 0)), Verdict::NotFound));
  }

  #[test]
  fn blocked_wins_over_valid_window() {
    let mut c = visitor((Some(at(8, 0, 0)), Some(at(18, 0, 0))));
    c.status = CredentialStatus::Blocked;
    assert!(matches!(
      evaluate(Some(c), at(12, 0, 0)),
      Verdict::Denied { reason: DenyReason::Blocked }
    ));
  }

  #[test]
  fn visitor_before_window_is_not_yet_valid() {
    let c = visitor((Some(at(8, 0, 0)), Some(at(18, 0, 0))));
    assert!(matches!(
      evaluate(Some(c), at(7, 59, 59)),
      Verdict::Denied { reason: DenyReason::NotYetValid }
    ));
  }

  #[test]
  fn visitor_window_end_is_inclusive() {
    let until = at(18, 0, 0);
    let c = visitor((Some(at(8, 0, 0)), Some(until)));

    assert!(evaluate(Some(c.clone()), at(17, 59, 59)).is_authorized());
    assert!(evaluate(Some(c.clone()), until).is_authorized());
    assert!(matches!(
      evaluate(Some(c), until + Duration::seconds(1)),
      Verdict::Denied { reason: DenyReason::Expired }
    ));
  }

  #[test]
  fn visitor_without_end_stays_authorized() {
    let c = visitor((Some(at(8, 0, 0)), None));
    assert!(evaluate(Some(c), at(23, 59, 59)).is_authorized());
  }

  #[test]
  fn employee_is_authorized_at_any_time() {
    let far_future = Utc.with_ymd_and_hms(2224, 1, 1, 0, 0, 0).unwrap();
    let far_past = Utc.with_ymd_and_hms(1824, 1, 1, 0, 0, 0).unwrap();
    assert!(evaluate(Some(employee()), far_future).is_authorized());
    assert!(evaluate(Some(employee()), far_past).is_authorized());
  }

  #[test]
  fn blocked_employee_is_denied() {
    let mut c = employee();
    c.status = CredentialStatus::Blocked;
    assert!(matches!(
      evaluate(Some(c), at(12, 0, 0)),
      Verdict::Denied { reason: DenyReason::Blocked }
    ));
  }
}
