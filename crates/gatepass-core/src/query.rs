//! Read-side reporting facade for dashboard and report views.
//!
//! Everything here is computed at read time from committed store state.
//! "Expiring soon" and "expired" are derived dimensions over the validity
//! window; they never overload the stored `status`.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::{
  Error, Result,
  audit::AuditEntry,
  credential::{Credential, CredentialKind, CredentialStatus},
  store::{AuditLog, CredentialFilter, CredentialStore},
};

/// The reporting window for "expiring soon".
pub const EXPIRING_SOON_HOURS: i64 = 2;

// ─── Derived validity ────────────────────────────────────────────────────────

/// Presentation-only state derived from the validity window. Distinct from
/// [`CredentialStatus`]: a credential can be `Expired` here and still
/// `Active` there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidityState {
  /// Employees: no window at all.
  Unbounded,
  NotYetValid,
  Current,
  /// Ends within the next [`EXPIRING_SOON_HOURS`] hours.
  ExpiringSoon,
  Expired,
}

pub fn validity_state(credential: &Credential, now: DateTime<Utc>) -> ValidityState {
  if credential.kind == CredentialKind::Employee {
    return ValidityState::Unbounded;
  }
  if let Some(from) = credential.valid_from
    && now < from
  {
    return ValidityState::NotYetValid;
  }
  match credential.valid_until {
    Some(until) if now > until => ValidityState::Expired,
    Some(until) if until <= now + Duration::hours(EXPIRING_SOON_HOURS) => {
      ValidityState::ExpiringSoon
    }
    _ => ValidityState::Current,
  }
}

/// The expiring-soon window test: `valid_until` in `(now, now + 2h]`.
/// Already-expired credentials fall outside on the open lower bound; a
/// window ending exactly two hours out is included.
pub fn is_expiring_soon(credential: &Credential, now: DateTime<Utc>) -> bool {
  credential.kind == CredentialKind::Visitor
    && credential.valid_until.is_some_and(|until| {
      now < until && until <= now + Duration::hours(EXPIRING_SOON_HOURS)
    })
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// Dashboard headline counts. Status counts are literal over the stored
/// status; `expiring_soon` is the separate derived dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CredentialCounts {
  pub employees:     usize,
  pub visitors:      usize,
  pub active:        usize,
  pub blocked:       usize,
  pub vehicles:      usize,
  pub expiring_soon: usize,
}

/// An audit entry joined with a display label for its operator.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityView {
  #[serde(flatten)]
  pub entry:          AuditEntry,
  /// The operator id, or `"System"` for system-initiated entries. Resolving
  /// ids to human names belongs to the excluded operator directory.
  pub operator_label: String,
}

// ─── Facade ──────────────────────────────────────────────────────────────────

/// Read-only views over the credential store and audit log. Never mutates.
pub struct Reports<S> {
  store: Arc<S>,
}

impl<S> Reports<S>
where
  S: CredentialStore + AuditLog,
{
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  pub async fn counts(&self, now: DateTime<Utc>) -> Result<CredentialCounts> {
    let credentials = CredentialStore::list(&*self.store, &CredentialFilter::default())
      .await
      .map_err(Error::storage)?;

    let mut counts = CredentialCounts {
      employees:     0,
      visitors:      0,
      active:        0,
      blocked:       0,
      vehicles:      0,
      expiring_soon: 0,
    };
    for credential in &credentials {
      match credential.kind {
        CredentialKind::Employee => counts.employees += 1,
        CredentialKind::Visitor => counts.visitors += 1,
      }
      match credential.status {
        CredentialStatus::Active => counts.active += 1,
        CredentialStatus::Blocked => counts.blocked += 1,
      }
      if credential.vehicle.is_some() {
        counts.vehicles += 1;
      }
      if is_expiring_soon(credential, now) {
        counts.expiring_soon += 1;
      }
    }
    Ok(counts)
  }

  /// Visitor credentials whose window ends in `(now, now + 2h]`, soonest
  /// first.
  pub async fn expiring_soon(&self, now: DateTime<Utc>) -> Result<Vec<Credential>> {
    let mut expiring: Vec<Credential> =
      CredentialStore::list(&*self.store, &CredentialFilter::default())
        .await
        .map_err(Error::storage)?
        .into_iter()
        .filter(|c| is_expiring_soon(c, now))
        .collect();
    expiring.sort_by_key(|c| c.valid_until);
    Ok(expiring)
  }

  /// The most recent `limit` audit entries with operator labels attached.
  pub async fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityView>> {
    let entries = AuditLog::recent(&*self.store, limit)
      .await
      .map_err(Error::storage)?;
    Ok(
      entries
        .into_iter()
        .map(|entry| ActivityView {
          operator_label: entry
            .operator_id
            .clone()
            .unwrap_or_else(|| "System".to_string()),
          entry,
        })
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use uuid::Uuid;

  use super::*;
  use crate::credential::ExternalRef;

  fn visitor_until(until: Option<DateTime<Utc>>) -> Credential {
    Credential {
      credential_id: Uuid::new_v4(),
      kind:          CredentialKind::Visitor,
      display_name:  "Ana Souza".to_string(),
      contact_phone: "(11) 98765-4321".to_string(),
      external_ref:  ExternalRef::NationalId("123.456.789-00".to_string()),
      status:        CredentialStatus::Active,
      valid_from:    None,
      valid_until:   until,
      vehicle:       None,
      created_at:    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
  }

  #[test]
  fn expiring_soon_window_boundaries() {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let two_hours = Duration::hours(EXPIRING_SOON_HOURS);

    // Exactly +2h: included.
    assert!(is_expiring_soon(&visitor_until(Some(now + two_hours)), now));
    // +2h and one second: excluded.
    assert!(!is_expiring_soon(
      &visitor_until(Some(now + two_hours + Duration::seconds(1))),
      now
    ));
    // Already expired one second ago: excluded.
    assert!(!is_expiring_soon(
      &visitor_until(Some(now - Duration::seconds(1))),
      now
    ));
    // Ending exactly now: expired, excluded by the open lower bound.
    assert!(!is_expiring_soon(&visitor_until(Some(now)), now));
    // No window end at all: excluded.
    assert!(!is_expiring_soon(&visitor_until(None), now));
  }

  #[test]
  fn employees_never_expire() {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let mut c = visitor_until(Some(now + Duration::hours(1)));
    c.kind = CredentialKind::Employee;
    c.external_ref = ExternalRef::Registration("EMP-042".to_string());
    c.valid_until = None;
    assert!(!is_expiring_soon(&c, now));
    assert_eq!(validity_state(&c, now), ValidityState::Unbounded);
  }

  #[test]
  fn validity_state_tracks_the_window() {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

    let mut c = visitor_until(Some(now + Duration::hours(8)));
    c.valid_from = Some(now - Duration::hours(1));
    assert_eq!(validity_state(&c, now), ValidityState::Current);

    c.valid_until = Some(now + Duration::hours(1));
    assert_eq!(validity_state(&c, now), ValidityState::ExpiringSoon);

    c.valid_until = Some(now - Duration::seconds(1));
    assert_eq!(validity_state(&c, now), ValidityState::Expired);

    c.valid_from = Some(now + Duration::hours(1));
    c.valid_until = Some(now + Duration::hours(4));
    assert_eq!(validity_state(&c, now), ValidityState::NotYetValid);
  }
}
