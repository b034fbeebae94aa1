//! Credential — the person/vehicle aggregate at the heart of the store.
//!
//! A credential records who may pass the gate, under which status, and (for
//! visitors) inside which validity window. The aggregate owns at most one
//! vehicle; writes always replace the whole aggregate, never single fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Kind and status ─────────────────────────────────────────────────────────

/// Who the credential was issued to. Immutable after creation — changing
/// kind is modelled as delete + recreate, not an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
  Employee,
  Visitor,
}

impl CredentialKind {
  pub fn label(self) -> &'static str {
    match self {
      Self::Employee => "employee",
      Self::Visitor => "visitor",
    }
  }
}

/// Administrative status. Independent of the validity window: a blocked
/// credential is denied even inside its window, and expiry never mutates
/// status — it is computed at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
  Active,
  Blocked,
}

// ─── External reference ──────────────────────────────────────────────────────

/// Kind-dependent identifier: employees carry a registration number,
/// visitors a national id. Exactly one form exists per credential, selected
/// by [`CredentialKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ExternalRef {
  Registration(String),
  NationalId(String),
}

impl ExternalRef {
  pub fn value(&self) -> &str {
    match self {
      Self::Registration(v) | Self::NationalId(v) => v,
    }
  }

  pub fn matches_kind(&self, kind: CredentialKind) -> bool {
    matches!(
      (self, kind),
      (Self::Registration(_), CredentialKind::Employee)
        | (Self::NationalId(_), CredentialKind::Visitor)
    )
  }
}

// ─── Vehicle ─────────────────────────────────────────────────────────────────

/// The vehicle owned by a credential. `credential_id` is a back-reference
/// only; ownership lives on the credential side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
  pub vehicle_id:    Uuid,
  pub credential_id: Uuid,
  /// Normalised uppercase plate, `LLL-NNNN` or `LLL-NLNN` style.
  pub plate:         String,
  pub model:         Option<String>,
  pub color:         Option<String>,
}

// ─── Credential ──────────────────────────────────────────────────────────────

/// The stored credential aggregate. Mutated only by the lifecycle manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
  /// Opaque, non-guessable identifier (random v4); doubles as the public
  /// verification capability, so it is never sequential.
  pub credential_id: Uuid,
  pub kind:          CredentialKind,
  pub display_name:  String,
  pub contact_phone: String,
  pub external_ref:  ExternalRef,
  pub status:        CredentialStatus,
  /// Visitor-only window start; `None` for employees by design.
  pub valid_from:    Option<DateTime<Utc>>,
  /// Visitor-only window end, inclusive. `None` for employees by design.
  pub valid_until:   Option<DateTime<Utc>>,
  pub vehicle:       Option<Vehicle>,
  pub created_at:    DateTime<Utc>,
}

impl Credential {
  pub fn plate(&self) -> Option<&str> {
    self.vehicle.as_ref().map(|v| v.plate.as_str())
  }

  /// Verify the aggregate invariants. Enforced by the store on every `put`;
  /// a violation there means a writer bypassed the lifecycle manager.
  pub fn check_invariants(&self) -> Result<()> {
    if !self.external_ref.matches_kind(self.kind) {
      return Err(Error::InvalidCredential(format!(
        "external_ref does not match kind {:?}",
        self.kind
      )));
    }
    if let (Some(from), Some(until)) = (self.valid_from, self.valid_until)
      && from > until
    {
      return Err(Error::InvalidCredential(
        "valid_from is after valid_until".to_string(),
      ));
    }
    if self.kind == CredentialKind::Employee
      && (self.valid_from.is_some() || self.valid_until.is_some())
    {
      return Err(Error::InvalidCredential(
        "employee credentials are time-unbounded".to_string(),
      ));
    }
    if let Some(vehicle) = &self.vehicle
      && vehicle.credential_id != self.credential_id
    {
      return Err(Error::InvalidCredential(
        "vehicle back-reference does not match owning credential".to_string(),
      ));
    }
    Ok(())
  }
}

// ─── Draft input ─────────────────────────────────────────────────────────────

/// Unvalidated input to [`crate::lifecycle::LifecycleManager::create`] and
/// `update`. Field checks run in declaration order and report the first
/// failing field; normalisation (plate, phone, national id) happens during
/// validation, before anything touches the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialDraft {
  pub kind:          CredentialKind,
  pub display_name:  String,
  pub contact_phone: String,
  /// Registration number (employee) or national id (visitor).
  pub id_number:     String,
  pub plate:         String,
  pub vehicle_model: Option<String>,
  pub vehicle_color: Option<String>,
  pub valid_from:    Option<DateTime<Utc>>,
  pub valid_until:   Option<DateTime<Utc>>,
}
