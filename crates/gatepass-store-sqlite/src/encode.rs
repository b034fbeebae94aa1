//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with fixed-width nanosecond
//! precision. Fixed width makes the strings sort lexicographically in
//! chronological order (the audit clamp and `recent` ordering rely on
//! this), and full nanosecond precision makes a put/get round-trip
//! lossless for the instants `Utc::now` produces. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use gatepass_core::{
  audit::{AuditAction, AuditEntry},
  credential::{
    Credential, CredentialKind, CredentialStatus, ExternalRef, Vehicle,
  },
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── CredentialKind ──────────────────────────────────────────────────────────

pub fn encode_kind(k: CredentialKind) -> &'static str {
  match k {
    CredentialKind::Employee => "employee",
    CredentialKind::Visitor => "visitor",
  }
}

pub fn decode_kind(s: &str) -> Result<CredentialKind> {
  match s {
    "employee" => Ok(CredentialKind::Employee),
    "visitor" => Ok(CredentialKind::Visitor),
    other => Err(Error::Decode(format!("unknown credential kind: {other:?}"))),
  }
}

// ─── CredentialStatus ────────────────────────────────────────────────────────

pub fn encode_status(s: CredentialStatus) -> &'static str {
  match s {
    CredentialStatus::Active => "active",
    CredentialStatus::Blocked => "blocked",
  }
}

pub fn decode_status(s: &str) -> Result<CredentialStatus> {
  match s {
    "active" => Ok(CredentialStatus::Active),
    "blocked" => Ok(CredentialStatus::Blocked),
    other => Err(Error::Decode(format!("unknown status: {other:?}"))),
  }
}

// ─── AuditAction ─────────────────────────────────────────────────────────────

pub fn encode_action(a: AuditAction) -> &'static str {
  match a {
    AuditAction::Create => "create",
    AuditAction::Update => "update",
    AuditAction::Block => "block",
    AuditAction::Unblock => "unblock",
    AuditAction::Delete => "delete",
  }
}

pub fn decode_action(s: &str) -> Result<AuditAction> {
  match s {
    "create" => Ok(AuditAction::Create),
    "update" => Ok(AuditAction::Update),
    "block" => Ok(AuditAction::Block),
    "unblock" => Ok(AuditAction::Unblock),
    "delete" => Ok(AuditAction::Delete),
    other => Err(Error::Decode(format!("unknown audit action: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read from a `credentials` row joined with its vehicle.
pub struct RawCredential {
  pub credential_id: String,
  pub kind:          String,
  pub display_name:  String,
  pub contact_phone: String,
  pub external_ref:  String,
  pub status:        String,
  pub valid_from:    Option<String>,
  pub valid_until:   Option<String>,
  pub created_at:    String,
  // vehicles join
  pub vehicle_id:    Option<String>,
  pub plate:         Option<String>,
  pub model:         Option<String>,
  pub color:         Option<String>,
}

impl RawCredential {
  pub fn into_credential(self) -> Result<Credential> {
    let credential_id = decode_uuid(&self.credential_id)?;
    let kind = decode_kind(&self.kind)?;

    // The external_ref column holds only the value; the variant is implied
    // by the kind column.
    let external_ref = match kind {
      CredentialKind::Employee => ExternalRef::Registration(self.external_ref),
      CredentialKind::Visitor => ExternalRef::NationalId(self.external_ref),
    };

    let vehicle = match (self.vehicle_id, self.plate) {
      (Some(vehicle_id), Some(plate)) => Some(Vehicle {
        vehicle_id: decode_uuid(&vehicle_id)?,
        credential_id,
        plate,
        model: self.model,
        color: self.color,
      }),
      _ => None,
    };

    Ok(Credential {
      credential_id,
      kind,
      display_name: self.display_name,
      contact_phone: self.contact_phone,
      external_ref,
      status: decode_status(&self.status)?,
      valid_from: self.valid_from.as_deref().map(decode_dt).transpose()?,
      valid_until: self.valid_until.as_deref().map(decode_dt).transpose()?,
      vehicle,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read from an `audit_log` row.
pub struct RawAuditEntry {
  pub seq:         i64,
  pub entry_id:    String,
  pub timestamp:   String,
  pub operator_id: Option<String>,
  pub action:      String,
  pub subject_id:  String,
  pub details:     String,
}

impl RawAuditEntry {
  pub fn into_entry(self) -> Result<AuditEntry> {
    Ok(AuditEntry {
      entry_id:    decode_uuid(&self.entry_id)?,
      seq:         self.seq,
      timestamp:   decode_dt(&self.timestamp)?,
      operator_id: self.operator_id,
      action:      decode_action(&self.action)?,
      subject_id:  decode_uuid(&self.subject_id)?,
      details:     self.details,
    })
  }
}
