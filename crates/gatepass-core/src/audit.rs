//! Audit trail types.
//!
//! The audit log is strictly append-only: every lifecycle mutation pairs with
//! exactly one entry, entries are never updated or deleted, and insertion
//! order (`seq`) — not wall-clock comparison — is the source of truth for
//! "what happened when".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The administrative action an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
  Create,
  Update,
  Block,
  Unblock,
  Delete,
}

/// A persisted audit entry. `seq` and `timestamp` are assigned by the log at
/// append time; the timestamp is clamped to be non-decreasing in insertion
/// order even when the wall clock coarsens or steps back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
  pub entry_id:    Uuid,
  pub seq:         i64,
  pub timestamp:   DateTime<Utc>,
  /// `None` records a system-initiated action.
  pub operator_id: Option<String>,
  pub action:      AuditAction,
  pub subject_id:  Uuid,
  /// Human-readable summary, not machine-parsed. For deletions this carries
  /// the name/plate snapshot captured before the subject became
  /// unreachable.
  pub details:     String,
}

/// Input to [`crate::store::AuditLog::append`]. Id, sequence number and
/// timestamp are never accepted from callers.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
  pub operator_id: Option<String>,
  pub action:      AuditAction,
  pub subject_id:  Uuid,
  pub details:     String,
}
