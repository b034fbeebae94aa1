//! The lifecycle manager — the only component permitted to mutate the
//! credential store.
//!
//! Every operation validates fully before touching the store, pairs its
//! write with exactly one audit entry, and publishes a change event on
//! success. The store keeps each aggregate write atomic; the write + audit
//! pair is protected by compensating rollback, so a failed append never
//! leaves a visible half-applied mutation behind.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
  Error, Result,
  audit::{AuditAction, NewAuditEntry},
  credential::{
    Credential, CredentialDraft, CredentialKind, CredentialStatus,
    ExternalRef, Vehicle,
  },
  normalize,
  store::{AuditLog, CredentialStore},
};

// ─── Change events ───────────────────────────────────────────────────────────

/// Published after every committed mutation. UI collaborators may subscribe
/// to refresh their views; a lagging or absent subscriber never blocks or
/// fails a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
  pub action:        AuditAction,
  pub credential_id: Uuid,
}

// ─── Validated draft fields ──────────────────────────────────────────────────

/// The outcome of draft validation: normalised fields, ready to write.
struct Validated {
  display_name:  String,
  contact_phone: String,
  external_ref:  ExternalRef,
  plate:         String,
  valid_from:    Option<DateTime<Utc>>,
  valid_until:   Option<DateTime<Utc>>,
}

/// Check the draft in field order and report the first failing field.
/// Normalisation is applied here so the store only ever sees canonical
/// values.
fn validate(draft: &CredentialDraft) -> Result<Validated> {
  let display_name = draft.display_name.trim();
  if display_name.is_empty() {
    return Err(Error::validation("display_name", "required"));
  }

  let contact_phone = normalize::phone(&draft.contact_phone);
  if !normalize::is_phone(&contact_phone) {
    return Err(Error::validation(
      "contact_phone",
      "expected 10 or 11 digits",
    ));
  }

  let external_ref = match draft.kind {
    CredentialKind::Employee => {
      let registration = draft.id_number.trim();
      if registration.is_empty() {
        return Err(Error::validation("id_number", "registration required"));
      }
      ExternalRef::Registration(registration.to_string())
    }
    CredentialKind::Visitor => {
      let national_id = normalize::national_id(&draft.id_number);
      if !normalize::is_national_id(&national_id) {
        return Err(Error::validation(
          "id_number",
          "national id requires 11 digits",
        ));
      }
      ExternalRef::NationalId(national_id)
    }
  };

  let plate = normalize::plate(&draft.plate);
  if !normalize::is_plate(&plate) {
    return Err(Error::validation("plate", "expected LLL-NNNN or LLL-NLNN"));
  }

  // Employees are time-unbounded by design; a window on an employee draft
  // is dropped rather than rejected, matching the management form.
  let (valid_from, valid_until) = match draft.kind {
    CredentialKind::Employee => (None, None),
    CredentialKind::Visitor => {
      let Some(from) = draft.valid_from else {
        return Err(Error::validation("valid_from", "required for visitors"));
      };
      if let Some(until) = draft.valid_until
        && until < from
      {
        return Err(Error::validation(
          "valid_until",
          "must not precede valid_from",
        ));
      }
      (Some(from), draft.valid_until)
    }
  };

  Ok(Validated {
    display_name: display_name.to_string(),
    contact_phone,
    external_ref,
    plate,
    valid_from,
    valid_until,
  })
}

// ─── Manager ─────────────────────────────────────────────────────────────────

/// Sole writer of credential state. Holds no session state: the acting
/// operator is an explicit parameter on every call, recorded verbatim.
pub struct LifecycleManager<S> {
  store:  Arc<S>,
  events: broadcast::Sender<ChangeEvent>,
}

impl<S> LifecycleManager<S>
where
  S: CredentialStore + AuditLog,
{
  pub fn new(store: Arc<S>) -> Self {
    let (events, _) = broadcast::channel(64);
    Self { store, events }
  }

  /// Subscribe to mutation notifications.
  pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
    self.events.subscribe()
  }

  fn notify(&self, action: AuditAction, credential_id: Uuid) {
    // Nobody listening is fine.
    let _ = self.events.send(ChangeEvent { action, credential_id });
  }

  /// Create a credential (status `Active`) with its vehicle, paired with a
  /// `Create` audit entry.
  pub async fn create(
    &self,
    draft: CredentialDraft,
    operator: &str,
  ) -> Result<Credential> {
    let fields = validate(&draft)?;
    let credential_id = Uuid::new_v4();

    let credential = Credential {
      credential_id,
      kind: draft.kind,
      display_name: fields.display_name,
      contact_phone: fields.contact_phone,
      external_ref: fields.external_ref,
      status: CredentialStatus::Active,
      valid_from: fields.valid_from,
      valid_until: fields.valid_until,
      vehicle: Some(Vehicle {
        vehicle_id: Uuid::new_v4(),
        credential_id,
        plate: fields.plate,
        model: draft.vehicle_model.clone(),
        color: draft.vehicle_color.clone(),
      }),
      created_at: Utc::now(),
    };

    CredentialStore::put(&*self.store, credential.clone())
      .await
      .map_err(Error::storage)?;

    let entry = NewAuditEntry {
      operator_id: Some(operator.to_string()),
      action:      AuditAction::Create,
      subject_id:  credential_id,
      details:     format!(
        "Registered new {} {} (plate {})",
        credential.kind.label(),
        credential.display_name,
        credential.plate().unwrap_or("none"),
      ),
    };

    if let Err(append_err) = AuditLog::append(&*self.store, entry).await {
      if let Err(undo_err) = CredentialStore::delete(&*self.store, credential_id).await {
        tracing::error!(
          %credential_id,
          append_error = %append_err,
          undo_error = %undo_err,
          "audit append failed and create rollback failed",
        );
        return Err(Error::PartialWrite(credential_id));
      }
      return Err(Error::storage(append_err));
    }

    self.notify(AuditAction::Create, credential_id);
    Ok(credential)
  }

  /// Replace the mutable fields of an existing credential. `kind` is
  /// immutable and `status` is not editable through update; the vehicle
  /// keeps its id but takes the draft's plate, model and color.
  pub async fn update(
    &self,
    id: Uuid,
    draft: CredentialDraft,
    operator: &str,
  ) -> Result<Credential> {
    let previous = self.fetch(id).await?;
    if draft.kind != previous.kind {
      return Err(Error::validation(
        "kind",
        "immutable; delete and recreate instead",
      ));
    }
    let fields = validate(&draft)?;

    let credential = Credential {
      credential_id: id,
      kind: previous.kind,
      display_name: fields.display_name,
      contact_phone: fields.contact_phone,
      external_ref: fields.external_ref,
      status: previous.status,
      valid_from: fields.valid_from,
      valid_until: fields.valid_until,
      vehicle: Some(Vehicle {
        vehicle_id: previous
          .vehicle
          .as_ref()
          .map(|v| v.vehicle_id)
          .unwrap_or_else(Uuid::new_v4),
        credential_id: id,
        plate: fields.plate,
        model: draft.vehicle_model.clone(),
        color: draft.vehicle_color.clone(),
      }),
      created_at: previous.created_at,
    };

    let details = format!(
      "Updated {} {}",
      credential.kind.label(),
      credential.display_name
    );
    self
      .write_with_audit(credential.clone(), previous, AuditAction::Update, operator, details)
      .await?;

    self.notify(AuditAction::Update, id);
    Ok(credential)
  }

  /// Set or clear the block. Every request is logged, repeats included —
  /// re-blocking an already blocked credential still writes a `Block`
  /// entry.
  pub async fn set_blocked(
    &self,
    id: Uuid,
    blocked: bool,
    operator: &str,
  ) -> Result<Credential> {
    let previous = self.fetch(id).await?;

    let mut credential = previous.clone();
    credential.status = if blocked {
      CredentialStatus::Blocked
    } else {
      CredentialStatus::Active
    };

    let action = if blocked { AuditAction::Block } else { AuditAction::Unblock };
    let details = format!(
      "{} {}",
      if blocked { "Blocked" } else { "Unblocked" },
      credential.display_name
    );
    self
      .write_with_audit(credential.clone(), previous, action, operator, details)
      .await?;

    self.notify(action, id);
    Ok(credential)
  }

  /// Remove the credential and its vehicle, then log a `Delete` entry
  /// carrying the name/plate snapshot — the subject is unreachable by the
  /// time the entry is read.
  pub async fn delete(&self, id: Uuid, operator: &str) -> Result<()> {
    let previous = self.fetch(id).await?;
    let details = format!(
      "Deleted {} {} (plate {})",
      previous.kind.label(),
      previous.display_name,
      previous.plate().unwrap_or("none"),
    );

    CredentialStore::delete(&*self.store, id)
      .await
      .map_err(Error::storage)?;

    let entry = NewAuditEntry {
      operator_id: Some(operator.to_string()),
      action: AuditAction::Delete,
      subject_id: id,
      details,
    };

    if let Err(append_err) = AuditLog::append(&*self.store, entry).await {
      if let Err(undo_err) = CredentialStore::put(&*self.store, previous).await {
        tracing::error!(
          credential_id = %id,
          append_error = %append_err,
          undo_error = %undo_err,
          "audit append failed and delete restore failed",
        );
        return Err(Error::PartialDelete(id));
      }
      return Err(Error::storage(append_err));
    }

    self.notify(AuditAction::Delete, id);
    Ok(())
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  async fn fetch(&self, id: Uuid) -> Result<Credential> {
    CredentialStore::get(&*self.store, id)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::NotFound(id))
  }

  /// Write the aggregate, then its audit entry; restore `previous` if the
  /// append fails.
  async fn write_with_audit(
    &self,
    credential: Credential,
    previous: Credential,
    action: AuditAction,
    operator: &str,
    details: String,
  ) -> Result<()> {
    let id = credential.credential_id;

    CredentialStore::put(&*self.store, credential)
      .await
      .map_err(Error::storage)?;

    let entry = NewAuditEntry {
      operator_id: Some(operator.to_string()),
      action,
      subject_id: id,
      details,
    };

    if let Err(append_err) = AuditLog::append(&*self.store, entry).await {
      if let Err(undo_err) = CredentialStore::put(&*self.store, previous).await {
        tracing::error!(
          credential_id = %id,
          append_error = %append_err,
          undo_error = %undo_err,
          "audit append failed and write rollback failed",
        );
        return Err(Error::PartialWrite(id));
      }
      return Err(Error::storage(append_err));
    }

    Ok(())
  }
}
