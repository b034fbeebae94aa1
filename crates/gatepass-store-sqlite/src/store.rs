//! [`SqliteStore`] — the SQLite implementation of
//! [`CredentialStore`] and [`AuditLog`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use gatepass_core::{
  audit::{AuditEntry, NewAuditEntry},
  credential::Credential,
  store::{AuditLog, CredentialFilter, CredentialStore},
};

use crate::{
  Error, Result,
  encode::{
    RawAuditEntry, RawCredential, encode_action, encode_dt, encode_kind,
    encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

const CREDENTIAL_COLUMNS: &str = "
  c.credential_id, c.kind, c.display_name, c.contact_phone, c.external_ref,
  c.status, c.valid_from, c.valid_until, c.created_at,
  v.vehicle_id, v.plate, v.model, v.color";

fn credential_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCredential> {
  Ok(RawCredential {
    credential_id: row.get(0)?,
    kind:          row.get(1)?,
    display_name:  row.get(2)?,
    contact_phone: row.get(3)?,
    external_ref:  row.get(4)?,
    status:        row.get(5)?,
    valid_from:    row.get(6)?,
    valid_until:   row.get(7)?,
    created_at:    row.get(8)?,
    vehicle_id:    row.get(9)?,
    plate:         row.get(10)?,
    model:         row.get(11)?,
    color:         row.get(12)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Gatepass store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// are serialized onto one connection, which is what makes each aggregate
/// write atomic from the perspective of concurrent readers.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── CredentialStore impl ────────────────────────────────────────────────────

impl CredentialStore for SqliteStore {
  type Error = Error;

  async fn get(&self, id: Uuid) -> Result<Option<Credential>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCredential> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {CREDENTIAL_COLUMNS}
                 FROM credentials c
                 LEFT JOIN vehicles v ON v.credential_id = c.credential_id
                 WHERE c.credential_id = ?1"
              ),
              rusqlite::params![id_str],
              credential_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCredential::into_credential).transpose()
  }

  async fn list(&self, filter: &CredentialFilter) -> Result<Vec<Credential>> {
    let kind_str = filter.kind.map(encode_kind).map(str::to_owned);
    let status_str = filter.status.map(encode_status).map(str::to_owned);
    let name_pattern = filter
      .name
      .as_deref()
      .map(|n| format!("%{}%", n.to_lowercase()));

    let raws: Vec<RawCredential> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CREDENTIAL_COLUMNS}
           FROM credentials c
           LEFT JOIN vehicles v ON v.credential_id = c.credential_id
           WHERE (?1 IS NULL OR c.kind = ?1)
             AND (?2 IS NULL OR c.status = ?2)
             AND (?3 IS NULL OR LOWER(c.display_name) LIKE ?3)
           ORDER BY c.created_at DESC, c.credential_id"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              kind_str.as_deref(),
              status_str.as_deref(),
              name_pattern.as_deref(),
            ],
            credential_from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCredential::into_credential).collect()
  }

  async fn put(&self, credential: Credential) -> Result<()> {
    credential.check_invariants().map_err(|e| match e {
      gatepass_core::Error::InvalidCredential(msg) => Error::InvalidCredential(msg),
      other => Error::InvalidCredential(other.to_string()),
    })?;

    let id_str = encode_uuid(credential.credential_id);
    let kind_str = encode_kind(credential.kind).to_owned();
    let display_name = credential.display_name.clone();
    let contact_phone = credential.contact_phone.clone();
    let external_ref = credential.external_ref.value().to_owned();
    let status_str = encode_status(credential.status).to_owned();
    let valid_from = credential.valid_from.map(encode_dt);
    let valid_until = credential.valid_until.map(encode_dt);
    let created_at = encode_dt(credential.created_at);
    let vehicle = credential.vehicle.as_ref().map(|v| {
      (
        encode_uuid(v.vehicle_id),
        v.plate.clone(),
        v.model.clone(),
        v.color.clone(),
      )
    });

    self
      .conn
      .call(move |conn| {
        // Replace the whole aggregate in one transaction so readers never
        // see a credential paired with a stale vehicle.
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM vehicles WHERE credential_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "INSERT OR REPLACE INTO credentials (
             credential_id, kind, display_name, contact_phone, external_ref,
             status, valid_from, valid_until, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            kind_str,
            display_name,
            contact_phone,
            external_ref,
            status_str,
            valid_from,
            valid_until,
            created_at,
          ],
        )?;
        if let Some((vehicle_id, plate, model, color)) = vehicle {
          tx.execute(
            "INSERT INTO vehicles (vehicle_id, credential_id, plate, model, color)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![vehicle_id, id_str, plate, model, color],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let deleted: usize = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM vehicles WHERE credential_id = ?1",
          rusqlite::params![id_str],
        )?;
        let deleted = tx.execute(
          "DELETE FROM credentials WHERE credential_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(deleted)
      })
      .await?;

    if deleted == 0 {
      return Err(Error::NotFound(id));
    }
    Ok(())
  }
}

// ─── AuditLog impl ───────────────────────────────────────────────────────────

impl AuditLog for SqliteStore {
  type Error = Error;

  async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry> {
    let entry_id = Uuid::new_v4();
    let entry_id_str = encode_uuid(entry_id);
    let now_str = encode_dt(Utc::now());
    let operator_id = entry.operator_id.clone();
    let action_str = encode_action(entry.action).to_owned();
    let subject_str = encode_uuid(entry.subject_id);
    let details = entry.details.clone();

    let (seq, ts_str): (i64, String) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // Clamp the timestamp so the column is non-decreasing in insertion
        // order. Encoded timestamps are fixed-width, so the string compare
        // is a chronological compare.
        let last_ts: Option<String> = tx
          .query_row(
            "SELECT timestamp FROM audit_log ORDER BY seq DESC LIMIT 1",
            [],
            |r| r.get(0),
          )
          .optional()?;
        let ts = match last_ts {
          Some(prev) if prev.as_str() > now_str.as_str() => prev,
          _ => now_str,
        };

        tx.execute(
          "INSERT INTO audit_log (entry_id, timestamp, operator_id, action, subject_id, details)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            entry_id_str,
            ts,
            operator_id,
            action_str,
            subject_str,
            details,
          ],
        )?;
        let seq = tx.last_insert_rowid();
        tx.commit()?;
        Ok((seq, ts))
      })
      .await?;

    Ok(AuditEntry {
      entry_id,
      seq,
      timestamp: crate::encode::decode_dt(&ts_str)?,
      operator_id: entry.operator_id,
      action: entry.action,
      subject_id: entry.subject_id,
      details: entry.details,
    })
  }

  async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>> {
    let limit_val = limit as i64;

    let raws: Vec<RawAuditEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT seq, entry_id, timestamp, operator_id, action, subject_id, details
           FROM audit_log
           ORDER BY timestamp DESC, seq DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], |row| {
            Ok(RawAuditEntry {
              seq:         row.get(0)?,
              entry_id:    row.get(1)?,
              timestamp:   row.get(2)?,
              operator_id: row.get(3)?,
              action:      row.get(4)?,
              subject_id:  row.get(5)?,
              details:     row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAuditEntry::into_entry).collect()
  }
}
