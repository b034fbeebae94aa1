//! The `CredentialStore` and `AuditLog` traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g.
//! `gatepass-store-sqlite`). Higher layers (`gatepass-api`, the lifecycle
//! manager) depend on these abstractions, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  audit::{AuditEntry, NewAuditEntry},
  credential::{Credential, CredentialKind, CredentialStatus},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`CredentialStore::list`]. Filters compose; any may be
/// absent, and argument order never matters.
#[derive(Debug, Clone, Default)]
pub struct CredentialFilter {
  pub kind:   Option<CredentialKind>,
  pub status: Option<CredentialStatus>,
  /// Case-insensitive substring match over the display name.
  pub name:   Option<String>,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Abstraction over the durable credential store.
///
/// Writes are total replacements of the credential aggregate (credential plus
/// its vehicle) — partial-field semantics belong to the lifecycle manager,
/// which reads, modifies, and writes back. A `put` or `delete` must be
/// atomic over the whole aggregate so concurrent readers never observe a
/// torn credential/vehicle pair.
///
/// All methods return `Send` futures so the traits can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CredentialStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Retrieve a credential by id. Returns `None` if not found.
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Credential>, Self::Error>> + Send + '_;

  /// List credentials matching `filter`, newest first.
  fn list<'a>(
    &'a self,
    filter: &'a CredentialFilter,
  ) -> impl Future<Output = Result<Vec<Credential>, Self::Error>> + Send + 'a;

  /// Upsert the whole aggregate. Validates the credential invariants and
  /// fails without writing if they are violated.
  fn put(
    &self,
    credential: Credential,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove a credential and its owned vehicle in one atomic step. Fails if
  /// the id is absent.
  fn delete(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// Abstraction over the append-only audit log.
///
/// No update or delete operation exists — the log is write-once per entry by
/// design (compliance requirement). `append` must be safe under concurrent
/// calls: each call produces exactly one durable entry, even when many race.
pub trait AuditLog: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist one entry and return it with its assigned id, sequence number
  /// and (clamped, non-decreasing) timestamp.
  fn append(
    &self,
    entry: NewAuditEntry,
  ) -> impl Future<Output = Result<AuditEntry, Self::Error>> + Send + '_;

  /// The most recent `limit` entries, ordered by timestamp descending, ties
  /// broken by insertion order descending.
  fn recent(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<AuditEntry>, Self::Error>> + Send + '_;
}
