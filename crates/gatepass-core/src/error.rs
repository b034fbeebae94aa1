//! Error types for `gatepass-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// A user-correctable field error. Validation runs fully before any write,
  /// so a validation failure never leaves a partial state behind.
  #[error("invalid {field}: {constraint}")]
  Validation {
    field:      &'static str,
    constraint: String,
  },

  #[error("credential not found: {0}")]
  NotFound(Uuid),

  /// A store-level invariant violation. Unreachable when all writes go
  /// through the lifecycle manager; treat as an internal-consistency
  /// assertion.
  #[error("credential invariant violated: {0}")]
  InvalidCredential(String),

  /// The credential write succeeded, the paired audit append failed, and the
  /// compensating rollback of the write also failed.
  #[error("credential {0} written but its audit entry was lost; rollback failed")]
  PartialWrite(Uuid),

  /// The credential was deleted, the paired audit append failed, and the
  /// compensating restore also failed.
  #[error("credential {0} deleted but its audit entry was lost; restore failed")]
  PartialDelete(Uuid),

  /// Infrastructure failure. Retryable by the caller with backoff; never
  /// retried silently inside the core.
  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn validation(field: &'static str, constraint: impl Into<String>) -> Self {
    Self::Validation { field, constraint: constraint.into() }
  }

  pub fn storage(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Storage(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
