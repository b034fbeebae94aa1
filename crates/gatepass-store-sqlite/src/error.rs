//! Error type for `gatepass-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum string no longer matches any known variant.
  #[error("cannot decode stored value: {0}")]
  Decode(String),

  #[error("credential not found: {0}")]
  NotFound(Uuid),

  /// Aggregate invariants violated on `put`. Unreachable when writes go
  /// through the lifecycle manager.
  #[error("invalid credential: {0}")]
  InvalidCredential(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
