//! SQL schema for the Gatepass SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS credentials (
    credential_id TEXT PRIMARY KEY,
    kind          TEXT NOT NULL,   -- 'employee' | 'visitor'
    display_name  TEXT NOT NULL,
    contact_phone TEXT NOT NULL,
    external_ref  TEXT NOT NULL,   -- registration or national id, per kind
    status        TEXT NOT NULL,   -- 'active' | 'blocked'
    valid_from    TEXT,            -- RFC 3339 UTC; visitors only
    valid_until   TEXT,            -- RFC 3339 UTC; visitors only
    created_at    TEXT NOT NULL
);

-- At most one vehicle per credential; written and removed together with its
-- owning credential, inside the same transaction.
CREATE TABLE IF NOT EXISTS vehicles (
    vehicle_id    TEXT PRIMARY KEY,
    credential_id TEXT NOT NULL UNIQUE REFERENCES credentials(credential_id),
    plate         TEXT NOT NULL,
    model         TEXT,
    color         TEXT
);

-- The audit log is strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS audit_log (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_id    TEXT NOT NULL UNIQUE,
    timestamp   TEXT NOT NULL,     -- RFC 3339 UTC; clamped non-decreasing
    operator_id TEXT,              -- NULL = system
    action      TEXT NOT NULL,
    subject_id  TEXT NOT NULL,     -- intentionally not a foreign key:
                                   -- entries outlive their subject
    details     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS credentials_kind_idx   ON credentials(kind);
CREATE INDEX IF NOT EXISTS credentials_status_idx ON credentials(status);
CREATE INDEX IF NOT EXISTS credentials_until_idx  ON credentials(valid_until);
CREATE INDEX IF NOT EXISTS audit_timestamp_idx    ON audit_log(timestamp);

PRAGMA user_version = 1;
";
