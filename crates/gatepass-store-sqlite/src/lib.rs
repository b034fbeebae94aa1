//! SQLite backend for the Gatepass credential store and audit log.

pub mod encode;
pub mod error;
pub mod schema;
pub mod store;


pub use error::{Error, Result};
pub use store::SqliteStore;
