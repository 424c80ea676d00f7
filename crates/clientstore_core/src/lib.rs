//! Client data-access core.
//! Owns the client record, its SQLite schema and the `ClientStore` query surface.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::client::{Client, ClientId, ClientValidationError, Timestamp};
pub use repo::client_repo::{ClientStore, RepoError, RepoResult, SqliteClientStore};
pub use repo::memory_repo::MemoryClientStore;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
