//! Connection factory for SQLite databases.

use std::sync::Arc;

use tracing::info;

use strata_core::config::ConnectionDetails;
use strata_core::connection::Connection;
use strata_core::error::{StrataError, StrataResult};
use strata_core::mode::ModeRegistry;

use crate::dialect::{SqliteDialect, DIALECT_NAME};
use crate::executor::SqliteExecutor;

/// Database location that opens a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Open the database named in `details` and apply its mode.
pub fn connect(details: ConnectionDetails, modes: &ModeRegistry) -> StrataResult<Connection> {
    if details.dialect != DIALECT_NAME {
        return Err(StrataError::Configuration(format!(
            "dialect '{}' is not handled by strata-sqlite",
            details.dialect
        )));
    }

    let executor = if details.database == IN_MEMORY {
        SqliteExecutor::in_memory()?
    } else {
        SqliteExecutor::open(&details.database)?
    };
    info!(database = %details.database, mode = %details.mode, "Opened SQLite database");

    Connection::new(details, Arc::new(SqliteDialect), Arc::new(executor), modes)
}
