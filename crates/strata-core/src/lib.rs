//! strata-core - Core library for strata.
//!
//! This crate provides the capability traits, query builder and schema model
//! of a SQL data-access layer, plus the history mode that keeps a shadow
//! table per base table and reads any table as it was at a past instant.
//!
//! # Example
//!
//! ```ignore
//! use strata_core::{history_scope, Connection, ConnectionDetails, ModeRegistry};
//!
//! let details = ConnectionDetails::builder().mode("history").build();
//! let conn = Connection::new(details, dialect, executor, &ModeRegistry::builtin())?;
//!
//! conn.create(&mut user)?;
//!
//! // Read the users table as it was an hour ago
//! let past = conn.q("users").scope(&history_scope(Utc::now() - Duration::hours(1)))?;
//! let rows = conn.all(&past)?;
//! ```

pub mod clock;
pub mod config;
pub mod connection;
pub mod error;
pub mod history;
pub mod mode;
pub mod query;
pub mod schema;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConnectionDetails, HistoryOptions};
pub use connection::Connection;
pub use error::{ErrorCode, HistoryStage, StrataError, StrataResult};
pub use history::{history_scope, HistoryDialect, HistoryRow, HistoryScope, HistoryTranslator};
pub use mode::{history_mode, ModeRegistry};
pub use query::{JoinKind, Query, Scope, TableTemplate};
pub use schema::{ColumnOptions, ForeignKey, Index, SchemaChange, Table};
pub use traits::{
    Access, Dialect, Entity, Executor, Field, Quoter, SchemaTranslator, TimeTravel,
};
pub use types::{Clause, Clauses, Columns, Row, Value};
