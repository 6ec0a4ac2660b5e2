//! strata-sqlite - SQLite backend for strata.
//!
//! Provides the dialect, schema translator and executor needed to run strata
//! (including the history mode) against a SQLite database through `rusqlite`.
//!
//! # Example
//!
//! ```ignore
//! use strata_core::{ConnectionDetails, ModeRegistry};
//!
//! let details = ConnectionDetails::builder()
//!     .database("app.db")
//!     .mode("history")
//!     .build();
//! let conn = strata_sqlite::connect(details, &ModeRegistry::builtin())?;
//! ```

mod dialect;
mod executor;
mod factory;
mod translator;

pub use dialect::{SqliteDialect, DIALECT_NAME};
pub use executor::SqliteExecutor;
pub use factory::{connect, IN_MEMORY};
pub use translator::SqliteTranslator;
