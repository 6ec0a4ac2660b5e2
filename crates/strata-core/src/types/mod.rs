//! Core types for strata.

mod clause;
mod columns;
mod value;

pub use clause::{Clause, Clauses, ALIAS_TOKEN};
pub use columns::{Column, Columns};
pub use value::{format_timestamp, parse_timestamp, Row, Value};
