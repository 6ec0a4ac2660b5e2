//! Temporal history on shadow tables.
//!
//! Every base table `t` gets a shadow table `t<suffix>` holding one row per
//! version of each entity, stamped with the interval `[created_at, deleted_at)`
//! during which that version was current. [`HistoryDialect`] writes the
//! versions, [`HistoryTranslator`] keeps shadow schemas in step with their base
//! tables and [`HistoryScope`] reads a query as of a past instant.

mod dialect;
mod row;
mod scope;
mod translator;

pub use dialect::HistoryDialect;
pub use row::HistoryRow;
pub use scope::{history_scope, query_history, validity_predicate, HistoryScope};
pub use translator::HistoryTranslator;

/// Suffix used when none is configured.
pub const DEFAULT_SUFFIX: &str = "_history";

/// Start of a version's validity interval.
pub const CREATED_AT: &str = "created_at";

/// End of a version's validity interval; NULL while the version is current.
pub const DELETED_AT: &str = "deleted_at";

/// Name under which the history mode is registered.
pub const MODE_NAME: &str = "history";

/// `suffix`, or [`DEFAULT_SUFFIX`] when it is empty.
///
/// An empty suffix would make every table look historical and give shadow
/// tables the names of their base tables.
fn suffix_or_default(suffix: impl Into<String>) -> String {
    let suffix = suffix.into();
    if suffix.is_empty() {
        DEFAULT_SUFFIX.to_string()
    } else {
        suffix
    }
}
