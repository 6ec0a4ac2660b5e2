//! Dialect trait and the optional capabilities a dialect may expose.

use chrono::{DateTime, Utc};

use super::{Entity, Executor, SchemaTranslator};
use crate::error::StrataResult;
use crate::query::Query;
use crate::types::{Columns, Row};

/// Identifier quoting.
pub trait Quoter {
    /// Quote an identifier; dotted names are quoted part by part.
    fn quote(&self, ident: &str) -> String;
}

/// Capability of reading tables as they were at a past instant.
pub trait TimeTravel: Send + Sync {
    /// Rewrite `query` to read the shadow tables filtered to `instant`.
    fn query_history(&self, query: Query, instant: DateTime<Utc>) -> Query;
}

/// Core Dialect trait - every SQL backend implements this.
pub trait Dialect: Quoter + Send + Sync {
    /// Short dialect name (e.g. `"sqlite"`).
    fn name(&self) -> &str;

    /// Rewrite `?` placeholders and other generic SQL into the dialect's form.
    fn translate_sql(&self, sql: &str) -> String;

    /// Insert the entity, assigning its id if the database generates one.
    fn create(
        &self,
        exec: &dyn Executor,
        entity: &mut dyn Entity,
        columns: &Columns,
    ) -> StrataResult<()>;

    /// Update the entity's writable columns by id.
    fn update(&self, exec: &dyn Executor, entity: &dyn Entity, columns: &Columns)
        -> StrataResult<()>;

    /// Delete the entity by id.
    fn destroy(&self, exec: &dyn Executor, entity: &dyn Entity) -> StrataResult<()>;

    /// Run a query and return every row.
    fn select_many(&self, exec: &dyn Executor, query: &Query) -> StrataResult<Vec<Row>> {
        let (sql, args) = query.to_sql()?;
        exec.query(&sql, &args)
    }

    /// Translator turning migration operations into this dialect's DDL.
    fn schema_translator(&self) -> Box<dyn SchemaTranslator>;

    /// Time-travel capability, if this dialect provides it.
    fn time_travel(&self) -> Option<&dyn TimeTravel> {
        None
    }
}
