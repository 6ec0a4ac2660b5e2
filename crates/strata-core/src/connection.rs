//! A dialect, an executor and the details they were set up from.

use std::sync::Arc;

use tracing::debug;

use crate::config::ConnectionDetails;
use crate::error::StrataResult;
use crate::mode::ModeRegistry;
use crate::query::Query;
use crate::schema::SchemaChange;
use crate::traits::{Dialect, Entity, Executor};
use crate::types::{Columns, Row};

/// Entry point for mutations, queries and migrations.
///
/// The dialect is the one produced by the configured mode, so with the
/// history mode every mutation and migration also reaches the shadow tables.
pub struct Connection {
    details: ConnectionDetails,
    dialect: Arc<dyn Dialect>,
    executor: Arc<dyn Executor>,
}

impl Connection {
    /// Apply the mode named in `details` to `dialect`.
    ///
    /// Options consumed by the mode are removed from the stored details.
    pub fn new(
        mut details: ConnectionDetails,
        dialect: Arc<dyn Dialect>,
        executor: Arc<dyn Executor>,
        modes: &ModeRegistry,
    ) -> StrataResult<Self> {
        let dialect = modes.apply(dialect, &mut details)?;
        Ok(Self {
            details,
            dialect,
            executor,
        })
    }

    pub fn details(&self) -> &ConnectionDetails {
        &self.details
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    /// Insert `entity`; its id is updated if the database assigned one.
    pub fn create(&self, entity: &mut dyn Entity) -> StrataResult<()> {
        let columns = Columns::for_entity(&*entity);
        self.dialect.create(self.executor.as_ref(), entity, &columns)
    }

    pub fn update(&self, entity: &dyn Entity) -> StrataResult<()> {
        let columns = Columns::for_entity(entity);
        self.dialect.update(self.executor.as_ref(), entity, &columns)
    }

    pub fn destroy(&self, entity: &dyn Entity) -> StrataResult<()> {
        self.dialect.destroy(self.executor.as_ref(), entity)
    }

    /// Start a query on `table`.
    pub fn q(&self, table: impl Into<String>) -> Query {
        Query::new(Arc::clone(&self.dialect), table)
    }

    pub fn all(&self, query: &Query) -> StrataResult<Vec<Row>> {
        self.dialect.select_many(self.executor.as_ref(), query)
    }

    /// First row of `query`, if any.
    pub fn first(&self, query: &Query) -> StrataResult<Option<Row>> {
        let rows = self.all(&query.clone().limit(1))?;
        Ok(rows.into_iter().next())
    }

    /// Translate a migration with the dialect's translator and run it.
    pub fn migrate(&self, change: SchemaChange) -> StrataResult<()> {
        let table = change.table_name().to_string();
        let sql = change.translate(self.dialect.schema_translator().as_ref())?;
        debug!(table = %table, "Running migration");
        self.executor.execute_script(&sql)
    }
}
