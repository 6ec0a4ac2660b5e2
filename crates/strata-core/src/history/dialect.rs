//! Dialect decorator recording every mutation in a shadow table.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::{
    query_history, suffix_or_default, HistoryRow, HistoryTranslator, CREATED_AT, DELETED_AT,
};
use crate::clock::{Clock, SystemClock};
use crate::error::{HistoryStage, StrataError, StrataResult};
use crate::query::Query;
use crate::traits::{Dialect, Entity, Executor, Quoter, SchemaTranslator, TimeTravel};
use crate::types::{Columns, Row, Value};

/// Wraps a dialect so that Create, Update and Destroy also maintain history.
///
/// The base statement always runs first. History statements only run once it
/// succeeded, and they are not wrapped in a transaction: a failing history
/// write leaves the base mutation in place and is reported as a
/// [`StrataError::History`] carrying the stage that failed.
pub struct HistoryDialect {
    inner: Arc<dyn Dialect>,
    suffix: String,
    clock: Arc<dyn Clock>,
}

impl HistoryDialect {
    /// Wrap `inner`, stamping history rows with wall-clock time.
    pub fn new(inner: Arc<dyn Dialect>, suffix: impl Into<String>) -> Self {
        Self::with_clock(inner, suffix, Arc::new(SystemClock))
    }

    pub fn with_clock(
        inner: Arc<dyn Dialect>,
        suffix: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner,
            suffix: suffix_or_default(suffix),
            clock,
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// The wrapped dialect.
    pub fn inner(&self) -> &Arc<dyn Dialect> {
        &self.inner
    }

    /// Name of the shadow table of `table`.
    pub fn shadow_table(&self, table: &str) -> String {
        format!("{}{}", table, self.suffix)
    }

    /// Columns copied into the shadow table: everything writable plus the id.
    fn history_columns(entity: &dyn Entity) -> Columns {
        Columns::for_entity(entity)
            .writeable()
            .with(&[entity.id_field()])
    }

    /// Copy the persisted base row into a new open shadow row.
    fn insert_history(
        &self,
        exec: &dyn Executor,
        entity: &dyn Entity,
        at: DateTime<Utc>,
    ) -> StrataResult<()> {
        let table = entity.table_name();
        let columns = Self::history_columns(entity);
        let sql = format!(
            "INSERT INTO {shadow} ({cols}, {created}, {deleted}) \
             SELECT {select}, ? AS {created}, NULL AS {deleted} FROM {base} WHERE {id} = ?",
            shadow = self.quote(&self.shadow_table(table)),
            cols = columns.quoted_string(self),
            created = self.quote(CREATED_AT),
            deleted = self.quote(DELETED_AT),
            select = columns.select_string(self),
            base = self.quote(table),
            id = self.quote(&format!("{}.{}", table, entity.id_field())),
        );

        debug!(table, stage = %HistoryStage::Insert, "Writing history row");
        exec.execute(
            &self.translate_sql(&sql),
            &[Value::Timestamp(at), entity.id()],
        )
        .map(|_| ())
        .map_err(|e| {
            warn!(table, error = %e, "History insert failed after base mutation");
            StrataError::history(HistoryStage::Insert, e)
        })
    }

    /// Stamp `deleted_at` on the open shadow row, if there is one.
    fn delete_history(
        &self,
        exec: &dyn Executor,
        entity: &dyn Entity,
        at: DateTime<Utc>,
    ) -> StrataResult<()> {
        let table = entity.table_name();
        let sql = format!(
            "UPDATE {shadow} SET {deleted} = ? WHERE {id} = ? AND {deleted} IS NULL",
            shadow = self.quote(&self.shadow_table(table)),
            deleted = self.quote(DELETED_AT),
            id = self.quote(entity.id_field()),
        );

        debug!(table, stage = %HistoryStage::Delete, "Closing history row");
        exec.execute(
            &self.translate_sql(&sql),
            &[Value::Timestamp(at), entity.id()],
        )
        .map(|closed| {
            if closed == 0 {
                debug!(table, "No open history row to close");
            }
        })
        .map_err(|e| {
            warn!(table, error = %e, "History delete failed after base mutation");
            StrataError::history(HistoryStage::Delete, e)
        })
    }

    /// Every recorded version of one entity, oldest first.
    pub fn versions(
        &self,
        exec: &dyn Executor,
        table: &str,
        id_field: &str,
        id: Value,
    ) -> StrataResult<Vec<HistoryRow>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ? ORDER BY {}",
            self.quote(&self.shadow_table(table)),
            self.quote(id_field),
            self.quote(CREATED_AT),
        );
        exec.query(&self.translate_sql(&sql), &[id])?
            .into_iter()
            .map(|row| HistoryRow::from_row(row, id_field))
            .collect()
    }
}

impl Quoter for HistoryDialect {
    fn quote(&self, ident: &str) -> String {
        self.inner.quote(ident)
    }
}

impl Dialect for HistoryDialect {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn translate_sql(&self, sql: &str) -> String {
        self.inner.translate_sql(sql)
    }

    fn create(
        &self,
        exec: &dyn Executor,
        entity: &mut dyn Entity,
        columns: &Columns,
    ) -> StrataResult<()> {
        self.inner.create(exec, entity, columns)?;
        let now = self.clock.now();
        self.insert_history(exec, &*entity, now)
    }

    fn update(
        &self,
        exec: &dyn Executor,
        entity: &dyn Entity,
        columns: &Columns,
    ) -> StrataResult<()> {
        self.inner.update(exec, entity, columns)?;
        let now = self.clock.now();
        self.delete_history(exec, entity, now)?;
        self.insert_history(exec, entity, now)
    }

    fn destroy(&self, exec: &dyn Executor, entity: &dyn Entity) -> StrataResult<()> {
        self.inner.destroy(exec, entity)?;
        let now = self.clock.now();
        self.delete_history(exec, entity, now)
    }

    fn select_many(&self, exec: &dyn Executor, query: &Query) -> StrataResult<Vec<Row>> {
        self.inner.select_many(exec, query)
    }

    fn schema_translator(&self) -> Box<dyn SchemaTranslator> {
        Box::new(HistoryTranslator::new(
            self.inner.schema_translator(),
            self.suffix.clone(),
        ))
    }

    fn time_travel(&self) -> Option<&dyn TimeTravel> {
        Some(self)
    }
}

impl TimeTravel for HistoryDialect {
    fn query_history(&self, query: Query, instant: DateTime<Utc>) -> Query {
        query_history(query, &self.suffix, instant)
    }
}
