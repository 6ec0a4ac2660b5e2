//! Query construction: table templates, predicates, joins and scopes.
//!
//! A [`Query`] keeps its direct (WHERE) predicates separate from its global
//! predicates. Global predicates are attached to every join when the query is
//! rendered, with [`ALIAS_TOKEN`](crate::types::ALIAS_TOKEN) resolved to each
//! join's alias, so one predicate template can filter every joined table.

pub mod join;

use std::fmt;
use std::sync::Arc;

use crate::error::{StrataError, StrataResult};
use crate::traits::Dialect;
use crate::types::{Clause, Clauses, Value};

pub use join::{JoinClause, JoinClauses, JoinKind, JoinTarget};

/// Template turning a base table name into the name actually queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableTemplate(String);

impl TableTemplate {
    /// Token replaced by the base table name.
    pub const PLACEHOLDER: &'static str = "{}";

    /// Template resolving to the base name unchanged.
    pub fn base() -> Self {
        Self(Self::PLACEHOLDER.to_string())
    }

    /// Template resolving to the base name followed by `suffix`.
    pub fn suffixed(suffix: &str) -> Self {
        Self(format!("{}{}", Self::PLACEHOLDER, suffix))
    }

    pub fn resolve(&self, table: &str) -> String {
        self.0.replace(Self::PLACEHOLDER, table)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TableTemplate {
    fn default() -> Self {
        Self::base()
    }
}

/// A reusable query transform.
pub trait Scope {
    fn apply(&self, query: Query) -> StrataResult<Query>;
}

impl<F> Scope for F
where
    F: Fn(Query) -> StrataResult<Query>,
{
    fn apply(&self, query: Query) -> StrataResult<Query> {
        self(query)
    }
}

/// A SELECT over one table, bound to the dialect that will run it.
#[derive(Clone)]
pub struct Query {
    dialect: Arc<dyn Dialect>,
    table: String,
    alias: String,
    table_template: TableTemplate,
    columns: Vec<String>,
    where_clauses: Clauses,
    global_clauses: Clauses,
    join_clauses: JoinClauses,
    order_clauses: Vec<String>,
    limit: Option<u64>,
    raw_sql: Option<Clause>,
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("dialect", &self.dialect.name())
            .field("table", &self.table)
            .field("alias", &self.alias)
            .field("table_template", &self.table_template)
            .field("where_clauses", &self.where_clauses)
            .field("global_clauses", &self.global_clauses)
            .field("join_clauses", &self.join_clauses)
            .finish()
    }
}

impl Query {
    /// Query `table`, aliased by its own name.
    pub fn new(dialect: Arc<dyn Dialect>, table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            dialect,
            alias: table.clone(),
            table,
            table_template: TableTemplate::base(),
            columns: Vec::new(),
            where_clauses: Clauses::new(),
            global_clauses: Clauses::new(),
            join_clauses: JoinClauses::new(),
            order_clauses: Vec::new(),
            limit: None,
            raw_sql: None,
        }
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    /// Base table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Table name after applying the template.
    pub fn table_name(&self) -> String {
        self.table_template.resolve(&self.table)
    }

    pub fn table_alias(&self) -> &str {
        &self.alias
    }

    pub fn table_template(&self) -> &TableTemplate {
        &self.table_template
    }

    pub fn where_clauses(&self) -> &Clauses {
        &self.where_clauses
    }

    pub fn global_clauses(&self) -> &Clauses {
        &self.global_clauses
    }

    /// Joins as requested, before template and global predicates are applied.
    pub fn join_clauses(&self) -> &JoinClauses {
        &self.join_clauses
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn with_table_template(mut self, template: TableTemplate) -> Self {
        self.table_template = template;
        self
    }

    /// Restrict the select list (defaults to every column of the primary table).
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Add a direct WHERE predicate.
    pub fn filter(mut self, fragment: impl Into<String>, args: Vec<Value>) -> Self {
        self.where_clauses.push(Clause::new(fragment, args));
        self
    }

    /// Add a predicate applied to every joined table.
    pub fn global_filter(mut self, fragment: impl Into<String>, args: Vec<Value>) -> Self {
        self.global_clauses.push(Clause::new(fragment, args));
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order_clauses.push(order.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Replace the generated SQL with a raw statement.
    pub fn raw(mut self, sql: impl Into<String>, args: Vec<Value>) -> Self {
        self.raw_sql = Some(Clause::new(sql, args));
        self
    }

    /// Whether the query renders a raw statement instead of generated SQL.
    pub fn is_raw(&self) -> bool {
        self.raw_sql.is_some()
    }

    /// Apply a scope.
    pub fn scope<S: Scope + ?Sized>(self, scope: &S) -> StrataResult<Self> {
        scope.apply(self)
    }

    /// Append a join of `kind`, aliasing the table by its own name.
    pub fn join_kind(
        self,
        kind: JoinKind,
        table: impl Into<String>,
        on: impl Into<String>,
        args: Vec<Value>,
    ) -> Self {
        let table = table.into();
        self.join_as(kind, table.clone(), table, on, args)
    }

    /// Append a join of `kind` with an explicit alias.
    pub fn join_as(
        mut self,
        kind: JoinKind,
        table: impl Into<String>,
        alias: impl Into<String>,
        on: impl Into<String>,
        args: Vec<Value>,
    ) -> Self {
        if self.raw_sql.is_some() {
            tracing::warn!(table = %self.table, "Query is set up to use raw SQL; ignoring join");
            return self;
        }
        self.join_clauses
            .push(JoinClause::aliased(kind, table, alias, Clause::new(on, args)));
        self
    }

    pub fn join(self, table: impl Into<String>, on: impl Into<String>, args: Vec<Value>) -> Self {
        self.join_kind(JoinKind::Join, table, on, args)
    }

    pub fn left_join(
        self,
        table: impl Into<String>,
        on: impl Into<String>,
        args: Vec<Value>,
    ) -> Self {
        self.join_kind(JoinKind::Left, table, on, args)
    }

    pub fn right_join(
        self,
        table: impl Into<String>,
        on: impl Into<String>,
        args: Vec<Value>,
    ) -> Self {
        self.join_kind(JoinKind::Right, table, on, args)
    }

    pub fn left_outer_join(
        self,
        table: impl Into<String>,
        on: impl Into<String>,
        args: Vec<Value>,
    ) -> Self {
        self.join_kind(JoinKind::LeftOuter, table, on, args)
    }

    pub fn right_outer_join(
        self,
        table: impl Into<String>,
        on: impl Into<String>,
        args: Vec<Value>,
    ) -> Self {
        self.join_kind(JoinKind::RightOuter, table, on, args)
    }

    pub fn inner_join(
        self,
        table: impl Into<String>,
        on: impl Into<String>,
        args: Vec<Value>,
    ) -> Self {
        self.join_kind(JoinKind::Inner, table, on, args)
    }

    /// Joins as rendered: table template applied and global predicates attached.
    pub fn effective_joins(&self) -> JoinClauses {
        self.join_clauses
            .iter()
            .map(|join| {
                let mut join = join.clone();
                join.target.table = self.table_template.resolve(&join.target.table);
                join.attach_global(&self.global_clauses);
                join
            })
            .collect()
    }

    /// Render the query into dialect SQL and its positional arguments.
    pub fn to_sql(&self) -> StrataResult<(String, Vec<Value>)> {
        if let Some(raw) = &self.raw_sql {
            return Ok((self.dialect.translate_sql(&raw.fragment), raw.arguments.clone()));
        }
        if self.table.is_empty() {
            return Err(StrataError::validation("query has no table"));
        }

        let columns = if self.columns.is_empty() {
            format!("{}.*", self.alias)
        } else {
            self.columns.join(", ")
        };
        let mut sql = format!(
            "SELECT {} FROM {} AS {}",
            columns,
            self.table_name(),
            self.alias
        );
        let mut args = Vec::new();

        let joins = self.effective_joins();
        if !joins.is_empty() {
            sql.push(' ');
            sql.push_str(&joins.to_string());
            args.extend(joins.args());
        }

        if !self.where_clauses.is_empty() {
            let wheres = self.where_clauses.with_alias(&self.alias);
            sql.push_str(" WHERE ");
            sql.push_str(&wheres.conjunction());
            args.extend(wheres.args());
        }

        if !self.order_clauses.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_clauses.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        Ok((self.dialect.translate_sql(&sql), args))
    }
}
