//! Reading queries as of a past instant.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{CREATED_AT, DELETED_AT};
use crate::error::{StrataError, StrataResult};
use crate::query::{Query, Scope, TableTemplate};
use crate::types::{Value, ALIAS_TOKEN};

/// Predicate selecting the version current at one instant.
///
/// Binds the instant twice. Column references carry the alias token so the
/// predicate resolves against whichever table it is attached to.
pub fn validity_predicate() -> String {
    format!(
        "{t}.{c} <= ? AND ({t}.{d} IS NULL OR {t}.{d} > ?)",
        t = ALIAS_TOKEN,
        c = CREATED_AT,
        d = DELETED_AT
    )
}

/// Point `query` at the shadow tables and keep only versions valid at `instant`.
///
/// The predicate is added both as a direct filter and as a global filter, so
/// every joined shadow table is restricted to the same instant.
pub fn query_history(query: Query, suffix: &str, instant: DateTime<Utc>) -> Query {
    let args = vec![Value::Timestamp(instant), Value::Timestamp(instant)];
    query
        .filter(validity_predicate(), args.clone())
        .global_filter(validity_predicate(), args)
        .with_table_template(TableTemplate::suffixed(suffix))
}

/// Query transform reading every table as it was at `instant`.
///
/// Requires the query's dialect to provide time travel, and a query built
/// from clauses. Applying it to a raw statement or to any other dialect is an
/// error rather than a silently unfiltered read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryScope {
    instant: DateTime<Utc>,
}

impl HistoryScope {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }
}

impl Scope for HistoryScope {
    fn apply(&self, query: Query) -> StrataResult<Query> {
        if query.is_raw() {
            return Err(StrataError::validation(format!(
                "cannot read raw SQL on '{}' as of a past instant",
                query.table()
            )));
        }
        let dialect = Arc::clone(query.dialect());
        match dialect.time_travel() {
            Some(time_travel) => Ok(time_travel.query_history(query, self.instant)),
            None => Err(StrataError::time_travel_absent(dialect.name())),
        }
    }
}

/// Shorthand for [`HistoryScope::new`].
pub fn history_scope(instant: DateTime<Utc>) -> HistoryScope {
    HistoryScope::new(instant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::history::HistoryDialect;
    use crate::query::tests::NumberedDialect;
    use chrono::TimeZone;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_scope_requires_time_travel() {
        let query = Query::new(Arc::new(NumberedDialect), "users");
        let err = query.scope(&history_scope(instant())).unwrap_err();

        assert_eq!(err.code(), ErrorCode::CapTimeTravelMissing);
        assert!(err.to_string().contains("numbered"));
    }

    #[test]
    fn test_scope_rewrites_table_and_filters() {
        let dialect = Arc::new(HistoryDialect::new(Arc::new(NumberedDialect), "_history"));
        let (sql, args) = Query::new(dialect, "users")
            .filter("%TABLE_NAME%.id = ?", vec![Value::from(1i64)])
            .scope(&HistoryScope::new(instant()))
            .unwrap()
            .to_sql()
            .unwrap();

        assert_eq!(
            sql,
            "SELECT users.* FROM users_history AS users WHERE (users.id = $1) \
             AND (users.created_at <= $2 AND (users.deleted_at IS NULL OR users.deleted_at > $3))"
        );
        assert_eq!(
            args,
            vec![
                Value::from(1i64),
                Value::Timestamp(instant()),
                Value::Timestamp(instant())
            ]
        );
    }

    #[test]
    fn test_disjunctive_filter_stays_bounded_by_validity() {
        let dialect = Arc::new(HistoryDialect::new(Arc::new(NumberedDialect), "_history"));
        let (sql, _) = Query::new(dialect, "users")
            .filter(
                "%TABLE_NAME%.id = ? OR %TABLE_NAME%.name = ?",
                vec![Value::from(1i64), Value::from("zzz")],
            )
            .scope(&history_scope(instant()))
            .unwrap()
            .to_sql()
            .unwrap();

        assert!(sql.ends_with(
            "WHERE (users.id = $1 OR users.name = $2) \
             AND (users.created_at <= $3 AND (users.deleted_at IS NULL OR users.deleted_at > $4))"
        ));
    }

    #[test]
    fn test_raw_query_rejected() {
        let dialect = Arc::new(HistoryDialect::new(Arc::new(NumberedDialect), "_history"));
        let err = Query::new(dialect, "users")
            .raw("SELECT * FROM users", vec![])
            .scope(&history_scope(instant()))
            .unwrap_err();

        assert!(matches!(err, StrataError::Validation { .. }));
        assert!(err.to_string().contains("raw SQL"));
    }

    #[test]
    fn test_joined_tables_filtered_by_their_own_alias() {
        let dialect = Arc::new(HistoryDialect::new(Arc::new(NumberedDialect), "_v"));
        let query = Query::new(dialect, "users")
            .alias("u")
            .scope(&history_scope(instant()))
            .unwrap()
            .left_join("pets", "pets.owner_id = u.id", vec![])
            .join_as(
                crate::query::JoinKind::Inner,
                "toys",
                "t",
                "t.pet_id = pets.id",
                vec![],
            );

        let (sql, args) = query.to_sql().unwrap();
        assert_eq!(
            sql,
            "SELECT u.* FROM users_v AS u \
             LEFT JOIN pets_v AS pets ON (pets.owner_id = u.id) \
             AND (pets.created_at <= $1 AND (pets.deleted_at IS NULL OR pets.deleted_at > $2)) \
             INNER JOIN toys_v AS t ON (t.pet_id = pets.id) \
             AND (t.created_at <= $3 AND (t.deleted_at IS NULL OR t.deleted_at > $4)) \
             WHERE (u.created_at <= $5 AND (u.deleted_at IS NULL OR u.deleted_at > $6))"
        );
        assert_eq!(args.len(), 6);
    }

    #[test]
    fn test_query_history_direct() {
        let query = query_history(
            Query::new(Arc::new(NumberedDialect), "users"),
            "_h",
            instant(),
        );
        assert_eq!(query.table_name(), "users_h");
        assert_eq!(query.where_clauses().len(), 1);
        assert_eq!(query.global_clauses().len(), 1);
    }
}
