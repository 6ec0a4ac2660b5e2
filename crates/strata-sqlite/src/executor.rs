//! Executor over a single rusqlite connection.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use tracing::debug;

use strata_core::error::{StrataError, StrataResult};
use strata_core::traits::Executor;
use strata_core::types::{format_timestamp, Row, Value};

/// SQLite-backed executor.
///
/// Statements run in autocommit mode unless the caller opened a transaction
/// with `BEGIN` through [`Executor::execute_script`].
#[derive(Debug)]
pub struct SqliteExecutor {
    conn: Mutex<Connection>,
}

impl SqliteExecutor {
    /// Open (or create) a database file at the given path
    pub fn open(path: impl AsRef<Path>) -> StrataResult<Self> {
        let conn = Connection::open(path.as_ref()).map_err(|e| {
            StrataError::connection_failed(
                format!("failed to open {}", path.as_ref().display()),
                e,
            )
        })?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> StrataResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StrataError::connection_failed("failed to open in-memory database", e))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StrataResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StrataError::Internal(format!("connection lock poisoned: {}", e)))
    }
}

fn db_error(e: rusqlite::Error) -> StrataError {
    StrataError::database_source(e.to_string(), e)
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Real(r) => SqlValue::Real(*r),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Blob(b) => SqlValue::Blob(b.clone()),
        Value::Timestamp(ts) => SqlValue::Text(format_timestamp(ts)),
    }
}

fn from_sql(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::Integer(i),
        SqlValue::Real(r) => Value::Real(r),
        SqlValue::Text(s) => Value::Text(s),
        SqlValue::Blob(b) => Value::Blob(b),
    }
}

impl Executor for SqliteExecutor {
    fn execute(&self, sql: &str, args: &[Value]) -> StrataResult<usize> {
        debug!(sql, args = args.len(), "Executing statement");
        let params: Vec<SqlValue> = args.iter().map(to_sql).collect();
        let conn = self.lock()?;
        conn.execute(sql, params_from_iter(params.iter()))
            .map_err(db_error)
    }

    fn query(&self, sql: &str, args: &[Value]) -> StrataResult<Vec<Row>> {
        debug!(sql, args = args.len(), "Running query");
        let params: Vec<SqlValue> = args.iter().map(to_sql).collect();
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql).map_err(db_error)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params_from_iter(params.iter())).map_err(db_error)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(db_error)? {
            let mut record = Row::new();
            for (i, name) in names.iter().enumerate() {
                let value: SqlValue = row.get(i).map_err(db_error)?;
                record.push(name.clone(), from_sql(value));
            }
            out.push(record);
        }
        Ok(out)
    }

    fn execute_script(&self, sql: &str) -> StrataResult<()> {
        debug!(sql, "Executing script");
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(db_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn setup() -> SqliteExecutor {
        let exec = SqliteExecutor::in_memory().unwrap();
        exec.execute_script("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, at TEXT, data BLOB);")
            .unwrap();
        exec
    }

    #[test]
    fn test_values_round_trip_through_sqlite() {
        let exec = setup();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let n = exec
            .execute(
                "INSERT INTO t (id, name, at, data) VALUES (?, ?, ?, ?)",
                &[
                    Value::from(1i64),
                    Value::from("a"),
                    Value::Timestamp(at),
                    Value::Blob(vec![1, 2]),
                ],
            )
            .unwrap();
        assert_eq!(n, 1);

        let rows = exec.query("SELECT * FROM t WHERE id = ?", &[Value::from(1i64)]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].columns(), &["id", "name", "at", "data"]);
        assert_eq!(rows[0].get("name"), Some(&Value::from("a")));
        assert_eq!(rows[0].get("at").unwrap().as_timestamp().unwrap(), Some(at));
        assert_eq!(rows[0].get("data"), Some(&Value::Blob(vec![1, 2])));
    }

    #[test]
    fn test_bool_binds_as_integer() {
        let exec = setup();
        exec.execute("INSERT INTO t (id) VALUES (?)", &[Value::from(true)])
            .unwrap();
        let rows = exec.query("SELECT id FROM t", &[]).unwrap();
        assert_eq!(rows[0].get("id"), Some(&Value::from(1i64)));
    }

    #[test]
    fn test_errors_map_to_database() {
        let exec = setup();
        let err = exec.execute("INSERT INTO missing VALUES (1)", &[]).unwrap_err();
        assert!(matches!(err, StrataError::Database { .. }));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_open_failure_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SqliteExecutor::open(dir.path().join("absent").join("app.db")).unwrap_err();
        assert_eq!(err.code(), strata_core::error::ErrorCode::DbConnectionFailed);
    }
}
