//! Executor trait - runs SQL on behalf of dialects.

use crate::error::StrataResult;
use crate::types::{Row, Value};

/// A handle able to run SQL with positional arguments.
///
/// Transactions are the executor's concern: a dialect issues its statements
/// one after another on the handle it was given and never opens or commits a
/// transaction itself.
#[cfg_attr(test, mockall::automock)]
pub trait Executor: Send + Sync {
    /// Run a single statement, returning the number of affected rows.
    fn execute(&self, sql: &str, args: &[Value]) -> StrataResult<usize>;

    /// Run a query, returning every row.
    fn query(&self, sql: &str, args: &[Value]) -> StrataResult<Vec<Row>>;

    /// Run a script of one or more statements without arguments.
    fn execute_script(&self, sql: &str) -> StrataResult<()>;
}
