//! Schema translator trait - turns migration operations into DDL.

use crate::error::StrataResult;
use crate::schema::Table;

/// Translates migration operations on a table description into SQL.
///
/// Operations receive the table by value so wrappers can adjust a copy and
/// translate it again. Column operations read their payload from
/// `table.columns` (`[0]` is the affected column; for renames `[0]` is the old
/// name and `[1]` the new one), index operations from `table.indexes` and
/// foreign-key operations from `table.foreign_keys[0]`.
pub trait SchemaTranslator: Send + Sync {
    fn create_table(&self, table: Table) -> StrataResult<String>;

    fn drop_table(&self, table: Table) -> StrataResult<String>;

    fn rename_table(&self, from: Table, to: Table) -> StrataResult<String>;

    fn add_column(&self, table: Table) -> StrataResult<String>;

    fn change_column(&self, table: Table) -> StrataResult<String>;

    fn drop_column(&self, table: Table) -> StrataResult<String>;

    fn rename_column(&self, table: Table) -> StrataResult<String>;

    fn add_index(&self, table: Table) -> StrataResult<String>;

    fn drop_index(&self, table: Table) -> StrataResult<String>;

    fn rename_index(&self, table: Table) -> StrataResult<String>;

    fn add_foreign_key(&self, table: Table) -> StrataResult<String>;

    fn drop_foreign_key(&self, table: Table) -> StrataResult<String>;
}
