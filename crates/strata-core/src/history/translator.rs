//! Schema translator that mirrors migrations onto shadow tables.

use tracing::debug;

use super::{suffix_or_default, CREATED_AT, DELETED_AT};
use crate::error::{HistoryStage, StrataError, StrataResult};
use crate::schema::{Column, ColumnOptions, Table};
use crate::traits::SchemaTranslator;

/// Column type of the temporal columns on shadow tables.
const TIMESTAMP_TYPE: &str = "timestamp";

/// Wraps a base translator so every table operation is repeated on the
/// table's shadow counterpart.
///
/// Output is the base SQL, a newline, then the shadow SQL. Operations naming
/// a table that already carries the suffix are rejected, so shadow tables can
/// only change through their base table.
pub struct HistoryTranslator {
    inner: Box<dyn SchemaTranslator>,
    suffix: String,
}

impl HistoryTranslator {
    pub fn new(inner: Box<dyn SchemaTranslator>, suffix: impl Into<String>) -> Self {
        Self {
            inner,
            suffix: suffix_or_default(suffix),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    fn is_historical(&self, name: &str) -> bool {
        name.ends_with(&self.suffix)
    }

    fn guard(&self, operation: &str, name: &str) -> StrataResult<()> {
        if self.is_historical(name) {
            debug!(operation, table = name, "Rejected migration on historical table");
            return Err(StrataError::historical_target());
        }
        Ok(())
    }

    /// Derive the shadow description of `table`.
    ///
    /// Same columns with primary flags cleared, no indexes, no foreign keys,
    /// plus `created_at` and a nullable `deleted_at`.
    pub fn shadow_table(&self, table: &Table) -> StrataResult<Table> {
        let mut shadow = table.clone();
        shadow.name.push_str(&self.suffix);
        shadow.foreign_keys.clear();
        shadow.indexes.clear();
        for column in &mut shadow.columns {
            column.primary = false;
        }

        shadow
            .push_column(Column::new(CREATED_AT, TIMESTAMP_TYPE))
            .map_err(|e| StrataError::history(HistoryStage::Table, e))?;
        shadow
            .push_column(
                Column::new(DELETED_AT, TIMESTAMP_TYPE).with_options(ColumnOptions::nullable()),
            )
            .map_err(|e| StrataError::history(HistoryStage::Table, e))?;
        Ok(shadow)
    }

    /// Run `op` on the base table, then on a suffixed copy whose indexes are
    /// no longer unique.
    fn apply<F>(&self, operation: &str, table: Table, op: F) -> StrataResult<String>
    where
        F: Fn(Table) -> StrataResult<String>,
    {
        self.guard(operation, &table.name)?;
        let sql = op(table.clone())?;

        let mut shadow = table;
        shadow.name.push_str(&self.suffix);
        for index in &mut shadow.indexes {
            index.unique = false;
        }
        let mirrored = op(shadow)?;

        Ok(format!("{}\n{}", sql, mirrored))
    }
}

impl SchemaTranslator for HistoryTranslator {
    fn create_table(&self, mut table: Table) -> StrataResult<String> {
        self.guard("create_table", &table.name)?;
        table.disable_timestamps();
        let sql = self.inner.create_table(table.clone())?;
        let shadow = self.inner.create_table(self.shadow_table(&table)?)?;
        Ok(format!("{}\n{}", sql, shadow))
    }

    fn drop_table(&self, table: Table) -> StrataResult<String> {
        self.apply("drop_table", table, |t| self.inner.drop_table(t))
    }

    fn rename_table(&self, from: Table, to: Table) -> StrataResult<String> {
        self.guard("rename_table", &from.name)?;
        self.guard("rename_table", &to.name)?;
        let sql = self.inner.rename_table(from.clone(), to.clone())?;

        let (mut from, mut to) = (from, to);
        from.name.push_str(&self.suffix);
        to.name.push_str(&self.suffix);
        let mirrored = self.inner.rename_table(from, to)?;

        Ok(format!("{}\n{}", sql, mirrored))
    }

    fn add_column(&self, table: Table) -> StrataResult<String> {
        self.apply("add_column", table, |t| self.inner.add_column(t))
    }

    fn change_column(&self, table: Table) -> StrataResult<String> {
        self.apply("change_column", table, |t| self.inner.change_column(t))
    }

    fn drop_column(&self, table: Table) -> StrataResult<String> {
        self.apply("drop_column", table, |t| self.inner.drop_column(t))
    }

    fn rename_column(&self, table: Table) -> StrataResult<String> {
        self.apply("rename_column", table, |t| self.inner.rename_column(t))
    }

    fn add_index(&self, table: Table) -> StrataResult<String> {
        self.inner.add_index(table)
    }

    fn drop_index(&self, table: Table) -> StrataResult<String> {
        self.inner.drop_index(table)
    }

    fn rename_index(&self, table: Table) -> StrataResult<String> {
        self.inner.rename_index(table)
    }

    fn add_foreign_key(&self, table: Table) -> StrataResult<String> {
        self.inner.add_foreign_key(table)
    }

    fn drop_foreign_key(&self, table: Table) -> StrataResult<String> {
        self.inner.drop_foreign_key(table)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::schema::{ForeignKey, Index, SchemaChange};

    /// Translator that describes each operation instead of emitting real DDL.
    pub(crate) struct EchoTranslator;

    fn describe(table: &Table) -> String {
        let cols: Vec<String> = table
            .columns
            .iter()
            .map(|c| {
                let mut s = format!("{}:{}", c.name, c.column_type);
                if c.primary {
                    s.push_str(":pk");
                }
                if c.options.null {
                    s.push_str(":null");
                }
                s
            })
            .collect();
        let idx: Vec<String> = table
            .indexes
            .iter()
            .map(|i| format!("{}{}", i.name, if i.unique { ":unique" } else { "" }))
            .collect();
        format!(
            "{} cols=[{}] idx=[{}] fks={} ts={}",
            table.name,
            cols.join(","),
            idx.join(","),
            table.foreign_keys.len(),
            table.timestamps_enabled()
        )
    }

    impl SchemaTranslator for EchoTranslator {
        fn create_table(&self, t: Table) -> StrataResult<String> {
            Ok(format!("CREATE {}", describe(&t)))
        }
        fn drop_table(&self, t: Table) -> StrataResult<String> {
            Ok(format!("DROP {}", describe(&t)))
        }
        fn rename_table(&self, from: Table, to: Table) -> StrataResult<String> {
            Ok(format!("RENAME {} TO {}", from.name, to.name))
        }
        fn add_column(&self, t: Table) -> StrataResult<String> {
            Ok(format!("ADD COLUMN {}", describe(&t)))
        }
        fn change_column(&self, t: Table) -> StrataResult<String> {
            Ok(format!("CHANGE COLUMN {}", describe(&t)))
        }
        fn drop_column(&self, t: Table) -> StrataResult<String> {
            Ok(format!("DROP COLUMN {}", describe(&t)))
        }
        fn rename_column(&self, t: Table) -> StrataResult<String> {
            Ok(format!("RENAME COLUMN {}", describe(&t)))
        }
        fn add_index(&self, t: Table) -> StrataResult<String> {
            Ok(format!("ADD INDEX {}", describe(&t)))
        }
        fn drop_index(&self, t: Table) -> StrataResult<String> {
            Ok(format!("DROP INDEX {}", describe(&t)))
        }
        fn rename_index(&self, t: Table) -> StrataResult<String> {
            Ok(format!("RENAME INDEX {}", describe(&t)))
        }
        fn add_foreign_key(&self, t: Table) -> StrataResult<String> {
            Ok(format!("ADD FK {}", describe(&t)))
        }
        fn drop_foreign_key(&self, t: Table) -> StrataResult<String> {
            Ok(format!("DROP FK {}", describe(&t)))
        }
    }

    /// Translator whose every operation fails.
    struct BrokenTranslator;

    impl SchemaTranslator for BrokenTranslator {
        fn create_table(&self, _: Table) -> StrataResult<String> {
            Err(StrataError::unsupported("broken"))
        }
        fn drop_table(&self, t: Table) -> StrataResult<String> {
            self.create_table(t)
        }
        fn rename_table(&self, t: Table, _: Table) -> StrataResult<String> {
            self.create_table(t)
        }
        fn add_column(&self, t: Table) -> StrataResult<String> {
            self.create_table(t)
        }
        fn change_column(&self, t: Table) -> StrataResult<String> {
            self.create_table(t)
        }
        fn drop_column(&self, t: Table) -> StrataResult<String> {
            self.create_table(t)
        }
        fn rename_column(&self, t: Table) -> StrataResult<String> {
            self.create_table(t)
        }
        fn add_index(&self, t: Table) -> StrataResult<String> {
            self.create_table(t)
        }
        fn drop_index(&self, t: Table) -> StrataResult<String> {
            self.create_table(t)
        }
        fn rename_index(&self, t: Table) -> StrataResult<String> {
            self.create_table(t)
        }
        fn add_foreign_key(&self, t: Table) -> StrataResult<String> {
            self.create_table(t)
        }
        fn drop_foreign_key(&self, t: Table) -> StrataResult<String> {
            self.create_table(t)
        }
    }

    fn translator() -> HistoryTranslator {
        HistoryTranslator::new(Box::new(EchoTranslator), "_history")
    }

    fn users() -> Table {
        Table::new("users")
            .with_column(Column::new("id", "integer").primary())
            .unwrap()
            .with_column(Column::new("email", "string"))
            .unwrap()
            .with_column(Column::new("org_id", "integer"))
            .unwrap()
            .with_index(Index::new("users_email_idx", &["email"]).unique())
            .with_foreign_key(ForeignKey::new("users_org_fk", "org_id", "orgs", &["id"]))
    }

    #[test]
    fn test_create_table_emits_base_and_shadow() {
        let sql = translator().create_table(users()).unwrap();
        let lines: Vec<&str> = sql.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "CREATE users cols=[id:integer:pk,email:string,org_id:integer] \
             idx=[users_email_idx:unique] fks=1 ts=false"
        );
        assert_eq!(
            lines[1],
            "CREATE users_history cols=[id:integer,email:string,org_id:integer,\
             created_at:timestamp,deleted_at:timestamp:null] idx=[] fks=0 ts=false"
        );
    }

    #[test]
    fn test_create_table_with_temporal_column_fails() {
        let table = users()
            .with_column(Column::new("deleted_at", "timestamp"))
            .unwrap();
        let err = translator().create_table(table).unwrap_err();
        assert_eq!(err.history_stage(), Some(HistoryStage::Table));
        assert!(err.to_string().starts_with("historical table"));
    }

    #[test]
    fn test_drop_column_mirrors_without_uniqueness() {
        let mut table = users();
        table.columns = vec![Column::named("email")];
        let sql = translator().drop_column(table).unwrap();
        let lines: Vec<&str> = sql.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("DROP COLUMN users "));
        assert!(lines[0].contains("users_email_idx:unique"));
        assert!(lines[1].starts_with("DROP COLUMN users_history "));
        assert!(lines[1].contains("idx=[users_email_idx]"));
    }

    #[test]
    fn test_guarded_operations_reject_shadow_names() {
        let t = translator();
        let shadow = || Table::new("users_history");
        let results = vec![
            t.create_table(shadow()),
            t.drop_table(shadow()),
            t.add_column(shadow()),
            t.change_column(shadow()),
            t.drop_column(shadow()),
            t.rename_column(shadow()),
            t.rename_table(shadow(), Table::new("people")),
            t.rename_table(Table::new("people"), shadow()),
        ];

        for result in results {
            let err = result.unwrap_err();
            assert_eq!(err.code(), ErrorCode::SchHistoricalTarget);
            assert!(err
                .to_string()
                .contains("operation already applies to historical tables"));
        }
    }

    #[test]
    fn test_rename_table_suffixes_both_sides() {
        let sql = translator()
            .rename_table(Table::new("people"), Table::new("persons"))
            .unwrap();
        assert_eq!(
            sql,
            "RENAME people TO persons\nRENAME people_history TO persons_history"
        );
    }

    #[test]
    fn test_column_changes_through_schema_change() {
        let t = translator();

        let sql = SchemaChange::rename_column("users", "email", "mail")
            .translate(&t)
            .unwrap();
        assert_eq!(sql.lines().count(), 2);
        assert!(sql.lines().nth(1).unwrap().starts_with("RENAME COLUMN users_history "));

        let sql = SchemaChange::add_column("users", Column::new("bio", "text").nullable())
            .translate(&t)
            .unwrap();
        assert!(sql.ends_with("ADD COLUMN users_history cols=[bio:text:null] idx=[] fks=0 ts=true"));

        let sql = SchemaChange::change_column("users", Column::new("bio", "string"))
            .translate(&t)
            .unwrap();
        assert!(sql.contains("CHANGE COLUMN users_history"));

        let sql = SchemaChange::drop_table("users").translate(&t).unwrap();
        assert_eq!(sql.lines().count(), 2);
    }

    #[test]
    fn test_index_and_foreign_key_operations_forward_verbatim() {
        let t = translator();
        let sql = t
            .add_index(Table::new("users").with_index(Index::new("users_org_idx", &["org_id"])))
            .unwrap();
        assert_eq!(sql.lines().count(), 1);
        assert!(sql.starts_with("ADD INDEX users "));

        let sql = t.drop_foreign_key(users()).unwrap();
        assert_eq!(sql.lines().count(), 1);
    }

    #[test]
    fn test_empty_suffix_falls_back_to_default() {
        let t = HistoryTranslator::new(Box::new(EchoTranslator), "");
        assert_eq!(t.suffix(), "_history");

        let sql = t.drop_table(Table::new("users")).unwrap();
        assert_eq!(sql.lines().count(), 2);
        assert!(sql.lines().nth(1).unwrap().starts_with("DROP users_history "));
    }

    #[test]
    fn test_base_failure_propagates() {
        let t = HistoryTranslator::new(Box::new(BrokenTranslator), "_history");
        assert!(matches!(
            t.drop_column(users()),
            Err(StrataError::Unsupported(_))
        ));
        assert!(matches!(
            t.create_table(users()),
            Err(StrataError::Unsupported(_))
        ));
    }
}
