//! SQLite DDL generation.

use strata_core::error::{StrataError, StrataResult};
use strata_core::schema::{Column, ForeignKey, Index, Table};
use strata_core::traits::SchemaTranslator;

use crate::dialect::quote_ident;

/// Automatic timestamp columns added when a table keeps the timestamps option.
const AUTO_TIMESTAMPS: [&str; 2] = ["created_at", "updated_at"];

/// Translates migration operations into SQLite DDL.
///
/// Every emitted statement is terminated with `;` so outputs can be
/// concatenated into one script.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteTranslator;

/// SQLite storage class for a generic column type.
fn affinity(column_type: &str) -> &'static str {
    match column_type.to_ascii_lowercase().as_str() {
        "integer" | "int" | "bigint" | "smallint" | "bool" | "boolean" => "INTEGER",
        "float" | "double" | "real" | "decimal" | "numeric" => "REAL",
        "blob" | "binary" | "bytes" => "BLOB",
        _ => "TEXT",
    }
}

fn column_at<'a>(table: &'a Table, index: usize, operation: &str) -> StrataResult<&'a Column> {
    table.columns.get(index).ok_or_else(|| {
        StrataError::validation(format!(
            "{} on '{}' needs column #{}",
            operation,
            table.name,
            index + 1
        ))
    })
}

impl SqliteTranslator {
    /// Single integer primary key, rendered inline as a rowid alias.
    fn rowid_key(table: &Table) -> Option<&str> {
        match table.primary_keys().as_slice() {
            [only] => table
                .columns
                .iter()
                .find(|c| c.name == *only && affinity(&c.column_type) == "INTEGER")
                .map(|c| c.name.as_str()),
            _ => None,
        }
    }

    fn column_def(column: &Column, rowid: bool) -> String {
        let mut def = format!(
            "{} {}",
            quote_ident(&column.name),
            affinity(&column.column_type)
        );
        if rowid {
            def.push_str(" PRIMARY KEY AUTOINCREMENT");
            return def;
        }
        if !column.options.null {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = &column.options.default {
            def.push_str(&format!(" DEFAULT {}", default));
        }
        def
    }

    fn foreign_key_def(fk: &ForeignKey) -> String {
        let mut def = format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            quote_ident(&fk.name),
            quote_ident(&fk.column),
            quote_ident(&fk.references.table),
            join_idents(&fk.references.columns)
        );
        if let Some(action) = &fk.on_delete {
            def.push_str(&format!(" ON DELETE {}", action));
        }
        if let Some(action) = &fk.on_update {
            def.push_str(&format!(" ON UPDATE {}", action));
        }
        def
    }

    fn create_index(table: &str, index: &Index) -> String {
        format!(
            "CREATE {}INDEX {} ON {} ({});",
            if index.unique { "UNIQUE " } else { "" },
            quote_ident(&index.name),
            quote_ident(table),
            join_idents(&index.columns)
        )
    }
}

fn join_idents(names: &[String]) -> String {
    names
        .iter()
        .map(|n| quote_ident(n))
        .collect::<Vec<_>>()
        .join(", ")
}

impl SchemaTranslator for SqliteTranslator {
    fn create_table(&self, table: Table) -> StrataResult<String> {
        if table.columns.is_empty() {
            return Err(StrataError::schema(format!(
                "table '{}' has no columns",
                table.name
            )));
        }

        let rowid = Self::rowid_key(&table);
        let mut defs: Vec<String> = table
            .columns
            .iter()
            .map(|c| Self::column_def(c, Some(c.name.as_str()) == rowid))
            .collect();

        if table.timestamps_enabled() {
            for name in AUTO_TIMESTAMPS {
                if !table.has_column(name) {
                    defs.push(format!(
                        "{} TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP",
                        quote_ident(name)
                    ));
                }
            }
        }

        let keys = table.primary_keys();
        if rowid.is_none() && !keys.is_empty() {
            let keys: Vec<String> = keys.into_iter().map(String::from).collect();
            defs.push(format!("PRIMARY KEY ({})", join_idents(&keys)));
        }
        defs.extend(table.foreign_keys.iter().map(Self::foreign_key_def));

        let mut statements = vec![format!(
            "CREATE TABLE {} (\n  {}\n);",
            quote_ident(&table.name),
            defs.join(",\n  ")
        )];
        statements.extend(
            table
                .indexes
                .iter()
                .map(|index| Self::create_index(&table.name, index)),
        );
        Ok(statements.join("\n"))
    }

    fn drop_table(&self, table: Table) -> StrataResult<String> {
        Ok(format!("DROP TABLE {};", quote_ident(&table.name)))
    }

    fn rename_table(&self, from: Table, to: Table) -> StrataResult<String> {
        Ok(format!(
            "ALTER TABLE {} RENAME TO {};",
            quote_ident(&from.name),
            quote_ident(&to.name)
        ))
    }

    fn add_column(&self, table: Table) -> StrataResult<String> {
        let column = column_at(&table, 0, "add column")?;
        Ok(format!(
            "ALTER TABLE {} ADD COLUMN {};",
            quote_ident(&table.name),
            Self::column_def(column, false)
        ))
    }

    fn change_column(&self, table: Table) -> StrataResult<String> {
        Err(StrataError::unsupported(format!(
            "sqlite cannot change column types in place (table '{}')",
            table.name
        )))
    }

    fn drop_column(&self, table: Table) -> StrataResult<String> {
        let column = column_at(&table, 0, "drop column")?;
        Ok(format!(
            "ALTER TABLE {} DROP COLUMN {};",
            quote_ident(&table.name),
            quote_ident(&column.name)
        ))
    }

    fn rename_column(&self, table: Table) -> StrataResult<String> {
        let old = column_at(&table, 0, "rename column")?;
        let new = column_at(&table, 1, "rename column")?;
        Ok(format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {};",
            quote_ident(&table.name),
            quote_ident(&old.name),
            quote_ident(&new.name)
        ))
    }

    fn add_index(&self, table: Table) -> StrataResult<String> {
        if table.indexes.is_empty() {
            return Err(StrataError::validation(format!(
                "add index on '{}' needs an index",
                table.name
            )));
        }
        Ok(table
            .indexes
            .iter()
            .map(|index| Self::create_index(&table.name, index))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn drop_index(&self, table: Table) -> StrataResult<String> {
        let index = table.indexes.first().ok_or_else(|| {
            StrataError::validation(format!("drop index on '{}' needs an index", table.name))
        })?;
        Ok(format!("DROP INDEX {};", quote_ident(&index.name)))
    }

    fn rename_index(&self, table: Table) -> StrataResult<String> {
        Err(StrataError::unsupported(format!(
            "sqlite has no ALTER INDEX (table '{}')",
            table.name
        )))
    }

    fn add_foreign_key(&self, table: Table) -> StrataResult<String> {
        Err(StrataError::unsupported(format!(
            "sqlite cannot add foreign keys to existing table '{}'",
            table.name
        )))
    }

    fn drop_foreign_key(&self, table: Table) -> StrataResult<String> {
        Err(StrataError::unsupported(format!(
            "sqlite cannot drop foreign keys from table '{}'",
            table.name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::schema::ColumnOptions;

    fn users() -> Table {
        Table::new("users")
            .with_column(Column::new("id", "integer").primary())
            .unwrap()
            .with_column(Column::new("email", "string"))
            .unwrap()
            .with_column(Column::new("bio", "text").nullable())
            .unwrap()
    }

    #[test]
    fn test_create_table() {
        let mut table = users()
            .with_column(Column::new("org_id", "integer").with_default("0"))
            .unwrap()
            .with_index(Index::new("users_email_idx", &["email"]).unique())
            .with_foreign_key(
                ForeignKey::new("users_org_fk", "org_id", "orgs", &["id"]).on_delete("CASCADE"),
            );
        table.disable_timestamps();

        let sql = SqliteTranslator.create_table(table).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE \"users\" (\n  \
             \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,\n  \
             \"email\" TEXT NOT NULL,\n  \
             \"bio\" TEXT,\n  \
             \"org_id\" INTEGER NOT NULL DEFAULT 0,\n  \
             CONSTRAINT \"users_org_fk\" FOREIGN KEY (\"org_id\") REFERENCES \"orgs\" (\"id\") ON DELETE CASCADE\n);\n\
             CREATE UNIQUE INDEX \"users_email_idx\" ON \"users\" (\"email\");"
        );
    }

    #[test]
    fn test_create_table_adds_timestamps_by_default() {
        let sql = SqliteTranslator.create_table(users()).unwrap();
        assert!(sql.contains("\"created_at\" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP"));
        assert!(sql.contains("\"updated_at\" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP"));
    }

    #[test]
    fn test_composite_primary_key() {
        let mut table = Table::new("memberships");
        table.column("user_id", "integer", ColumnOptions::default()).unwrap();
        table.column("org_id", "integer", ColumnOptions::default()).unwrap();
        table.columns.iter_mut().for_each(|c| c.primary = true);
        table.disable_timestamps();

        let sql = SqliteTranslator.create_table(table).unwrap();
        assert!(sql.contains("PRIMARY KEY (\"user_id\", \"org_id\")"));
        assert!(!sql.contains("AUTOINCREMENT"));
    }

    #[test]
    fn test_alter_statements() {
        let t = SqliteTranslator;
        let mut table = Table::new("users");
        table.columns = vec![Column::named("bio"), Column::named("about")];

        assert_eq!(
            t.rename_column(table.clone()).unwrap(),
            "ALTER TABLE \"users\" RENAME COLUMN \"bio\" TO \"about\";"
        );
        assert_eq!(
            t.drop_column(table).unwrap(),
            "ALTER TABLE \"users\" DROP COLUMN \"bio\";"
        );
        assert_eq!(
            t.rename_table(Table::new("users"), Table::new("people")).unwrap(),
            "ALTER TABLE \"users\" RENAME TO \"people\";"
        );
    }

    #[test]
    fn test_missing_payload() {
        let err = SqliteTranslator.drop_column(Table::new("users")).unwrap_err();
        assert!(matches!(err, StrataError::Validation { .. }));
    }

    #[test]
    fn test_unsupported_operations() {
        let t = SqliteTranslator;
        assert!(matches!(
            t.change_column(users()),
            Err(StrataError::Unsupported(_))
        ));
        assert!(matches!(
            t.rename_index(users()),
            Err(StrataError::Unsupported(_))
        ));
        assert!(matches!(
            t.add_foreign_key(users()),
            Err(StrataError::Unsupported(_))
        ));
    }
}
