//! SQLite dialect.

use strata_core::error::{StrataError, StrataResult};
use strata_core::traits::{Dialect, Entity, Executor, Quoter, SchemaTranslator};
use strata_core::types::{Columns, Value};

use crate::translator::SqliteTranslator;

/// Name of the SQLite dialect in connection details.
pub const DIALECT_NAME: &str = "sqlite";

/// Quote an identifier for SQLite, part by part for dotted names.
pub(crate) fn quote_ident(ident: &str) -> String {
    ident
        .split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

/// SQLite dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    fn values(entity: &dyn Entity, columns: &Columns) -> StrataResult<Vec<Value>> {
        columns
            .names()
            .into_iter()
            .map(|name| {
                entity
                    .value(name)
                    .ok_or_else(|| StrataError::missing_field(name))
            })
            .collect()
    }
}

impl Quoter for SqliteDialect {
    fn quote(&self, ident: &str) -> String {
        quote_ident(ident)
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &str {
        DIALECT_NAME
    }

    fn translate_sql(&self, sql: &str) -> String {
        sql.to_string()
    }

    fn create(
        &self,
        exec: &dyn Executor,
        entity: &mut dyn Entity,
        columns: &Columns,
    ) -> StrataResult<()> {
        let id_field = entity.id_field().to_string();
        let generated = entity.id().is_zero();

        let mut cols = columns.writeable();
        if generated {
            cols.remove(&[id_field.as_str()]);
        }
        let args = Self::values(&*entity, &cols)?;

        let table = self.quote(entity.table_name());
        let mut sql = if cols.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", table)
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                cols.quoted_string(self),
                cols.placeholders()
            )
        };

        if !generated {
            exec.execute(&sql, &args)?;
            return Ok(());
        }

        sql.push_str(&format!(" RETURNING {}", self.quote(&id_field)));
        let id = exec
            .query(&sql, &args)?
            .into_iter()
            .next()
            .and_then(|row| row.get(&id_field).cloned())
            .ok_or_else(|| StrataError::database("insert returned no generated id"))?;
        entity.set_id(id);
        Ok(())
    }

    fn update(
        &self,
        exec: &dyn Executor,
        entity: &dyn Entity,
        columns: &Columns,
    ) -> StrataResult<()> {
        let mut cols = columns.writeable();
        cols.remove(&[entity.id_field()]);
        if cols.is_empty() {
            return Ok(());
        }

        let mut args = Self::values(entity, &cols)?;
        args.push(entity.id());
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            self.quote(entity.table_name()),
            cols.update_string(self),
            self.quote(entity.id_field())
        );
        exec.execute(&sql, &args)?;
        Ok(())
    }

    fn destroy(&self, exec: &dyn Executor, entity: &dyn Entity) -> StrataResult<()> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            self.quote(entity.table_name()),
            self.quote(entity.id_field())
        );
        exec.execute(&sql, &[entity.id()])?;
        Ok(())
    }

    fn schema_translator(&self) -> Box<dyn SchemaTranslator> {
        Box::new(SqliteTranslator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::SqliteExecutor;
    use strata_core::traits::Field;

    struct Note {
        id: i64,
        body: String,
    }

    impl Entity for Note {
        fn table_name(&self) -> &str {
            "notes"
        }

        fn id(&self) -> Value {
            Value::from(self.id)
        }

        fn set_id(&mut self, id: Value) {
            self.id = id.as_i64().unwrap_or_default();
        }

        fn fields(&self) -> Vec<Field> {
            vec![Field::new("body", self.body.as_str())]
        }
    }

    fn setup() -> SqliteExecutor {
        let exec = SqliteExecutor::in_memory().unwrap();
        exec.execute_script(
            "CREATE TABLE notes (id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT NOT NULL);",
        )
        .unwrap();
        exec
    }

    #[test]
    fn test_quote() {
        assert_eq!(SqliteDialect.quote("users"), "\"users\"");
        assert_eq!(SqliteDialect.quote("users.id"), "\"users\".\"id\"");
        assert_eq!(SqliteDialect.quote("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_create_assigns_generated_id() {
        let exec = setup();
        let mut note = Note {
            id: 0,
            body: "hello".to_string(),
        };
        let columns = Columns::for_entity(&note);
        SqliteDialect.create(&exec, &mut note, &columns).unwrap();
        assert_eq!(note.id, 1);

        let mut explicit = Note {
            id: 10,
            body: "ten".to_string(),
        };
        SqliteDialect.create(&exec, &mut explicit, &columns).unwrap();
        assert_eq!(explicit.id, 10);

        let rows = exec.query("SELECT id FROM notes ORDER BY id", &[]).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_update_and_destroy() {
        let exec = setup();
        let mut note = Note {
            id: 0,
            body: "a".to_string(),
        };
        let columns = Columns::for_entity(&note);
        SqliteDialect.create(&exec, &mut note, &columns).unwrap();

        note.body = "b".to_string();
        SqliteDialect.update(&exec, &note, &columns).unwrap();
        let rows = exec.query("SELECT body FROM notes", &[]).unwrap();
        assert_eq!(rows[0].get("body"), Some(&Value::from("b")));

        SqliteDialect.destroy(&exec, &note).unwrap();
        assert!(exec.query("SELECT * FROM notes", &[]).unwrap().is_empty());
    }
}
