//! Table descriptions and the migration operations applied to them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{StrataError, StrataResult};
use crate::traits::SchemaTranslator;

/// Table option controlling automatic `created_at`/`updated_at` columns.
pub const TIMESTAMPS_OPTION: &str = "timestamps";

/// Free-form table options.
pub type Options = BTreeMap<String, serde_json::Value>;

/// Column options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnOptions {
    /// Whether the column accepts NULL.
    pub null: bool,
    /// Default value, as an SQL literal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Size hint for sized types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl ColumnOptions {
    /// Options for a nullable column.
    pub fn nullable() -> Self {
        Self {
            null: true,
            ..Default::default()
        }
    }
}

/// A column description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default)]
    pub options: ColumnOptions,
    #[serde(default)]
    pub primary: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            options: ColumnOptions::default(),
            primary: false,
        }
    }

    /// A column identified by name only, as used by drop/rename payloads.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, "")
    }

    pub fn with_options(mut self, options: ColumnOptions) -> Self {
        self.options = options;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.options.null = true;
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.options.default = Some(default.into());
        self
    }
}

/// An index description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

impl Index {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Target of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub table: String,
    pub columns: Vec<String>,
}

/// A foreign key description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: String,
    pub column: String,
    pub references: ForeignKeyRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
}

impl ForeignKey {
    pub fn new(
        name: impl Into<String>,
        column: impl Into<String>,
        table: impl Into<String>,
        columns: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            references: ForeignKeyRef {
                table: table.into(),
                columns: columns.iter().map(|c| c.to_string()).collect(),
            },
            on_delete: None,
            on_update: None,
        }
    }

    pub fn on_delete(mut self, action: impl Into<String>) -> Self {
        self.on_delete = Some(action.into());
        self
    }
}

/// A table description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(default)]
    pub options: Options,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a column, refusing duplicate names.
    pub fn column(
        &mut self,
        name: impl Into<String>,
        column_type: impl Into<String>,
        options: ColumnOptions,
    ) -> StrataResult<()> {
        self.push_column(Column::new(name, column_type).with_options(options))
    }

    /// Append a prepared column, refusing duplicate names.
    pub fn push_column(&mut self, column: Column) -> StrataResult<()> {
        if self.has_column(&column.name) {
            return Err(StrataError::duplicate_column(&self.name, &column.name));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Builder-style [`Table::push_column`].
    pub fn with_column(mut self, column: Column) -> StrataResult<Self> {
        self.push_column(column)?;
        Ok(self)
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn with_foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Names of the primary-key columns, in declaration order.
    pub fn primary_keys(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Ask translators not to append automatic timestamp columns.
    pub fn disable_timestamps(&mut self) {
        self.options
            .insert(TIMESTAMPS_OPTION.to_string(), serde_json::Value::Bool(false));
    }

    /// Whether translators should append automatic timestamp columns.
    pub fn timestamps_enabled(&self) -> bool {
        !matches!(
            self.options.get(TIMESTAMPS_OPTION),
            Some(serde_json::Value::Bool(false))
        )
    }
}

/// A migration operation.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaChange {
    CreateTable(Table),
    DropTable(Table),
    RenameTable { from: Table, to: Table },
    AddColumn(Table),
    ChangeColumn(Table),
    DropColumn(Table),
    RenameColumn(Table),
    AddIndex(Table),
    DropIndex(Table),
    RenameIndex(Table),
    AddForeignKey(Table),
    DropForeignKey(Table),
}

impl SchemaChange {
    pub fn drop_table(table: impl Into<String>) -> Self {
        Self::DropTable(Table::new(table))
    }

    pub fn rename_table(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::RenameTable {
            from: Table::new(from),
            to: Table::new(to),
        }
    }

    pub fn add_column(table: impl Into<String>, column: Column) -> Self {
        Self::AddColumn(Self::with_columns(table, vec![column]))
    }

    pub fn change_column(table: impl Into<String>, column: Column) -> Self {
        Self::ChangeColumn(Self::with_columns(table, vec![column]))
    }

    pub fn drop_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::DropColumn(Self::with_columns(table, vec![Column::named(column)]))
    }

    pub fn rename_column(
        table: impl Into<String>,
        old: impl Into<String>,
        new: impl Into<String>,
    ) -> Self {
        Self::RenameColumn(Self::with_columns(
            table,
            vec![Column::named(old), Column::named(new)],
        ))
    }

    fn with_columns(table: impl Into<String>, columns: Vec<Column>) -> Table {
        Table {
            columns,
            ..Table::new(table)
        }
    }

    /// Name of the table this operation targets (the source for renames).
    pub fn table_name(&self) -> &str {
        match self {
            Self::RenameTable { from, .. } => &from.name,
            Self::CreateTable(t)
            | Self::DropTable(t)
            | Self::AddColumn(t)
            | Self::ChangeColumn(t)
            | Self::DropColumn(t)
            | Self::RenameColumn(t)
            | Self::AddIndex(t)
            | Self::DropIndex(t)
            | Self::RenameIndex(t)
            | Self::AddForeignKey(t)
            | Self::DropForeignKey(t) => &t.name,
        }
    }

    /// Translate this operation into SQL.
    pub fn translate(self, translator: &dyn SchemaTranslator) -> StrataResult<String> {
        match self {
            Self::CreateTable(t) => translator.create_table(t),
            Self::DropTable(t) => translator.drop_table(t),
            Self::RenameTable { from, to } => translator.rename_table(from, to),
            Self::AddColumn(t) => translator.add_column(t),
            Self::ChangeColumn(t) => translator.change_column(t),
            Self::DropColumn(t) => translator.drop_column(t),
            Self::RenameColumn(t) => translator.rename_column(t),
            Self::AddIndex(t) => translator.add_index(t),
            Self::DropIndex(t) => translator.drop_index(t),
            Self::RenameIndex(t) => translator.rename_index(t),
            Self::AddForeignKey(t) => translator.add_foreign_key(t),
            Self::DropForeignKey(t) => translator.drop_foreign_key(t),
        }
    }
}
