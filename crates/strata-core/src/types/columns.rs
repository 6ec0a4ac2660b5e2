//! Column sets derived from entities.
//!
//! A [`Columns`] set is the only view of an entity's shape the history layer
//! consumes: which columns can be read back, which can be written, and how to
//! render them as quoted column lists or qualified select expressions.

use std::collections::BTreeMap;

use crate::traits::{Access, Entity, Quoter};

/// A single column in a column set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub readable: bool,
    pub writeable: bool,
    /// Expression used in SELECT lists, qualified by the table alias.
    pub select_sql: String,
}

/// An ordered (by name) set of columns belonging to one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    cols: BTreeMap<String, Column>,
    table_name: String,
    table_alias: String,
}

impl Columns {
    /// Create an empty set for `table_name`, aliased as `table_alias`.
    pub fn new(table_name: impl Into<String>, table_alias: impl Into<String>) -> Self {
        Self {
            cols: BTreeMap::new(),
            table_name: table_name.into(),
            table_alias: table_alias.into(),
        }
    }

    /// Derive the column set of an entity, including its id column.
    pub fn for_entity<E: Entity + ?Sized>(entity: &E) -> Self {
        let table = entity.table_name().to_string();
        let mut cols = Self::new(table.clone(), table);
        cols.add(&[entity.id_field()]);
        for field in entity.fields() {
            let tag = match field.access {
                Access::ReadWrite => field.name,
                Access::ReadOnly => format!("{},r", field.name),
                Access::WriteOnly => format!("{},w", field.name),
            };
            cols.add(&[tag.as_str()]);
        }
        cols
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn table_alias(&self) -> &str {
        &self.table_alias
    }

    /// Add columns by name.
    ///
    /// A `,r` suffix marks the column read-only and `,w` write-only. Adding a
    /// column that is already present keeps the existing entry.
    pub fn add(&mut self, names: &[&str]) {
        for raw in names {
            let (name, readable, writeable) = if let Some(n) = raw.strip_suffix(",r") {
                (n, true, false)
            } else if let Some(n) = raw.strip_suffix(",w") {
                (n, false, true)
            } else {
                (*raw, true, true)
            };
            let name = name.trim();
            if name.is_empty() || self.cols.contains_key(name) {
                continue;
            }
            self.cols.insert(
                name.to_string(),
                Column {
                    name: name.to_string(),
                    readable,
                    writeable,
                    select_sql: format!("{}.{}", self.table_alias, name),
                },
            );
        }
    }

    /// Builder-style [`Columns::add`].
    pub fn with(mut self, names: &[&str]) -> Self {
        self.add(names);
        self
    }

    /// Remove columns by name.
    pub fn remove(&mut self, names: &[&str]) {
        for name in names {
            self.cols.remove(*name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cols.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.cols.get(name)
    }

    pub fn len(&self) -> usize {
        self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cols.is_empty()
    }

    /// Column names in set order.
    pub fn names(&self) -> Vec<&str> {
        self.cols.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.cols.values()
    }

    /// The subset of columns that can be read back.
    pub fn readable(&self) -> Columns {
        self.filtered(|c| c.readable)
    }

    /// The subset of columns that can be written.
    pub fn writeable(&self) -> Columns {
        self.filtered(|c| c.writeable)
    }

    fn filtered(&self, keep: impl Fn(&Column) -> bool) -> Columns {
        Columns {
            cols: self
                .cols
                .iter()
                .filter(|(_, c)| keep(c))
                .map(|(k, c)| (k.clone(), c.clone()))
                .collect(),
            table_name: self.table_name.clone(),
            table_alias: self.table_alias.clone(),
        }
    }

    /// `"a", "b", ...` using the dialect's quoting.
    pub fn quoted_string<Q: Quoter + ?Sized>(&self, quoter: &Q) -> String {
        self.cols
            .keys()
            .map(|name| quoter.quote(name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `"alias"."a", "alias"."b", ...` for SELECT lists.
    pub fn select_string<Q: Quoter + ?Sized>(&self, quoter: &Q) -> String {
        self.cols
            .values()
            .map(|c| quoter.quote(&c.select_sql))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `"a" = ?, "b" = ?, ...` for UPDATE statements.
    pub fn update_string<Q: Quoter + ?Sized>(&self, quoter: &Q) -> String {
        self.cols
            .keys()
            .map(|name| format!("{} = ?", quoter.quote(name)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// One `?` per column.
    pub fn placeholders(&self) -> String {
        vec!["?"; self.cols.len()].join(", ")
    }
}
