//! Entity trait - the descriptor of a persisted record.

use crate::types::Value;

/// How a field participates in reads and writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Access {
    #[default]
    ReadWrite,
    /// Selected but never written (e.g. database-computed columns).
    ReadOnly,
    /// Written but never selected.
    WriteOnly,
}

/// A named field value of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: Value,
    pub access: Access,
}

impl Field {
    /// Create a read/write field.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            access: Access::ReadWrite,
        }
    }

    /// Create a read-only field.
    pub fn read_only(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            access: Access::ReadOnly,
            ..Self::new(name, value)
        }
    }

    /// Create a write-only field.
    pub fn write_only(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            access: Access::WriteOnly,
            ..Self::new(name, value)
        }
    }
}

/// A record mapped onto one table.
///
/// Implementations describe their fields explicitly; the core never inspects
/// struct layouts.
pub trait Entity {
    /// Table the entity is stored in.
    fn table_name(&self) -> &str;

    /// Name of the identifier column.
    fn id_field(&self) -> &str {
        "id"
    }

    /// Current identifier value.
    fn id(&self) -> Value;

    /// Store the identifier assigned by the database.
    fn set_id(&mut self, id: Value);

    /// Every mapped field except the identifier.
    fn fields(&self) -> Vec<Field>;

    /// Value of one column, including the identifier.
    fn value(&self, column: &str) -> Option<Value> {
        if column == self.id_field() {
            return Some(self.id());
        }
        self.fields()
            .into_iter()
            .find(|f| f.name == column)
            .map(|f| f.value)
    }
}
