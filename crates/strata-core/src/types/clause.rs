//! SQL predicate fragments with positional arguments.

use serde::{Deserialize, Serialize};

use super::Value;

/// Placeholder standing for "the alias of the table this clause is attached to".
///
/// Substituted with the primary table's alias in WHERE clauses and with each
/// join's alias when a global clause is attached to a join.
pub const ALIAS_TOKEN: &str = "%TABLE_NAME%";

/// An SQL fragment plus its positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub fragment: String,
    pub arguments: Vec<Value>,
}

impl Clause {
    pub fn new(fragment: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            fragment: fragment.into(),
            arguments,
        }
    }

    /// Copy of this clause with [`ALIAS_TOKEN`] replaced by `alias`.
    pub fn with_alias(&self, alias: &str) -> Self {
        Self {
            fragment: self.fragment.replace(ALIAS_TOKEN, alias),
            arguments: self.arguments.clone(),
        }
    }
}

/// An ordered conjunction of clauses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clauses(Vec<Clause>);

impl Clauses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, clause: Clause) {
        self.0.push(clause);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Clause>) {
        self.0.extend(other);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Clause> {
        self.0.iter()
    }

    /// Render the fragments as a conjunction.
    ///
    /// Each fragment is parenthesized so an `OR` inside one clause cannot
    /// escape into its neighbours.
    pub fn conjunction(&self) -> String {
        self.0
            .iter()
            .map(|c| format!("({})", c.fragment))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// All arguments, in fragment order.
    pub fn args(&self) -> Vec<Value> {
        self.0
            .iter()
            .flat_map(|c| c.arguments.iter().cloned())
            .collect()
    }

    /// Copy of every clause with [`ALIAS_TOKEN`] replaced by `alias`.
    pub fn with_alias(&self, alias: &str) -> Self {
        Self(self.0.iter().map(|c| c.with_alias(alias)).collect())
    }
}

impl From<Vec<Clause>> for Clauses {
    fn from(clauses: Vec<Clause>) -> Self {
        Self(clauses)
    }
}

impl IntoIterator for Clauses {
    type Item = Clause;
    type IntoIter = std::vec::IntoIter<Clause>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Clauses {
    type Item = &'a Clause;
    type IntoIter = std::slice::Iter<'a, Clause>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
