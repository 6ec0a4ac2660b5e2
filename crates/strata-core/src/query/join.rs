//! JOIN clauses and their rendering.

use std::fmt;

use strum::{Display, EnumString};

use crate::types::{Clause, Clauses, Value};

/// Kind of JOIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum JoinKind {
    #[strum(serialize = "JOIN")]
    Join,
    #[strum(serialize = "LEFT JOIN")]
    Left,
    #[strum(serialize = "RIGHT JOIN")]
    Right,
    #[strum(serialize = "LEFT OUTER JOIN")]
    LeftOuter,
    #[strum(serialize = "RIGHT OUTER JOIN")]
    RightOuter,
    #[strum(serialize = "INNER JOIN")]
    Inner,
}

/// The joined table and the alias it is referred to by.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinTarget {
    pub table: String,
    pub alias: String,
}

impl fmt::Display for JoinTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} AS {}", self.table, self.alias)
    }
}

/// One JOIN: kind, target and an ordered conjunction of ON predicates.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub target: JoinTarget,
    pub on: Clauses,
}

impl JoinClause {
    /// Join `table`, aliased by its own name.
    pub fn new(kind: JoinKind, table: impl Into<String>, on: Clause) -> Self {
        let table = table.into();
        Self::aliased(kind, table.clone(), table, on)
    }

    pub fn aliased(
        kind: JoinKind,
        table: impl Into<String>,
        alias: impl Into<String>,
        on: Clause,
    ) -> Self {
        let mut clauses = Clauses::new();
        if !on.fragment.is_empty() {
            clauses.push(on);
        }
        Self {
            kind,
            target: JoinTarget {
                table: table.into(),
                alias: alias.into(),
            },
            on: clauses,
        }
    }

    /// Append global predicates, resolving the alias token to this join's alias.
    pub fn attach_global(&mut self, globals: &Clauses) {
        self.on.extend(globals.with_alias(&self.target.alias));
    }

    /// Arguments in the order their placeholders appear in the rendered SQL.
    pub fn args(&self) -> Vec<Value> {
        self.on.args()
    }
}

impl fmt::Display for JoinClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.target)?;
        if !self.on.is_empty() {
            write!(f, " ON {}", self.on.conjunction())?;
        }
        Ok(())
    }
}

/// An ordered sequence of joins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinClauses(Vec<JoinClause>);

impl JoinClauses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, join: JoinClause) {
        self.0.push(join);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JoinClause> {
        self.0.iter()
    }

    pub fn args(&self) -> Vec<Value> {
        self.0.iter().flat_map(JoinClause::args).collect()
    }
}

impl fmt::Display for JoinClauses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", rendered.join(" "))
    }
}

impl FromIterator<JoinClause> for JoinClauses {
    fn from_iter<I: IntoIterator<Item = JoinClause>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
