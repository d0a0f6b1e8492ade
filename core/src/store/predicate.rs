//! Conjunctive predicates evaluated by the record store.

use crate::store::Row;
use crate::types::Value;
use std::cmp::Ordering;
use std::fmt;

/// A single comparison against one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Equal(Value),
    GreaterOrEqual(Value),
    LessOrEqual(Value),
    /// Inclusive on both ends.
    Between(Value, Value),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
}

impl Comparison {
    /// `Null` column values never match.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Equal(expected) => value.compare(expected) == Some(Ordering::Equal),
            Self::GreaterOrEqual(lower) => {
                matches!(value.compare(lower), Some(Ordering::Greater | Ordering::Equal))
            }
            Self::LessOrEqual(upper) => {
                matches!(value.compare(upper), Some(Ordering::Less | Ordering::Equal))
            }
            Self::Between(lower, upper) => {
                Self::GreaterOrEqual(lower.clone()).matches(value)
                    && Self::LessOrEqual(upper.clone()).matches(value)
            }
            Self::StartsWith(prefix) => value.as_text().is_some_and(|s| s.starts_with(prefix.as_str())),
            Self::EndsWith(suffix) => value.as_text().is_some_and(|s| s.ends_with(suffix.as_str())),
            Self::Contains(pattern) => value.as_text().is_some_and(|s| s.contains(pattern.as_str())),
        }
    }

    /// Whether the comparison only makes sense for text columns.
    pub fn is_text_match(&self) -> bool {
        matches!(
            self,
            Self::StartsWith(_) | Self::EndsWith(_) | Self::Contains(_)
        )
    }

    /// Whether the comparison needs an ordered column.
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            Self::GreaterOrEqual(_) | Self::LessOrEqual(_) | Self::Between(..)
        )
    }

    /// Literal operands of the comparison.
    pub fn operands(&self) -> Vec<&Value> {
        match self {
            Self::Equal(v) | Self::GreaterOrEqual(v) | Self::LessOrEqual(v) => vec![v],
            Self::Between(lower, upper) => vec![lower, upper],
            Self::StartsWith(_) | Self::EndsWith(_) | Self::Contains(_) => vec![],
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal(v) => write!(f, "= {v}"),
            Self::GreaterOrEqual(v) => write!(f, ">= {v}"),
            Self::LessOrEqual(v) => write!(f, "<= {v}"),
            Self::Between(lower, upper) => write!(f, "BETWEEN {lower} AND {upper}"),
            Self::StartsWith(prefix) => write!(f, "LIKE {:?}", format!("{prefix}%")),
            Self::EndsWith(suffix) => write!(f, "LIKE {:?}", format!("%{suffix}")),
            Self::Contains(pattern) => write!(f, "LIKE {:?}", format!("%{pattern}%")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub column: usize,
    pub comparison: Comparison,
}

/// Clauses joined with AND. The empty predicate matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn and(mut self, column: usize, comparison: Comparison) -> Self {
        self.push(column, comparison);
        self
    }

    pub fn push(&mut self, column: usize, comparison: Comparison) {
        self.clauses.push(Clause { column, comparison });
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.clauses.iter().all(|clause| {
            row.get(clause.column)
                .is_some_and(|value| clause.comparison.matches(value))
        })
    }
}
