use super::StorageKind;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// A single field value, one variant per [`StorageKind`] plus `Null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Text(String),
    Keywords(BTreeSet<String>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Integer(i64),
    Real(f64),
    Blob(Vec<u8>),
}

impl Value {
    /// Builds a keyword set value.
    pub fn keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Keywords(keywords.into_iter().map(Into::into).collect())
    }

    /// Storage kind of this value, `None` for `Null`.
    pub fn kind(&self) -> Option<StorageKind> {
        match self {
            Self::Null => None,
            Self::Text(_) => Some(StorageKind::Text),
            Self::Keywords(_) => Some(StorageKind::KeywordSet),
            Self::Date(_) => Some(StorageKind::Date),
            Self::DateTime(_) => Some(StorageKind::DateTime),
            Self::Integer(_) => Some(StorageKind::Integer),
            Self::Real(_) => Some(StorageKind::Real),
            Self::Blob(_) => Some(StorageKind::Blob),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this value may be stored in a field of the given kind.
    ///
    /// `Null` fits every kind; nullability is checked by the schema.
    pub fn fits(&self, kind: StorageKind) -> bool {
        match self.kind() {
            None => true,
            Some(own) => own == kind || (own == StorageKind::Integer && kind == StorageKind::Real),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_keywords(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::Keywords(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(r) => Some(*r),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Compares two values the way a relational store evaluates a predicate.
    ///
    /// Returns `None` when either side is `Null` or the kinds are not
    /// comparable. Integers and reals compare numerically.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Keywords(a), Self::Keywords(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Real(a), Self::Real(b)) => a.partial_cmp(b),
            (Self::Integer(a), Self::Real(b)) => (*a as f64).partial_cmp(b),
            (Self::Real(a), Self::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Blob(a), Self::Blob(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total order used when sorting search results. `Null` sorts first.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Null, _) => Ordering::Less,
            (_, Self::Null) => Ordering::Greater,
            (Self::Real(a), Self::Real(b)) => a.total_cmp(b),
            (Self::Integer(a), Self::Real(b)) => (*a as f64).total_cmp(b),
            (Self::Real(a), Self::Integer(b)) => a.total_cmp(&(*b as f64)),
            (a, b) => a
                .compare(b)
                .unwrap_or_else(|| a.kind().cmp(&b.kind())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Keywords(keywords) => {
                f.write_str("{")?;
                for (i, keyword) in keywords.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{keyword:?}")?;
                }
                f.write_str("}")
            }
            Self::Date(d) => write!(f, "'{d}'"),
            Self::DateTime(dt) => write!(f, "'{dt}'"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::Blob(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<BTreeSet<String>> for Value {
    fn from(value: BTreeSet<String>) -> Self {
        Self::Keywords(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
