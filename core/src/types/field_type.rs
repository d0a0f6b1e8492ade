//! The fixed registry of searchable capability tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a field's values are represented in the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StorageKind {
    Text,
    KeywordSet,
    Date,
    DateTime,
    Integer,
    Real,
    Blob,
}

impl StorageKind {
    /// Whether range criteria and sorting are meaningful for this kind.
    pub const fn is_orderable(&self) -> bool {
        matches!(
            self,
            Self::Text | Self::Date | Self::DateTime | Self::Integer | Self::Real
        )
    }

    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text)
    }

    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Real)
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "TEXT",
            Self::KeywordSet => "KEYWORD SET",
            Self::Date => "DATE",
            Self::DateTime => "DATETIME",
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Blob => "BLOB",
        };
        f.write_str(name)
    }
}

/// A searchable capability. A field may carry several, provided they all map
/// to the same [`StorageKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Document identifier. Exactly one field per schema, matched exactly.
    Uuid,
    /// Exact string match.
    Id,
    /// Prefix, suffix and substring match.
    Text,
    /// Set of strings served by an inverted index.
    Keyword,
    Date,
    DateTime,
    Integer,
    Real,
    /// Opaque payload, never searchable.
    Object,
}

impl FieldType {
    pub const ALL: [FieldType; 9] = [
        Self::Uuid,
        Self::Id,
        Self::Text,
        Self::Keyword,
        Self::Date,
        Self::DateTime,
        Self::Integer,
        Self::Real,
        Self::Object,
    ];

    pub const fn storage_kind(&self) -> StorageKind {
        match self {
            Self::Uuid | Self::Id | Self::Text => StorageKind::Text,
            Self::Keyword => StorageKind::KeywordSet,
            Self::Date => StorageKind::Date,
            Self::DateTime => StorageKind::DateTime,
            Self::Integer => StorageKind::Integer,
            Self::Real => StorageKind::Real,
            Self::Object => StorageKind::Blob,
        }
    }

    pub const fn is_searchable(&self) -> bool {
        !matches!(self, Self::Object)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uuid => "UUID",
            Self::Id => "ID",
            Self::Text => "TEXT",
            Self::Keyword => "KEYWORD",
            Self::Date => "DATE",
            Self::DateTime => "DATETIME",
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Object => "OBJECT",
        };
        f.write_str(name)
    }
}
