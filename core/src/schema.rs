//! Fields and schemas.
//!
//! A [`Schema`] is fixed at construction: it validates its fields once and is
//! read-only afterwards, so it can be shared freely between an engine and the
//! queries built against it.

use crate::store::Row;
use crate::types::{DocId, Document, FieldType, StorageKind, Value};
use error::{DocumentError, SchemaError};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

pub mod error {
    use crate::types::StorageKind;
    use thiserror::Error;

    #[derive(Debug, Error, PartialEq)]
    pub enum SchemaError {
        #[error("Name must not be empty")]
        EmptyName,

        #[error("Field '{0}' declares no field type")]
        NoCapabilities(String),

        #[error("Field '{field}' has inconsistent storage representation: {kinds:?}")]
        InconsistentStorage {
            field: String,
            kinds: Vec<StorageKind>,
        },

        #[error("Schema has no UUID field")]
        MissingUuid,

        #[error("Schema has more than one UUID field: {0:?}")]
        MultipleUuid(Vec<String>),

        #[error("Duplicate field: {0}")]
        DuplicateField(String),

        #[error("Unknown field: {0}")]
        UnknownField(String),

        #[error("Only the UUID field can be the primary key, not '{0}'")]
        PrimaryKeyNotUuid(String),

        #[error("Invalid default for field '{0}'")]
        InvalidDefault(String),
    }

    #[derive(Debug, Error, PartialEq)]
    pub enum DocumentError {
        #[error("Document has a field that is not in the schema: {0}")]
        UnknownField(String),

        #[error("Document is missing a value for field '{0}'")]
        MissingValue(String),

        #[error("Field '{field}' expects {expected}, found {found}")]
        TypeMismatch {
            field: String,
            expected: StorageKind,
            found: StorageKind,
        },

        #[error("Invalid document identifier: {0:?}")]
        InvalidIdentifier(String),
    }
}

/// A named attribute with one storage representation and one or more
/// searchable capabilities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    name: String,
    capabilities: BTreeSet<FieldType>,
    storage_kind: StorageKind,
    primary_key: bool,
    nullable: bool,
    default: Option<Value>,
}

impl Field {
    /// Creates a nullable field without a default.
    ///
    /// Fails if no capability is given or if the capabilities disagree on the
    /// storage representation.
    pub fn new(
        name: impl Into<String>,
        capabilities: impl IntoIterator<Item = FieldType>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        if name.is_empty() {
            return Err(SchemaError::EmptyName);
        }

        let capabilities: BTreeSet<FieldType> = capabilities.into_iter().collect();
        let kinds: BTreeSet<StorageKind> = capabilities.iter().map(|t| t.storage_kind()).collect();

        let mut distinct = kinds.iter().copied();
        let storage_kind = match (distinct.next(), distinct.next()) {
            (None, _) => return Err(SchemaError::NoCapabilities(name)),
            (Some(kind), None) => kind,
            (Some(_), Some(_)) => {
                return Err(SchemaError::InconsistentStorage {
                    field: name,
                    kinds: kinds.into_iter().collect(),
                });
            }
        };

        Ok(Self {
            name,
            capabilities,
            storage_kind,
            primary_key: false,
            nullable: true,
            default: None,
        })
    }

    pub fn with_primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Value substituted when a document omits this field.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> impl Iterator<Item = FieldType> + '_ {
        self.capabilities.iter().copied()
    }

    pub fn has(&self, field_type: FieldType) -> bool {
        self.capabilities.contains(&field_type)
    }

    pub fn storage_kind(&self) -> StorageKind {
        self.storage_kind
    }

    pub fn is_keyword(&self) -> bool {
        self.has(FieldType::Keyword)
    }

    pub fn is_uuid(&self) -> bool {
        self.has(FieldType::Uuid)
    }

    /// `false` only for fields whose capabilities are all unsearchable.
    pub fn is_searchable(&self) -> bool {
        self.capabilities.iter().any(FieldType::is_searchable)
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Checks a value against this field and converts it to the stored form.
    pub fn coerce(&self, value: Value) -> Result<Value, DocumentError> {
        if value.is_null() && !self.nullable {
            return Err(DocumentError::MissingValue(self.name.clone()));
        }
        if let Some(found) = value.kind() {
            if !value.fits(self.storage_kind) {
                return Err(DocumentError::TypeMismatch {
                    field: self.name.clone(),
                    expected: self.storage_kind,
                    found,
                });
            }
        }

        // Widen integers stored in real columns so rows stay homogeneous.
        Ok(match (self.storage_kind, value) {
            (StorageKind::Real, Value::Integer(i)) => Value::Real(i as f64),
            (_, value) => value,
        })
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field({:?}", self.name)?;
        for capability in &self.capabilities {
            write!(f, ", {capability}")?;
        }
        write!(
            f,
            ", primary_key={}, nullable={}, default=",
            self.primary_key, self.nullable
        )?;
        match &self.default {
            Some(value) => write!(f, "{value})"),
            None => f.write_str("NULL)"),
        }
    }
}

/// An ordered, immutable collection of fields with exactly one UUID field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
    uuid_field: usize,
    keyword_fields: Vec<usize>,
}

impl Schema {
    pub fn new(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = Field>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        if name.is_empty() {
            return Err(SchemaError::EmptyName);
        }

        let mut fields: Vec<Field> = fields.into_iter().collect();

        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
        }

        let uuid_positions: Vec<usize> = fields
            .iter()
            .enumerate()
            .filter(|(_, field)| field.is_uuid())
            .map(|(i, _)| i)
            .collect();

        let uuid_field = match uuid_positions.as_slice() {
            [] => return Err(SchemaError::MissingUuid),
            [single] => *single,
            many => {
                return Err(SchemaError::MultipleUuid(
                    many.iter().map(|&i| fields[i].name.clone()).collect(),
                ));
            }
        };

        for (i, field) in fields.iter().enumerate() {
            if field.primary_key && i != uuid_field {
                return Err(SchemaError::PrimaryKeyNotUuid(field.name.clone()));
            }
            if let Some(default) = &field.default {
                let valid = i != uuid_field && !default.is_null() && default.fits(field.storage_kind);
                if !valid {
                    return Err(SchemaError::InvalidDefault(field.name.clone()));
                }
            }
        }

        // The identifier is always the primary key.
        let uuid = &mut fields[uuid_field];
        uuid.primary_key = true;
        uuid.nullable = false;

        let keyword_fields = fields
            .iter()
            .enumerate()
            .filter(|(_, field)| field.is_keyword())
            .map(|(i, _)| i)
            .collect();

        Ok(Self {
            name,
            fields,
            uuid_field,
            keyword_fields,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> Result<&Field, SchemaError> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .ok_or_else(|| SchemaError::UnknownField(name.to_string()))
    }

    /// Column index of a field within stored rows.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn uuid_field(&self) -> &Field {
        &self.fields[self.uuid_field]
    }

    pub fn keyword_fields(&self) -> impl Iterator<Item = &Field> {
        self.keyword_fields.iter().map(|&i| &self.fields[i])
    }

    /// Validates a document and lays it out as a row in schema order.
    ///
    /// Absent fields take their default, or `Null` when nullable.
    pub fn conform(&self, document: &Document) -> Result<(DocId, Row), DocumentError> {
        if let Some(unknown) = document.names().find(|name| !self.contains(name)) {
            return Err(DocumentError::UnknownField(unknown.to_string()));
        }

        let mut values = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = match document.get(&field.name) {
                Some(value) => value.clone(),
                None => field.default.clone().unwrap_or(Value::Null),
            };
            let value = field.coerce(value)?;
            values.push(value);
        }

        let id = match &values[self.uuid_field] {
            Value::Text(raw) => DocId::try_from(raw.as_str())
                .map_err(|_| DocumentError::InvalidIdentifier(raw.clone()))?,
            _ => return Err(DocumentError::MissingValue(self.uuid_field().name.clone())),
        };

        Ok((id, Row::new(values)))
    }

    /// Turns a stored row back into a document covering every field.
    pub fn document(&self, row: Row) -> Document {
        self.fields
            .iter()
            .map(|field| field.name.clone())
            .zip(row.into_values())
            .collect()
    }

    /// Keyword sets of a row, one entry per keyword field. `Null` yields
    /// nothing.
    pub fn keywords<'r>(&self, row: &'r Row) -> impl Iterator<Item = (&Field, &'r BTreeSet<String>)> {
        self.keyword_fields.iter().filter_map(move |&i| {
            row.get(i)
                .and_then(Value::as_keywords)
                .map(|keywords| (&self.fields[i], keywords))
        })
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Schema({:?}", self.name)?;
        for field in &self.fields {
            write!(f, ",\n\t{field}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests;
