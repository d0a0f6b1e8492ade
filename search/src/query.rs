//! Query construction and validation.
//!
//! A [`Query`] is bound to a schema and validates every criterion as it is
//! added, so a query that was built successfully can always be executed.
//! Criteria are joined with AND.

use sift_core::schema::Schema;
use sift_core::store::{Comparison, Predicate};
use sift_core::{StorageKind, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field '{0}' is not searchable")]
    Unsearchable(String),

    #[error("Field '{0}' is not a keyword field")]
    NotKeywordField(String),

    #[error("{criterion} is not supported on field '{field}'")]
    UnsupportedComparison {
        field: String,
        criterion: &'static str,
    },

    #[error("Field '{field}' expects {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: StorageKind,
        found: StorageKind,
    },

    #[error("order_by needs at least one field")]
    EmptyOrderBy,

    #[error("order_by got {fields} fields but {directions} directions")]
    OrderByLengthMismatch { fields: usize, directions: usize },

    #[error("Invalid sort direction {0:?}, expected ASC or DESC")]
    InvalidDirection(String),

    #[error("Query was built for schema '{0}'")]
    ForeignSchema(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for Direction {
    type Err = QueryError;

    /// Accepts `ASC`/`DESC` and `ascending`/`descending`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            _ => Err(QueryError::InvalidDirection(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Ascending => write!(f, "ASC"),
            Direction::Descending => write!(f, "DESC"),
        }
    }
}

/// A filter on one field.
///
/// Every variant except [`Criterion::ContainsKeywords`] is evaluated by the
/// record store; `ContainsKeywords` is answered by the field's inverted index.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Equal { field: String, value: Value },
    GreaterOrEqual { field: String, lower: Value },
    LessOrEqual { field: String, upper: Value },
    /// Inclusive on both ends.
    Between { field: String, lower: Value, upper: Value },
    StartsWith { field: String, prefix: String },
    EndsWith { field: String, suffix: String },
    Contains { field: String, substring: String },
    /// Matches documents whose keyword set contains every listed keyword.
    /// An empty list matches nothing.
    ContainsKeywords { field: String, keywords: BTreeSet<String> },
}

impl Criterion {
    pub fn equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equal {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn greater_or_equal(field: impl Into<String>, lower: impl Into<Value>) -> Self {
        Self::GreaterOrEqual {
            field: field.into(),
            lower: lower.into(),
        }
    }

    pub fn less_or_equal(field: impl Into<String>, upper: impl Into<Value>) -> Self {
        Self::LessOrEqual {
            field: field.into(),
            upper: upper.into(),
        }
    }

    pub fn between(
        field: impl Into<String>,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Self {
        Self::Between {
            field: field.into(),
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    pub fn starts_with(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::StartsWith {
            field: field.into(),
            prefix: prefix.into(),
        }
    }

    pub fn ends_with(field: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self::EndsWith {
            field: field.into(),
            suffix: suffix.into(),
        }
    }

    pub fn contains(field: impl Into<String>, substring: impl Into<String>) -> Self {
        Self::Contains {
            field: field.into(),
            substring: substring.into(),
        }
    }

    pub fn contains_keywords<I, S>(field: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ContainsKeywords {
            field: field.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::Equal { field, .. }
            | Self::GreaterOrEqual { field, .. }
            | Self::LessOrEqual { field, .. }
            | Self::Between { field, .. }
            | Self::StartsWith { field, .. }
            | Self::EndsWith { field, .. }
            | Self::Contains { field, .. }
            | Self::ContainsKeywords { field, .. } => field,
        }
    }

    pub fn is_index_evaluable(&self) -> bool {
        matches!(self, Self::ContainsKeywords { .. })
    }

    /// Store-side form of the criterion; `None` for keyword criteria.
    pub fn comparison(&self) -> Option<Comparison> {
        let comparison = match self {
            Self::Equal { value, .. } => Comparison::Equal(value.clone()),
            Self::GreaterOrEqual { lower, .. } => Comparison::GreaterOrEqual(lower.clone()),
            Self::LessOrEqual { upper, .. } => Comparison::LessOrEqual(upper.clone()),
            Self::Between { lower, upper, .. } => {
                Comparison::Between(lower.clone(), upper.clone())
            }
            Self::StartsWith { prefix, .. } => Comparison::StartsWith(prefix.clone()),
            Self::EndsWith { suffix, .. } => Comparison::EndsWith(suffix.clone()),
            Self::Contains { substring, .. } => Comparison::Contains(substring.clone()),
            Self::ContainsKeywords { .. } => return None,
        };
        Some(comparison)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Equal { .. } => "Equal",
            Self::GreaterOrEqual { .. } => "GreaterOrEqual",
            Self::LessOrEqual { .. } => "LessOrEqual",
            Self::Between { .. } => "Between",
            Self::StartsWith { .. } => "StartsWith",
            Self::EndsWith { .. } => "EndsWith",
            Self::Contains { .. } => "Contains",
            Self::ContainsKeywords { .. } => "ContainsKeywords",
        }
    }

    /// Checks the criterion against the schema it will run on.
    fn validate(&self, schema: &Schema) -> Result<(), QueryError> {
        let name = self.field();
        let field = schema
            .field(name)
            .map_err(|_| QueryError::UnknownField(name.to_string()))?;

        if !field.is_searchable() {
            return Err(QueryError::Unsearchable(name.to_string()));
        }

        let Some(comparison) = self.comparison() else {
            return if field.is_keyword() {
                Ok(())
            } else {
                Err(QueryError::NotKeywordField(name.to_string()))
            };
        };

        let kind = field.storage_kind();
        let supported = if comparison.is_text_match() {
            kind.is_text()
        } else if comparison.is_range() {
            kind.is_orderable()
        } else {
            true
        };
        if !supported {
            return Err(QueryError::UnsupportedComparison {
                field: name.to_string(),
                criterion: self.name(),
            });
        }

        for operand in comparison.operands() {
            if let Some(found) = operand.kind() {
                let numeric = kind.is_numeric() && found.is_numeric();
                if found != kind && !numeric {
                    return Err(QueryError::TypeMismatch {
                        field: name.to_string(),
                        expected: kind,
                        found,
                    });
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContainsKeywords { field, keywords } => {
                write!(f, "{field} CONTAINS {}", Value::Keywords(keywords.clone()))
            }
            other => match other.comparison() {
                Some(comparison) => write!(f, "{} {comparison}", other.field()),
                None => write!(f, "{}", other.field()),
            },
        }
    }
}

/// A search request: criteria joined with AND, plus ordering and paging.
#[derive(Debug, Clone)]
pub struct Query {
    schema: Arc<Schema>,
    pub(crate) criteria: Vec<Criterion>,
    pub(crate) order_by: Vec<(String, Direction)>,
    pub(crate) limit: Option<usize>,
    pub(crate) offset: Option<usize>,
}

/// A query split into the part the record store evaluates and the part the
/// keyword indexes evaluate.
pub(crate) struct Plan<'q> {
    pub predicate: Predicate,
    pub keyword_criteria: Vec<(&'q str, &'q BTreeSet<String>)>,
    pub order: Vec<(usize, Direction)>,
}

impl Query {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            criteria: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Adds a criterion, rejecting it if it cannot run on the bound schema.
    pub fn add(&mut self, criterion: Criterion) -> Result<&mut Self, QueryError> {
        criterion.validate(&self.schema)?;
        self.criteria.push(criterion);
        Ok(self)
    }

    /// Clears all criteria. Ordering and paging are kept.
    pub fn reset(&mut self) -> &mut Self {
        self.criteria.clear();
        self
    }

    /// Replaces all criteria. On error the query is left without criteria.
    pub fn renew_with(
        &mut self,
        criteria: impl IntoIterator<Item = Criterion>,
    ) -> Result<&mut Self, QueryError> {
        self.reset();
        for criterion in criteria {
            self.add(criterion)?;
        }
        Ok(self)
    }

    /// Sets the sort order from parallel lists of field names and direction
    /// tokens (`ASC` / `DESC`), replacing any previous order.
    pub fn order_by<F, D>(&mut self, fields: &[F], directions: &[D]) -> Result<&mut Self, QueryError>
    where
        F: AsRef<str>,
        D: AsRef<str>,
    {
        if fields.len() != directions.len() {
            return Err(QueryError::OrderByLengthMismatch {
                fields: fields.len(),
                directions: directions.len(),
            });
        }
        if fields.is_empty() {
            return Err(QueryError::EmptyOrderBy);
        }

        let mut order_by = Vec::with_capacity(fields.len());
        for (field, direction) in fields.iter().zip(directions) {
            let field = field.as_ref();
            self.check_sortable(field)?;
            order_by.push((field.to_string(), direction.as_ref().parse::<Direction>()?));
        }

        self.order_by = order_by;
        Ok(self)
    }

    /// Appends one sort key.
    pub fn then_order_by(
        &mut self,
        field: &str,
        direction: Direction,
    ) -> Result<&mut Self, QueryError> {
        self.check_sortable(field)?;
        self.order_by.push((field.to_string(), direction));
        Ok(self)
    }

    pub fn limit(&mut self, limit: usize) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: usize) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn ordering(&self) -> &[(String, Direction)] {
        &self.order_by
    }

    fn check_sortable(&self, name: &str) -> Result<(), QueryError> {
        let field = self
            .schema
            .field(name)
            .map_err(|_| QueryError::UnknownField(name.to_string()))?;
        if !field.is_searchable() {
            return Err(QueryError::Unsearchable(name.to_string()));
        }
        Ok(())
    }

    pub(crate) fn plan(&self) -> Plan<'_> {
        let mut predicate = Predicate::all();
        let mut keyword_criteria = Vec::new();

        for criterion in &self.criteria {
            match criterion {
                Criterion::ContainsKeywords { field, keywords } => {
                    keyword_criteria.push((field.as_str(), keywords));
                }
                other => {
                    if let (Some(column), Some(comparison)) =
                        (self.schema.position(other.field()), other.comparison())
                    {
                        predicate.push(column, comparison);
                    }
                }
            }
        }

        let order = self
            .order_by
            .iter()
            .filter_map(|(field, direction)| {
                self.schema.position(field).map(|column| (column, *direction))
            })
            .collect();

        Plan {
            predicate,
            keyword_criteria,
            order,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SEARCH {}", self.schema.name())?;
        for (i, criterion) in self.criteria.iter().enumerate() {
            let joiner = if i == 0 { " WHERE" } else { " AND" };
            write!(f, "{joiner} {criterion}")?;
        }
        for (i, (field, direction)) in self.order_by.iter().enumerate() {
            let joiner = if i == 0 { " ORDER BY" } else { "," };
            write!(f, "{joiner} {field} {direction}")?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        if let Some(offset) = self.offset {
            write!(f, " OFFSET {offset}")?;
        }
        Ok(())
    }
}
