//! In-memory keyword → identifier accumulators.
//!
//! [`Postings`] folds `(keyword, id)` pairs for one keyword field.
//! [`IndexUpdate`] groups them per field so a store can apply a whole batch in
//! one atomic write.

use crate::schema::Schema;
use crate::store::Row;
use crate::types::DocId;
use std::collections::{BTreeMap, BTreeSet};

/// `keyword → set<DocId>` for a single keyword field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Postings {
    entries: BTreeMap<String, BTreeSet<DocId>>,
}

impl Postings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, keyword: impl Into<String>, id: DocId) {
        self.entries.entry(keyword.into()).or_default().insert(id);
    }

    pub fn get(&self, keyword: &str) -> Option<&BTreeSet<DocId>> {
        self.entries.get(keyword)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<DocId>)> {
        self.entries.iter().map(|(k, ids)| (k.as_str(), ids))
    }

    /// Number of distinct keywords.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, DocId)> for Postings {
    fn from_iter<T: IntoIterator<Item = (K, DocId)>>(iter: T) -> Self {
        let mut postings = Postings::new();
        for (keyword, id) in iter {
            postings.add(keyword, id);
        }
        postings
    }
}

impl<K: Into<String>> Extend<(K, DocId)> for Postings {
    fn extend<T: IntoIterator<Item = (K, DocId)>>(&mut self, iter: T) {
        for (keyword, id) in iter {
            self.add(keyword, id);
        }
    }
}

/// Pending index writes, grouped by keyword field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexUpdate {
    fields: BTreeMap<String, Postings>,
}

impl IndexUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, keyword: impl Into<String>, id: DocId) {
        self.postings_mut(field).add(keyword, id);
    }

    /// Records every keyword of a stored row under its field.
    pub fn add_row(&mut self, schema: &Schema, id: &DocId, row: &Row) {
        for (field, keywords) in schema.keywords(row) {
            let postings = self.postings_mut(field.name());
            for keyword in keywords {
                postings.add(keyword.as_str(), id.clone());
            }
        }
    }

    pub fn insert(&mut self, field: impl Into<String>, postings: Postings) {
        self.fields.insert(field.into(), postings);
    }

    pub fn field(&self, field: &str) -> Option<&Postings> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Postings)> {
        self.fields.iter().map(|(f, p)| (f.as_str(), p))
    }

    /// Total distinct keywords across all fields.
    pub fn keyword_count(&self) -> usize {
        self.fields.values().map(Postings::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.values().all(Postings::is_empty)
    }

    fn postings_mut(&mut self, field: &str) -> &mut Postings {
        self.fields.entry(field.to_string()).or_default()
    }
}
