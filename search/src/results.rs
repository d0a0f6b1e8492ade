//! Search results.

use crate::engine::error::EngineError;
use sift_core::schema::Schema;
use sift_core::store::RecordStore;
use sift_core::{DocId, Document};
use std::vec;
use tracing::warn;

/// Documents matched by a query, in result order.
///
/// Unordered queries yield ids and fetch each row on demand; ordered queries
/// were already materialized to be sorted. A row that disappeared between
/// planning and fetching is skipped with a warning.
pub struct SearchResults<'a, S> {
    store: &'a S,
    schema: &'a Schema,
    remaining: Remaining,
}

enum Remaining {
    Ids(vec::IntoIter<DocId>),
    Documents(vec::IntoIter<Document>),
}

impl<'a, S: RecordStore> SearchResults<'a, S> {
    pub(crate) fn pending(store: &'a S, schema: &'a Schema, ids: Vec<DocId>) -> Self {
        Self {
            store,
            schema,
            remaining: Remaining::Ids(ids.into_iter()),
        }
    }

    pub(crate) fn ready(store: &'a S, schema: &'a Schema, documents: Vec<Document>) -> Self {
        Self {
            store,
            schema,
            remaining: Remaining::Documents(documents.into_iter()),
        }
    }
}

impl<S: RecordStore> Iterator for SearchResults<'_, S> {
    type Item = Result<Document, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.remaining {
            Remaining::Documents(documents) => documents.next().map(Ok),
            Remaining::Ids(ids) => loop {
                let id = ids.next()?;
                match self.store.get_by_key(self.schema.name(), &id) {
                    Ok(Some(row)) => return Some(Ok(self.schema.document(row))),
                    Ok(None) => warn!(%id, "indexed document missing from store"),
                    Err(e) => return Some(Err(e.into())),
                }
            },
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.remaining {
            Remaining::Documents(documents) => documents.size_hint(),
            Remaining::Ids(ids) => (0, Some(ids.len())),
        }
    }
}
