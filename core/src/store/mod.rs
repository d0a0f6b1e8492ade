//! Storage boundary of the engine.
//!
//! Two collaborators live here:
//! - [`RecordStore`]: one table of rows per schema, keyed by [`DocId`]
//! - [`IndexStore`]: one inverted index table per keyword field
//!
//! [`Database`] implements both on top of redb.

use crate::schema::Schema;
use crate::types::{DocId, Value};
use error::StoreError;
use std::collections::BTreeSet;

pub(crate) mod db;
pub(crate) mod postings;
pub(crate) mod predicate;
pub(crate) mod row;

pub use db::Database;
pub use postings::{IndexUpdate, Postings};
pub use predicate::{Clause, Comparison, Predicate};
pub use row::Row;

pub mod error {
    use crate::types::DocId;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum StoreError {
        #[error("Database error: {0}")]
        Redb(#[from] redb::DatabaseError),

        #[error("Table error: {0}")]
        TableError(#[from] redb::TableError),

        #[error("Storage error: {0}")]
        StorageError(#[from] redb::StorageError),

        #[error("Transaction error: {0}")]
        TransactionError(#[from] redb::TransactionError),

        #[error("Commit error: {0}")]
        CommitError(#[from] redb::CommitError),

        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Schema descriptor error: {0}")]
        Codec(#[from] serde_json::Error),

        #[error("Duplicate key: {0}")]
        DuplicateKey(DocId),

        #[error("Table '{table}' was created with a different schema")]
        SchemaMismatch { table: String },
    }
}

/// Primary storage for documents.
///
/// Tables are addressed by schema name; rows by the value of the schema's
/// UUID field.
pub trait RecordStore {
    /// Provisions the table for a schema. Idempotent for the same schema.
    fn create_table(&mut self, schema: &Schema) -> Result<(), StoreError>;

    /// Inserts a row. Fails with [`StoreError::DuplicateKey`] if the id is
    /// already stored.
    fn insert(&mut self, table: &str, id: &DocId, row: &Row) -> Result<(), StoreError>;

    /// Inserts many rows in one commit, skipping ids that are already stored
    /// or repeated within `rows`.
    ///
    /// Returns the positions within `rows` that were skipped, ascending.
    fn insert_batch(&mut self, table: &str, rows: &[(DocId, Row)]) -> Result<Vec<usize>, StoreError>;

    /// Applies `(column, value)` assignments to every row matching
    /// `predicate`. Returns the number of rows updated.
    fn update(
        &mut self,
        table: &str,
        predicate: &Predicate,
        assignments: &[(usize, Value)],
    ) -> Result<usize, StoreError>;

    /// Applies `(column, value)` assignments to the row stored under `id`.
    /// Returns `false` if there is no such row.
    fn update_by_key(
        &mut self,
        table: &str,
        id: &DocId,
        assignments: &[(usize, Value)],
    ) -> Result<bool, StoreError>;

    fn get_by_key(&self, table: &str, id: &DocId) -> Result<Option<Row>, StoreError>;

    /// Ids of the rows matching `predicate`, in primary-key order.
    fn scan_ids(&self, table: &str, predicate: &Predicate) -> Result<Vec<DocId>, StoreError>;

    /// Rows matching `predicate`, in primary-key order.
    fn scan(&self, table: &str, predicate: &Predicate) -> Result<Vec<(DocId, Row)>, StoreError>;

    fn count(&self, table: &str) -> Result<u64, StoreError>;
}

/// Inverted indexes: `keyword → set<DocId>`, one table per keyword field.
///
/// Indexes are scoped by table, so schemas sharing a store never share
/// keyword rows.
pub trait IndexStore {
    fn create_index(&mut self, table: &str, field: &str) -> Result<(), StoreError>;

    fn get(&self, table: &str, field: &str, keyword: &str) -> Result<Option<BTreeSet<DocId>>, StoreError>;

    /// Replaces the id set of a keyword.
    fn put(
        &mut self,
        table: &str,
        field: &str,
        keyword: &str,
        ids: &BTreeSet<DocId>,
    ) -> Result<(), StoreError>;

    /// Unions every posting set of `update` into the stored sets of `table`.
    ///
    /// Implementations must apply the whole update atomically: concurrent
    /// merges touching the same keyword must not lose ids, and readers must
    /// never observe a partially applied update.
    fn merge(&mut self, table: &str, update: &IndexUpdate) -> Result<(), StoreError>;

    /// Every keyword of a field, sorted.
    fn keywords(&self, table: &str, field: &str) -> Result<Vec<String>, StoreError>;

    /// Full contents of a field's index.
    fn postings(&self, table: &str, field: &str) -> Result<Postings, StoreError>;

    /// Ids containing `keyword`; empty if the keyword was never seen.
    fn lookup(&self, table: &str, field: &str, keyword: &str) -> Result<BTreeSet<DocId>, StoreError> {
        Ok(self.get(table, field, keyword)?.unwrap_or_default())
    }

    /// Adds one document id to one keyword row.
    fn add_document(
        &mut self,
        table: &str,
        field: &str,
        keyword: &str,
        id: &DocId,
    ) -> Result<(), StoreError> {
        let mut update = IndexUpdate::new();
        update.add(field, keyword, id.clone());
        self.merge(table, &update)
    }

    /// Folds all pairs in memory, then writes each distinct keyword once.
    ///
    /// Returns the number of distinct keywords written.
    fn bulk_build<I>(&mut self, table: &str, field: &str, pairs: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = (String, DocId)>,
        Self: Sized,
    {
        let postings: Postings = pairs.into_iter().collect();
        let written = postings.len();

        let mut update = IndexUpdate::new();
        update.insert(field, postings);
        self.merge(table, &update)?;
        Ok(written)
    }
}
