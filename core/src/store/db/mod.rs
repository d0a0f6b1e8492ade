//! Database layer backed by redb.
//!
//! This module handles all redb operations including:
//! - Row tables (DocId → Row), one per schema
//! - Keyword tables (keyword → set<DocId>), one per keyword field
//! - Metadata storage (schema descriptors as JSON strings)

use crate::schema::Schema;
use crate::store::db::keyword_table::KeywordTable;
use crate::store::db::versioned::VersionedRow;
use crate::store::error::StoreError;
use crate::store::{IndexStore, IndexUpdate, Postings, Predicate, RecordStore, Row};
use crate::types::{DocId, Value};
use redb::backends::InMemoryBackend;
use redb::{ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

mod keyword_table;
mod versioned;

/// Metadata table: &str → JSON string
const METADATA_TABLE: TableDefinition<&str, &str> = TableDefinition::new("metadata");

fn row_table_name(table: &str) -> String {
    format!("rows::{table}")
}

fn schema_metadata_key(table: &str) -> String {
    format!("schema::{table}")
}

/// The main database struct wrapping redb.
pub struct Database {
    db: redb::Database,
}

impl Database {
    /// Creates or opens an on-disk database, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = redb::Database::create(path)?;
        debug!(path = %path.display(), "opened database");
        Self::init(db)
    }

    /// Creates a database that lives only as long as this value.
    pub fn in_memory() -> Result<Self, StoreError> {
        let db = redb::Database::builder().create_with_backend(InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: redb::Database) -> Result<Self, StoreError> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(METADATA_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    fn rows<'a>(name: &'a str) -> TableDefinition<'a, DocId, VersionedRow> {
        TableDefinition::new(name)
    }
}

impl RecordStore for Database {
    fn create_table(&mut self, schema: &Schema) -> Result<(), StoreError> {
        let name = row_table_name(schema.name());
        let descriptor = serde_json::to_string(schema)?;
        let metadata_key = schema_metadata_key(schema.name());

        let write_txn = self.db.begin_write()?;
        {
            let mut metadata = write_txn.open_table(METADATA_TABLE)?;
            let stored = metadata
                .get(metadata_key.as_str())?
                .map(|guard| guard.value().to_string());

            match stored {
                Some(stored) if stored != descriptor => {
                    return Err(StoreError::SchemaMismatch {
                        table: schema.name().to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    metadata.insert(metadata_key.as_str(), descriptor.as_str())?;
                }
            }

            let _ = write_txn.open_table(Self::rows(&name))?;
        }
        write_txn.commit()?;

        debug!(table = schema.name(), "provisioned row table");
        Ok(())
    }

    fn insert(&mut self, table: &str, id: &DocId, row: &Row) -> Result<(), StoreError> {
        let name = row_table_name(table);
        let write_txn = self.db.begin_write()?;
        {
            let mut rows = write_txn.open_table(Self::rows(&name))?;

            if rows.get(id)?.is_some() {
                return Err(StoreError::DuplicateKey(id.clone()));
            }

            rows.insert(id, &VersionedRow::V1(row.clone()))?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn insert_batch(&mut self, table: &str, batch: &[(DocId, Row)]) -> Result<Vec<usize>, StoreError> {
        let name = row_table_name(table);
        let mut skipped = Vec::new();

        let write_txn = self.db.begin_write()?;
        {
            let mut rows = write_txn.open_table(Self::rows(&name))?;

            for (position, (id, row)) in batch.iter().enumerate() {
                if rows.get(id)?.is_some() {
                    skipped.push(position);
                    continue;
                }
                rows.insert(id, &VersionedRow::V1(row.clone()))?;
            }
        }
        write_txn.commit()?;
        Ok(skipped)
    }

    fn update(
        &mut self,
        table: &str,
        predicate: &Predicate,
        assignments: &[(usize, Value)],
    ) -> Result<usize, StoreError> {
        let name = row_table_name(table);
        let write_txn = self.db.begin_write()?;
        let updated;
        {
            let mut rows = write_txn.open_table(Self::rows(&name))?;

            // Collect first: the table cannot be written while iterating it.
            let mut matching = Vec::new();
            for entry in rows.iter()? {
                let (id, row) = entry?;
                let row = row.value().into_latest();
                if predicate.matches(&row) {
                    matching.push((id.value(), row));
                }
            }

            updated = matching.len();
            for (id, mut row) in matching {
                for (column, value) in assignments {
                    row.set(*column, value.clone());
                }
                rows.insert(&id, &VersionedRow::V1(row))?;
            }
        }
        write_txn.commit()?;
        Ok(updated)
    }

    fn update_by_key(
        &mut self,
        table: &str,
        id: &DocId,
        assignments: &[(usize, Value)],
    ) -> Result<bool, StoreError> {
        let name = row_table_name(table);
        let write_txn = self.db.begin_write()?;
        {
            let mut rows = write_txn.open_table(Self::rows(&name))?;

            let Some(mut row) = rows.get(id)?.map(|guard| guard.value().into_latest()) else {
                return Ok(false);
            };
            for (column, value) in assignments {
                row.set(*column, value.clone());
            }
            rows.insert(id, &VersionedRow::V1(row))?;
        }
        write_txn.commit()?;
        Ok(true)
    }

    fn get_by_key(&self, table: &str, id: &DocId) -> Result<Option<Row>, StoreError> {
        let name = row_table_name(table);
        let read_txn = self.db.begin_read()?;
        let rows = read_txn.open_table(Self::rows(&name))?;

        match rows.get(id)? {
            None => Ok(None),
            Some(guard) => Ok(Some(guard.value().into_latest())),
        }
    }

    fn scan_ids(&self, table: &str, predicate: &Predicate) -> Result<Vec<DocId>, StoreError> {
        let name = row_table_name(table);
        let read_txn = self.db.begin_read()?;
        let rows = read_txn.open_table(Self::rows(&name))?;

        let mut ids = Vec::new();
        for entry in rows.iter()? {
            let (id, row) = entry?;
            if predicate.is_empty() || predicate.matches(&row.value().into_latest()) {
                ids.push(id.value());
            }
        }

        Ok(ids)
    }

    fn scan(&self, table: &str, predicate: &Predicate) -> Result<Vec<(DocId, Row)>, StoreError> {
        let name = row_table_name(table);
        let read_txn = self.db.begin_read()?;
        let rows = read_txn.open_table(Self::rows(&name))?;

        let mut matching = Vec::new();
        for entry in rows.iter()? {
            let (id, row) = entry?;
            let row = row.value().into_latest();
            if predicate.matches(&row) {
                matching.push((id.value(), row));
            }
        }

        Ok(matching)
    }

    fn count(&self, table: &str) -> Result<u64, StoreError> {
        let name = row_table_name(table);
        let read_txn = self.db.begin_read()?;
        let rows = read_txn.open_table(Self::rows(&name))?;
        Ok(rows.len()?)
    }
}

impl IndexStore for Database {
    fn create_index(&mut self, table: &str, field: &str) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        KeywordTable::new(table, field).init(&write_txn)?;
        write_txn.commit()?;

        debug!(table, field, "provisioned keyword table");
        Ok(())
    }

    fn get(&self, table: &str, field: &str, keyword: &str) -> Result<Option<BTreeSet<DocId>>, StoreError> {
        let read_txn = self.db.begin_read()?;
        KeywordTable::new(table, field).get(&read_txn, keyword)
    }

    fn put(
        &mut self,
        table: &str,
        field: &str,
        keyword: &str,
        ids: &BTreeSet<DocId>,
    ) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        KeywordTable::new(table, field).put(&write_txn, keyword, ids)?;
        write_txn.commit()?;
        Ok(())
    }

    fn merge(&mut self, table: &str, update: &IndexUpdate) -> Result<(), StoreError> {
        if update.is_empty() {
            return Ok(());
        }

        let write_txn = self.db.begin_write()?;
        for (field, postings) in update.iter() {
            KeywordTable::new(table, field).merge(&write_txn, postings)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn keywords(&self, table: &str, field: &str) -> Result<Vec<String>, StoreError> {
        let read_txn = self.db.begin_read()?;
        KeywordTable::new(table, field).keywords(&read_txn)
    }

    fn postings(&self, table: &str, field: &str) -> Result<Postings, StoreError> {
        let read_txn = self.db.begin_read()?;
        KeywordTable::new(table, field).postings(&read_txn)
    }
}
