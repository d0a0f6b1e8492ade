use crate::store::Postings;
use crate::store::db::versioned::VersionedPostings;
use crate::store::error::StoreError;
use crate::types::DocId;
use redb::{ReadTransaction, ReadableTable, TableDefinition, WriteTransaction};
use std::collections::BTreeSet;

/// Inverted index table of one keyword field of one row table:
/// `keyword → set<DocId>`.
pub struct KeywordTable {
    name: String,
}

impl KeywordTable {
    pub fn new(table: &str, field: &str) -> Self {
        Self {
            name: format!("keywords::{table}::{field}"),
        }
    }

    fn definition(&self) -> TableDefinition<'_, &'static str, VersionedPostings> {
        TableDefinition::new(&self.name)
    }

    pub fn init(&self, txn: &WriteTransaction) -> Result<(), StoreError> {
        txn.open_table(self.definition())?;
        Ok(())
    }

    pub fn get(
        &self,
        txn: &ReadTransaction,
        keyword: &str,
    ) -> Result<Option<BTreeSet<DocId>>, StoreError> {
        let table = txn.open_table(self.definition())?;
        Ok(table.get(keyword)?.map(|guard| guard.value().into_latest()))
    }

    pub fn put(
        &self,
        txn: &WriteTransaction,
        keyword: &str,
        ids: &BTreeSet<DocId>,
    ) -> Result<(), StoreError> {
        let mut table = txn.open_table(self.definition())?;
        table.insert(keyword, &VersionedPostings::V1(ids.clone()))?;
        Ok(())
    }

    /// Unions `postings` into the stored rows within `txn`.
    ///
    /// The read and the write of each row share the caller's write
    /// transaction, and redb admits one writer at a time, so no concurrent
    /// merge can interleave between them.
    pub fn merge(&self, txn: &WriteTransaction, postings: &Postings) -> Result<(), StoreError> {
        let mut table = txn.open_table(self.definition())?;

        for (keyword, ids) in postings.iter() {
            let mut merged = table
                .get(keyword)?
                .map(|guard| guard.value().into_latest())
                .unwrap_or_default();
            let before = merged.len();
            merged.extend(ids.iter().cloned());

            if merged.len() != before {
                table.insert(keyword, &VersionedPostings::V1(merged))?;
            }
        }

        Ok(())
    }

    pub fn keywords(&self, txn: &ReadTransaction) -> Result<Vec<String>, StoreError> {
        let table = txn.open_table(self.definition())?;
        let mut keywords = Vec::new();

        for entry in table.iter()? {
            let (keyword, _) = entry?;
            keywords.push(keyword.value().to_string());
        }

        Ok(keywords)
    }

    pub fn postings(&self, txn: &ReadTransaction) -> Result<Postings, StoreError> {
        let table = txn.open_table(self.definition())?;
        let mut postings = Postings::new();

        for entry in table.iter()? {
            let (keyword, ids) = entry?;
            let keyword = keyword.value().to_string();
            for id in ids.value().into_latest() {
                postings.add(keyword.as_str(), id);
            }
        }

        Ok(postings)
    }
}
