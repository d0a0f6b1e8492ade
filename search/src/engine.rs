//! Schema-bound search engine over a record store and keyword indexes.

use crate::config::{CaseMatching, SearchConfig};
use crate::query::{Direction, Query, QueryError};
use crate::results::SearchResults;
use error::EngineError;
use nucleo::Matcher;
use nucleo::pattern::{Normalization, Pattern};
use sift_core::schema::Schema;
use sift_core::schema::error::DocumentError;
use sift_core::store::error::StoreError;
use sift_core::store::{Database, IndexStore, IndexUpdate, RecordStore, Row};
use sift_core::types::Config;
use sift_core::{DocId, Document, Value};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub mod error {
    use crate::query::QueryError;
    use sift_core::DocId;
    use sift_core::schema::error::{DocumentError, SchemaError};
    use sift_core::store::error::StoreError;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("Schema error: {0}")]
        Schema(#[from] SchemaError),

        #[error("Invalid document: {0}")]
        Document(#[from] DocumentError),

        #[error("Invalid query: {0}")]
        Query(#[from] QueryError),

        #[error("Store error: {0}")]
        Store(#[from] StoreError),

        #[error("Document already exists: {0}")]
        DuplicateIdentifier(DocId),

        /// The row was stored but its keywords may be missing from the index.
        #[error("Failed to update keyword index for {fields:?}: {source}")]
        IndexWrite {
            fields: Vec<String>,
            #[source]
            source: StoreError,
        },

        #[error("Field '{0}' cannot be updated in place")]
        ReadOnlyField(String),
    }
}

/// Upper bound on the rows preallocated for one ingest batch.
const INITIAL_BATCH_CAPACITY: usize = 4096;

/// Outcome of [`SearchEngine::bulk_ingest`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub inserted: usize,
    /// Ids that were already stored, in input order.
    pub skipped: Vec<DocId>,
    /// Distinct `(field, keyword)` pairs written to the indexes.
    pub keywords: usize,
}

/// Search engine for one schema.
///
/// Rows live in the record store; every keyword field gets its own inverted
/// index. Both are provisioned when the engine is created.
pub struct SearchEngine<S = Database> {
    schema: Arc<Schema>,
    store: S,
    config: SearchConfig,
}

/// Create operations.
impl SearchEngine<Database> {
    /// Opens (or creates) the database for `schema` under `config.base_path`.
    pub fn open(
        schema: Schema,
        config: &Config,
        search_config: SearchConfig,
    ) -> Result<Self, EngineError> {
        let store = Database::open(&config.db_path(schema.name()))?;
        Self::with_store(schema, store, search_config)
    }

    pub fn in_memory(schema: Schema) -> Result<Self, EngineError> {
        Self::with_store(schema, Database::in_memory()?, SearchConfig::default())
    }
}

impl<S: RecordStore + IndexStore> SearchEngine<S> {
    pub fn with_store(schema: Schema, mut store: S, config: SearchConfig) -> Result<Self, EngineError> {
        for problem in config.validate() {
            warn!(%problem, "invalid search config, using default");
        }
        let config = config.with_defaults_for_invalid();

        store.create_table(&schema)?;
        for field in schema.keyword_fields() {
            store.create_index(schema.name(), field.name())?;
        }
        debug!(schema = schema.name(), fields = schema.len(), "search engine ready");

        Ok(Self {
            schema: Arc::new(schema),
            store,
            config,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// A fresh query bound to this engine's schema.
    pub fn create_query(&self) -> Query {
        Query::new(Arc::clone(&self.schema))
    }

    /// Number of stored documents.
    pub fn len(&self) -> Result<u64, EngineError> {
        Ok(self.store.count(self.schema.name())?)
    }

    pub fn is_empty(&self) -> Result<bool, EngineError> {
        Ok(self.len()? == 0)
    }
}

/// Ingestion operations.
impl<S: RecordStore + IndexStore> SearchEngine<S> {
    /// Stores one document and indexes its keywords.
    ///
    /// Fails with [`EngineError::DuplicateIdentifier`] if the id is already
    /// stored. If the index write fails after the row was stored, the row is
    /// kept and [`EngineError::IndexWrite`] is returned.
    pub fn add_one(&mut self, document: &Document) -> Result<DocId, EngineError> {
        let (id, row) = self.schema.conform(document)?;

        match self.store.insert(self.schema.name(), &id, &row) {
            Ok(()) => {}
            Err(StoreError::DuplicateKey(id)) => {
                return Err(EngineError::DuplicateIdentifier(id));
            }
            Err(e) => return Err(e.into()),
        }

        let mut update = IndexUpdate::new();
        update.add_row(&self.schema, &id, &row);
        self.write_index(&update)?;

        debug!(%id, keywords = update.keyword_count(), "document added");
        Ok(id)
    }

    /// Stores many documents, folding their keywords in memory and writing
    /// each distinct keyword once at the end.
    ///
    /// Documents whose id is already stored, including ids repeated earlier
    /// in the same input, are skipped with a warning and contribute no
    /// keywords. A document that does not conform to the schema aborts the
    /// ingest: documents of its unfinished batch are dropped, while batches
    /// committed before it stay stored and are indexed before the error is
    /// returned.
    pub fn bulk_ingest<I>(&mut self, documents: I) -> Result<IngestReport, EngineError>
    where
        I: IntoIterator<Item = Document>,
    {
        let started = Instant::now();

        let mut report = IngestReport::default();
        let mut update = IndexUpdate::new();
        let ingested = self.ingest_batches(documents, &mut update, &mut report);

        // Committed rows must always reach the index, even when ingestion
        // stopped early.
        report.keywords = update.keyword_count();
        self.write_index(&update)?;
        if let Err(e) = ingested {
            warn!(inserted = report.inserted, error = %e, "bulk ingest aborted");
            return Err(e);
        }

        info!(
            inserted = report.inserted,
            skipped = report.skipped.len(),
            keywords = report.keywords,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "bulk ingest finished"
        );
        Ok(report)
    }

    fn ingest_batches<I>(
        &mut self,
        documents: I,
        update: &mut IndexUpdate,
        report: &mut IngestReport,
    ) -> Result<(), EngineError>
    where
        I: IntoIterator<Item = Document>,
    {
        let batch_size = self.config.ingest_batch_size;
        let mut batch = Vec::with_capacity(batch_size.min(INITIAL_BATCH_CAPACITY));

        for document in documents {
            batch.push(self.schema.conform(&document)?);
            if batch.len() >= batch_size {
                self.flush_batch(&mut batch, update, report)?;
            }
        }
        self.flush_batch(&mut batch, update, report)
    }

    fn flush_batch(
        &mut self,
        batch: &mut Vec<(DocId, Row)>,
        update: &mut IndexUpdate,
        report: &mut IngestReport,
    ) -> Result<(), EngineError> {
        if batch.is_empty() {
            return Ok(());
        }

        let skipped: HashSet<usize> = self
            .store
            .insert_batch(self.schema.name(), batch)?
            .into_iter()
            .collect();

        for (position, (id, row)) in batch.drain(..).enumerate() {
            if skipped.contains(&position) {
                warn!(%id, "skipping duplicate document");
                report.skipped.push(id);
                continue;
            }
            update.add_row(&self.schema, &id, &row);
            report.inserted += 1;
        }
        Ok(())
    }

    fn write_index(&mut self, update: &IndexUpdate) -> Result<(), EngineError> {
        if update.is_empty() {
            return Ok(());
        }
        self.store.merge(self.schema.name(), update).map_err(|source| EngineError::IndexWrite {
            fields: update.iter().map(|(field, _)| field.to_string()).collect(),
            source,
        })
    }

    /// Overwrites one field of a stored document. Returns `false` if no
    /// document has that id.
    ///
    /// The identifier and keyword fields are rejected: changing them would
    /// leave the indexes stale.
    pub fn update_field(
        &mut self,
        id: &DocId,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<bool, EngineError> {
        let target = self.schema.field(field)?;
        if target.is_uuid() || target.is_keyword() {
            return Err(EngineError::ReadOnlyField(field.to_string()));
        }
        let value = target.coerce(value.into())?;

        let Some(column) = self.schema.position(field) else {
            return Err(DocumentError::UnknownField(field.to_string()).into());
        };

        let updated = self
            .store
            .update_by_key(self.schema.name(), id, &[(column, value)])?;

        debug!(%id, field, updated, "field updated");
        Ok(updated)
    }
}

/// Read operations.
impl<S: RecordStore + IndexStore> SearchEngine<S> {
    pub fn get(&self, id: &DocId) -> Result<Option<Document>, EngineError> {
        let row = self.store.get_by_key(self.schema.name(), id)?;
        Ok(row.map(|row| self.schema.document(row)))
    }

    /// Runs a query.
    ///
    /// Store criteria and keyword criteria are evaluated separately and
    /// intersected. Without an order the results come in identifier order
    /// and rows are fetched lazily; with an order every candidate is fetched
    /// and sorted before the window is applied.
    pub fn search(&self, query: &Query) -> Result<SearchResults<'_, S>, EngineError> {
        if !Arc::ptr_eq(query.schema(), &self.schema) && **query.schema() != *self.schema {
            return Err(QueryError::ForeignSchema(query.schema().name().to_string()).into());
        }

        let started = Instant::now();
        let table = self.schema.name();
        let plan = query.plan();

        let keyword_ids = self.keyword_ids(&plan.keyword_criteria)?;
        let candidates: BTreeSet<DocId> = match keyword_ids {
            Some(ids) if ids.is_empty() => ids,
            Some(ids) if plan.predicate.is_empty() => ids,
            Some(ids) => self
                .store
                .scan_ids(table, &plan.predicate)?
                .into_iter()
                .filter(|id| ids.contains(id))
                .collect(),
            None => self.store.scan_ids(table, &plan.predicate)?.into_iter().collect(),
        };

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(self.config.default_limit);

        debug!(
            %query,
            candidates = candidates.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "search planned"
        );

        if plan.order.is_empty() {
            let ids = candidates.into_iter().skip(offset).take(limit).collect();
            return Ok(SearchResults::pending(&self.store, &self.schema, ids));
        }

        let mut rows = Vec::with_capacity(candidates.len());
        for id in candidates {
            match self.store.get_by_key(table, &id)? {
                Some(row) => rows.push(row),
                None => warn!(%id, "indexed document missing from store"),
            }
        }
        rows.sort_by(|a, b| compare_rows(a, b, &plan.order));

        let documents = rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| self.schema.document(row))
            .collect();
        Ok(SearchResults::ready(&self.store, &self.schema, documents))
    }

    /// Ids satisfying every keyword criterion, or `None` if there are none.
    fn keyword_ids(
        &self,
        criteria: &[(&str, &BTreeSet<String>)],
    ) -> Result<Option<BTreeSet<DocId>>, EngineError> {
        let mut result: Option<BTreeSet<DocId>> = None;

        for &(field, keywords) in criteria {
            let mut ids: Option<BTreeSet<DocId>> = None;
            for keyword in keywords {
                let found = self.store.lookup(self.schema.name(), field, keyword)?;
                let narrowed = match ids {
                    None => found,
                    Some(acc) => intersect(acc, &found),
                };
                let exhausted = narrowed.is_empty();
                ids = Some(narrowed);
                if exhausted {
                    break;
                }
            }

            // An empty keyword list matches nothing.
            let ids = ids.unwrap_or_default();
            let narrowed = match result {
                None => ids,
                Some(acc) => intersect(acc, &ids),
            };
            if narrowed.is_empty() {
                return Ok(Some(narrowed));
            }
            result = Some(narrowed);
        }

        Ok(result)
    }

    /// Every keyword seen in a keyword field, sorted.
    pub fn keywords(&self, field: &str) -> Result<Vec<String>, EngineError> {
        if !self.schema.field(field)?.is_keyword() {
            return Err(QueryError::NotKeywordField(field.to_string()).into());
        }
        Ok(self.store.keywords(self.schema.name(), field)?)
    }

    /// Keywords of `field` fuzzy-matching `pattern`, best match first.
    ///
    /// An empty pattern returns every keyword.
    pub fn suggest_keywords(&self, field: &str, pattern: &str) -> Result<Vec<String>, EngineError> {
        let keywords = self.keywords(field)?;

        let case_matching = match self.config.case_matching {
            CaseMatching::Sensitive => nucleo::pattern::CaseMatching::Respect,
            CaseMatching::Insensitive => nucleo::pattern::CaseMatching::Ignore,
            CaseMatching::Smart => nucleo::pattern::CaseMatching::Smart,
        };
        let normalization = if self.config.unicode_normalization {
            Normalization::Smart
        } else {
            Normalization::Never
        };

        let pattern = Pattern::parse(pattern, case_matching, normalization);
        let mut matcher = Matcher::new(nucleo::Config::DEFAULT);
        let mut matches = pattern.match_list(keywords, &mut matcher);
        // Stable, so equal scores stay alphabetical.
        matches.sort_by(|(_, a), (_, b)| b.cmp(a));

        Ok(matches.into_iter().map(|(keyword, _)| keyword).collect())
    }
}

fn intersect(ids: BTreeSet<DocId>, other: &BTreeSet<DocId>) -> BTreeSet<DocId> {
    ids.into_iter().filter(|id| other.contains(id)).collect()
}

fn compare_rows(a: &Row, b: &Row, order: &[(usize, Direction)]) -> Ordering {
    for &(column, direction) in order {
        let ordering = match (a.get(column), b.get(column)) {
            (Some(x), Some(y)) => x.sort_cmp(y),
            _ => Ordering::Equal,
        };
        let ordering = match direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
