//! Schema-driven document search.
//!
//! A [`SearchEngine`] owns one [`Schema`]. Documents are validated against it,
//! stored as rows in a redb table, and every keyword field feeds an inverted
//! index of `keyword → ids`. Queries combine store-side comparisons with
//! keyword containment and come back as a lazy iterator of documents.
//!
//! ```no_run
//! use sift_search::{Criterion, Field, FieldType, Schema, SearchEngine};
//!
//! let schema = Schema::new(
//!     "notes",
//!     [
//!         Field::new("id", [FieldType::Uuid])?,
//!         Field::new("tags", [FieldType::Keyword])?,
//!     ],
//! )?;
//! let engine = SearchEngine::in_memory(schema)?;
//! let mut query = engine.create_query();
//! query.add(Criterion::contains_keywords("tags", ["red"]))?;
//! for document in engine.search(&query)? {
//!     println!("{:?}", document?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod engine;
mod query;
mod results;

pub use config::{CaseMatching, ConfigError, MAX_INGEST_BATCH_SIZE, SearchConfig};
pub use engine::error::EngineError;
pub use engine::{IngestReport, SearchEngine};
pub use query::{Criterion, Direction, Query, QueryError};
pub use results::SearchResults;
pub use sift_core::schema::error::{DocumentError, SchemaError};
pub use sift_core::store::error::StoreError;
pub use sift_core::store::{Database, IndexStore, RecordStore};
pub use sift_core::types::Config;
pub use sift_core::{DocId, Document, Field, FieldType, Schema, StorageKind, Value};

#[cfg(test)]
mod tests;
