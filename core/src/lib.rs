//! Schema model and storage for the sift document search engine.
//!
//! This crate owns everything below the query layer:
//! - The field type registry, fields and schemas
//! - Documents and their values
//! - The record store and inverted index store traits
//! - A redb-backed implementation of both stores

pub mod schema;
pub mod store;
pub mod types;

pub use schema::{Field, Schema};
pub use types::{DocId, Document, FieldType, StorageKind, Value};
