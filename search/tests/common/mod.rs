#![allow(dead_code)]

use sift_search::{Document, EngineError, Field, FieldType, Query, Schema, SearchEngine, Value};
use std::collections::BTreeSet;

/// `id` (UUID), `tags` (KEYWORD), `price` (INTEGER)
pub fn tagged_schema() -> Schema {
    Schema::new(
        "items",
        [
            Field::new("id", [FieldType::Uuid]).unwrap(),
            Field::new("tags", [FieldType::Keyword]).unwrap(),
            Field::new("price", [FieldType::Integer]).unwrap(),
        ],
    )
    .unwrap()
}

pub fn item(id: &str, tags: &[&str], price: i64) -> Document {
    Document::new()
        .with("id", id)
        .with("tags", Value::keywords(tags.iter().copied()))
        .with("price", price)
}

pub fn tag_set(tags: &[&str]) -> BTreeSet<String> {
    tags.iter().map(|s| s.to_string()).collect()
}

pub fn result_ids<S>(engine: &SearchEngine<S>, query: &Query) -> Result<Vec<String>, EngineError>
where
    S: sift_search::RecordStore + sift_search::IndexStore,
{
    engine
        .search(query)?
        .map(|document| {
            document.map(|document| match document.get("id") {
                Some(Value::Text(id)) => id.clone(),
                other => panic!("result without an id: {other:?}"),
            })
        })
        .collect()
}
