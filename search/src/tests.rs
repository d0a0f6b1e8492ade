use super::*;
use common::{create_engine, doc, ids, make_id, product_schema, search_ids};
use std::collections::BTreeSet;
use std::sync::Arc;

mod common {
    use super::*;

    pub(super) fn make_id(s: &str) -> DocId {
        DocId::try_from(s).unwrap()
    }

    /// id, name, tags (keyword), colors (keyword), price, rating, photo
    pub(super) fn product_schema() -> Schema {
        Schema::new(
            "products",
            [
                Field::new("id", [FieldType::Uuid]).unwrap(),
                Field::new("name", [FieldType::Text]).unwrap(),
                Field::new("tags", [FieldType::Keyword]).unwrap(),
                Field::new("colors", [FieldType::Keyword]).unwrap(),
                Field::new("price", [FieldType::Integer]).unwrap(),
                Field::new("rating", [FieldType::Real]).unwrap(),
                Field::new("photo", [FieldType::Object]).unwrap(),
            ],
        )
        .unwrap()
    }

    pub(super) fn create_engine() -> SearchEngine {
        SearchEngine::in_memory(product_schema()).unwrap()
    }

    pub(super) fn doc(id: &str, name: &str, tags: &[&str], price: i64) -> Document {
        Document::new()
            .with("id", id)
            .with("name", name)
            .with("tags", Value::keywords(tags.iter().copied()))
            .with("price", price)
    }

    pub(super) fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    pub(super) fn search_ids(engine: &SearchEngine, query: &Query) -> Vec<String> {
        engine
            .search(query)
            .unwrap()
            .map(|document| {
                let document = document.unwrap();
                document.get("id").unwrap().as_text().unwrap().to_string()
            })
            .collect()
    }
}

mod query {
    use super::*;

    fn query() -> Query {
        Query::new(Arc::new(product_schema()))
    }

    #[test]
    fn test_add_rejects_unknown_field() {
        let mut query = query();
        let err = query.add(Criterion::equal("weight", 3)).unwrap_err();
        assert_eq!(err, QueryError::UnknownField("weight".to_string()));
        assert!(query.criteria().is_empty());
    }

    #[test]
    fn test_add_rejects_unsearchable_field() {
        let mut query = query();
        let err = query
            .add(Criterion::equal("photo", vec![1u8, 2, 3]))
            .unwrap_err();
        assert_eq!(err, QueryError::Unsearchable("photo".to_string()));
    }

    #[test]
    fn test_contains_keywords_needs_keyword_field() {
        let mut query = query();
        let err = query
            .add(Criterion::contains_keywords("name", ["red"]))
            .unwrap_err();
        assert_eq!(err, QueryError::NotKeywordField("name".to_string()));

        assert!(query.add(Criterion::contains_keywords("tags", ["red"])).is_ok());
    }

    #[test]
    fn test_text_match_needs_text_field() {
        let mut query = query();
        let err = query.add(Criterion::starts_with("price", "1")).unwrap_err();
        assert_eq!(
            err,
            QueryError::UnsupportedComparison {
                field: "price".to_string(),
                criterion: "StartsWith",
            }
        );
    }

    #[test]
    fn test_literal_type_must_match_field() {
        let mut query = query();
        let err = query.add(Criterion::equal("price", "cheap")).unwrap_err();
        assert_eq!(
            err,
            QueryError::TypeMismatch {
                field: "price".to_string(),
                expected: StorageKind::Integer,
                found: StorageKind::Text,
            }
        );
    }

    #[test]
    fn test_numeric_literals_cross_integer_and_real() {
        let mut query = query();
        query.add(Criterion::greater_or_equal("price", 2.5)).unwrap();
        query.add(Criterion::between("rating", 1, 4)).unwrap();
        assert_eq!(query.criteria().len(), 2);
    }

    #[test]
    fn test_reset_keeps_order_and_paging() {
        let mut query = query();
        query.add(Criterion::equal("name", "apple")).unwrap();
        query.order_by(&["price"], &["DESC"]).unwrap();
        query.limit(5);

        query.reset();

        assert!(query.criteria().is_empty());
        assert_eq!(query.ordering(), &[("price".to_string(), Direction::Descending)]);
        assert_eq!(query.limit, Some(5));
    }

    #[test]
    fn test_renew_with_replaces_criteria() {
        let mut query = query();
        query.add(Criterion::equal("name", "apple")).unwrap();

        query
            .renew_with([
                Criterion::contains_keywords("tags", ["red"]),
                Criterion::less_or_equal("price", 10),
            ])
            .unwrap();
        assert_eq!(query.criteria().len(), 2);
        assert_eq!(query.criteria()[0].field(), "tags");

        let err = query
            .renew_with([Criterion::equal("nope", 1)])
            .unwrap_err();
        assert_eq!(err, QueryError::UnknownField("nope".to_string()));
        assert!(query.criteria().is_empty());
    }

    #[test]
    fn test_order_by_validation() {
        let mut query = query();

        assert_eq!(
            query.order_by(&["price", "name"], &["ASC"]).unwrap_err(),
            QueryError::OrderByLengthMismatch {
                fields: 2,
                directions: 1
            }
        );
        assert_eq!(
            query.order_by::<&str, &str>(&[], &[]).unwrap_err(),
            QueryError::EmptyOrderBy
        );
        assert_eq!(
            query.order_by(&["price"], &["UP"]).unwrap_err(),
            QueryError::InvalidDirection("UP".to_string())
        );
        assert_eq!(
            query.order_by(&["photo"], &["ASC"]).unwrap_err(),
            QueryError::Unsearchable("photo".to_string())
        );
        assert!(query.ordering().is_empty());

        query.order_by(&["price", "name"], &["desc", "Asc"]).unwrap();
        assert_eq!(
            query.ordering(),
            &[
                ("price".to_string(), Direction::Descending),
                ("name".to_string(), Direction::Ascending),
            ]
        );
    }

    #[test]
    fn test_display() {
        let mut query = query();
        query
            .add(Criterion::contains_keywords("tags", ["red", "big"]))
            .unwrap()
            .add(Criterion::between("price", 1, 3))
            .unwrap()
            .add(Criterion::starts_with("name", "ap"))
            .unwrap();
        query.order_by(&["price"], &["DESC"]).unwrap();
        query.limit(2).offset(1);

        assert_eq!(
            query.to_string(),
            r#"SEARCH products WHERE tags CONTAINS {"big", "red"} AND price BETWEEN 1 AND 3 AND name LIKE "ap%" ORDER BY price DESC LIMIT 2 OFFSET 1"#
        );
    }

    #[test]
    fn test_plan_splits_store_and_index_criteria() {
        let mut query = query();
        query
            .add(Criterion::contains_keywords("tags", ["red"]))
            .unwrap()
            .add(Criterion::equal("name", "apple"))
            .unwrap();

        let plan = query.plan();
        assert_eq!(plan.keyword_criteria.len(), 1);
        assert_eq!(plan.keyword_criteria[0].0, "tags");
        assert_eq!(plan.predicate.clauses().len(), 1);
        assert_eq!(plan.predicate.clauses()[0].column, 1);
    }
}

mod add_one {
    use super::*;

    #[test]
    fn test_add_then_get() {
        let mut engine = create_engine();
        let id = engine.add_one(&doc("a", "apple", &["red"], 3)).unwrap();

        assert_eq!(id, make_id("a"));
        let stored = engine.get(&id).unwrap().unwrap();
        assert_eq!(stored.get("name"), Some(&Value::from("apple")));
        // Absent nullable fields come back as Null.
        assert_eq!(stored.get("rating"), Some(&Value::Null));
        assert_eq!(engine.len().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let mut engine = create_engine();
        engine.add_one(&doc("a", "apple", &["red"], 3)).unwrap();

        let err = engine.add_one(&doc("a", "again", &["blue"], 1)).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateIdentifier(id) if id == make_id("a")));

        // The rejected document left no trace in the index.
        assert_eq!(engine.keywords("tags").unwrap(), ids(&["red"]));
    }

    #[test]
    fn test_nonconforming_document_is_rejected() {
        let mut engine = create_engine();

        let err = engine
            .add_one(&doc("a", "apple", &[], 3).with("weight", 7))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Document(DocumentError::UnknownField(field)) if field == "weight"
        ));

        let err = engine
            .add_one(&Document::new().with("name", "nameless"))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Document(DocumentError::MissingValue(field)) if field == "id"
        ));
        assert!(engine.is_empty().unwrap());
    }

    #[test]
    fn test_keywords_are_indexed() {
        let mut engine = create_engine();
        engine
            .add_one(&doc("a", "apple", &["red", "small"], 3).with("colors", Value::keywords(["crimson"])))
            .unwrap();
        engine.add_one(&doc("b", "beet", &["red"], 1)).unwrap();

        assert_eq!(engine.keywords("tags").unwrap(), ids(&["red", "small"]));
        assert_eq!(engine.keywords("colors").unwrap(), ids(&["crimson"]));

        let postings = engine.store().postings("products", "tags").unwrap();
        let expected: BTreeSet<DocId> = [make_id("a"), make_id("b")].into_iter().collect();
        assert_eq!(postings.get("red"), Some(&expected));
    }
}

mod bulk_ingest {
    use super::*;

    #[test]
    fn test_report_counts_and_skips() {
        let mut engine = create_engine();
        engine.add_one(&doc("a", "apple", &["red"], 3)).unwrap();

        let report = engine
            .bulk_ingest(vec![
                doc("b", "beet", &["red", "round"], 1),
                doc("a", "again", &["ghost"], 9),
                doc("c", "cherry", &["red"], 7),
                doc("b", "blueberry", &["phantom"], 2),
            ])
            .unwrap();

        assert_eq!(report.inserted, 2);
        assert_eq!(report.skipped, vec![make_id("a"), make_id("b")]);
        // tags:red and tags:round
        assert_eq!(report.keywords, 2);

        assert_eq!(engine.len().unwrap(), 3);
        assert_eq!(engine.keywords("tags").unwrap(), ids(&["red", "round"]));
    }

    #[test]
    fn test_small_batches_match_single_batch() {
        let documents: Vec<Document> = (0..25)
            .map(|i| {
                let tag = format!("t{}", i % 4);
                doc(&format!("d{i:02}"), "x", &[tag.as_str(), "all"], i)
            })
            .collect();

        let mut single = create_engine();
        single.bulk_ingest(documents.clone()).unwrap();

        let config = SearchConfig {
            ingest_batch_size: 3,
            ..SearchConfig::default()
        };
        let store = sift_core::store::Database::in_memory().unwrap();
        let mut batched = SearchEngine::with_store(product_schema(), store, config).unwrap();
        batched.bulk_ingest(documents).unwrap();

        assert_eq!(batched.len().unwrap(), 25);
        assert_eq!(
            batched.store().postings("products", "tags").unwrap(),
            single.store().postings("products", "tags").unwrap()
        );
    }

    #[test]
    fn test_invalid_document_aborts() {
        let config = SearchConfig {
            ingest_batch_size: 2,
            ..SearchConfig::default()
        };
        let store = sift_core::store::Database::in_memory().unwrap();
        let mut engine = SearchEngine::with_store(product_schema(), store, config).unwrap();

        let result = engine.bulk_ingest(vec![
            doc("a", "apple", &["red"], 3),
            doc("b", "beet", &["red"], 1),
            doc("c", "cherry", &["red"], 7),
            Document::new().with("id", "z").with("price", "free"),
        ]);
        assert!(matches!(
            result,
            Err(EngineError::Document(DocumentError::TypeMismatch { .. }))
        ));

        // The first batch was committed and stays findable by keyword; the
        // unfinished batch was dropped.
        assert_eq!(engine.len().unwrap(), 2);
        let mut query = engine.create_query();
        query
            .add(Criterion::contains_keywords("tags", ["red"]))
            .unwrap();
        assert_eq!(search_ids(&engine, &query), ids(&["a", "b"]));

        // Retrying the corrected input fills in the rest.
        let report = engine
            .bulk_ingest(vec![
                doc("a", "apple", &["red"], 3),
                doc("b", "beet", &["red"], 1),
                doc("c", "cherry", &["red"], 7),
                doc("z", "zucchini", &["red"], 2),
            ])
            .unwrap();
        assert_eq!(report.inserted, 2);
        assert_eq!(search_ids(&engine, &query), ids(&["a", "b", "c", "z"]));
    }
}

mod search {
    use super::*;

    fn fruit_engine() -> SearchEngine {
        let mut engine = create_engine();
        engine
            .bulk_ingest(vec![
                doc("a", "apple", &["red", "big"], 3),
                doc("b", "banana", &["yellow"], 1),
                doc("c", "cherry", &["red"], 7),
                doc("d", "date", &["brown", "big"], 5),
            ])
            .unwrap();
        engine
    }

    #[test]
    fn test_no_criteria_returns_everything_in_id_order() {
        let engine = fruit_engine();
        let query = engine.create_query();
        assert_eq!(search_ids(&engine, &query), ids(&["a", "b", "c", "d"]));
    }

    #[test]
    fn test_keywords_are_anded() {
        let engine = fruit_engine();
        let mut query = engine.create_query();
        query
            .add(Criterion::contains_keywords("tags", ["red", "big"]))
            .unwrap();
        assert_eq!(search_ids(&engine, &query), ids(&["a"]));
    }

    #[test]
    fn test_empty_keyword_set_matches_nothing() {
        let engine = fruit_engine();
        let mut query = engine.create_query();
        query
            .add(Criterion::contains_keywords("tags", Vec::<String>::new()))
            .unwrap();
        assert!(search_ids(&engine, &query).is_empty());
    }

    #[test]
    fn test_unknown_keyword_matches_nothing() {
        let engine = fruit_engine();
        let mut query = engine.create_query();
        query
            .add(Criterion::contains_keywords("tags", ["purple"]))
            .unwrap();
        assert!(search_ids(&engine, &query).is_empty());
    }

    #[test]
    fn test_store_and_keyword_criteria_combine() {
        let engine = fruit_engine();
        let mut query = engine.create_query();
        query
            .add(Criterion::contains_keywords("tags", ["big"]))
            .unwrap()
            .add(Criterion::greater_or_equal("price", 4))
            .unwrap();
        assert_eq!(search_ids(&engine, &query), ids(&["d"]));
    }

    #[test]
    fn test_text_criteria() {
        let engine = fruit_engine();

        let mut query = engine.create_query();
        query.add(Criterion::contains("name", "an")).unwrap();
        assert_eq!(search_ids(&engine, &query), ids(&["b"]));

        query.renew_with([Criterion::ends_with("name", "e")]).unwrap();
        assert_eq!(search_ids(&engine, &query), ids(&["a", "d"]));
    }

    #[test]
    fn test_order_limit_offset() {
        let engine = fruit_engine();
        let mut query = engine.create_query();
        query.order_by(&["price"], &["DESC"]).unwrap();
        assert_eq!(search_ids(&engine, &query), ids(&["c", "d", "a", "b"]));

        query.limit(2).offset(1);
        assert_eq!(search_ids(&engine, &query), ids(&["d", "a"]));

        query.offset(10);
        assert!(search_ids(&engine, &query).is_empty());
    }

    #[test]
    fn test_default_limit_applies() {
        let config = SearchConfig {
            default_limit: 3,
            ..SearchConfig::default()
        };
        let store = sift_core::store::Database::in_memory().unwrap();
        let mut engine = SearchEngine::with_store(product_schema(), store, config).unwrap();
        engine
            .bulk_ingest((0..5).map(|i| doc(&format!("d{i}"), "x", &[], i)))
            .unwrap();

        let mut query = engine.create_query();
        assert_eq!(search_ids(&engine, &query), ids(&["d0", "d1", "d2"]));

        query.limit(5);
        assert_eq!(search_ids(&engine, &query).len(), 5);
    }

    #[test]
    fn test_nulls_sort_first_ascending() {
        let mut engine = create_engine();
        engine.add_one(&doc("a", "apple", &[], 1).with("rating", 4.5)).unwrap();
        engine.add_one(&doc("b", "beet", &[], 1)).unwrap();
        engine.add_one(&doc("c", "cherry", &[], 1).with("rating", 2)).unwrap();

        let mut query = engine.create_query();
        query.order_by(&["rating"], &["ASC"]).unwrap();
        assert_eq!(search_ids(&engine, &query), ids(&["b", "c", "a"]));

        // Null never satisfies a comparison.
        query.add(Criterion::less_or_equal("rating", 5)).unwrap();
        assert_eq!(search_ids(&engine, &query), ids(&["c", "a"]));
    }

    #[test]
    fn test_ties_keep_id_order() {
        let engine = fruit_engine();
        let mut query = engine.create_query();
        query.order_by(&["rating"], &["DESC"]).unwrap();

        // Every rating is Null, so the id order survives the sort.
        assert_eq!(search_ids(&engine, &query), ids(&["a", "b", "c", "d"]));
    }

    #[test]
    fn test_query_from_other_schema_is_rejected() {
        let engine = fruit_engine();
        let other = Schema::new("other", [Field::new("id", [FieldType::Uuid]).unwrap()]).unwrap();
        let query = Query::new(Arc::new(other));

        assert!(matches!(
            engine.search(&query),
            Err(EngineError::Query(QueryError::ForeignSchema(name))) if name == "other"
        ));
    }

    #[test]
    fn test_equal_schema_from_elsewhere_is_accepted() {
        let engine = fruit_engine();
        let query = Query::new(Arc::new(product_schema()));
        assert_eq!(search_ids(&engine, &query).len(), 4);
    }
}

mod update_field {
    use super::*;

    #[test]
    fn test_updates_value() {
        let mut engine = create_engine();
        engine.add_one(&doc("a", "apple", &["red"], 3)).unwrap();

        assert!(engine.update_field(&make_id("a"), "price", 9).unwrap());
        assert!(engine.update_field(&make_id("a"), "rating", 4).unwrap());

        let stored = engine.get(&make_id("a")).unwrap().unwrap();
        assert_eq!(stored.get("price"), Some(&Value::Integer(9)));
        assert_eq!(stored.get("rating"), Some(&Value::Real(4.0)));
    }

    #[test]
    fn test_missing_document() {
        let mut engine = create_engine();
        assert!(!engine.update_field(&make_id("zz"), "price", 9).unwrap());
    }

    #[test]
    fn test_rejects_indexed_and_identifier_fields() {
        let mut engine = create_engine();
        engine.add_one(&doc("a", "apple", &["red"], 3)).unwrap();

        for field in ["id", "tags"] {
            let err = engine
                .update_field(&make_id("a"), field, "x")
                .unwrap_err();
            assert!(matches!(err, EngineError::ReadOnlyField(name) if name == field));
        }
    }

    #[test]
    fn test_rejects_wrong_type() {
        let mut engine = create_engine();
        engine.add_one(&doc("a", "apple", &["red"], 3)).unwrap();

        let err = engine
            .update_field(&make_id("a"), "price", "lots")
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Document(DocumentError::TypeMismatch { .. })
        ));
    }
}

mod keywords {
    use super::*;

    #[test]
    fn test_keywords_of_non_keyword_field() {
        let engine = create_engine();
        assert!(matches!(
            engine.keywords("name"),
            Err(EngineError::Query(QueryError::NotKeywordField(_)))
        ));
        assert!(matches!(
            engine.keywords("missing"),
            Err(EngineError::Schema(SchemaError::UnknownField(_)))
        ));
    }

    #[test]
    fn test_suggest_keywords() {
        let mut engine = create_engine();
        engine
            .add_one(&doc("a", "apple", &["red", "reed", "blue", "green"], 3))
            .unwrap();

        let suggestions = engine.suggest_keywords("tags", "red").unwrap();
        assert_eq!(suggestions.first().map(String::as_str), Some("red"));
        assert!(suggestions.contains(&"reed".to_string()));
        assert!(!suggestions.contains(&"blue".to_string()));

        let all = engine.suggest_keywords("tags", "").unwrap();
        assert_eq!(all.len(), 4);
    }
}

mod config {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = SearchConfig::load(&SearchConfig::path(temp.path())).unwrap();
        assert_eq!(config, SearchConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = SearchConfig::path(temp.path());
        let config = SearchConfig {
            default_limit: 50,
            case_matching: CaseMatching::Sensitive,
            ..SearchConfig::default()
        };

        config.save(&path).unwrap();
        assert_eq!(SearchConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp = TempDir::new().unwrap();
        let path = SearchConfig::path(temp.path());
        std::fs::write(&path, "default_limit = 5\n").unwrap();

        let config = SearchConfig::load(&path).unwrap();
        assert_eq!(config.default_limit, 5);
        assert_eq!(config.ingest_batch_size, 1000);
    }

    #[test]
    fn test_oversized_batch_rejected() {
        let config = SearchConfig {
            ingest_batch_size: usize::MAX,
            ..SearchConfig::default()
        };
        assert_eq!(config.validate().len(), 1);
        assert_eq!(config.with_defaults_for_invalid().ingest_batch_size, 1000);
    }

    #[test]
    fn test_huge_batch_size_ingests() {
        let config = SearchConfig {
            ingest_batch_size: MAX_INGEST_BATCH_SIZE,
            ..SearchConfig::default()
        };
        let store = sift_core::store::Database::in_memory().unwrap();
        let mut engine = SearchEngine::with_store(product_schema(), store, config).unwrap();

        let report = engine
            .bulk_ingest(vec![doc("a", "apple", &["red"], 3)])
            .unwrap();
        assert_eq!(report.inserted, 1);
    }

    #[test]
    fn test_invalid_values_replaced() {
        let config = SearchConfig {
            default_limit: 0,
            ingest_batch_size: 0,
            ..SearchConfig::default()
        };
        assert_eq!(config.validate().len(), 2);
        assert_eq!(config.with_defaults_for_invalid(), SearchConfig::default());
    }
}
