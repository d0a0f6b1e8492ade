use super::*;
use chrono::NaiveDate;

fn uuid(name: &str) -> Field {
    Field::new(name, [FieldType::Uuid]).unwrap()
}

fn keyword(name: &str) -> Field {
    Field::new(name, [FieldType::Keyword]).unwrap()
}

fn sample_schema() -> Schema {
    Schema::new(
        "movies",
        [
            uuid("id"),
            Field::new("title", [FieldType::Text, FieldType::Id]).unwrap(),
            Field::new("year", [FieldType::Integer]).unwrap(),
            Field::new("rating", [FieldType::Real]).unwrap().with_default(0.0),
            keyword("genres"),
            Field::new("released", [FieldType::Date]).unwrap(),
        ],
    )
    .unwrap()
}

mod field {
    use super::*;

    #[test]
    fn test_capabilities_sharing_storage_are_accepted() {
        let field = Field::new("name", [FieldType::Id, FieldType::Text, FieldType::Uuid]).unwrap();
        assert_eq!(field.storage_kind(), StorageKind::Text);
        assert!(field.is_uuid());
        assert!(!field.is_keyword());
    }

    #[test]
    fn test_inconsistent_storage_is_rejected() {
        let err = Field::new("mixed", [FieldType::Text, FieldType::Integer]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::InconsistentStorage {
                field: "mixed".to_string(),
                kinds: vec![StorageKind::Text, StorageKind::Integer],
            }
        );
    }

    #[test]
    fn test_date_and_datetime_do_not_mix() {
        Field::new("when", [FieldType::Date, FieldType::DateTime]).unwrap_err();
    }

    #[test]
    fn test_empty_capabilities_are_rejected() {
        let err = Field::new("nothing", Vec::<FieldType>::new()).unwrap_err();
        assert_eq!(err, SchemaError::NoCapabilities("nothing".to_string()));
    }

    #[test]
    fn test_object_is_unsearchable() {
        let field = Field::new("payload", [FieldType::Object]).unwrap();
        assert!(!field.is_searchable());
        assert_eq!(field.storage_kind(), StorageKind::Blob);
    }

    #[test]
    fn test_display() {
        let field = keyword("tags");
        assert_eq!(
            field.to_string(),
            r#"Field("tags", KEYWORD, primary_key=false, nullable=true, default=NULL)"#
        );
    }
}

mod schema {
    use super::*;

    #[test]
    fn test_zero_uuid_fields_is_rejected() {
        let err = Schema::new("s", [keyword("tags")]).unwrap_err();
        assert_eq!(err, SchemaError::MissingUuid);
    }

    #[test]
    fn test_two_uuid_fields_are_rejected() {
        let err = Schema::new("s", [uuid("a"), keyword("tags"), uuid("b")]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MultipleUuid(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_duplicate_field_is_rejected() {
        let err = Schema::new("s", [uuid("id"), keyword("id")]).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateField("id".to_string()));
    }

    #[test]
    fn test_primary_key_must_be_uuid() {
        let err = Schema::new(
            "s",
            [
                uuid("id"),
                Field::new("other", [FieldType::Id]).unwrap().with_primary_key(),
            ],
        )
        .unwrap_err();
        assert_eq!(err, SchemaError::PrimaryKeyNotUuid("other".to_string()));
    }

    #[test]
    fn test_default_must_match_storage() {
        let err = Schema::new(
            "s",
            [
                uuid("id"),
                Field::new("year", [FieldType::Integer]).unwrap().with_default("1999"),
            ],
        )
        .unwrap_err();
        assert_eq!(err, SchemaError::InvalidDefault("year".to_string()));
    }

    #[test]
    fn test_uuid_becomes_primary_key() {
        let schema = sample_schema();
        let id = schema.uuid_field();
        assert_eq!(id.name(), "id");
        assert!(id.is_primary_key());
        assert!(!id.is_nullable());
    }

    #[test]
    fn test_keyword_fields_are_derived() {
        let schema = sample_schema();
        let names: Vec<&str> = schema.keyword_fields().map(Field::name).collect();
        assert_eq!(names, vec!["genres"]);
    }

    #[test]
    fn test_unknown_field_lookup() {
        let schema = sample_schema();
        assert_eq!(
            schema.field("nope").unwrap_err(),
            SchemaError::UnknownField("nope".to_string())
        );
        assert_eq!(schema.position("year"), Some(2));
    }
}

mod conform {
    use super::*;

    #[test]
    fn test_conform_fills_defaults_in_schema_order() {
        let schema = sample_schema();
        let document = Document::new()
            .with("genres", Value::keywords(["drama"]))
            .with("id", "m1")
            .with("year", 1994);

        let (id, row) = schema.conform(&document).unwrap();
        assert_eq!(id.as_str(), "m1");
        assert_eq!(
            row.values(),
            &[
                Value::from("m1"),
                Value::Null,
                Value::Integer(1994),
                Value::Real(0.0),
                Value::keywords(["drama"]),
                Value::Null,
            ]
        );
    }

    #[test]
    fn test_conform_widens_integer_into_real() {
        let schema = sample_schema();
        let (_, row) = schema
            .conform(&Document::new().with("id", "m1").with("rating", 4))
            .unwrap();
        assert_eq!(row.get(3), Some(&Value::Real(4.0)));
    }

    #[test]
    fn test_conform_rejects_unknown_field() {
        let schema = sample_schema();
        let err = schema
            .conform(&Document::new().with("id", "m1").with("director", "x"))
            .unwrap_err();
        assert_eq!(err, DocumentError::UnknownField("director".to_string()));
    }

    #[test]
    fn test_conform_rejects_type_mismatch() {
        let schema = sample_schema();
        let err = schema
            .conform(&Document::new().with("id", "m1").with("released", "1994-09-23"))
            .unwrap_err();
        assert_eq!(
            err,
            DocumentError::TypeMismatch {
                field: "released".to_string(),
                expected: StorageKind::Date,
                found: StorageKind::Text,
            }
        );
    }

    #[test]
    fn test_conform_requires_identifier() {
        let schema = sample_schema();
        let err = schema.conform(&Document::new().with("year", 1)).unwrap_err();
        assert_eq!(err, DocumentError::MissingValue("id".to_string()));

        let err = schema.conform(&Document::new().with("id", "")).unwrap_err();
        assert_eq!(err, DocumentError::InvalidIdentifier(String::new()));
    }

    #[test]
    fn test_document_round_trip() {
        let schema = sample_schema();
        let released = NaiveDate::from_ymd_opt(1994, 9, 23).unwrap();
        let (_, row) = schema
            .conform(&Document::new().with("id", "m1").with("released", released))
            .unwrap();

        let document = schema.document(row);
        let names: Vec<&str> = document.names().collect();
        assert_eq!(
            names,
            vec!["id", "title", "year", "rating", "genres", "released"]
        );
        assert_eq!(document.get("released"), Some(&Value::Date(released)));
    }

    #[test]
    fn test_keywords_skip_null() {
        let schema = sample_schema();
        let (_, row) = schema.conform(&Document::new().with("id", "m1")).unwrap();
        assert_eq!(schema.keywords(&row).count(), 0);

        let (_, row) = schema
            .conform(
                &Document::new()
                    .with("id", "m2")
                    .with("genres", Value::keywords(["a", "b"])),
            )
            .unwrap();
        let collected: Vec<_> = schema
            .keywords(&row)
            .map(|(field, keywords)| (field.name(), keywords.len()))
            .collect();
        assert_eq!(collected, vec![("genres", 2)]);
    }
}
