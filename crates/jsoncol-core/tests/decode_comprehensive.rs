//! End-to-end decoding tests: schema build, compile, and document decode
//! through the public API.

use jsoncol::schema::{
    ArraySchema, BoolSchema, DoubleSchema, EpochUnit, InstantNumberSchema, InstantSchema,
    IntSchema, Kinds, LocalDateSchema, LongSchema, ObjectField, ObjectKvSchema, ObjectSchema,
    RepeatedBehavior, Schema, SkipSchema, StringSchema, TupleSchema, TypedObjectSchema,
};
use jsoncol::{compile, ArrayValue, Column, ColumnType, Error};

fn decode(schema: impl Into<Schema>, text: &str) -> jsoncol::Result<(Vec<Column>, usize)> {
    let mut decoder = compile(&schema.into())?;
    let mut columns = decoder.new_batch();
    let rows = decoder.decode_document(text, &mut columns)?;
    Ok((columns, rows))
}

// ============================================================================
// Scalars and coercion
// ============================================================================

#[test]
fn test_long_standard_accepts_int_and_null() {
    let (cols, rows) = decode(LongSchema::standard(), "42 null -7").unwrap();
    assert_eq!(rows, 3);
    assert_eq!(cols[0].long_values(), &[Some(42), None, Some(-7)]);
}

#[test]
fn test_long_standard_rejects_string() {
    let err = decode(LongSchema::standard(), r#""42""#).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { expected: "long", .. }));
}

#[test]
fn test_long_lenient_truncates_decimals_toward_zero() {
    let (cols, _) = decode(LongSchema::lenient(), r#"12.9 -12.9 "3.5" "40""#).unwrap();
    assert_eq!(
        cols[0].long_values(),
        &[Some(12), Some(-12), Some(3), Some(40)]
    );
}

#[test]
fn test_long_on_null_substitute() {
    let schema = LongSchema::builder()
        .kinds(Kinds::INT | Kinds::NULL)
        .on_null(-1)
        .build()
        .unwrap();
    let (cols, _) = decode(schema, "5 null").unwrap();
    assert_eq!(cols[0].long_values(), &[Some(5), Some(-1)]);
}

#[test]
fn test_double_decodes_int_and_scientific_notation() {
    let (cols, _) = decode(DoubleSchema::standard(), "3 2.5e1 -0.25").unwrap();
    assert_eq!(
        cols[0].double_values(),
        &[Some(3.0), Some(25.0), Some(-0.25)]
    );
}

#[test]
fn test_string_keeps_number_literal_text() {
    let (cols, _) = decode(StringSchema::lenient(), r#""hi" 1.50 true"#).unwrap();
    assert_eq!(
        cols[0].string_values(),
        &[
            Some("hi".to_string()),
            Some("1.50".to_string()),
            Some("true".to_string())
        ]
    );
}

#[test]
fn test_bool_lenient_accepts_text() {
    let (cols, _) = decode(BoolSchema::lenient(), r#"true "false" null"#).unwrap();
    assert_eq!(cols[0].bool_values(), &[Some(true), Some(false), None]);
}

#[test]
fn test_instant_rfc3339() {
    let (cols, _) = decode(InstantSchema::standard(), r#""2021-01-01T00:00:00Z""#).unwrap();
    assert_eq!(cols[0].timestamp_values(), &[Some(1_609_459_200 * 1_000_000_000)]);
}

#[test]
fn test_instant_number_epoch_seconds() {
    let (cols, _) = decode(InstantNumberSchema::standard(EpochUnit::Seconds), "1609459200").unwrap();
    assert_eq!(cols[0].timestamp_values(), &[Some(1_609_459_200 * 1_000_000_000)]);
}

#[test]
fn test_local_date_default_format() {
    let (cols, _) = decode(LocalDateSchema::standard(), r#""2021-06-15""#).unwrap();
    let date = cols[0].date_values()[0].unwrap();
    assert_eq!(date.to_string(), "2021-06-15");
}

#[test]
fn test_byte_range_overflow_rejected() {
    use jsoncol::schema::ByteSchema;
    let err = decode(ByteSchema::standard(), "1000").unwrap_err();
    assert!(matches!(err, Error::Syntax { .. }));
}

// ============================================================================
// Objects
// ============================================================================

fn point_schema() -> ObjectSchema {
    ObjectSchema::standard(vec![
        ObjectField::new(
            "x",
            LongSchema::builder()
                .kinds(Kinds::INT | Kinds::NULL)
                .allow_missing(true)
                .build()
                .unwrap(),
        ),
        ObjectField::new(
            "y",
            LongSchema::builder()
                .kinds(Kinds::INT | Kinds::NULL)
                .allow_missing(true)
                .build()
                .unwrap(),
        ),
    ])
    .unwrap()
}

#[test]
fn test_object_basic_decode() {
    let (cols, rows) = decode(point_schema(), r#"{"x": 1, "y": 2} {"y": 4, "x": 3}"#).unwrap();
    assert_eq!(rows, 2);
    assert_eq!(cols[0].long_values(), &[Some(1), Some(3)]);
    assert_eq!(cols[1].long_values(), &[Some(2), Some(4)]);
}

#[test]
fn test_object_missing_field_is_null_when_allowed() {
    let (cols, _) = decode(point_schema(), r#"{"x": 1}"#).unwrap();
    assert_eq!(cols[0].long_values(), &[Some(1)]);
    assert_eq!(cols[1].long_values(), &[None]);
}

#[test]
fn test_object_missing_field_rejected_when_not_allowed() {
    let schema = ObjectSchema::standard(vec![ObjectField::new(
        "x",
        LongSchema::builder().allow_missing(false).build().unwrap(),
    )])
    .unwrap();
    let err = decode(schema, "{}").unwrap_err();
    assert!(matches!(err, Error::MissingMismatch { .. }));
}

#[test]
fn test_object_null_means_empty_object() {
    let (cols, rows) = decode(point_schema(), "null").unwrap();
    assert_eq!(rows, 1);
    assert_eq!(cols[0].long_values(), &[None]);
    assert_eq!(cols[1].long_values(), &[None]);
}

#[test]
fn test_object_unknown_field_skipped_by_default() {
    let (cols, _) =
        decode(point_schema(), r#"{"x": 1, "extra": {"deep": [1, 2]}, "y": 2}"#).unwrap();
    assert_eq!(cols[0].long_values(), &[Some(1)]);
    assert_eq!(cols[1].long_values(), &[Some(2)]);
}

#[test]
fn test_object_unknown_field_rejected_when_strict() {
    let schema = ObjectSchema::strict(vec![ObjectField::new("x", LongSchema::standard())]).unwrap();
    let err = decode(schema, r#"{"x": 1, "bogus": 2}"#).unwrap_err();
    assert!(matches!(err, Error::Structural { .. }));
}

#[test]
fn test_object_field_alias_and_case_insensitive() {
    let schema = ObjectSchema::standard(vec![
        ObjectField::new("count", LongSchema::standard())
            .alias("n")
            .case_insensitive(true),
    ])
    .unwrap();
    let (cols, _) = decode(schema, r#"{"COUNT": 1} {"n": 2}"#).unwrap();
    assert_eq!(cols[0].long_values(), &[Some(1), Some(2)]);
}

#[test]
fn test_object_repeated_field_uses_first_by_default() {
    let (cols, _) = decode(point_schema(), r#"{"x": 1, "x": 9, "y": 2}"#).unwrap();
    assert_eq!(cols[0].long_values(), &[Some(1)]);
}

#[test]
fn test_object_repeated_field_rejected_on_demand() {
    let schema = ObjectSchema::standard(vec![
        ObjectField::new("x", LongSchema::standard()).on_repeated(RepeatedBehavior::Error),
    ])
    .unwrap();
    let err = decode(schema, r#"{"x": 1, "x": 2}"#).unwrap_err();
    assert!(matches!(err, Error::Structural { .. }));
}

#[test]
fn test_object_skip_field_consumes_any_shape() {
    let schema = ObjectSchema::standard(vec![
        ObjectField::new("keep", LongSchema::standard()),
        ObjectField::new("drop", SkipSchema::standard()),
    ])
    .unwrap();
    let (cols, _) = decode(schema, r#"{"keep": 1, "drop": {"a": [null, {}]}}"#).unwrap();
    assert_eq!(cols.len(), 1);
    assert_eq!(cols[0].long_values(), &[Some(1)]);
}

#[test]
fn test_nested_object_column_naming() {
    let inner = ObjectSchema::standard(vec![
        ObjectField::new("lat", DoubleSchema::standard()),
        ObjectField::new("lon", DoubleSchema::standard()),
    ])
    .unwrap();
    let schema: Schema = ObjectSchema::standard(vec![
        ObjectField::new("id", LongSchema::standard()),
        ObjectField::new("pos", inner),
    ])
    .unwrap()
    .into();
    assert_eq!(
        jsoncol::column_names(&schema, jsoncol::default_column_name),
        ["id", "pos_lat", "pos_lon"]
    );
}

// ============================================================================
// Arrays, tuples, key/value maps
// ============================================================================

#[test]
fn test_array_with_null_substitute() {
    let element = IntSchema::builder()
        .kinds(Kinds::INT | Kinds::NULL)
        .on_null(0)
        .build()
        .unwrap();
    let schema = ArraySchema::standard(element).unwrap();
    let (cols, _) = decode(schema, "[1, 2, null, 4]").unwrap();
    assert_eq!(
        cols[0].array_values(),
        &[Some(ArrayValue::Int(vec![Some(1), Some(2), Some(0), Some(4)]))]
    );
}

#[test]
fn test_array_null_document_is_empty_array_cell() {
    let schema = ArraySchema::standard(IntSchema::standard()).unwrap();
    let (cols, rows) = decode(schema, "null []").unwrap();
    assert_eq!(rows, 2);
    assert_eq!(
        cols[0].array_values(),
        &[Some(ArrayValue::Int(vec![])), Some(ArrayValue::Int(vec![]))]
    );
}

#[test]
fn test_array_of_objects_fans_out_per_field() {
    let schema = ArraySchema::standard(point_schema()).unwrap();
    let (cols, _) = decode(schema, r#"[{"x": 1, "y": 2}, {"x": 3, "y": 4}]"#).unwrap();
    assert_eq!(cols.len(), 2);
    assert_eq!(
        cols[0].array_values(),
        &[Some(ArrayValue::Long(vec![Some(1), Some(3)]))]
    );
    assert_eq!(
        cols[1].array_values(),
        &[Some(ArrayValue::Long(vec![Some(2), Some(4)]))]
    );
}

#[test]
fn test_nested_arrays_rejected_at_compile() {
    let inner = ArraySchema::standard(IntSchema::standard()).unwrap();
    let outer: Schema = ArraySchema::standard(inner).unwrap().into();
    assert!(matches!(compile(&outer), Err(Error::Schema(_))));
}

#[test]
fn test_tuple_decode_and_extras_skipped() {
    let schema = TupleSchema::builder()
        .named_item("id", LongSchema::standard())
        .named_item("name", StringSchema::standard())
        .build()
        .unwrap();
    let (cols, _) = decode(schema, r#"[7, "seven", "ignored", [1]]"#).unwrap();
    assert_eq!(cols[0].long_values(), &[Some(7)]);
    assert_eq!(cols[1].string_values(), &[Some("seven".to_string())]);
}

#[test]
fn test_tuple_too_short_is_structural_error() {
    let schema = TupleSchema::standard(vec![
        LongSchema::standard().into(),
        LongSchema::standard().into(),
    ])
    .unwrap();
    let err = decode(schema, "[1]").unwrap_err();
    assert!(matches!(err, Error::Structural { .. }));
}

#[test]
fn test_tuple_default_labels_are_indices() {
    let schema: Schema = TupleSchema::standard(vec![
        LongSchema::standard().into(),
        StringSchema::standard().into(),
    ])
    .unwrap()
    .into();
    assert_eq!(
        jsoncol::column_names(&schema, jsoncol::default_column_name),
        ["0", "1"]
    );
}

#[test]
fn test_kv_map_produces_parallel_key_value_arrays() {
    let schema = ObjectKvSchema::standard(LongSchema::standard()).unwrap();
    let (cols, _) = decode(schema, r#"{"a": 1, "b": 2, "c": 3}"#).unwrap();
    assert_eq!(cols.len(), 2);
    assert_eq!(
        cols[0].array_values(),
        &[Some(ArrayValue::String(vec![
            Some("a".to_string()),
            Some("b".to_string()),
            Some("c".to_string())
        ]))]
    );
    assert_eq!(
        cols[1].array_values(),
        &[Some(ArrayValue::Long(vec![Some(1), Some(2), Some(3)]))]
    );
}

#[test]
fn test_kv_map_null_yields_empty_arrays() {
    let schema = ObjectKvSchema::standard(LongSchema::standard()).unwrap();
    let (cols, _) = decode(schema, "null").unwrap();
    assert_eq!(cols[0].array_values()[0].as_ref().unwrap().len(), 0);
    assert_eq!(cols[1].array_values()[0].as_ref().unwrap().len(), 0);
}

// ============================================================================
// Discriminated unions
// ============================================================================

fn pet_schema() -> TypedObjectSchema {
    TypedObjectSchema::builder("type")
        .shared_field(ObjectField::new(
            "age",
            IntSchema::builder()
                .kinds(Kinds::INT | Kinds::NULL)
                .allow_missing(true)
                .build()
                .unwrap(),
        ))
        .variant(
            "cat",
            ObjectSchema::standard(vec![ObjectField::new(
                "meow",
                BoolSchema::builder()
                    .kinds(Kinds::BOOL | Kinds::NULL)
                    .allow_missing(true)
                    .build()
                    .unwrap(),
            )])
            .unwrap(),
        )
        .variant(
            "dog",
            ObjectSchema::standard(vec![ObjectField::new(
                "bark",
                StringSchema::builder()
                    .kinds(Kinds::STRING | Kinds::NULL)
                    .allow_missing(true)
                    .build()
                    .unwrap(),
            )])
            .unwrap(),
        )
        .build()
        .unwrap()
}

#[test]
fn test_typed_object_selects_variant_and_null_fills_others() {
    let (cols, rows) = decode(
        pet_schema(),
        r#"{"type": "cat", "age": 3, "meow": true}
           {"type": "dog", "bark": "loud", "age": 5}"#,
    )
    .unwrap();
    assert_eq!(rows, 2);
    assert_eq!(
        cols[0].string_values(),
        &[Some("cat".to_string()), Some("dog".to_string())]
    );
    assert_eq!(cols[1].int_values(), &[Some(3), Some(5)]);
    assert_eq!(cols[2].bool_values(), &[Some(true), None]);
    assert_eq!(cols[3].string_values(), &[None, Some("loud".to_string())]);
}

#[test]
fn test_typed_object_column_layout() {
    let schema: Schema = pet_schema().into();
    assert_eq!(jsoncol::output_count(&schema), 4);
    assert_eq!(
        jsoncol::column_names(&schema, jsoncol::default_column_name),
        ["type", "age", "cat_meow", "dog_bark"]
    );
    assert_eq!(jsoncol::output_types(&schema)[0], ColumnType::String);
}

#[test]
fn test_typed_object_tag_must_come_first() {
    let err = decode(pet_schema(), r#"{"age": 3, "type": "cat"}"#).unwrap_err();
    assert!(matches!(err, Error::Structural { .. }));
}

#[test]
fn test_typed_object_known_tag_alone_rejected() {
    let err = decode(pet_schema(), r#"{"type": "cat"}"#).unwrap_err();
    assert!(matches!(err, Error::Structural { .. }));
}

#[test]
fn test_typed_object_unknown_tag_rejected_by_default() {
    let err = decode(pet_schema(), r#"{"type": "ferret", "age": 1}"#).unwrap_err();
    assert!(matches!(err, Error::Structural { .. }));
}

#[test]
fn test_typed_object_unknown_tag_recorded_when_allowed() {
    let schema = TypedObjectSchema::builder("type")
        .variant(
            "cat",
            ObjectSchema::standard(vec![ObjectField::new(
                "meow",
                BoolSchema::builder()
                    .kinds(Kinds::BOOL | Kinds::NULL)
                    .allow_missing(true)
                    .build()
                    .unwrap(),
            )])
            .unwrap(),
        )
        .allow_unknown_tags(true)
        .build()
        .unwrap();
    let (cols, _) = decode(schema, r#"{"type": "ferret", "whatever": [1, {}]}"#).unwrap();
    assert_eq!(cols[0].string_values(), &[Some("ferret".to_string())]);
    assert_eq!(cols[1].bool_values(), &[None]);
}

// ============================================================================
// Binding and batch reuse
// ============================================================================

#[test]
fn test_decoder_rejects_foreign_columns() {
    let mut decoder = compile(&LongSchema::standard().into()).unwrap();
    let mut wrong = vec![ColumnType::String.new_column()];
    let mut lexer = jsoncol::Lexer::new("1");
    use jsoncol::TokenSource;
    lexer.advance().unwrap();
    let err = decoder.decode_value(&mut lexer, &mut wrong).unwrap_err();
    assert!(matches!(err, Error::ColumnBinding(_)));
}

#[test]
fn test_decoder_rebinds_to_fresh_batches() {
    let mut decoder = compile(&point_schema().into()).unwrap();
    let mut first = decoder.new_batch();
    decoder
        .decode_document(r#"{"x": 1, "y": 2}"#, &mut first)
        .unwrap();
    let mut second = decoder.new_batch();
    decoder
        .decode_document(r#"{"x": 3, "y": 4}"#, &mut second)
        .unwrap();
    assert_eq!(first[0].long_values(), &[Some(1)]);
    assert_eq!(second[0].long_values(), &[Some(3)]);
}

#[test]
fn test_syntax_error_carries_location() {
    let err = decode(LongSchema::standard(), "1 tru").unwrap_err();
    match err {
        Error::Syntax { location, .. } => assert_eq!(location.line, 1),
        other => panic!("expected syntax error, got {other:?}"),
    }
}
