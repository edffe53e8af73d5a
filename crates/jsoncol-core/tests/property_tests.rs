//! Property-based tests for decode invariants
//!
//! Uses proptest to verify row conservation, value round-trips, and
//! field-order independence across arbitrary inputs.

use jsoncol::schema::{Kinds, LongSchema, ObjectField, ObjectSchema, Schema, StringSchema};
use jsoncol::{compile, Column};
use proptest::prelude::*;

fn decode(schema: &Schema, text: &str) -> jsoncol::Result<(Vec<Column>, usize)> {
    let mut decoder = compile(schema)?;
    let mut columns = decoder.new_batch();
    let rows = decoder.decode_document(text, &mut columns)?;
    Ok((columns, rows))
}

proptest! {
    /// Every i64 literal decodes back to itself.
    #[test]
    fn long_values_roundtrip(value in any::<i64>()) {
        let schema: Schema = LongSchema::standard().into();
        let (cols, rows) = decode(&schema, &value.to_string()).unwrap();
        prop_assert_eq!(rows, 1);
        prop_assert_eq!(cols[0].long_values(), &[Some(value)]);
    }

    /// Finite doubles written by serde_json decode back exactly.
    #[test]
    fn double_values_roundtrip(value in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
        use jsoncol::schema::DoubleSchema;
        let schema: Schema = DoubleSchema::standard().into();
        let text = serde_json::json!(value).to_string();
        let (cols, _) = decode(&schema, &text).unwrap();
        prop_assert_eq!(cols[0].double_values(), &[Some(value)]);
    }

    /// Arbitrary strings survive JSON escaping and unescaping.
    #[test]
    fn string_values_roundtrip(value in ".*") {
        let schema: Schema = StringSchema::standard().into();
        let text = serde_json::Value::String(value.clone()).to_string();
        let (cols, _) = decode(&schema, &text).unwrap();
        prop_assert_eq!(cols[0].string_values(), &[Some(value)]);
    }

    /// One top-level value produces exactly one row in every column.
    #[test]
    fn row_count_is_conserved(values in prop::collection::vec(any::<i64>(), 0..40)) {
        let schema: Schema = ObjectSchema::standard(vec![ObjectField::new(
            "v",
            LongSchema::standard(),
        )])
        .unwrap()
        .into();
        let text: String = values
            .iter()
            .map(|v| format!("{{\"v\": {v}}}"))
            .collect::<Vec<_>>()
            .join(" ");
        let (cols, rows) = decode(&schema, &text).unwrap();
        prop_assert_eq!(rows, values.len());
        for col in &cols {
            prop_assert_eq!(col.len(), values.len());
        }
        let expected: Vec<_> = values.iter().map(|v| Some(*v)).collect();
        prop_assert_eq!(cols[0].long_values(), expected.as_slice());
    }

    /// Decoding the same object with its members in either order yields the
    /// same columns.
    #[test]
    fn field_order_is_irrelevant(a in any::<i64>(), b in any::<i64>()) {
        let schema: Schema = ObjectSchema::standard(vec![
            ObjectField::new("a", LongSchema::standard()),
            ObjectField::new("b", LongSchema::standard()),
        ])
        .unwrap()
        .into();
        let forward = decode(&schema, &format!("{{\"a\": {a}, \"b\": {b}}}")).unwrap();
        let reversed = decode(&schema, &format!("{{\"b\": {b}, \"a\": {a}}}")).unwrap();
        prop_assert_eq!(forward.0, reversed.0);
    }

    /// Null always lands as the substitute when one is configured.
    #[test]
    fn null_substitute_applies(nulls in prop::collection::vec(any::<bool>(), 1..20)) {
        let schema: Schema = LongSchema::builder()
            .kinds(Kinds::INT | Kinds::NULL)
            .on_null(-99)
            .build()
            .unwrap()
            .into();
        let text: String = nulls
            .iter()
            .map(|is_null| if *is_null { "null".to_string() } else { "1".to_string() })
            .collect::<Vec<_>>()
            .join(" ");
        let (cols, _) = decode(&schema, &text).unwrap();
        let expected: Vec<_> = nulls
            .iter()
            .map(|is_null| if *is_null { Some(-99) } else { Some(1) })
            .collect();
        prop_assert_eq!(cols[0].long_values(), expected.as_slice());
    }
}
