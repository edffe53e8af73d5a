//! Scalar processors, repeaters, and the shared per-token dispatch
//!
//! One [`ScalarDecoder`] per leaf schema type captures the type-specific
//! conversions; [`ScalarProcessor`] and [`ScalarRepeater`] drive the same
//! decoder for single values and for array elements respectively, so the
//! seven-way token dispatch is written once.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use num_bigint::BigInt;
use serde_json::{Map, Number, Value};

use crate::chunk::{ArrayValue, Column};
use crate::coerce;
use crate::growbuf::GrowBuf;
use crate::process::{check_kind, Repeater, ValueProcessor, advance_in_structure};
use crate::schema::{
    BigDecimalSchema, BigIntegerSchema, BoolSchema, ByteSchema, CharSchema, DoubleSchema,
    FloatSchema, InstantNumberSchema, InstantSchema, IntSchema, Kinds, LocalDateSchema,
    LongSchema, ShortSchema, SkipSchema, StringSchema,
};
use crate::tokens::{Location, TokenKind, TokenSource};
use crate::{Error, Result};

/// Type-specific half of a scalar processor: which kinds are accepted, the
/// substitutes, and one conversion per accepted token kind.
///
/// The `decode_*` defaults reject; each decoder overrides exactly the
/// conversions its schema node can enable.
pub(crate) trait ScalarDecoder {
    type Value: Clone;

    const TYPE_NAME: &'static str;

    fn kinds(&self) -> Kinds;

    fn allow_missing(&self) -> bool;

    fn on_null(&self) -> Option<Self::Value>;

    fn on_missing(&self) -> Option<Self::Value>;

    fn decode_string(&self, _text: &str, location: Location) -> Result<Self::Value> {
        Err(Error::syntax(
            format!("{} cannot decode a string", Self::TYPE_NAME),
            location,
        ))
    }

    fn decode_int(&self, _text: &str, location: Location) -> Result<Self::Value> {
        Err(Error::syntax(
            format!("{} cannot decode an integer", Self::TYPE_NAME),
            location,
        ))
    }

    fn decode_decimal(&self, _text: &str, location: Location) -> Result<Self::Value> {
        Err(Error::syntax(
            format!("{} cannot decode a decimal", Self::TYPE_NAME),
            location,
        ))
    }

    fn decode_bool(&self, _value: bool, location: Location) -> Result<Self::Value> {
        Err(Error::syntax(
            format!("{} cannot decode a boolean", Self::TYPE_NAME),
            location,
        ))
    }

    /// Append one cell to this decoder's column type.
    fn push(col: &mut Column, value: Option<Self::Value>);

    /// Wrap accumulated elements as one array cell.
    fn array_value(values: Vec<Option<Self::Value>>) -> ArrayValue;
}

/// Decode the current value token through a decoder; `None` is the null
/// representation (an unsubstituted `null`).
pub(crate) fn decode_scalar<D: ScalarDecoder>(
    dec: &D,
    src: &mut dyn TokenSource,
) -> Result<Option<D::Value>> {
    let kind = check_kind(dec.kinds(), D::TYPE_NAME, src)?;
    let location = src.location();
    match kind {
        TokenKind::Null => Ok(dec.on_null()),
        TokenKind::String | TokenKind::FieldName => dec.decode_string(src.text(), location).map(Some),
        TokenKind::Int => dec.decode_int(src.text(), location).map(Some),
        TokenKind::Decimal => dec.decode_decimal(src.text(), location).map(Some),
        TokenKind::Bool => dec.decode_bool(src.bool_value(), location).map(Some),
        other => Err(Error::mismatch(D::TYPE_NAME, other, location)),
    }
}

fn decode_missing<D: ScalarDecoder>(dec: &D) -> Result<Option<D::Value>> {
    if !dec.allow_missing() {
        return Err(Error::missing(D::TYPE_NAME, Location::default()));
    }
    Ok(dec.on_missing())
}

/// Single-value scalar processor bound to one absolute column index.
pub(crate) struct ScalarProcessor<D> {
    dec: D,
    col: usize,
}

impl<D> ScalarProcessor<D> {
    pub(crate) fn new(dec: D, col: usize) -> Self {
        Self { dec, col }
    }
}

impl<D: ScalarDecoder> ValueProcessor for ScalarProcessor<D> {
    fn process_value(&mut self, src: &mut dyn TokenSource, out: &mut [Column]) -> Result<()> {
        let value = decode_scalar(&self.dec, src)?;
        D::push(&mut out[self.col], value);
        Ok(())
    }

    fn process_missing(&mut self, out: &mut [Column]) -> Result<()> {
        let value = decode_missing(&self.dec)?;
        D::push(&mut out[self.col], value);
        Ok(())
    }
}

/// Array-element scalar repeater: accumulates into a growth buffer, writes
/// one array cell on finish. The buffer is reused across arrays.
pub(crate) struct ScalarRepeater<D: ScalarDecoder> {
    dec: D,
    col: usize,
    buf: GrowBuf<Option<D::Value>>,
}

impl<D: ScalarDecoder> ScalarRepeater<D> {
    pub(crate) fn new(dec: D, col: usize) -> Self {
        Self {
            dec,
            col,
            buf: GrowBuf::new(),
        }
    }
}

impl<D: ScalarDecoder> Repeater for ScalarRepeater<D> {
    fn begin(&mut self) {
        self.buf.reset();
    }

    fn element(&mut self, src: &mut dyn TokenSource) -> Result<()> {
        let value = decode_scalar(&self.dec, src)?;
        self.buf.push(value);
        Ok(())
    }

    fn element_missing(&mut self) -> Result<()> {
        let value = decode_missing(&self.dec)?;
        self.buf.push(value);
        Ok(())
    }

    fn finish(&mut self, out: &mut [Column]) -> Result<()> {
        let values = self.buf.take();
        out[self.col].push_array(Some(D::array_value(values)));
        Ok(())
    }

    fn null_sequence(&mut self, out: &mut [Column]) -> Result<()> {
        out[self.col].push_array(Some(D::array_value(Vec::new())));
        Ok(())
    }

    fn missing_sequence(&mut self, out: &mut [Column]) -> Result<()> {
        out[self.col].push_array(Some(D::array_value(Vec::new())));
        Ok(())
    }
}

macro_rules! integral_decoder {
    ($decoder:ident, $schema:ty, $ty:ty, $type_name:literal, $push:ident, $array:ident) => {
        pub(crate) struct $decoder(pub(crate) $schema);

        impl ScalarDecoder for $decoder {
            type Value = $ty;

            const TYPE_NAME: &'static str = $type_name;

            fn kinds(&self) -> Kinds {
                self.0.kinds()
            }

            fn allow_missing(&self) -> bool {
                self.0.allow_missing()
            }

            fn on_null(&self) -> Option<$ty> {
                self.0.on_null()
            }

            fn on_missing(&self) -> Option<$ty> {
                self.0.on_missing()
            }

            fn decode_int(&self, text: &str, location: Location) -> Result<$ty> {
                let wide = coerce::parse_i64(text, $type_name, location)?;
                coerce::narrow(wide, $type_name, location)
            }

            fn decode_decimal(&self, text: &str, location: Location) -> Result<$ty> {
                let dec = coerce::parse_big_decimal(text, location)?;
                let wide = coerce::truncate_to_i64(&dec, $type_name, location)?;
                coerce::narrow(wide, $type_name, location)
            }

            // Strings route through arbitrary precision when decimals are
            // accepted, so "2.5e1" and "25" both land as 25.
            fn decode_string(&self, text: &str, location: Location) -> Result<$ty> {
                if self.0.kinds().contains(Kinds::DECIMAL) {
                    self.decode_decimal(text, location)
                } else {
                    self.decode_int(text, location)
                }
            }

            fn push(col: &mut Column, value: Option<$ty>) {
                col.$push(value);
            }

            fn array_value(values: Vec<Option<$ty>>) -> ArrayValue {
                ArrayValue::$array(values)
            }
        }
    };
}

integral_decoder!(ByteDecoder, ByteSchema, i8, "byte", push_byte, Byte);
integral_decoder!(ShortDecoder, ShortSchema, i16, "short", push_short, Short);
integral_decoder!(IntDecoder, IntSchema, i32, "int", push_int, Int);
integral_decoder!(LongDecoder, LongSchema, i64, "long", push_long, Long);

macro_rules! float_decoder {
    ($decoder:ident, $schema:ty, $ty:ty, $type_name:literal, $parse:ident, $push:ident, $array:ident) => {
        pub(crate) struct $decoder(pub(crate) $schema);

        impl ScalarDecoder for $decoder {
            type Value = $ty;

            const TYPE_NAME: &'static str = $type_name;

            fn kinds(&self) -> Kinds {
                self.0.kinds()
            }

            fn allow_missing(&self) -> bool {
                self.0.allow_missing()
            }

            fn on_null(&self) -> Option<$ty> {
                self.0.on_null()
            }

            fn on_missing(&self) -> Option<$ty> {
                self.0.on_missing()
            }

            fn decode_int(&self, text: &str, location: Location) -> Result<$ty> {
                coerce::$parse(text, $type_name, location)
            }

            fn decode_decimal(&self, text: &str, location: Location) -> Result<$ty> {
                coerce::$parse(text, $type_name, location)
            }

            fn decode_string(&self, text: &str, location: Location) -> Result<$ty> {
                coerce::$parse(text, $type_name, location)
            }

            fn push(col: &mut Column, value: Option<$ty>) {
                col.$push(value);
            }

            fn array_value(values: Vec<Option<$ty>>) -> ArrayValue {
                ArrayValue::$array(values)
            }
        }
    };
}

float_decoder!(FloatDecoder, FloatSchema, f32, "float", parse_f32, push_float, Float);
float_decoder!(DoubleDecoder, DoubleSchema, f64, "double", parse_f64, push_double, Double);

pub(crate) struct StringDecoder(pub(crate) StringSchema);

impl ScalarDecoder for StringDecoder {
    type Value = String;

    const TYPE_NAME: &'static str = "string";

    fn kinds(&self) -> Kinds {
        self.0.kinds()
    }

    fn allow_missing(&self) -> bool {
        self.0.allow_missing()
    }

    fn on_null(&self) -> Option<String> {
        self.0.on_null()
    }

    fn on_missing(&self) -> Option<String> {
        self.0.on_missing()
    }

    fn decode_string(&self, text: &str, _location: Location) -> Result<String> {
        Ok(text.to_owned())
    }

    // Numbers keep their literal text.
    fn decode_int(&self, text: &str, _location: Location) -> Result<String> {
        Ok(text.to_owned())
    }

    fn decode_decimal(&self, text: &str, _location: Location) -> Result<String> {
        Ok(text.to_owned())
    }

    fn decode_bool(&self, value: bool, _location: Location) -> Result<String> {
        Ok(if value { "true" } else { "false" }.to_owned())
    }

    fn push(col: &mut Column, value: Option<String>) {
        col.push_string(value);
    }

    fn array_value(values: Vec<Option<String>>) -> ArrayValue {
        ArrayValue::String(values)
    }
}

pub(crate) struct BoolDecoder(pub(crate) BoolSchema);

impl ScalarDecoder for BoolDecoder {
    type Value = bool;

    const TYPE_NAME: &'static str = "bool";

    fn kinds(&self) -> Kinds {
        self.0.kinds()
    }

    fn allow_missing(&self) -> bool {
        self.0.allow_missing()
    }

    fn on_null(&self) -> Option<bool> {
        self.0.on_null()
    }

    fn on_missing(&self) -> Option<bool> {
        self.0.on_missing()
    }

    fn decode_bool(&self, value: bool, _location: Location) -> Result<bool> {
        Ok(value)
    }

    fn decode_string(&self, text: &str, location: Location) -> Result<bool> {
        coerce::parse_bool_text(text, location)
    }

    fn push(col: &mut Column, value: Option<bool>) {
        col.push_bool(value);
    }

    fn array_value(values: Vec<Option<bool>>) -> ArrayValue {
        ArrayValue::Bool(values)
    }
}

pub(crate) struct CharDecoder(pub(crate) CharSchema);

impl ScalarDecoder for CharDecoder {
    type Value = char;

    const TYPE_NAME: &'static str = "char";

    fn kinds(&self) -> Kinds {
        self.0.kinds()
    }

    fn allow_missing(&self) -> bool {
        self.0.allow_missing()
    }

    fn on_null(&self) -> Option<char> {
        self.0.on_null()
    }

    fn on_missing(&self) -> Option<char> {
        self.0.on_missing()
    }

    fn decode_string(&self, text: &str, location: Location) -> Result<char> {
        coerce::parse_char(text, location)
    }

    fn push(col: &mut Column, value: Option<char>) {
        col.push_char(value);
    }

    fn array_value(values: Vec<Option<char>>) -> ArrayValue {
        ArrayValue::Char(values)
    }
}

pub(crate) struct BigIntegerDecoder(pub(crate) BigIntegerSchema);

impl ScalarDecoder for BigIntegerDecoder {
    type Value = BigInt;

    const TYPE_NAME: &'static str = "biginteger";

    fn kinds(&self) -> Kinds {
        self.0.kinds()
    }

    fn allow_missing(&self) -> bool {
        self.0.allow_missing()
    }

    fn on_null(&self) -> Option<BigInt> {
        self.0.on_null()
    }

    fn on_missing(&self) -> Option<BigInt> {
        self.0.on_missing()
    }

    fn decode_int(&self, text: &str, location: Location) -> Result<BigInt> {
        coerce::parse_big_int(text, location)
    }

    fn decode_decimal(&self, text: &str, location: Location) -> Result<BigInt> {
        let dec = coerce::parse_big_decimal(text, location)?;
        Ok(coerce::truncate_to_big_int(&dec))
    }

    fn decode_string(&self, text: &str, location: Location) -> Result<BigInt> {
        if self.0.kinds().contains(Kinds::DECIMAL) {
            self.decode_decimal(text, location)
        } else {
            self.decode_int(text, location)
        }
    }

    fn push(col: &mut Column, value: Option<BigInt>) {
        col.push_big_integer(value);
    }

    fn array_value(values: Vec<Option<BigInt>>) -> ArrayValue {
        ArrayValue::BigInteger(values)
    }
}

pub(crate) struct BigDecimalDecoder(pub(crate) BigDecimalSchema);

impl ScalarDecoder for BigDecimalDecoder {
    type Value = BigDecimal;

    const TYPE_NAME: &'static str = "bigdecimal";

    fn kinds(&self) -> Kinds {
        self.0.kinds()
    }

    fn allow_missing(&self) -> bool {
        self.0.allow_missing()
    }

    fn on_null(&self) -> Option<BigDecimal> {
        self.0.on_null()
    }

    fn on_missing(&self) -> Option<BigDecimal> {
        self.0.on_missing()
    }

    fn decode_int(&self, text: &str, location: Location) -> Result<BigDecimal> {
        coerce::parse_big_decimal(text, location)
    }

    fn decode_decimal(&self, text: &str, location: Location) -> Result<BigDecimal> {
        coerce::parse_big_decimal(text, location)
    }

    fn decode_string(&self, text: &str, location: Location) -> Result<BigDecimal> {
        coerce::parse_big_decimal(text, location)
    }

    fn push(col: &mut Column, value: Option<BigDecimal>) {
        col.push_big_decimal(value);
    }

    fn array_value(values: Vec<Option<BigDecimal>>) -> ArrayValue {
        ArrayValue::BigDecimal(values)
    }
}

pub(crate) struct InstantDecoder(pub(crate) InstantSchema);

impl ScalarDecoder for InstantDecoder {
    type Value = i64;

    const TYPE_NAME: &'static str = "instant";

    fn kinds(&self) -> Kinds {
        self.0.kinds()
    }

    fn allow_missing(&self) -> bool {
        self.0.allow_missing()
    }

    fn on_null(&self) -> Option<i64> {
        self.0.on_null()
    }

    fn on_missing(&self) -> Option<i64> {
        self.0.on_missing()
    }

    fn decode_string(&self, text: &str, location: Location) -> Result<i64> {
        coerce::parse_instant(text, self.0.format(), location)
    }

    fn push(col: &mut Column, value: Option<i64>) {
        col.push_timestamp(value);
    }

    fn array_value(values: Vec<Option<i64>>) -> ArrayValue {
        ArrayValue::TimestampNanos(values)
    }
}

pub(crate) struct InstantNumberDecoder(pub(crate) InstantNumberSchema);

impl ScalarDecoder for InstantNumberDecoder {
    type Value = i64;

    const TYPE_NAME: &'static str = "instant-number";

    fn kinds(&self) -> Kinds {
        self.0.kinds()
    }

    fn allow_missing(&self) -> bool {
        self.0.allow_missing()
    }

    fn on_null(&self) -> Option<i64> {
        self.0.on_null()
    }

    fn on_missing(&self) -> Option<i64> {
        self.0.on_missing()
    }

    fn decode_int(&self, text: &str, location: Location) -> Result<i64> {
        let epoch = coerce::parse_i64(text, Self::TYPE_NAME, location)?;
        coerce::epoch_to_nanos(epoch, self.0.unit(), location)
    }

    fn decode_decimal(&self, text: &str, location: Location) -> Result<i64> {
        let dec = coerce::parse_big_decimal(text, location)?;
        coerce::decimal_epoch_to_nanos(&dec, self.0.unit(), location)
    }

    fn decode_string(&self, text: &str, location: Location) -> Result<i64> {
        if self.0.kinds().contains(Kinds::DECIMAL) {
            self.decode_decimal(text, location)
        } else {
            self.decode_int(text, location)
        }
    }

    fn push(col: &mut Column, value: Option<i64>) {
        col.push_timestamp(value);
    }

    fn array_value(values: Vec<Option<i64>>) -> ArrayValue {
        ArrayValue::TimestampNanos(values)
    }
}

pub(crate) struct LocalDateDecoder(pub(crate) LocalDateSchema);

impl ScalarDecoder for LocalDateDecoder {
    type Value = NaiveDate;

    const TYPE_NAME: &'static str = "localdate";

    fn kinds(&self) -> Kinds {
        self.0.kinds()
    }

    fn allow_missing(&self) -> bool {
        self.0.allow_missing()
    }

    fn on_null(&self) -> Option<NaiveDate> {
        self.0.on_null()
    }

    fn on_missing(&self) -> Option<NaiveDate> {
        self.0.on_missing()
    }

    fn decode_string(&self, text: &str, location: Location) -> Result<NaiveDate> {
        coerce::parse_local_date(text, self.0.format(), location)
    }

    fn push(col: &mut Column, value: Option<NaiveDate>) {
        col.push_date(value);
    }

    fn array_value(values: Vec<Option<NaiveDate>>) -> ArrayValue {
        ArrayValue::Date(values)
    }
}

/// Consume-and-discard processor; owns no columns.
pub(crate) struct SkipProcessor {
    schema: SkipSchema,
}

impl SkipProcessor {
    pub(crate) fn new(schema: SkipSchema) -> Self {
        Self { schema }
    }
}

impl ValueProcessor for SkipProcessor {
    fn process_value(&mut self, src: &mut dyn TokenSource, _out: &mut [Column]) -> Result<()> {
        check_kind(self.schema.kinds(), "skip", src)?;
        src.skip_value()
    }

    fn process_missing(&mut self, _out: &mut [Column]) -> Result<()> {
        if !self.schema.allow_missing() {
            return Err(Error::missing("skip", Location::default()));
        }
        Ok(())
    }
}

/// Materialize the current value as a [`serde_json::Value`].
///
/// Same cursor contract as a processor: entered at the value's first token,
/// returns at its last.
pub(crate) fn capture_any(src: &mut dyn TokenSource) -> Result<Value> {
    let kind = src
        .current()
        .ok_or_else(|| Error::structural("unexpected end of input", src.location()))?;
    match kind {
        TokenKind::Null => Ok(Value::Null),
        TokenKind::Bool => Ok(Value::Bool(src.bool_value())),
        TokenKind::String | TokenKind::FieldName => Ok(Value::String(src.text().to_owned())),
        TokenKind::Int | TokenKind::Decimal => {
            let number: Number = src.text().parse().map_err(|_| {
                Error::syntax(
                    format!("cannot represent number {:?}", src.text()),
                    src.location(),
                )
            })?;
            Ok(Value::Number(number))
        }
        TokenKind::BeginArray => {
            let mut elements = Vec::new();
            let mut next = advance_in_structure(src)?;
            while next != TokenKind::EndArray {
                elements.push(capture_any(src)?);
                next = advance_in_structure(src)?;
            }
            Ok(Value::Array(elements))
        }
        TokenKind::BeginObject => {
            let mut members = Map::new();
            let mut next = advance_in_structure(src)?;
            while next == TokenKind::FieldName {
                let key = src.text().to_owned();
                advance_in_structure(src)?;
                let value = capture_any(src)?;
                members.insert(key, value);
                next = advance_in_structure(src)?;
            }
            if next != TokenKind::EndObject {
                return Err(Error::structural(
                    format!("unexpected {next} inside object"),
                    src.location(),
                ));
            }
            Ok(Value::Object(members))
        }
        TokenKind::EndObject | TokenKind::EndArray => Err(Error::structural(
            format!("unexpected {kind}"),
            src.location(),
        )),
    }
}

/// Opaque passthrough processor: one `Any` column, missing stored as null.
pub(crate) struct AnyProcessor {
    col: usize,
}

impl AnyProcessor {
    pub(crate) fn new(col: usize) -> Self {
        Self { col }
    }
}

impl ValueProcessor for AnyProcessor {
    fn process_value(&mut self, src: &mut dyn TokenSource, out: &mut [Column]) -> Result<()> {
        let value = capture_any(src)?;
        out[self.col].push_any(Some(value));
        Ok(())
    }

    fn process_missing(&mut self, out: &mut [Column]) -> Result<()> {
        out[self.col].push_any(None);
        Ok(())
    }
}

pub(crate) struct AnyRepeater {
    col: usize,
    buf: GrowBuf<Option<Value>>,
}

impl AnyRepeater {
    pub(crate) fn new(col: usize) -> Self {
        Self {
            col,
            buf: GrowBuf::new(),
        }
    }
}

impl Repeater for AnyRepeater {
    fn begin(&mut self) {
        self.buf.reset();
    }

    fn element(&mut self, src: &mut dyn TokenSource) -> Result<()> {
        self.buf.push(Some(capture_any(src)?));
        Ok(())
    }

    fn element_missing(&mut self) -> Result<()> {
        self.buf.push(None);
        Ok(())
    }

    fn finish(&mut self, out: &mut [Column]) -> Result<()> {
        let values = self.buf.take();
        out[self.col].push_array(Some(ArrayValue::Any(values)));
        Ok(())
    }

    fn null_sequence(&mut self, out: &mut [Column]) -> Result<()> {
        out[self.col].push_array(Some(ArrayValue::Any(Vec::new())));
        Ok(())
    }

    fn missing_sequence(&mut self, out: &mut [Column]) -> Result<()> {
        out[self.col].push_array(Some(ArrayValue::Any(Vec::new())));
        Ok(())
    }
}
