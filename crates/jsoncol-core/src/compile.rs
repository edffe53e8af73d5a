//! Schema compiler: lowers a schema tree into a bound processor tree
//!
//! The flat output column space is partitioned among children in
//! declaration order, each child consuming `output_count` of its schema.
//! Layout functions (`output_count`, `output_types`, `output_paths`) are
//! derived purely from the schema, so callers can allocate and name columns
//! without compiling.

use tracing::debug;

use crate::chunk::{Column, ColumnType};
use crate::process::{
    AnyProcessor, AnyRepeater, ArrayProcessor, BigDecimalDecoder, BigIntegerDecoder, BoolDecoder,
    ByteDecoder, CharDecoder, DoubleDecoder, FloatDecoder, InstantDecoder, InstantNumberDecoder,
    IntDecoder, KvProcessor, LocalDateDecoder, LongDecoder, ObjectProcessor, ObjectRepeater,
    Repeater, ScalarProcessor, ScalarRepeater, ShortDecoder, SkipProcessor, SkipRepeater,
    StringDecoder, TupleProcessor, TupleRepeater, TypedObjectProcessor, ValueProcessor,
    VariantSlot,
};
use crate::schema::Schema;
use crate::tokens::{Lexer, TokenSource};
use crate::{Error, Result};

/// Number of output columns a schema produces.
pub fn output_count(schema: &Schema) -> usize {
    match schema {
        Schema::Skip(_) => 0,
        Schema::Object(o) => o.fields().iter().map(|f| output_count(f.schema())).sum(),
        Schema::ObjectKv(kv) => output_count(kv.key()) + output_count(kv.value()),
        Schema::Array(a) => output_count(a.element()),
        Schema::Tuple(t) => t.items().iter().map(|(_, s)| output_count(s)).sum(),
        Schema::TypedObject(t) => {
            1 + t
                .shared_fields()
                .iter()
                .map(|f| output_count(f.schema()))
                .sum::<usize>()
                + t.variants()
                    .iter()
                    .flat_map(|(_, o)| o.fields())
                    .map(|f| output_count(f.schema()))
                    .sum::<usize>()
        }
        _ => 1,
    }
}

/// Column types, in the same order the compiled processors write them.
pub fn output_types(schema: &Schema) -> Vec<ColumnType> {
    match schema {
        Schema::String(_) => vec![ColumnType::String],
        Schema::Bool(_) => vec![ColumnType::Bool],
        Schema::Char(_) => vec![ColumnType::Char],
        Schema::Byte(_) => vec![ColumnType::Byte],
        Schema::Short(_) => vec![ColumnType::Short],
        Schema::Int(_) => vec![ColumnType::Int],
        Schema::Long(_) => vec![ColumnType::Long],
        Schema::Float(_) => vec![ColumnType::Float],
        Schema::Double(_) => vec![ColumnType::Double],
        Schema::BigInteger(_) => vec![ColumnType::BigInteger],
        Schema::BigDecimal(_) => vec![ColumnType::BigDecimal],
        Schema::Instant(_) | Schema::InstantNumber(_) => vec![ColumnType::TimestampNanos],
        Schema::LocalDate(_) => vec![ColumnType::Date],
        Schema::Any(_) => vec![ColumnType::Any],
        Schema::Skip(_) => Vec::new(),
        Schema::Object(o) => o
            .fields()
            .iter()
            .flat_map(|f| output_types(f.schema()))
            .collect(),
        Schema::ObjectKv(kv) => output_types(kv.key())
            .into_iter()
            .chain(output_types(kv.value()))
            .map(|t| ColumnType::Array(Box::new(t)))
            .collect(),
        Schema::Array(a) => output_types(a.element())
            .into_iter()
            .map(|t| ColumnType::Array(Box::new(t)))
            .collect(),
        Schema::Tuple(t) => t
            .items()
            .iter()
            .flat_map(|(_, s)| output_types(s))
            .collect(),
        Schema::TypedObject(t) => {
            let mut types = vec![ColumnType::String];
            for field in t.shared_fields() {
                types.extend(output_types(field.schema()));
            }
            for (_, object) in t.variants() {
                for field in object.fields() {
                    types.extend(output_types(field.schema()));
                }
            }
            types
        }
    }
}

/// Canonical column paths: field-name segments for objects, decimal index
/// (or label) segments for tuples, `Key`/`Value` for key/value maps, and
/// for a discriminated union the tag column first, then shared fields, then
/// each variant's fields prefixed with its tag. Arrays add no segment.
pub fn output_paths(schema: &Schema) -> Vec<Vec<String>> {
    fn prefixed(prefix: &str, child: &Schema) -> Vec<Vec<String>> {
        output_paths(child)
            .into_iter()
            .map(|mut path| {
                path.insert(0, prefix.to_owned());
                path
            })
            .collect()
    }

    match schema {
        Schema::Skip(_) => Vec::new(),
        Schema::Object(o) => o
            .fields()
            .iter()
            .flat_map(|f| prefixed(f.name(), f.schema()))
            .collect(),
        Schema::ObjectKv(kv) => prefixed("Key", kv.key())
            .into_iter()
            .chain(prefixed("Value", kv.value()))
            .collect(),
        Schema::Array(a) => output_paths(a.element()),
        Schema::Tuple(t) => t
            .items()
            .iter()
            .flat_map(|(label, s)| prefixed(label, s))
            .collect(),
        Schema::TypedObject(t) => {
            let mut paths = vec![vec![t.tag_field().to_owned()]];
            for field in t.shared_fields() {
                paths.extend(prefixed(field.name(), field.schema()));
            }
            for (tag, object) in t.variants() {
                for field in object.fields() {
                    for mut path in prefixed(field.name(), field.schema()) {
                        path.insert(0, tag.clone());
                        paths.push(path);
                    }
                }
            }
            paths
        }
        _ => vec![Vec::new()],
    }
}

/// Default column name: segments joined with `_`; the empty path (a bare
/// scalar at the root) is `"Value"`.
pub fn default_column_name(path: &[String]) -> String {
    if path.is_empty() {
        "Value".to_owned()
    } else {
        path.join("_")
    }
}

/// Column names through a caller-supplied naming function.
pub fn column_names<F>(schema: &Schema, name: F) -> Vec<String>
where
    F: Fn(&[String]) -> String,
{
    output_paths(schema).iter().map(|p| name(p)).collect()
}

fn compile_value(schema: &Schema, base: usize) -> Result<Box<dyn ValueProcessor>> {
    Ok(match schema {
        Schema::String(s) => Box::new(ScalarProcessor::new(StringDecoder(s.clone()), base)),
        Schema::Bool(s) => Box::new(ScalarProcessor::new(BoolDecoder(s.clone()), base)),
        Schema::Char(s) => Box::new(ScalarProcessor::new(CharDecoder(s.clone()), base)),
        Schema::Byte(s) => Box::new(ScalarProcessor::new(ByteDecoder(s.clone()), base)),
        Schema::Short(s) => Box::new(ScalarProcessor::new(ShortDecoder(s.clone()), base)),
        Schema::Int(s) => Box::new(ScalarProcessor::new(IntDecoder(s.clone()), base)),
        Schema::Long(s) => Box::new(ScalarProcessor::new(LongDecoder(s.clone()), base)),
        Schema::Float(s) => Box::new(ScalarProcessor::new(FloatDecoder(s.clone()), base)),
        Schema::Double(s) => Box::new(ScalarProcessor::new(DoubleDecoder(s.clone()), base)),
        Schema::BigInteger(s) => {
            Box::new(ScalarProcessor::new(BigIntegerDecoder(s.clone()), base))
        }
        Schema::BigDecimal(s) => {
            Box::new(ScalarProcessor::new(BigDecimalDecoder(s.clone()), base))
        }
        Schema::Instant(s) => Box::new(ScalarProcessor::new(InstantDecoder(s.clone()), base)),
        Schema::InstantNumber(s) => {
            Box::new(ScalarProcessor::new(InstantNumberDecoder(s.clone()), base))
        }
        Schema::LocalDate(s) => {
            Box::new(ScalarProcessor::new(LocalDateDecoder(s.clone()), base))
        }
        Schema::Skip(s) => Box::new(SkipProcessor::new(s.clone())),
        Schema::Any(_) => Box::new(AnyProcessor::new(base)),
        Schema::Object(o) => {
            let mut col = base;
            let mut fields = Vec::with_capacity(o.fields().len());
            for field in o.fields() {
                let child = compile_value(field.schema(), col)?;
                col += output_count(field.schema());
                fields.push((field.clone(), child));
            }
            Box::new(ObjectProcessor::new(
                o.kinds(),
                o.allow_missing(),
                o.allow_unknown_fields(),
                fields,
            ))
        }
        Schema::ObjectKv(kv) => {
            let key = compile_repeater(kv.key(), base)?;
            let value = compile_repeater(kv.value(), base + output_count(kv.key()))?;
            Box::new(KvProcessor::new(kv.kinds(), kv.allow_missing(), key, value))
        }
        Schema::Array(a) => {
            let element = compile_repeater(a.element(), base)?;
            Box::new(ArrayProcessor::new(a.kinds(), a.allow_missing(), element))
        }
        Schema::Tuple(t) => {
            let mut col = base;
            let mut items = Vec::with_capacity(t.items().len());
            for (_, item) in t.items() {
                items.push(compile_value(item, col)?);
                col += output_count(item);
            }
            Box::new(TupleProcessor::new(t.kinds(), t.allow_missing(), items))
        }
        Schema::TypedObject(t) => {
            let tag_col = base;
            let shared_start = base + 1;
            let shared_count: usize = t
                .shared_fields()
                .iter()
                .map(|f| output_count(f.schema()))
                .sum();
            let shared_range = shared_start..shared_start + shared_count;
            let mut col = shared_range.end;
            let mut variants = Vec::with_capacity(t.variants().len());
            for (tag, object) in t.variants() {
                let own_start = col;
                let mut fields = Vec::new();
                let mut shared_col = shared_start;
                for field in t.shared_fields() {
                    fields.push((field.clone(), compile_value(field.schema(), shared_col)?));
                    shared_col += output_count(field.schema());
                }
                for field in object.fields() {
                    fields.push((field.clone(), compile_value(field.schema(), col)?));
                    col += output_count(field.schema());
                }
                let processor = ObjectProcessor::new(
                    object.kinds(),
                    object.allow_missing(),
                    object.allow_unknown_fields(),
                    fields,
                );
                variants.push(VariantSlot::new(tag.clone(), processor, own_start..col));
            }
            Box::new(TypedObjectProcessor::new(
                t.kinds(),
                t.allow_missing(),
                t.allow_unknown_tags(),
                t.tag_field().to_owned(),
                tag_col,
                shared_range,
                variants,
            ))
        }
    })
}

fn compile_repeater(schema: &Schema, base: usize) -> Result<Box<dyn Repeater>> {
    Ok(match schema {
        Schema::String(s) => Box::new(ScalarRepeater::new(StringDecoder(s.clone()), base)),
        Schema::Bool(s) => Box::new(ScalarRepeater::new(BoolDecoder(s.clone()), base)),
        Schema::Char(s) => Box::new(ScalarRepeater::new(CharDecoder(s.clone()), base)),
        Schema::Byte(s) => Box::new(ScalarRepeater::new(ByteDecoder(s.clone()), base)),
        Schema::Short(s) => Box::new(ScalarRepeater::new(ShortDecoder(s.clone()), base)),
        Schema::Int(s) => Box::new(ScalarRepeater::new(IntDecoder(s.clone()), base)),
        Schema::Long(s) => Box::new(ScalarRepeater::new(LongDecoder(s.clone()), base)),
        Schema::Float(s) => Box::new(ScalarRepeater::new(FloatDecoder(s.clone()), base)),
        Schema::Double(s) => Box::new(ScalarRepeater::new(DoubleDecoder(s.clone()), base)),
        Schema::BigInteger(s) => {
            Box::new(ScalarRepeater::new(BigIntegerDecoder(s.clone()), base))
        }
        Schema::BigDecimal(s) => {
            Box::new(ScalarRepeater::new(BigDecimalDecoder(s.clone()), base))
        }
        Schema::Instant(s) => Box::new(ScalarRepeater::new(InstantDecoder(s.clone()), base)),
        Schema::InstantNumber(s) => {
            Box::new(ScalarRepeater::new(InstantNumberDecoder(s.clone()), base))
        }
        Schema::LocalDate(s) => {
            Box::new(ScalarRepeater::new(LocalDateDecoder(s.clone()), base))
        }
        Schema::Skip(s) => Box::new(SkipRepeater::new(s.kinds())),
        Schema::Any(_) => Box::new(AnyRepeater::new(base)),
        Schema::Object(o) => {
            let mut col = base;
            let mut fields = Vec::with_capacity(o.fields().len());
            for field in o.fields() {
                let child = compile_repeater(field.schema(), col)?;
                col += output_count(field.schema());
                fields.push((field.clone(), child));
            }
            Box::new(ObjectRepeater::new(
                o.kinds(),
                o.allow_unknown_fields(),
                fields,
            ))
        }
        Schema::Tuple(t) => {
            let mut col = base;
            let mut items = Vec::with_capacity(t.items().len());
            for (_, item) in t.items() {
                items.push(compile_repeater(item, col)?);
                col += output_count(item);
            }
            Box::new(TupleRepeater::new(t.kinds(), items))
        }
        Schema::Array(_) => {
            return Err(Error::schema("arrays of arrays are not supported"));
        }
        Schema::ObjectKv(_) => {
            return Err(Error::schema(
                "arrays of key/value maps are not supported",
            ));
        }
        Schema::TypedObject(_) => {
            return Err(Error::schema(
                "arrays of discriminated unions are not supported",
            ));
        }
    })
}

/// A compiled schema: the root processor plus the column layout it writes.
pub struct Decoder {
    root: Box<dyn ValueProcessor>,
    types: Vec<ColumnType>,
    paths: Vec<Vec<String>>,
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("types", &self.types)
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}

/// Compile a schema into a reusable [`Decoder`].
pub fn compile(schema: &Schema) -> Result<Decoder> {
    let types = output_types(schema);
    let paths = output_paths(schema);
    let root = compile_value(schema, 0)?;
    debug!(columns = types.len(), "compiled schema");
    Ok(Decoder { root, types, paths })
}

impl Decoder {
    pub fn column_count(&self) -> usize {
        self.types.len()
    }

    pub fn column_types(&self) -> &[ColumnType] {
        &self.types
    }

    pub fn column_paths(&self) -> &[Vec<String>] {
        &self.paths
    }

    /// Default column names (underscore-joined paths).
    pub fn column_names(&self) -> Vec<String> {
        self.paths.iter().map(|p| default_column_name(p)).collect()
    }

    /// Allocate a fresh, empty column set matching the compiled layout.
    pub fn new_batch(&self) -> Vec<Column> {
        self.types.iter().map(ColumnType::new_column).collect()
    }

    /// Validate that a caller-supplied column set matches the compiled
    /// layout. Decoding entry points call this before consuming tokens.
    pub fn check_binding(&self, out: &[Column]) -> Result<()> {
        if out.len() != self.types.len() {
            return Err(Error::binding(format!(
                "expected {} columns, got {}",
                self.types.len(),
                out.len()
            )));
        }
        for (i, (col, expected)) in out.iter().zip(&self.types).enumerate() {
            if col.column_type() != expected {
                return Err(Error::binding(format!(
                    "column {i} is {:?}, expected {expected:?}",
                    col.column_type()
                )));
            }
        }
        Ok(())
    }

    /// Decode the current value; the source must be positioned on its first
    /// token. Appends exactly one cell to every column.
    pub fn decode_value(&mut self, src: &mut dyn TokenSource, out: &mut [Column]) -> Result<()> {
        self.check_binding(out)?;
        match src.current() {
            Some(kind) if kind.is_value_start() => self.root.process_value(src, out),
            Some(kind) => Err(Error::structural(
                format!("expected a value, found {kind}"),
                src.location(),
            )),
            None => Err(Error::structural("expected a value", src.location())),
        }
    }

    /// Record an absent root value.
    pub fn decode_missing(&mut self, out: &mut [Column]) -> Result<()> {
        self.check_binding(out)?;
        self.root.process_missing(out)
    }

    /// Decode every top-level value in `text`, returning how many were
    /// decoded.
    pub fn decode_document(&mut self, text: &str, out: &mut [Column]) -> Result<usize> {
        self.check_binding(out)?;
        let mut lexer = Lexer::new(text);
        let mut decoded = 0;
        while lexer.advance()?.is_some() {
            self.root.process_value(&mut lexer, out)?;
            decoded += 1;
        }
        Ok(decoded)
    }
}
