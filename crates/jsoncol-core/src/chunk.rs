//! Typed, append-only output columns
//!
//! This is the narrow buffer interface the compiled processors write into:
//! one [`Column`] per output position, each a typed vector of optional cells
//! where `None` is the null representation. Substitute values configured on
//! the schema land as `Some(..)`; bulk not-applicable fill lands as `None`.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use num_bigint::BigInt;
use serde_json::Value;

/// Primitive type of one output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Bool,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    BigInteger,
    BigDecimal,
    /// Epoch nanoseconds
    TimestampNanos,
    Date,
    /// Opaque passthrough JSON
    Any,
    /// Whole-array-per-cell column produced by array and key/value schemas
    Array(Box<ColumnType>),
}

impl ColumnType {
    /// Allocate an empty column of this type.
    pub fn new_column(&self) -> Column {
        let cells = match self {
            Self::Bool => CellData::Bool(Vec::new()),
            Self::Char => CellData::Char(Vec::new()),
            Self::Byte => CellData::Byte(Vec::new()),
            Self::Short => CellData::Short(Vec::new()),
            Self::Int => CellData::Int(Vec::new()),
            Self::Long => CellData::Long(Vec::new()),
            Self::Float => CellData::Float(Vec::new()),
            Self::Double => CellData::Double(Vec::new()),
            Self::String => CellData::String(Vec::new()),
            Self::BigInteger => CellData::BigInteger(Vec::new()),
            Self::BigDecimal => CellData::BigDecimal(Vec::new()),
            Self::TimestampNanos => CellData::TimestampNanos(Vec::new()),
            Self::Date => CellData::Date(Vec::new()),
            Self::Any => CellData::Any(Vec::new()),
            Self::Array(_) => CellData::Array(Vec::new()),
        };
        Column {
            ty: self.clone(),
            cells,
        }
    }
}

/// One decoded JSON array, as stored in a single [`ColumnType::Array`] cell.
///
/// Element nulls (explicit `null` elements whose schema has no substitute)
/// are `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue {
    Bool(Vec<Option<bool>>),
    Char(Vec<Option<char>>),
    Byte(Vec<Option<i8>>),
    Short(Vec<Option<i16>>),
    Int(Vec<Option<i32>>),
    Long(Vec<Option<i64>>),
    Float(Vec<Option<f32>>),
    Double(Vec<Option<f64>>),
    String(Vec<Option<String>>),
    BigInteger(Vec<Option<BigInt>>),
    BigDecimal(Vec<Option<BigDecimal>>),
    TimestampNanos(Vec<Option<i64>>),
    Date(Vec<Option<NaiveDate>>),
    Any(Vec<Option<Value>>),
}

impl ArrayValue {
    /// Number of elements in the stored array.
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Char(v) => v.len(),
            Self::Byte(v) => v.len(),
            Self::Short(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Long(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::String(v) => v.len(),
            Self::BigInteger(v) => v.len(),
            Self::BigDecimal(v) => v.len(),
            Self::TimestampNanos(v) => v.len(),
            Self::Date(v) => v.len(),
            Self::Any(v) => v.len(),
        }
    }

    /// Whether the stored array is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
enum CellData {
    Bool(Vec<Option<bool>>),
    Char(Vec<Option<char>>),
    Byte(Vec<Option<i8>>),
    Short(Vec<Option<i16>>),
    Int(Vec<Option<i32>>),
    Long(Vec<Option<i64>>),
    Float(Vec<Option<f32>>),
    Double(Vec<Option<f64>>),
    String(Vec<Option<String>>),
    BigInteger(Vec<Option<BigInt>>),
    BigDecimal(Vec<Option<BigDecimal>>),
    TimestampNanos(Vec<Option<i64>>),
    Date(Vec<Option<NaiveDate>>),
    Any(Vec<Option<Value>>),
    Array(Vec<Option<ArrayValue>>),
}

/// A typed, append-only output buffer for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    ty: ColumnType,
    cells: CellData,
}

macro_rules! cell_access {
    ($(($variant:ident, $ty:ty, $push:ident, $values:ident)),+ $(,)?) => {
        $(
            /// Append one cell. Panics if the column holds a different type,
            /// which can only happen on a binding the decoder did not vet.
            pub fn $push(&mut self, value: Option<$ty>) {
                match &mut self.cells {
                    CellData::$variant(cells) => cells.push(value),
                    _ => panic!(
                        "pushed {} cell into {:?} column",
                        stringify!($variant),
                        self.ty
                    ),
                }
            }

            /// Cells of the column. Panics if the column holds a different type.
            pub fn $values(&self) -> &[Option<$ty>] {
                match &self.cells {
                    CellData::$variant(cells) => cells,
                    _ => panic!(
                        "read {} cells from {:?} column",
                        stringify!($variant),
                        self.ty
                    ),
                }
            }
        )+
    };
}

impl Column {
    /// The column's type.
    pub fn column_type(&self) -> &ColumnType {
        &self.ty
    }

    /// Current number of cells.
    pub fn len(&self) -> usize {
        match &self.cells {
            CellData::Bool(v) => v.len(),
            CellData::Char(v) => v.len(),
            CellData::Byte(v) => v.len(),
            CellData::Short(v) => v.len(),
            CellData::Int(v) => v.len(),
            CellData::Long(v) => v.len(),
            CellData::Float(v) => v.len(),
            CellData::Double(v) => v.len(),
            CellData::String(v) => v.len(),
            CellData::BigInteger(v) => v.len(),
            CellData::BigDecimal(v) => v.len(),
            CellData::TimestampNanos(v) => v.len(),
            CellData::Date(v) => v.len(),
            CellData::Any(v) => v.len(),
            CellData::Array(v) => v.len(),
        }
    }

    /// Whether the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bulk-append `n` null-representation cells. Used for union
    /// not-applicable fill and missing-structure fill.
    pub fn fill_null(&mut self, n: usize) {
        match &mut self.cells {
            CellData::Bool(v) => v.resize(v.len() + n, None),
            CellData::Char(v) => v.resize(v.len() + n, None),
            CellData::Byte(v) => v.resize(v.len() + n, None),
            CellData::Short(v) => v.resize(v.len() + n, None),
            CellData::Int(v) => v.resize(v.len() + n, None),
            CellData::Float(v) => v.resize(v.len() + n, None),
            CellData::Long(v) => v.resize(v.len() + n, None),
            CellData::Double(v) => v.resize(v.len() + n, None),
            CellData::String(v) => v.resize(v.len() + n, None),
            CellData::BigInteger(v) => v.resize(v.len() + n, None),
            CellData::BigDecimal(v) => v.resize(v.len() + n, None),
            CellData::TimestampNanos(v) => v.resize(v.len() + n, None),
            CellData::Date(v) => v.resize(v.len() + n, None),
            CellData::Any(v) => v.resize(v.len() + n, None),
            CellData::Array(v) => v.resize(v.len() + n, None),
        }
    }

    cell_access! {
        (Bool, bool, push_bool, bool_values),
        (Char, char, push_char, char_values),
        (Byte, i8, push_byte, byte_values),
        (Short, i16, push_short, short_values),
        (Int, i32, push_int, int_values),
        (Long, i64, push_long, long_values),
        (Float, f32, push_float, float_values),
        (Double, f64, push_double, double_values),
        (String, String, push_string, string_values),
        (BigInteger, BigInt, push_big_integer, big_integer_values),
        (BigDecimal, BigDecimal, push_big_decimal, big_decimal_values),
        (TimestampNanos, i64, push_timestamp, timestamp_values),
        (Date, NaiveDate, push_date, date_values),
        (Any, Value, push_any, any_values),
        (Array, ArrayValue, push_array, array_values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_column_is_empty() {
        let col = ColumnType::Int.new_column();
        assert_eq!(col.len(), 0);
        assert!(col.is_empty());
        assert_eq!(col.column_type(), &ColumnType::Int);
    }

    #[test]
    fn test_push_and_read() {
        let mut col = ColumnType::Long.new_column();
        col.push_long(Some(7));
        col.push_long(None);
        assert_eq!(col.long_values(), &[Some(7), None]);
    }

    #[test]
    fn test_fill_null() {
        let mut col = ColumnType::String.new_column();
        col.push_string(Some("x".into()));
        col.fill_null(2);
        assert_eq!(col.len(), 3);
        assert_eq!(col.string_values()[1], None);
    }

    #[test]
    #[should_panic(expected = "pushed")]
    fn test_typed_push_rejects_wrong_column() {
        let mut col = ColumnType::Int.new_column();
        col.push_bool(Some(true));
    }

    #[test]
    fn test_array_column() {
        let mut col = ColumnType::Array(Box::new(ColumnType::Int)).new_column();
        col.push_array(Some(ArrayValue::Int(vec![Some(1), None])));
        assert_eq!(col.array_values()[0].as_ref().unwrap().len(), 2);
    }
}
