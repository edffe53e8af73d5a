//! Scalar schema nodes and their builders
//!
//! Every builder validates at construction; an invalid combination is a
//! configuration error raised here and never deferred to decode time.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use num_bigint::BigInt;

use crate::schema::Kinds;
use crate::{Error, Result};

pub(crate) fn check_substitutes(
    type_name: &str,
    kinds: Kinds,
    allow_missing: bool,
    has_on_null: bool,
    has_on_missing: bool,
) -> Result<()> {
    if has_on_null && !kinds.allows_null() {
        return Err(Error::schema(format!(
            "{type_name}: on_null substitute requires null in the allowed kinds"
        )));
    }
    if has_on_missing && !allow_missing {
        return Err(Error::schema(format!(
            "{type_name}: on_missing substitute requires allow_missing"
        )));
    }
    Ok(())
}

macro_rules! numeric_schema {
    (
        $(#[$doc:meta])*
        $name:ident, $builder:ident, $ty:ty, $type_name:literal,
        standard: [$($standard:ident)|+],
        strict: [$($strict:ident)|+],
        lenient: [$($lenient:ident)|+]
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            kinds: Kinds,
            allow_missing: bool,
            on_null: Option<$ty>,
            on_missing: Option<$ty>,
        }

        impl $name {
            const MASK: Kinds = Kinds::STRING
                .union(Kinds::INT)
                .union(Kinds::DECIMAL)
                .union(Kinds::NULL);

            /// Natural kinds plus null; missing permitted.
            pub fn standard() -> Self {
                Self {
                    kinds: $(Kinds::$standard)|+,
                    allow_missing: true,
                    on_null: None,
                    on_missing: None,
                }
            }

            /// Natural kinds only; null and missing rejected.
            pub fn strict() -> Self {
                Self {
                    kinds: $(Kinds::$strict)|+,
                    allow_missing: false,
                    on_null: None,
                    on_missing: None,
                }
            }

            /// Additionally coerces from strings (and decimals for integral
            /// types, truncating toward zero).
            pub fn lenient() -> Self {
                Self {
                    kinds: $(Kinds::$lenient)|+,
                    allow_missing: true,
                    on_null: None,
                    on_missing: None,
                }
            }

            pub fn builder() -> $builder {
                $builder {
                    inner: Self::standard(),
                }
            }

            pub fn kinds(&self) -> Kinds {
                self.kinds
            }

            pub fn allow_missing(&self) -> bool {
                self.allow_missing
            }

            pub fn on_null(&self) -> Option<$ty> {
                self.on_null.clone()
            }

            pub fn on_missing(&self) -> Option<$ty> {
                self.on_missing.clone()
            }
        }

        #[doc = concat!("Builder for [`", stringify!($name), "`].")]
        #[derive(Debug, Clone)]
        pub struct $builder {
            inner: $name,
        }

        impl $builder {
            pub fn kinds(mut self, kinds: Kinds) -> Self {
                self.inner.kinds = kinds;
                self
            }

            pub fn allow_missing(mut self, allow: bool) -> Self {
                self.inner.allow_missing = allow;
                self
            }

            pub fn on_null(mut self, value: $ty) -> Self {
                self.inner.on_null = Some(value);
                self
            }

            pub fn on_missing(mut self, value: $ty) -> Self {
                self.inner.on_missing = Some(value);
                self
            }

            pub fn build(self) -> Result<$name> {
                let inner = self.inner;
                inner.kinds.validate($type_name, $name::MASK)?;
                check_substitutes(
                    $type_name,
                    inner.kinds,
                    inner.allow_missing,
                    inner.on_null.is_some(),
                    inner.on_missing.is_some(),
                )?;
                Ok(inner)
            }
        }
    };
}

numeric_schema!(
    /// 8-bit signed integer column.
    ByteSchema, ByteBuilder, i8, "byte",
    standard: [INT | NULL], strict: [INT], lenient: [INT | DECIMAL | STRING | NULL]
);
numeric_schema!(
    /// 16-bit signed integer column.
    ShortSchema, ShortBuilder, i16, "short",
    standard: [INT | NULL], strict: [INT], lenient: [INT | DECIMAL | STRING | NULL]
);
numeric_schema!(
    /// 32-bit signed integer column.
    IntSchema, IntBuilder, i32, "int",
    standard: [INT | NULL], strict: [INT], lenient: [INT | DECIMAL | STRING | NULL]
);
numeric_schema!(
    /// 64-bit signed integer column.
    LongSchema, LongBuilder, i64, "long",
    standard: [INT | NULL], strict: [INT], lenient: [INT | DECIMAL | STRING | NULL]
);
numeric_schema!(
    /// 32-bit floating point column.
    FloatSchema, FloatBuilder, f32, "float",
    standard: [INT | DECIMAL | NULL], strict: [INT | DECIMAL],
    lenient: [INT | DECIMAL | STRING | NULL]
);
numeric_schema!(
    /// 64-bit floating point column.
    DoubleSchema, DoubleBuilder, f64, "double",
    standard: [INT | DECIMAL | NULL], strict: [INT | DECIMAL],
    lenient: [INT | DECIMAL | STRING | NULL]
);
numeric_schema!(
    /// Arbitrary-precision integer column.
    BigIntegerSchema, BigIntegerBuilder, BigInt, "biginteger",
    standard: [INT | NULL], strict: [INT], lenient: [INT | DECIMAL | STRING | NULL]
);
numeric_schema!(
    /// Arbitrary-precision decimal column.
    BigDecimalSchema, BigDecimalBuilder, BigDecimal, "bigdecimal",
    standard: [INT | DECIMAL | NULL], strict: [INT | DECIMAL],
    lenient: [INT | DECIMAL | STRING | NULL]
);

/// String column; can also coerce number and boolean tokens to text.
#[derive(Debug, Clone)]
pub struct StringSchema {
    kinds: Kinds,
    allow_missing: bool,
    on_null: Option<String>,
    on_missing: Option<String>,
}

impl StringSchema {
    const MASK: Kinds = Kinds::STRING
        .union(Kinds::INT)
        .union(Kinds::DECIMAL)
        .union(Kinds::BOOL)
        .union(Kinds::NULL);

    pub fn standard() -> Self {
        Self {
            kinds: Kinds::STRING | Kinds::NULL,
            allow_missing: true,
            on_null: None,
            on_missing: None,
        }
    }

    pub fn strict() -> Self {
        Self {
            kinds: Kinds::STRING,
            allow_missing: false,
            on_null: None,
            on_missing: None,
        }
    }

    /// Accepts numbers and booleans, preserving their literal text.
    pub fn lenient() -> Self {
        Self {
            kinds: Self::MASK,
            allow_missing: true,
            on_null: None,
            on_missing: None,
        }
    }

    pub fn builder() -> StringBuilder {
        StringBuilder {
            inner: Self::standard(),
        }
    }

    pub fn kinds(&self) -> Kinds {
        self.kinds
    }

    pub fn allow_missing(&self) -> bool {
        self.allow_missing
    }

    pub fn on_null(&self) -> Option<String> {
        self.on_null.clone()
    }

    pub fn on_missing(&self) -> Option<String> {
        self.on_missing.clone()
    }
}

/// Builder for [`StringSchema`].
#[derive(Debug, Clone)]
pub struct StringBuilder {
    inner: StringSchema,
}

impl StringBuilder {
    pub fn kinds(mut self, kinds: Kinds) -> Self {
        self.inner.kinds = kinds;
        self
    }

    pub fn allow_missing(mut self, allow: bool) -> Self {
        self.inner.allow_missing = allow;
        self
    }

    pub fn on_null(mut self, value: impl Into<String>) -> Self {
        self.inner.on_null = Some(value.into());
        self
    }

    pub fn on_missing(mut self, value: impl Into<String>) -> Self {
        self.inner.on_missing = Some(value.into());
        self
    }

    pub fn build(self) -> Result<StringSchema> {
        let inner = self.inner;
        inner.kinds.validate("string", StringSchema::MASK)?;
        check_substitutes(
            "string",
            inner.kinds,
            inner.allow_missing,
            inner.on_null.is_some(),
            inner.on_missing.is_some(),
        )?;
        Ok(inner)
    }
}

/// Boolean column; can also coerce `"true"`/`"false"` strings.
#[derive(Debug, Clone)]
pub struct BoolSchema {
    kinds: Kinds,
    allow_missing: bool,
    on_null: Option<bool>,
    on_missing: Option<bool>,
}

impl BoolSchema {
    const MASK: Kinds = Kinds::BOOL.union(Kinds::STRING).union(Kinds::NULL);

    pub fn standard() -> Self {
        Self {
            kinds: Kinds::BOOL | Kinds::NULL,
            allow_missing: true,
            on_null: None,
            on_missing: None,
        }
    }

    pub fn strict() -> Self {
        Self {
            kinds: Kinds::BOOL,
            allow_missing: false,
            on_null: None,
            on_missing: None,
        }
    }

    pub fn lenient() -> Self {
        Self {
            kinds: Self::MASK,
            allow_missing: true,
            on_null: None,
            on_missing: None,
        }
    }

    pub fn builder() -> BoolBuilder {
        BoolBuilder {
            inner: Self::standard(),
        }
    }

    pub fn kinds(&self) -> Kinds {
        self.kinds
    }

    pub fn allow_missing(&self) -> bool {
        self.allow_missing
    }

    pub fn on_null(&self) -> Option<bool> {
        self.on_null
    }

    pub fn on_missing(&self) -> Option<bool> {
        self.on_missing
    }
}

/// Builder for [`BoolSchema`].
#[derive(Debug, Clone)]
pub struct BoolBuilder {
    inner: BoolSchema,
}

impl BoolBuilder {
    pub fn kinds(mut self, kinds: Kinds) -> Self {
        self.inner.kinds = kinds;
        self
    }

    pub fn allow_missing(mut self, allow: bool) -> Self {
        self.inner.allow_missing = allow;
        self
    }

    pub fn on_null(mut self, value: bool) -> Self {
        self.inner.on_null = Some(value);
        self
    }

    pub fn on_missing(mut self, value: bool) -> Self {
        self.inner.on_missing = Some(value);
        self
    }

    pub fn build(self) -> Result<BoolSchema> {
        let inner = self.inner;
        inner.kinds.validate("bool", BoolSchema::MASK)?;
        check_substitutes(
            "bool",
            inner.kinds,
            inner.allow_missing,
            inner.on_null.is_some(),
            inner.on_missing.is_some(),
        )?;
        Ok(inner)
    }
}

/// Single-character column decoded from one-character strings.
#[derive(Debug, Clone)]
pub struct CharSchema {
    kinds: Kinds,
    allow_missing: bool,
    on_null: Option<char>,
    on_missing: Option<char>,
}

impl CharSchema {
    const MASK: Kinds = Kinds::STRING.union(Kinds::NULL);

    pub fn standard() -> Self {
        Self {
            kinds: Kinds::STRING | Kinds::NULL,
            allow_missing: true,
            on_null: None,
            on_missing: None,
        }
    }

    pub fn strict() -> Self {
        Self {
            kinds: Kinds::STRING,
            allow_missing: false,
            on_null: None,
            on_missing: None,
        }
    }

    pub fn builder() -> CharBuilder {
        CharBuilder {
            inner: Self::standard(),
        }
    }

    pub fn kinds(&self) -> Kinds {
        self.kinds
    }

    pub fn allow_missing(&self) -> bool {
        self.allow_missing
    }

    pub fn on_null(&self) -> Option<char> {
        self.on_null
    }

    pub fn on_missing(&self) -> Option<char> {
        self.on_missing
    }
}

/// Builder for [`CharSchema`].
#[derive(Debug, Clone)]
pub struct CharBuilder {
    inner: CharSchema,
}

impl CharBuilder {
    pub fn kinds(mut self, kinds: Kinds) -> Self {
        self.inner.kinds = kinds;
        self
    }

    pub fn allow_missing(mut self, allow: bool) -> Self {
        self.inner.allow_missing = allow;
        self
    }

    pub fn on_null(mut self, value: char) -> Self {
        self.inner.on_null = Some(value);
        self
    }

    pub fn on_missing(mut self, value: char) -> Self {
        self.inner.on_missing = Some(value);
        self
    }

    pub fn build(self) -> Result<CharSchema> {
        let inner = self.inner;
        inner.kinds.validate("char", CharSchema::MASK)?;
        check_substitutes(
            "char",
            inner.kinds,
            inner.allow_missing,
            inner.on_null.is_some(),
            inner.on_missing.is_some(),
        )?;
        Ok(inner)
    }
}

/// RFC-formatted timestamp column, producing epoch nanoseconds.
#[derive(Debug, Clone)]
pub struct InstantSchema {
    kinds: Kinds,
    allow_missing: bool,
    /// chrono format string; RFC 3339 when unset
    format: Option<String>,
    on_null: Option<i64>,
    on_missing: Option<i64>,
}

impl InstantSchema {
    const MASK: Kinds = Kinds::STRING.union(Kinds::NULL);

    pub fn standard() -> Self {
        Self {
            kinds: Kinds::STRING | Kinds::NULL,
            allow_missing: true,
            format: None,
            on_null: None,
            on_missing: None,
        }
    }

    pub fn strict() -> Self {
        Self {
            kinds: Kinds::STRING,
            allow_missing: false,
            format: None,
            on_null: None,
            on_missing: None,
        }
    }

    pub fn builder() -> InstantBuilder {
        InstantBuilder {
            inner: Self::standard(),
        }
    }

    pub fn kinds(&self) -> Kinds {
        self.kinds
    }

    pub fn allow_missing(&self) -> bool {
        self.allow_missing
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// Substitute epoch-nanosecond value for `null`.
    pub fn on_null(&self) -> Option<i64> {
        self.on_null
    }

    /// Substitute epoch-nanosecond value for missing.
    pub fn on_missing(&self) -> Option<i64> {
        self.on_missing
    }
}

/// Builder for [`InstantSchema`].
#[derive(Debug, Clone)]
pub struct InstantBuilder {
    inner: InstantSchema,
}

impl InstantBuilder {
    pub fn kinds(mut self, kinds: Kinds) -> Self {
        self.inner.kinds = kinds;
        self
    }

    pub fn allow_missing(mut self, allow: bool) -> Self {
        self.inner.allow_missing = allow;
        self
    }

    /// Parse through a chrono format string (naive datetimes are taken as UTC)
    /// instead of RFC 3339.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.inner.format = Some(format.into());
        self
    }

    pub fn on_null(mut self, epoch_nanos: i64) -> Self {
        self.inner.on_null = Some(epoch_nanos);
        self
    }

    pub fn on_missing(mut self, epoch_nanos: i64) -> Self {
        self.inner.on_missing = Some(epoch_nanos);
        self
    }

    pub fn build(self) -> Result<InstantSchema> {
        let inner = self.inner;
        inner.kinds.validate("instant", InstantSchema::MASK)?;
        check_substitutes(
            "instant",
            inner.kinds,
            inner.allow_missing,
            inner.on_null.is_some(),
            inner.on_missing.is_some(),
        )?;
        Ok(inner)
    }
}

/// Epoch unit for [`InstantNumberSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochUnit {
    Seconds,
    Millis,
    Micros,
    Nanos,
}

impl EpochUnit {
    /// Power-of-ten multiplier to epoch nanoseconds.
    pub fn nanos_multiplier(self) -> i64 {
        match self {
            Self::Seconds => 1_000_000_000,
            Self::Millis => 1_000_000,
            Self::Micros => 1_000,
            Self::Nanos => 1,
        }
    }
}

/// Timestamp column decoded from an epoch number, producing epoch nanoseconds.
#[derive(Debug, Clone)]
pub struct InstantNumberSchema {
    kinds: Kinds,
    allow_missing: bool,
    unit: EpochUnit,
    on_null: Option<i64>,
    on_missing: Option<i64>,
}

impl InstantNumberSchema {
    const MASK: Kinds = Kinds::STRING
        .union(Kinds::INT)
        .union(Kinds::DECIMAL)
        .union(Kinds::NULL);

    pub fn standard(unit: EpochUnit) -> Self {
        Self {
            kinds: Kinds::INT | Kinds::NULL,
            allow_missing: true,
            unit,
            on_null: None,
            on_missing: None,
        }
    }

    pub fn strict(unit: EpochUnit) -> Self {
        Self {
            kinds: Kinds::INT,
            allow_missing: false,
            unit,
            on_null: None,
            on_missing: None,
        }
    }

    /// Accepts fractional epochs and numeric strings.
    pub fn lenient(unit: EpochUnit) -> Self {
        Self {
            kinds: Self::MASK,
            allow_missing: true,
            unit,
            on_null: None,
            on_missing: None,
        }
    }

    pub fn builder(unit: EpochUnit) -> InstantNumberBuilder {
        InstantNumberBuilder {
            inner: Self::standard(unit),
        }
    }

    pub fn kinds(&self) -> Kinds {
        self.kinds
    }

    pub fn allow_missing(&self) -> bool {
        self.allow_missing
    }

    pub fn unit(&self) -> EpochUnit {
        self.unit
    }

    pub fn on_null(&self) -> Option<i64> {
        self.on_null
    }

    pub fn on_missing(&self) -> Option<i64> {
        self.on_missing
    }
}

/// Builder for [`InstantNumberSchema`].
#[derive(Debug, Clone)]
pub struct InstantNumberBuilder {
    inner: InstantNumberSchema,
}

impl InstantNumberBuilder {
    pub fn kinds(mut self, kinds: Kinds) -> Self {
        self.inner.kinds = kinds;
        self
    }

    pub fn allow_missing(mut self, allow: bool) -> Self {
        self.inner.allow_missing = allow;
        self
    }

    pub fn on_null(mut self, epoch_nanos: i64) -> Self {
        self.inner.on_null = Some(epoch_nanos);
        self
    }

    pub fn on_missing(mut self, epoch_nanos: i64) -> Self {
        self.inner.on_missing = Some(epoch_nanos);
        self
    }

    pub fn build(self) -> Result<InstantNumberSchema> {
        let inner = self.inner;
        inner
            .kinds
            .validate("instant-number", InstantNumberSchema::MASK)?;
        check_substitutes(
            "instant-number",
            inner.kinds,
            inner.allow_missing,
            inner.on_null.is_some(),
            inner.on_missing.is_some(),
        )?;
        Ok(inner)
    }
}

/// Calendar date column decoded from formatted strings.
#[derive(Debug, Clone)]
pub struct LocalDateSchema {
    kinds: Kinds,
    allow_missing: bool,
    /// chrono format string; `%Y-%m-%d` when unset
    format: Option<String>,
    on_null: Option<NaiveDate>,
    on_missing: Option<NaiveDate>,
}

impl LocalDateSchema {
    const MASK: Kinds = Kinds::STRING.union(Kinds::NULL);

    pub fn standard() -> Self {
        Self {
            kinds: Kinds::STRING | Kinds::NULL,
            allow_missing: true,
            format: None,
            on_null: None,
            on_missing: None,
        }
    }

    pub fn strict() -> Self {
        Self {
            kinds: Kinds::STRING,
            allow_missing: false,
            format: None,
            on_null: None,
            on_missing: None,
        }
    }

    pub fn builder() -> LocalDateBuilder {
        LocalDateBuilder {
            inner: Self::standard(),
        }
    }

    pub fn kinds(&self) -> Kinds {
        self.kinds
    }

    pub fn allow_missing(&self) -> bool {
        self.allow_missing
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn on_null(&self) -> Option<NaiveDate> {
        self.on_null
    }

    pub fn on_missing(&self) -> Option<NaiveDate> {
        self.on_missing
    }
}

/// Builder for [`LocalDateSchema`].
#[derive(Debug, Clone)]
pub struct LocalDateBuilder {
    inner: LocalDateSchema,
}

impl LocalDateBuilder {
    pub fn kinds(mut self, kinds: Kinds) -> Self {
        self.inner.kinds = kinds;
        self
    }

    pub fn allow_missing(mut self, allow: bool) -> Self {
        self.inner.allow_missing = allow;
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.inner.format = Some(format.into());
        self
    }

    pub fn on_null(mut self, value: NaiveDate) -> Self {
        self.inner.on_null = Some(value);
        self
    }

    pub fn on_missing(mut self, value: NaiveDate) -> Self {
        self.inner.on_missing = Some(value);
        self
    }

    pub fn build(self) -> Result<LocalDateSchema> {
        let inner = self.inner;
        inner.kinds.validate("localdate", LocalDateSchema::MASK)?;
        check_substitutes(
            "localdate",
            inner.kinds,
            inner.allow_missing,
            inner.on_null.is_some(),
            inner.on_missing.is_some(),
        )?;
        Ok(inner)
    }
}

/// Consume-and-discard node producing no output columns.
#[derive(Debug, Clone)]
pub struct SkipSchema {
    kinds: Kinds,
    allow_missing: bool,
}

impl SkipSchema {
    /// Skips any value, including null and missing.
    pub fn standard() -> Self {
        Self {
            kinds: Kinds::all(),
            allow_missing: true,
        }
    }

    pub fn builder() -> SkipBuilder {
        SkipBuilder {
            inner: Self::standard(),
        }
    }

    pub fn kinds(&self) -> Kinds {
        self.kinds
    }

    pub fn allow_missing(&self) -> bool {
        self.allow_missing
    }
}

/// Builder for [`SkipSchema`].
#[derive(Debug, Clone)]
pub struct SkipBuilder {
    inner: SkipSchema,
}

impl SkipBuilder {
    pub fn kinds(mut self, kinds: Kinds) -> Self {
        self.inner.kinds = kinds;
        self
    }

    pub fn allow_missing(mut self, allow: bool) -> Self {
        self.inner.allow_missing = allow;
        self
    }

    pub fn build(self) -> Result<SkipSchema> {
        let inner = self.inner;
        inner.kinds.validate("skip", Kinds::all())?;
        Ok(inner)
    }
}

/// Opaque passthrough node capturing one value as JSON.
///
/// Accepts every value kind; missing is stored as a null cell.
#[derive(Debug, Clone, Default)]
pub struct AnySchema {}

impl AnySchema {
    pub fn standard() -> Self {
        Self {}
    }

    pub fn kinds(&self) -> Kinds {
        Kinds::all()
    }

    pub fn allow_missing(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_standard_defaults() {
        let schema = IntSchema::standard();
        assert_eq!(schema.kinds(), Kinds::INT | Kinds::NULL);
        assert!(schema.allow_missing());
        assert_eq!(schema.on_null(), None);
    }

    #[test]
    fn test_on_null_requires_null_kind() {
        let err = IntSchema::builder()
            .kinds(Kinds::INT)
            .on_null(-1)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("on_null"), "{err}");
    }

    #[test]
    fn test_on_missing_requires_allow_missing() {
        let err = LongSchema::builder()
            .allow_missing(false)
            .on_missing(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("on_missing"), "{err}");
    }

    #[test]
    fn test_scalar_rejects_object_kind() {
        let err = DoubleSchema::builder()
            .kinds(Kinds::OBJECT | Kinds::INT)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_bool_lenient_accepts_strings() {
        let schema = BoolSchema::lenient();
        assert!(schema.kinds().contains(Kinds::STRING));
    }

    #[test]
    fn test_epoch_unit_multipliers() {
        assert_eq!(EpochUnit::Seconds.nanos_multiplier(), 1_000_000_000);
        assert_eq!(EpochUnit::Nanos.nanos_multiplier(), 1);
    }

    #[test]
    fn test_instant_number_decimal_requires_int() {
        let err = InstantNumberSchema::builder(EpochUnit::Millis)
            .kinds(Kinds::DECIMAL | Kinds::NULL)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }
}
