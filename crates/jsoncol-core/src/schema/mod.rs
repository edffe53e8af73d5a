//! Declarative schema model
//!
//! A [`Schema`] is an immutable tree of pre-validated nodes describing the
//! expected JSON shape and the coercions to apply. Every node is built
//! through its own builder (or a `standard()`/`strict()`/`lenient()`
//! shorthand) and every invariant is checked at construction; the compiler
//! and processors can assume a well-formed tree.

mod composite;
mod kinds;
mod scalars;

pub use composite::{
    ArrayBuilder, ArraySchema, ObjectBuilder, ObjectField, ObjectKvBuilder, ObjectKvSchema,
    ObjectSchema, RepeatedBehavior, TupleBuilder, TupleSchema, TypedObjectBuilder,
    TypedObjectSchema,
};
pub use kinds::Kinds;
pub use scalars::{
    AnySchema, BigDecimalBuilder, BigDecimalSchema, BigIntegerBuilder, BigIntegerSchema,
    BoolBuilder, BoolSchema, ByteBuilder, ByteSchema, CharBuilder, CharSchema, DoubleBuilder,
    DoubleSchema, EpochUnit, FloatBuilder, FloatSchema, InstantBuilder, InstantNumberBuilder,
    InstantNumberSchema, InstantSchema, IntBuilder, IntSchema, LocalDateBuilder, LocalDateSchema,
    LongBuilder, LongSchema, ShortBuilder, ShortSchema, SkipBuilder, SkipSchema, StringBuilder,
    StringSchema,
};

/// One node of the declarative type tree.
#[derive(Debug, Clone)]
pub enum Schema {
    String(StringSchema),
    Bool(BoolSchema),
    Char(CharSchema),
    Byte(ByteSchema),
    Short(ShortSchema),
    Int(IntSchema),
    Long(LongSchema),
    Float(FloatSchema),
    Double(DoubleSchema),
    BigInteger(BigIntegerSchema),
    BigDecimal(BigDecimalSchema),
    Instant(InstantSchema),
    InstantNumber(InstantNumberSchema),
    LocalDate(LocalDateSchema),
    Object(ObjectSchema),
    ObjectKv(ObjectKvSchema),
    Array(ArraySchema),
    Tuple(TupleSchema),
    TypedObject(TypedObjectSchema),
    Skip(SkipSchema),
    Any(AnySchema),
}

impl Schema {
    /// JSON value kinds this node accepts.
    pub fn kinds(&self) -> Kinds {
        match self {
            Self::String(s) => s.kinds(),
            Self::Bool(s) => s.kinds(),
            Self::Char(s) => s.kinds(),
            Self::Byte(s) => s.kinds(),
            Self::Short(s) => s.kinds(),
            Self::Int(s) => s.kinds(),
            Self::Long(s) => s.kinds(),
            Self::Float(s) => s.kinds(),
            Self::Double(s) => s.kinds(),
            Self::BigInteger(s) => s.kinds(),
            Self::BigDecimal(s) => s.kinds(),
            Self::Instant(s) => s.kinds(),
            Self::InstantNumber(s) => s.kinds(),
            Self::LocalDate(s) => s.kinds(),
            Self::Object(s) => s.kinds(),
            Self::ObjectKv(s) => s.kinds(),
            Self::Array(s) => s.kinds(),
            Self::Tuple(s) => s.kinds(),
            Self::TypedObject(s) => s.kinds(),
            Self::Skip(s) => s.kinds(),
            Self::Any(s) => s.kinds(),
        }
    }

    /// Whether this node tolerates an absent occurrence.
    pub fn allow_missing(&self) -> bool {
        match self {
            Self::String(s) => s.allow_missing(),
            Self::Bool(s) => s.allow_missing(),
            Self::Char(s) => s.allow_missing(),
            Self::Byte(s) => s.allow_missing(),
            Self::Short(s) => s.allow_missing(),
            Self::Int(s) => s.allow_missing(),
            Self::Long(s) => s.allow_missing(),
            Self::Float(s) => s.allow_missing(),
            Self::Double(s) => s.allow_missing(),
            Self::BigInteger(s) => s.allow_missing(),
            Self::BigDecimal(s) => s.allow_missing(),
            Self::Instant(s) => s.allow_missing(),
            Self::InstantNumber(s) => s.allow_missing(),
            Self::LocalDate(s) => s.allow_missing(),
            Self::Object(s) => s.allow_missing(),
            Self::ObjectKv(s) => s.allow_missing(),
            Self::Array(s) => s.allow_missing(),
            Self::Tuple(s) => s.allow_missing(),
            Self::TypedObject(s) => s.allow_missing(),
            Self::Skip(s) => s.allow_missing(),
            Self::Any(s) => s.allow_missing(),
        }
    }

    /// Whether this node fans out to child schemas.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            Self::Object(_)
                | Self::ObjectKv(_)
                | Self::Array(_)
                | Self::Tuple(_)
                | Self::TypedObject(_)
        )
    }
}

macro_rules! schema_from {
    ($($variant:ident($node:ty)),+ $(,)?) => {
        $(
            impl From<$node> for Schema {
                fn from(node: $node) -> Self {
                    Self::$variant(node)
                }
            }
        )+
    };
}

schema_from! {
    String(StringSchema),
    Bool(BoolSchema),
    Char(CharSchema),
    Byte(ByteSchema),
    Short(ShortSchema),
    Int(IntSchema),
    Long(LongSchema),
    Float(FloatSchema),
    Double(DoubleSchema),
    BigInteger(BigIntegerSchema),
    BigDecimal(BigDecimalSchema),
    Instant(InstantSchema),
    InstantNumber(InstantNumberSchema),
    LocalDate(LocalDateSchema),
    Object(ObjectSchema),
    ObjectKv(ObjectKvSchema),
    Array(ArraySchema),
    Tuple(TupleSchema),
    TypedObject(TypedObjectSchema),
    Skip(SkipSchema),
    Any(AnySchema),
}
