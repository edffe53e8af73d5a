//! Composite schema nodes: objects, key/value maps, arrays, tuples, and
//! discriminated unions.

use std::collections::HashSet;

use crate::schema::{Kinds, Schema};
use crate::{Error, Result};

/// Policy for a field that appears more than once in one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatedBehavior {
    /// Keep the first occurrence, skip later ones wholesale.
    #[default]
    UseFirst,
    /// Structural error.
    Error,
}

/// One declared field of an [`ObjectSchema`].
#[derive(Debug, Clone)]
pub struct ObjectField {
    name: String,
    schema: Schema,
    aliases: Vec<String>,
    case_insensitive: bool,
    repeated: RepeatedBehavior,
}

impl ObjectField {
    pub fn new(name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            aliases: Vec::new(),
            case_insensitive: false,
            repeated: RepeatedBehavior::default(),
        }
    }

    /// Add an alternate JSON name that selects this field.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Match the name and aliases ignoring ASCII case.
    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.case_insensitive = yes;
        self
    }

    pub fn on_repeated(mut self, behavior: RepeatedBehavior) -> Self {
        self.repeated = behavior;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn repeated(&self) -> RepeatedBehavior {
        self.repeated
    }

    /// Whether a JSON field name selects this field.
    pub fn matches(&self, name: &str) -> bool {
        if self.case_insensitive {
            self.name.eq_ignore_ascii_case(name)
                || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
        } else {
            self.name == name || self.aliases.iter().any(|a| a == name)
        }
    }

    fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Reject name/alias overlap across fields. When either side of a pair is
/// case-insensitive the comparison folds ASCII case.
fn check_field_overlap(context: &str, fields: &[ObjectField]) -> Result<()> {
    let names: Vec<(&str, bool)> = fields
        .iter()
        .flat_map(|f| f.all_names().map(move |n| (n, f.is_case_insensitive())))
        .collect();
    for (i, (a, a_folded)) in names.iter().enumerate() {
        for (b, b_folded) in &names[i + 1..] {
            if a == b {
                return Err(Error::schema(format!(
                    "{context}: field name or alias {a:?} declared twice"
                )));
            }
            if (*a_folded || *b_folded) && a.eq_ignore_ascii_case(b) {
                return Err(Error::schema(format!(
                    "{context}: field names {a:?} and {b:?} collide under \
                     case-insensitive matching"
                )));
            }
        }
    }
    Ok(())
}

/// JSON object with a fixed set of named fields.
#[derive(Debug, Clone)]
pub struct ObjectSchema {
    fields: Vec<ObjectField>,
    allow_unknown_fields: bool,
    kinds: Kinds,
    allow_missing: bool,
}

impl ObjectSchema {
    const MASK: Kinds = Kinds::OBJECT.union(Kinds::NULL);

    /// Unknown fields skipped; null and missing treated as the empty object.
    pub fn standard(fields: Vec<ObjectField>) -> Result<Self> {
        Self::builder().fields(fields).build()
    }

    /// Unknown fields, null and missing all rejected.
    pub fn strict(fields: Vec<ObjectField>) -> Result<Self> {
        Self::builder()
            .fields(fields)
            .allow_unknown_fields(false)
            .kinds(Kinds::OBJECT)
            .allow_missing(false)
            .build()
    }

    pub fn builder() -> ObjectBuilder {
        ObjectBuilder {
            fields: Vec::new(),
            allow_unknown_fields: true,
            kinds: Self::MASK,
            allow_missing: true,
        }
    }

    pub fn fields(&self) -> &[ObjectField] {
        &self.fields
    }

    pub fn allow_unknown_fields(&self) -> bool {
        self.allow_unknown_fields
    }

    pub fn kinds(&self) -> Kinds {
        self.kinds
    }

    pub fn allow_missing(&self) -> bool {
        self.allow_missing
    }
}

/// Builder for [`ObjectSchema`].
#[derive(Debug, Clone)]
pub struct ObjectBuilder {
    fields: Vec<ObjectField>,
    allow_unknown_fields: bool,
    kinds: Kinds,
    allow_missing: bool,
}

impl ObjectBuilder {
    pub fn field(mut self, field: ObjectField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: Vec<ObjectField>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn allow_unknown_fields(mut self, allow: bool) -> Self {
        self.allow_unknown_fields = allow;
        self
    }

    pub fn kinds(mut self, kinds: Kinds) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn allow_missing(mut self, allow: bool) -> Self {
        self.allow_missing = allow;
        self
    }

    pub fn build(self) -> Result<ObjectSchema> {
        self.kinds.validate("object", ObjectSchema::MASK)?;
        check_field_overlap("object", &self.fields)?;
        Ok(ObjectSchema {
            fields: self.fields,
            allow_unknown_fields: self.allow_unknown_fields,
            kinds: self.kinds,
            allow_missing: self.allow_missing,
        })
    }
}

/// Homogeneous key→value map decoded as paired key and value sequences.
#[derive(Debug, Clone)]
pub struct ObjectKvSchema {
    key: Box<Schema>,
    value: Box<Schema>,
    kinds: Kinds,
    allow_missing: bool,
}

impl ObjectKvSchema {
    const MASK: Kinds = Kinds::OBJECT.union(Kinds::NULL);

    /// String keys; null/missing map yields zero-length sequences.
    pub fn standard(value: impl Into<Schema>) -> Result<Self> {
        Self::builder().value(value).build()
    }

    pub fn builder() -> ObjectKvBuilder {
        ObjectKvBuilder {
            key: None,
            value: None,
            kinds: Self::MASK,
            allow_missing: true,
        }
    }

    pub fn key(&self) -> &Schema {
        &self.key
    }

    pub fn value(&self) -> &Schema {
        &self.value
    }

    pub fn kinds(&self) -> Kinds {
        self.kinds
    }

    pub fn allow_missing(&self) -> bool {
        self.allow_missing
    }
}

/// Builder for [`ObjectKvSchema`].
#[derive(Debug, Clone)]
pub struct ObjectKvBuilder {
    key: Option<Schema>,
    value: Option<Schema>,
    kinds: Kinds,
    allow_missing: bool,
}

impl ObjectKvBuilder {
    pub fn key(mut self, key: impl Into<Schema>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn value(mut self, value: impl Into<Schema>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn kinds(mut self, kinds: Kinds) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn allow_missing(mut self, allow: bool) -> Self {
        self.allow_missing = allow;
        self
    }

    pub fn build(self) -> Result<ObjectKvSchema> {
        self.kinds.validate("object-kv", ObjectKvSchema::MASK)?;
        let key = self
            .key
            .unwrap_or_else(|| Schema::String(crate::schema::StringSchema::standard()));
        if key.is_composite() {
            return Err(Error::schema(
                "object-kv: key schema must be a scalar type",
            ));
        }
        if !key.kinds().contains(Kinds::STRING) {
            return Err(Error::schema("object-kv: key schema must allow strings"));
        }
        let value = self
            .value
            .ok_or_else(|| Error::schema("object-kv: value schema is required"))?;
        Ok(ObjectKvSchema {
            key: Box::new(key),
            value: Box::new(value),
            kinds: self.kinds,
            allow_missing: self.allow_missing,
        })
    }
}

/// Homogeneous repeated element.
#[derive(Debug, Clone)]
pub struct ArraySchema {
    element: Box<Schema>,
    kinds: Kinds,
    allow_missing: bool,
}

impl ArraySchema {
    const MASK: Kinds = Kinds::ARRAY.union(Kinds::NULL);

    /// Null/missing array decodes as a zero-length array.
    pub fn standard(element: impl Into<Schema>) -> Result<Self> {
        Self::builder().element(element).build()
    }

    pub fn builder() -> ArrayBuilder {
        ArrayBuilder {
            element: None,
            kinds: Self::MASK,
            allow_missing: true,
        }
    }

    pub fn element(&self) -> &Schema {
        &self.element
    }

    pub fn kinds(&self) -> Kinds {
        self.kinds
    }

    pub fn allow_missing(&self) -> bool {
        self.allow_missing
    }
}

/// Builder for [`ArraySchema`].
#[derive(Debug, Clone)]
pub struct ArrayBuilder {
    element: Option<Schema>,
    kinds: Kinds,
    allow_missing: bool,
}

impl ArrayBuilder {
    pub fn element(mut self, element: impl Into<Schema>) -> Self {
        self.element = Some(element.into());
        self
    }

    pub fn kinds(mut self, kinds: Kinds) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn allow_missing(mut self, allow: bool) -> Self {
        self.allow_missing = allow;
        self
    }

    pub fn build(self) -> Result<ArraySchema> {
        self.kinds.validate("array", ArraySchema::MASK)?;
        let element = self
            .element
            .ok_or_else(|| Error::schema("array: element schema is required"))?;
        Ok(ArraySchema {
            element: Box::new(element),
            kinds: self.kinds,
            allow_missing: self.allow_missing,
        })
    }
}

/// Fixed-arity heterogeneous positional array.
///
/// Extra elements beyond the declared arity are consumed and ignored;
/// under-length arrays are a structural error.
#[derive(Debug, Clone)]
pub struct TupleSchema {
    items: Vec<(String, Schema)>,
    kinds: Kinds,
    allow_missing: bool,
}

impl TupleSchema {
    const MASK: Kinds = Kinds::ARRAY.union(Kinds::NULL);

    pub fn standard(items: impl IntoIterator<Item = Schema>) -> Result<Self> {
        let mut builder = Self::builder();
        for item in items {
            builder = builder.item(item);
        }
        builder.build()
    }

    pub fn builder() -> TupleBuilder {
        TupleBuilder {
            items: Vec::new(),
            kinds: Self::MASK,
            allow_missing: true,
        }
    }

    /// Positional (label, schema) pairs; unlabeled positions use their
    /// decimal index.
    pub fn items(&self) -> &[(String, Schema)] {
        &self.items
    }

    pub fn kinds(&self) -> Kinds {
        self.kinds
    }

    pub fn allow_missing(&self) -> bool {
        self.allow_missing
    }
}

/// Builder for [`TupleSchema`].
#[derive(Debug, Clone)]
pub struct TupleBuilder {
    items: Vec<(String, Schema)>,
    kinds: Kinds,
    allow_missing: bool,
}

impl TupleBuilder {
    /// Append a position labeled with its decimal index.
    pub fn item(mut self, schema: impl Into<Schema>) -> Self {
        let label = self.items.len().to_string();
        self.items.push((label, schema.into()));
        self
    }

    /// Append a position with an explicit label.
    pub fn named_item(mut self, label: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.items.push((label.into(), schema.into()));
        self
    }

    pub fn kinds(mut self, kinds: Kinds) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn allow_missing(mut self, allow: bool) -> Self {
        self.allow_missing = allow;
        self
    }

    pub fn build(self) -> Result<TupleSchema> {
        self.kinds.validate("tuple", TupleSchema::MASK)?;
        if self.items.is_empty() {
            return Err(Error::schema("tuple: at least one position is required"));
        }
        let mut labels = HashSet::new();
        for (label, _) in &self.items {
            if !labels.insert(label.as_str()) {
                return Err(Error::schema(format!(
                    "tuple: position label {label:?} declared twice"
                )));
            }
        }
        Ok(TupleSchema {
            items: self.items,
            kinds: self.kinds,
            allow_missing: self.allow_missing,
        })
    }
}

/// Discriminated union keyed by a type-tag field.
///
/// The tag field must be the first field of the incoming object. Shared
/// fields are decoded for every known tag; each variant's own fields fill
/// only when its tag is selected, with every other variant's columns
/// receiving a not-applicable (null) fill for that row.
#[derive(Debug, Clone)]
pub struct TypedObjectSchema {
    tag_field: String,
    shared: Vec<ObjectField>,
    variants: Vec<(String, ObjectSchema)>,
    allow_unknown_tags: bool,
    kinds: Kinds,
    allow_missing: bool,
}

impl TypedObjectSchema {
    const MASK: Kinds = Kinds::OBJECT.union(Kinds::NULL);

    pub fn builder(tag_field: impl Into<String>) -> TypedObjectBuilder {
        TypedObjectBuilder {
            tag_field: tag_field.into(),
            shared: Vec::new(),
            variants: Vec::new(),
            allow_unknown_tags: false,
            kinds: Self::MASK,
            allow_missing: true,
        }
    }

    pub fn tag_field(&self) -> &str {
        &self.tag_field
    }

    pub fn shared_fields(&self) -> &[ObjectField] {
        &self.shared
    }

    pub fn variants(&self) -> &[(String, ObjectSchema)] {
        &self.variants
    }

    pub fn allow_unknown_tags(&self) -> bool {
        self.allow_unknown_tags
    }

    pub fn kinds(&self) -> Kinds {
        self.kinds
    }

    pub fn allow_missing(&self) -> bool {
        self.allow_missing
    }
}

/// Builder for [`TypedObjectSchema`].
#[derive(Debug, Clone)]
pub struct TypedObjectBuilder {
    tag_field: String,
    shared: Vec<ObjectField>,
    variants: Vec<(String, ObjectSchema)>,
    allow_unknown_tags: bool,
    kinds: Kinds,
    allow_missing: bool,
}

impl TypedObjectBuilder {
    /// Declare a field decoded for every variant.
    pub fn shared_field(mut self, field: ObjectField) -> Self {
        self.shared.push(field);
        self
    }

    /// Declare one variant, selected when the tag field equals `tag`.
    pub fn variant(mut self, tag: impl Into<String>, object: ObjectSchema) -> Self {
        self.variants.push((tag.into(), object));
        self
    }

    /// Record unrecognized tags instead of erroring; no variant runs and
    /// every variant column receives a not-applicable fill.
    pub fn allow_unknown_tags(mut self, allow: bool) -> Self {
        self.allow_unknown_tags = allow;
        self
    }

    pub fn kinds(mut self, kinds: Kinds) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn allow_missing(mut self, allow: bool) -> Self {
        self.allow_missing = allow;
        self
    }

    pub fn build(self) -> Result<TypedObjectSchema> {
        self.kinds.validate("typed-object", TypedObjectSchema::MASK)?;
        if self.variants.is_empty() {
            return Err(Error::schema(
                "typed-object: at least one variant is required",
            ));
        }
        let mut tags = HashSet::new();
        for (tag, _) in &self.variants {
            if !tags.insert(tag.as_str()) {
                return Err(Error::schema(format!(
                    "typed-object: variant tag {tag:?} declared twice"
                )));
            }
        }
        check_field_overlap("typed-object shared fields", &self.shared)?;
        for (tag, object) in &self.variants {
            let mut combined = self.shared.clone();
            combined.extend(object.fields().iter().cloned());
            check_field_overlap(&format!("typed-object variant {tag:?}"), &combined)?;
            for field in &combined {
                if field.matches(&self.tag_field) {
                    return Err(Error::schema(format!(
                        "typed-object: field {:?} collides with the tag field",
                        field.name()
                    )));
                }
            }
        }
        Ok(TypedObjectSchema {
            tag_field: self.tag_field,
            shared: self.shared,
            variants: self.variants,
            allow_unknown_tags: self.allow_unknown_tags,
            kinds: self.kinds,
            allow_missing: self.allow_missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{IntSchema, StringSchema};

    fn int_field(name: &str) -> ObjectField {
        ObjectField::new(name, IntSchema::standard())
    }

    #[test]
    fn test_object_field_matching() {
        let field = ObjectField::new("name", StringSchema::standard()).alias("label");
        assert!(field.matches("name"));
        assert!(field.matches("label"));
        assert!(!field.matches("NAME"));

        let folded = field.case_insensitive(true);
        assert!(folded.matches("NAME"));
        assert!(folded.matches("Label"));
    }

    #[test]
    fn test_object_rejects_duplicate_names() {
        let err = ObjectSchema::standard(vec![int_field("a"), int_field("a")]).unwrap_err();
        assert!(err.to_string().contains("declared twice"), "{err}");
    }

    #[test]
    fn test_object_rejects_alias_overlap() {
        let fields = vec![int_field("a").alias("b"), int_field("b")];
        assert!(ObjectSchema::standard(fields).is_err());
    }

    #[test]
    fn test_object_case_insensitive_overlap() {
        let fields = vec![int_field("value").case_insensitive(true), int_field("VALUE")];
        assert!(ObjectSchema::standard(fields).is_err());
    }

    #[test]
    fn test_object_case_sensitive_pair_allowed() {
        let fields = vec![int_field("value"), int_field("VALUE")];
        assert!(ObjectSchema::standard(fields).is_ok());
    }

    #[test]
    fn test_kv_key_must_allow_string() {
        let err = ObjectKvSchema::builder()
            .key(IntSchema::strict())
            .value(IntSchema::standard())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("allow strings"), "{err}");
    }

    #[test]
    fn test_kv_key_must_be_scalar() {
        let inner = ObjectSchema::standard(vec![int_field("a")]).unwrap();
        let err = ObjectKvSchema::builder()
            .key(inner)
            .value(IntSchema::standard())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("scalar"), "{err}");
    }

    #[test]
    fn test_tuple_rejects_empty() {
        assert!(TupleSchema::standard([]).is_err());
    }

    #[test]
    fn test_tuple_default_labels() {
        let tuple = TupleSchema::standard([
            Schema::from(StringSchema::standard()),
            Schema::from(IntSchema::standard()),
        ])
        .unwrap();
        assert_eq!(tuple.items()[0].0, "0");
        assert_eq!(tuple.items()[1].0, "1");
    }

    #[test]
    fn test_typed_object_requires_variants() {
        let err = TypedObjectSchema::builder("type").build().unwrap_err();
        assert!(err.to_string().contains("variant"), "{err}");
    }

    #[test]
    fn test_typed_object_rejects_tag_collision() {
        let cat = ObjectSchema::standard(vec![int_field("type")]).unwrap();
        let err = TypedObjectSchema::builder("type")
            .variant("cat", cat)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("tag field"), "{err}");
    }

    #[test]
    fn test_typed_object_rejects_duplicate_tags() {
        let cat = ObjectSchema::standard(vec![int_field("meow")]).unwrap();
        let err = TypedObjectSchema::builder("type")
            .variant("cat", cat.clone())
            .variant("cat", cat)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("declared twice"), "{err}");
    }
}
