//! Discriminated-union processor

use std::ops::Range;

use crate::chunk::Column;
use crate::process::{advance_in_structure, check_kind, fill_null_range, ObjectProcessor};
use crate::process::ValueProcessor;
use crate::schema::Kinds;
use crate::tokens::{Location, TokenKind, TokenSource};
use crate::{Error, Result};

pub(crate) struct VariantSlot {
    tag: String,
    /// Member driver over the shared fields plus this variant's own fields;
    /// its child processors target the shared columns and this variant's
    /// column range.
    processor: ObjectProcessor,
    /// This variant's own columns, excluding the shared range.
    own_range: Range<usize>,
}

impl VariantSlot {
    pub(crate) fn new(tag: String, processor: ObjectProcessor, own_range: Range<usize>) -> Self {
        Self {
            tag,
            processor,
            own_range,
        }
    }
}

/// Type-tag dispatch: reads the tag from the object's first field, drives
/// the selected variant, and not-applicable-fills every other variant's
/// columns so all columns advance together.
pub(crate) struct TypedObjectProcessor {
    tag_field: String,
    tag_col: usize,
    shared_range: Range<usize>,
    variants: Vec<VariantSlot>,
    allow_unknown_tags: bool,
    kinds: Kinds,
    allow_missing: bool,
}

impl TypedObjectProcessor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        kinds: Kinds,
        allow_missing: bool,
        allow_unknown_tags: bool,
        tag_field: String,
        tag_col: usize,
        shared_range: Range<usize>,
        variants: Vec<VariantSlot>,
    ) -> Self {
        Self {
            tag_field,
            tag_col,
            shared_range,
            variants,
            allow_unknown_tags,
            kinds,
            allow_missing,
        }
    }

    /// Record a tag (or its absence) without running any variant: shared
    /// and variant columns all take the null representation.
    fn record_without_variant(&mut self, tag: Option<String>, out: &mut [Column]) {
        out[self.tag_col].push_string(tag);
        fill_null_range(out, self.shared_range.clone());
        for variant in &self.variants {
            fill_null_range(out, variant.own_range.clone());
        }
    }

    /// Consume the remaining members of an object whose variant will not
    /// run; returns at the closing `EndObject`.
    fn skip_members(&self, src: &mut dyn TokenSource) -> Result<()> {
        loop {
            match advance_in_structure(src)? {
                TokenKind::EndObject => return Ok(()),
                TokenKind::FieldName => {
                    advance_in_structure(src)?;
                    src.skip_value()?;
                }
                other => {
                    return Err(Error::structural(
                        format!("unexpected {other} inside object"),
                        src.location(),
                    ));
                }
            }
        }
    }
}

impl ValueProcessor for TypedObjectProcessor {
    fn process_value(&mut self, src: &mut dyn TokenSource, out: &mut [Column]) -> Result<()> {
        match check_kind(self.kinds, "typed-object", src)? {
            TokenKind::Null => {
                self.record_without_variant(None, out);
                Ok(())
            }
            TokenKind::BeginObject => {
                match advance_in_structure(src)? {
                    TokenKind::EndObject => {
                        // No members at all, so no tag to dispatch on.
                        if self.allow_unknown_tags {
                            self.record_without_variant(None, out);
                            return Ok(());
                        }
                        return Err(Error::structural(
                            format!("missing type tag field {:?}", self.tag_field),
                            src.location(),
                        ));
                    }
                    TokenKind::FieldName if src.text() == self.tag_field => {}
                    TokenKind::FieldName => {
                        return Err(Error::structural(
                            format!(
                                "type tag {:?} must be the first field, found {:?}",
                                self.tag_field,
                                src.text()
                            ),
                            src.location(),
                        ));
                    }
                    other => {
                        return Err(Error::structural(
                            format!("unexpected {other} inside object"),
                            src.location(),
                        ));
                    }
                }

                let tag = match advance_in_structure(src)? {
                    TokenKind::String => Some(src.text().to_owned()),
                    TokenKind::Null => None,
                    other => return Err(Error::mismatch("type tag", other, src.location())),
                };

                let selected = tag
                    .as_deref()
                    .and_then(|t| self.variants.iter().position(|v| v.tag == t));
                match selected {
                    Some(i) => {
                        if advance_in_structure(src)? == TokenKind::EndObject {
                            return Err(Error::structural(
                                format!(
                                    "typed object with tag {:?} has no fields beyond the tag",
                                    self.variants[i].tag
                                ),
                                src.location(),
                            ));
                        }
                        self.variants[i].processor.process_members(src, out)?;
                        out[self.tag_col].push_string(tag);
                        for (j, variant) in self.variants.iter().enumerate() {
                            if j != i {
                                fill_null_range(out, variant.own_range.clone());
                            }
                        }
                        Ok(())
                    }
                    None => {
                        if !self.allow_unknown_tags {
                            return Err(Error::structural(
                                match &tag {
                                    Some(t) => format!("unknown type tag {t:?}"),
                                    None => format!("null type tag {:?}", self.tag_field),
                                },
                                src.location(),
                            ));
                        }
                        self.skip_members(src)?;
                        self.record_without_variant(tag, out);
                        Ok(())
                    }
                }
            }
            other => Err(Error::mismatch("typed-object", other, src.location())),
        }
    }

    fn process_missing(&mut self, out: &mut [Column]) -> Result<()> {
        if !self.allow_missing {
            return Err(Error::missing("typed-object", Location::default()));
        }
        self.record_without_variant(None, out);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ColumnType;
    use crate::process::scalars::{BoolDecoder, ScalarProcessor};
    use crate::schema::{BoolSchema, ObjectField};
    use crate::tokens::Lexer;

    /// Tag column 0, `cat.meow` column 1, `dog.bark` column 2.
    fn cat_dog() -> TypedObjectProcessor {
        let cat = ObjectProcessor::new(
            Kinds::OBJECT | Kinds::NULL,
            true,
            true,
            vec![(
                ObjectField::new("meow", BoolSchema::standard()),
                Box::new(ScalarProcessor::new(BoolDecoder(BoolSchema::standard()), 1))
                    as Box<dyn ValueProcessor>,
            )],
        );
        let dog = ObjectProcessor::new(
            Kinds::OBJECT | Kinds::NULL,
            true,
            true,
            vec![(
                ObjectField::new("bark", BoolSchema::standard()),
                Box::new(ScalarProcessor::new(BoolDecoder(BoolSchema::standard()), 2))
                    as Box<dyn ValueProcessor>,
            )],
        );
        TypedObjectProcessor::new(
            Kinds::OBJECT | Kinds::NULL,
            true,
            false,
            "type".to_owned(),
            0,
            1..1,
            vec![
                VariantSlot::new("cat".to_owned(), cat, 1..2),
                VariantSlot::new("dog".to_owned(), dog, 2..3),
            ],
        )
    }

    fn columns() -> Vec<Column> {
        vec![
            ColumnType::String.new_column(),
            ColumnType::Bool.new_column(),
            ColumnType::Bool.new_column(),
        ]
    }

    fn run(proc: &mut TypedObjectProcessor, input: &str, cols: &mut [Column]) -> Result<()> {
        let mut lexer = Lexer::new(input);
        lexer.advance().unwrap();
        proc.process_value(&mut lexer, cols)
    }

    #[test]
    fn test_selected_variant_fills_others() {
        let mut cols = columns();
        let mut proc = cat_dog();
        run(&mut proc, r#"{"type": "dog", "bark": true}"#, &mut cols).unwrap();
        assert_eq!(cols[0].string_values(), &[Some("dog".to_owned())]);
        assert_eq!(cols[1].bool_values(), &[None]);
        assert_eq!(cols[2].bool_values(), &[Some(true)]);
    }

    #[test]
    fn test_tag_must_be_first() {
        let mut cols = columns();
        let mut proc = cat_dog();
        let err = run(&mut proc, r#"{"bark": true, "type": "dog"}"#, &mut cols).unwrap_err();
        assert!(err.to_string().contains("first field"), "{err}");
    }

    #[test]
    fn test_unknown_tag_rejected_by_default() {
        let mut cols = columns();
        let mut proc = cat_dog();
        let err = run(&mut proc, r#"{"type": "fish", "fins": 2}"#, &mut cols).unwrap_err();
        assert!(err.to_string().contains("unknown type tag"), "{err}");
    }

    #[test]
    fn test_unknown_tag_recorded_when_allowed() {
        let mut cols = columns();
        let mut proc = cat_dog();
        proc.allow_unknown_tags = true;
        run(&mut proc, r#"{"type": "fish", "fins": 2}"#, &mut cols).unwrap();
        assert_eq!(cols[0].string_values(), &[Some("fish".to_owned())]);
        assert_eq!(cols[1].bool_values(), &[None]);
        assert_eq!(cols[2].bool_values(), &[None]);
    }

    #[test]
    fn test_tag_only_object_is_structural() {
        let mut cols = columns();
        let mut proc = cat_dog();
        let err = run(&mut proc, r#"{"type": "cat"}"#, &mut cols).unwrap_err();
        assert!(err.to_string().contains("no fields beyond"), "{err}");
    }

    #[test]
    fn test_null_fills_all_columns() {
        let mut cols = columns();
        let mut proc = cat_dog();
        run(&mut proc, "null", &mut cols).unwrap();
        proc.process_missing(&mut cols).unwrap();
        assert_eq!(cols[0].string_values(), &[None, None]);
        assert_eq!(cols[1].bool_values(), &[None, None]);
        assert_eq!(cols[2].bool_values(), &[None, None]);
    }
}
