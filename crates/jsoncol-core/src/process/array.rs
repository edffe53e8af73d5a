//! Array and tuple processors, and the repeaters that let objects, tuples,
//! and skips appear as array elements.

use crate::chunk::Column;
use crate::process::{advance_in_structure, check_kind, Repeater, ValueProcessor};
use crate::schema::{Kinds, ObjectField, RepeatedBehavior};
use crate::tokens::{Location, TokenKind, TokenSource};
use crate::{Error, Result};

/// Homogeneous-array processor: the whole array lands as one cell per
/// output column. Null and missing arrays decode as zero-length arrays.
pub(crate) struct ArrayProcessor {
    element: Box<dyn Repeater>,
    kinds: Kinds,
    allow_missing: bool,
}

impl ArrayProcessor {
    pub(crate) fn new(kinds: Kinds, allow_missing: bool, element: Box<dyn Repeater>) -> Self {
        Self {
            element,
            kinds,
            allow_missing,
        }
    }
}

impl ValueProcessor for ArrayProcessor {
    fn process_value(&mut self, src: &mut dyn TokenSource, out: &mut [Column]) -> Result<()> {
        match check_kind(self.kinds, "array", src)? {
            TokenKind::Null => self.element.null_sequence(out),
            TokenKind::BeginArray => {
                self.element.begin();
                let mut kind = advance_in_structure(src)?;
                while kind != TokenKind::EndArray {
                    self.element.element(src)?;
                    kind = advance_in_structure(src)?;
                }
                self.element.finish(out)
            }
            other => Err(Error::mismatch("array", other, src.location())),
        }
    }

    fn process_missing(&mut self, out: &mut [Column]) -> Result<()> {
        if !self.allow_missing {
            return Err(Error::missing("array", Location::default()));
        }
        self.element.missing_sequence(out)
    }
}

/// Fixed-arity positional processor.
///
/// Extra elements are consumed and ignored; an under-length array is a
/// structural error. A null tuple feeds every position a null value, since
/// the current token remains the `null` for each positional processor.
pub(crate) struct TupleProcessor {
    items: Vec<Box<dyn ValueProcessor>>,
    kinds: Kinds,
    allow_missing: bool,
}

impl TupleProcessor {
    pub(crate) fn new(
        kinds: Kinds,
        allow_missing: bool,
        items: Vec<Box<dyn ValueProcessor>>,
    ) -> Self {
        Self {
            items,
            kinds,
            allow_missing,
        }
    }
}

impl ValueProcessor for TupleProcessor {
    fn process_value(&mut self, src: &mut dyn TokenSource, out: &mut [Column]) -> Result<()> {
        match check_kind(self.kinds, "tuple", src)? {
            TokenKind::Null => {
                for item in &mut self.items {
                    item.process_value(src, out)?;
                }
                Ok(())
            }
            TokenKind::BeginArray => {
                for (i, item) in self.items.iter_mut().enumerate() {
                    let kind = advance_in_structure(src)?;
                    if kind == TokenKind::EndArray {
                        return Err(Error::structural(
                            format!(
                                "tuple ended after {i} of {} elements",
                                self.items.len()
                            ),
                            src.location(),
                        ));
                    }
                    item.process_value(src, out)?;
                }
                let mut kind = advance_in_structure(src)?;
                while kind != TokenKind::EndArray {
                    src.skip_value()?;
                    kind = advance_in_structure(src)?;
                }
                Ok(())
            }
            other => Err(Error::mismatch("tuple", other, src.location())),
        }
    }

    fn process_missing(&mut self, out: &mut [Column]) -> Result<()> {
        if !self.allow_missing {
            return Err(Error::missing("tuple", Location::default()));
        }
        for item in &mut self.items {
            item.process_missing(out)?;
        }
        Ok(())
    }
}

struct RepeaterSlot {
    field: ObjectField,
    repeater: Box<dyn Repeater>,
}

/// Object-as-array-element repeater: fans each element's fields into the
/// field repeaters, so every field column gets one array cell per row with
/// equal element counts.
pub(crate) struct ObjectRepeater {
    slots: Vec<RepeaterSlot>,
    allow_unknown: bool,
    kinds: Kinds,
    visited: Vec<bool>,
}

impl ObjectRepeater {
    pub(crate) fn new(
        kinds: Kinds,
        allow_unknown: bool,
        fields: Vec<(ObjectField, Box<dyn Repeater>)>,
    ) -> Self {
        let visited = vec![false; fields.len()];
        Self {
            slots: fields
                .into_iter()
                .map(|(field, repeater)| RepeaterSlot { field, repeater })
                .collect(),
            allow_unknown,
            kinds,
            visited,
        }
    }
}

impl Repeater for ObjectRepeater {
    fn begin(&mut self) {
        for slot in &mut self.slots {
            slot.repeater.begin();
        }
    }

    fn element(&mut self, src: &mut dyn TokenSource) -> Result<()> {
        match check_kind(self.kinds, "object", src)? {
            // A null element is an empty object: every field is missing.
            TokenKind::Null => {
                for slot in &mut self.slots {
                    slot.repeater.element_missing()?;
                }
                Ok(())
            }
            TokenKind::BeginObject => {
                self.visited.clear();
                self.visited.resize(self.slots.len(), false);
                let mut kind = advance_in_structure(src)?;
                loop {
                    match kind {
                        TokenKind::EndObject => break,
                        TokenKind::FieldName => {
                            let found = self
                                .slots
                                .iter()
                                .position(|slot| slot.field.matches(src.text()));
                            match found {
                                None if self.allow_unknown => {
                                    advance_in_structure(src)?;
                                    src.skip_value()?;
                                }
                                None => {
                                    return Err(Error::structural(
                                        format!("unknown field {:?}", src.text()),
                                        src.location(),
                                    ));
                                }
                                Some(i) if self.visited[i] => {
                                    match self.slots[i].field.repeated() {
                                        RepeatedBehavior::UseFirst => {
                                            advance_in_structure(src)?;
                                            src.skip_value()?;
                                        }
                                        RepeatedBehavior::Error => {
                                            return Err(Error::structural(
                                                format!("repeated field {:?}", src.text()),
                                                src.location(),
                                            ));
                                        }
                                    }
                                }
                                Some(i) => {
                                    self.visited[i] = true;
                                    advance_in_structure(src)?;
                                    self.slots[i].repeater.element(src)?;
                                }
                            }
                        }
                        other => {
                            return Err(Error::structural(
                                format!("unexpected {other} inside object"),
                                src.location(),
                            ));
                        }
                    }
                    kind = advance_in_structure(src)?;
                }
                for (i, slot) in self.slots.iter_mut().enumerate() {
                    if !self.visited[i] {
                        slot.repeater.element_missing()?;
                    }
                }
                Ok(())
            }
            other => Err(Error::mismatch("object", other, src.location())),
        }
    }

    fn element_missing(&mut self) -> Result<()> {
        for slot in &mut self.slots {
            slot.repeater.element_missing()?;
        }
        Ok(())
    }

    fn finish(&mut self, out: &mut [Column]) -> Result<()> {
        for slot in &mut self.slots {
            slot.repeater.finish(out)?;
        }
        Ok(())
    }

    fn null_sequence(&mut self, out: &mut [Column]) -> Result<()> {
        for slot in &mut self.slots {
            slot.repeater.null_sequence(out)?;
        }
        Ok(())
    }

    fn missing_sequence(&mut self, out: &mut [Column]) -> Result<()> {
        for slot in &mut self.slots {
            slot.repeater.missing_sequence(out)?;
        }
        Ok(())
    }
}

/// Tuple-as-array-element repeater.
pub(crate) struct TupleRepeater {
    items: Vec<Box<dyn Repeater>>,
    kinds: Kinds,
}

impl TupleRepeater {
    pub(crate) fn new(kinds: Kinds, items: Vec<Box<dyn Repeater>>) -> Self {
        Self { items, kinds }
    }
}

impl Repeater for TupleRepeater {
    fn begin(&mut self) {
        for item in &mut self.items {
            item.begin();
        }
    }

    fn element(&mut self, src: &mut dyn TokenSource) -> Result<()> {
        match check_kind(self.kinds, "tuple", src)? {
            TokenKind::Null => {
                for item in &mut self.items {
                    item.element(src)?;
                }
                Ok(())
            }
            TokenKind::BeginArray => {
                for (i, item) in self.items.iter_mut().enumerate() {
                    let kind = advance_in_structure(src)?;
                    if kind == TokenKind::EndArray {
                        return Err(Error::structural(
                            format!("tuple ended after {i} of {} elements", self.items.len()),
                            src.location(),
                        ));
                    }
                    item.element(src)?;
                }
                let mut kind = advance_in_structure(src)?;
                while kind != TokenKind::EndArray {
                    src.skip_value()?;
                    kind = advance_in_structure(src)?;
                }
                Ok(())
            }
            other => Err(Error::mismatch("tuple", other, src.location())),
        }
    }

    fn element_missing(&mut self) -> Result<()> {
        for item in &mut self.items {
            item.element_missing()?;
        }
        Ok(())
    }

    fn finish(&mut self, out: &mut [Column]) -> Result<()> {
        for item in &mut self.items {
            item.finish(out)?;
        }
        Ok(())
    }

    fn null_sequence(&mut self, out: &mut [Column]) -> Result<()> {
        for item in &mut self.items {
            item.null_sequence(out)?;
        }
        Ok(())
    }

    fn missing_sequence(&mut self, out: &mut [Column]) -> Result<()> {
        for item in &mut self.items {
            item.missing_sequence(out)?;
        }
        Ok(())
    }
}

/// Skip-as-array-element repeater; owns no columns.
pub(crate) struct SkipRepeater {
    kinds: Kinds,
}

impl SkipRepeater {
    pub(crate) fn new(kinds: Kinds) -> Self {
        Self { kinds }
    }
}

impl Repeater for SkipRepeater {
    fn begin(&mut self) {}

    fn element(&mut self, src: &mut dyn TokenSource) -> Result<()> {
        check_kind(self.kinds, "skip", src)?;
        src.skip_value()
    }

    fn element_missing(&mut self) -> Result<()> {
        Ok(())
    }

    fn finish(&mut self, _out: &mut [Column]) -> Result<()> {
        Ok(())
    }

    fn null_sequence(&mut self, _out: &mut [Column]) -> Result<()> {
        Ok(())
    }

    fn missing_sequence(&mut self, _out: &mut [Column]) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ArrayValue, ColumnType};
    use crate::process::scalars::{IntDecoder, ScalarProcessor, ScalarRepeater, StringDecoder};
    use crate::schema::{IntSchema, StringSchema};
    use crate::tokens::Lexer;

    fn int_repeater(col: usize) -> Box<dyn Repeater> {
        Box::new(ScalarRepeater::new(IntDecoder(IntSchema::standard()), col))
    }

    fn run(proc: &mut dyn ValueProcessor, input: &str, cols: &mut [Column]) -> Result<()> {
        let mut lexer = Lexer::new(input);
        lexer.advance().unwrap();
        proc.process_value(&mut lexer, cols)
    }

    #[test]
    fn test_array_of_int_with_null_element() {
        let mut cols = vec![ColumnType::Array(Box::new(ColumnType::Int)).new_column()];
        let mut proc =
            ArrayProcessor::new(Kinds::ARRAY | Kinds::NULL, true, int_repeater(0));
        run(&mut proc, "[1, 2, null, 4]", &mut cols).unwrap();
        assert_eq!(
            cols[0].array_values(),
            &[Some(ArrayValue::Int(vec![Some(1), Some(2), None, Some(4)]))]
        );
    }

    #[test]
    fn test_array_null_and_missing_are_empty() {
        let mut cols = vec![ColumnType::Array(Box::new(ColumnType::Int)).new_column()];
        let mut proc =
            ArrayProcessor::new(Kinds::ARRAY | Kinds::NULL, true, int_repeater(0));
        run(&mut proc, "null", &mut cols).unwrap();
        proc.process_missing(&mut cols).unwrap();
        assert_eq!(
            cols[0].array_values(),
            &[
                Some(ArrayValue::Int(Vec::new())),
                Some(ArrayValue::Int(Vec::new())),
            ]
        );
    }

    #[test]
    fn test_tuple_positions_and_extra_elements() {
        let mut cols = vec![
            ColumnType::String.new_column(),
            ColumnType::Int.new_column(),
        ];
        let mut proc = TupleProcessor::new(
            Kinds::ARRAY | Kinds::NULL,
            true,
            vec![
                Box::new(ScalarProcessor::new(
                    StringDecoder(StringSchema::standard()),
                    0,
                )),
                Box::new(ScalarProcessor::new(IntDecoder(IntSchema::standard()), 1)),
            ],
        );
        run(&mut proc, r#"["x", 3, "extra", [9]]"#, &mut cols).unwrap();
        assert_eq!(cols[0].string_values(), &[Some("x".to_owned())]);
        assert_eq!(cols[1].int_values(), &[Some(3)]);
    }

    #[test]
    fn test_tuple_underflow_is_structural() {
        let mut cols = vec![
            ColumnType::String.new_column(),
            ColumnType::Int.new_column(),
        ];
        let mut proc = TupleProcessor::new(
            Kinds::ARRAY | Kinds::NULL,
            true,
            vec![
                Box::new(ScalarProcessor::new(
                    StringDecoder(StringSchema::standard()),
                    0,
                )),
                Box::new(ScalarProcessor::new(IntDecoder(IntSchema::standard()), 1)),
            ],
        );
        let err = run(&mut proc, r#"["only"]"#, &mut cols).unwrap_err();
        assert!(matches!(err, Error::Structural { .. }), "{err}");
    }

    #[test]
    fn test_tuple_null_fans_null_to_positions() {
        let mut cols = vec![
            ColumnType::String.new_column(),
            ColumnType::Int.new_column(),
        ];
        let mut proc = TupleProcessor::new(
            Kinds::ARRAY | Kinds::NULL,
            true,
            vec![
                Box::new(ScalarProcessor::new(
                    StringDecoder(StringSchema::standard()),
                    0,
                )),
                Box::new(ScalarProcessor::new(IntDecoder(IntSchema::standard()), 1)),
            ],
        );
        run(&mut proc, "null", &mut cols).unwrap();
        assert_eq!(cols[0].string_values(), &[None]);
        assert_eq!(cols[1].int_values(), &[None]);
    }

    #[test]
    fn test_array_of_objects_fans_per_field() {
        let mut cols = vec![
            ColumnType::Array(Box::new(ColumnType::Int)).new_column(),
            ColumnType::Array(Box::new(ColumnType::Int)).new_column(),
        ];
        let element = ObjectRepeater::new(
            Kinds::OBJECT | Kinds::NULL,
            true,
            vec![
                (
                    ObjectField::new("a", IntSchema::standard()),
                    int_repeater(0),
                ),
                (
                    ObjectField::new("b", IntSchema::standard()),
                    int_repeater(1),
                ),
            ],
        );
        let mut proc =
            ArrayProcessor::new(Kinds::ARRAY | Kinds::NULL, true, Box::new(element));
        run(
            &mut proc,
            r#"[{"a": 1, "b": 2}, {"b": 4}, null]"#,
            &mut cols,
        )
        .unwrap();
        assert_eq!(
            cols[0].array_values(),
            &[Some(ArrayValue::Int(vec![Some(1), None, None]))]
        );
        assert_eq!(
            cols[1].array_values(),
            &[Some(ArrayValue::Int(vec![Some(2), Some(4), None]))]
        );
    }
}
