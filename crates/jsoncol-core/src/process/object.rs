//! Object and key/value processors

use crate::chunk::Column;
use crate::process::{advance_in_structure, check_kind, Repeater, ValueProcessor};
use crate::schema::{Kinds, ObjectField, RepeatedBehavior};
use crate::tokens::{Location, TokenKind, TokenSource};
use crate::{Error, Result};

struct FieldSlot {
    field: ObjectField,
    processor: Box<dyn ValueProcessor>,
}

/// Fixed-field object processor.
///
/// Null and missing objects are both equivalent to `{}`: every declared
/// field takes its missing path.
pub(crate) struct ObjectProcessor {
    slots: Vec<FieldSlot>,
    allow_unknown: bool,
    kinds: Kinds,
    allow_missing: bool,
    visited: Vec<bool>,
}

impl ObjectProcessor {
    pub(crate) fn new(
        kinds: Kinds,
        allow_missing: bool,
        allow_unknown: bool,
        fields: Vec<(ObjectField, Box<dyn ValueProcessor>)>,
    ) -> Self {
        let visited = vec![false; fields.len()];
        Self {
            slots: fields
                .into_iter()
                .map(|(field, processor)| FieldSlot { field, processor })
                .collect(),
            allow_unknown,
            kinds,
            allow_missing,
            visited,
        }
    }

    fn fan_missing(&mut self, out: &mut [Column]) -> Result<()> {
        for slot in &mut self.slots {
            slot.processor.process_missing(out)?;
        }
        Ok(())
    }

    /// Drive the member loop from inside an already-opened object.
    ///
    /// Entered with the current token being a `FieldName` or the closing
    /// `EndObject`; returns at the `EndObject`. The discriminated-union
    /// processor calls this directly after consuming the tag member.
    pub(crate) fn process_members(
        &mut self,
        src: &mut dyn TokenSource,
        out: &mut [Column],
    ) -> Result<()> {
        self.visited.clear();
        self.visited.resize(self.slots.len(), false);

        let mut kind = src
            .current()
            .ok_or_else(|| Error::structural("unexpected end of input", src.location()))?;
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
                        Some(i) if self.visited[i] => match self.slots[i].field.repeated() {
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
                        },
                        Some(i) => {
                            self.visited[i] = true;
                            advance_in_structure(src)?;
                            self.slots[i].processor.process_value(src, out)?;
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
                slot.processor.process_missing(out)?;
            }
        }
        Ok(())
    }
}

impl ValueProcessor for ObjectProcessor {
    fn process_value(&mut self, src: &mut dyn TokenSource, out: &mut [Column]) -> Result<()> {
        match check_kind(self.kinds, "object", src)? {
            TokenKind::Null => self.fan_missing(out),
            TokenKind::BeginObject => {
                advance_in_structure(src)?;
                self.process_members(src, out)
            }
            other => Err(Error::mismatch("object", other, src.location())),
        }
    }

    fn process_missing(&mut self, out: &mut [Column]) -> Result<()> {
        if !self.allow_missing {
            return Err(Error::missing("object", Location::default()));
        }
        self.fan_missing(out)
    }
}

/// Homogeneous key→value map processor: one array cell per key column and
/// per value column, element counts equal by construction.
pub(crate) struct KvProcessor {
    key: Box<dyn Repeater>,
    value: Box<dyn Repeater>,
    kinds: Kinds,
    allow_missing: bool,
}

impl KvProcessor {
    pub(crate) fn new(
        kinds: Kinds,
        allow_missing: bool,
        key: Box<dyn Repeater>,
        value: Box<dyn Repeater>,
    ) -> Self {
        Self {
            key,
            value,
            kinds,
            allow_missing,
        }
    }
}

impl ValueProcessor for KvProcessor {
    fn process_value(&mut self, src: &mut dyn TokenSource, out: &mut [Column]) -> Result<()> {
        match check_kind(self.kinds, "object-kv", src)? {
            TokenKind::Null => {
                self.key.null_sequence(out)?;
                self.value.null_sequence(out)
            }
            TokenKind::BeginObject => {
                self.key.begin();
                self.value.begin();
                let mut kind = advance_in_structure(src)?;
                loop {
                    match kind {
                        TokenKind::EndObject => break,
                        TokenKind::FieldName => {
                            // The field name itself is the key element.
                            self.key.element(src)?;
                            advance_in_structure(src)?;
                            self.value.element(src)?;
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
                self.key.finish(out)?;
                self.value.finish(out)
            }
            other => Err(Error::mismatch("object-kv", other, src.location())),
        }
    }

    fn process_missing(&mut self, out: &mut [Column]) -> Result<()> {
        if !self.allow_missing {
            return Err(Error::missing("object-kv", Location::default()));
        }
        self.key.missing_sequence(out)?;
        self.value.missing_sequence(out)
    }
}
