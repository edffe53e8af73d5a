//! Path navigator for thin envelope documents
//!
//! Many feeds wrap the payload of interest in a single-field envelope like
//! `{"data": [...]}`. [`path_to_single_value`] finds the unique chain of
//! steps down to the first node with more than one child; the token-level
//! companions walk a live stream through those steps so the payload can be
//! decoded without buffering the envelope.

use crate::process::advance_in_structure;
use crate::schema::{ObjectField, Schema};
use crate::tokens::{TokenKind, TokenSource};
use crate::{Error, Result};

/// One navigation step.
#[derive(Debug, Clone, Copy)]
pub enum PathStep<'a> {
    /// Descend into the single declared field of an object.
    Field {
        field: &'a ObjectField,
        /// The owning object's unknown-field policy, applied to envelope
        /// siblings encountered while walking.
        allow_unknown: bool,
    },
    /// Descend into position `0` of a single-element tuple.
    Index(usize),
}

/// Descend while the node is a single-field object or single-element tuple;
/// the first node with more than one child (or any other node type) is the
/// terminal, however large.
pub fn path_to_single_value(schema: &Schema) -> (Vec<PathStep<'_>>, &Schema) {
    let mut steps = Vec::new();
    let mut node = schema;
    loop {
        match node {
            Schema::Object(o) if o.fields().len() == 1 => {
                let field = &o.fields()[0];
                steps.push(PathStep::Field {
                    field,
                    allow_unknown: o.allow_unknown_fields(),
                });
                node = field.schema();
            }
            Schema::Tuple(t) if t.items().len() == 1 => {
                steps.push(PathStep::Index(0));
                node = &t.items()[0].1;
            }
            _ => return (steps, node),
        }
    }
}

/// Walk the stream into one step: consume the opening token and everything
/// before the target, leaving the current token at the first token of the
/// target's value. The target field never appearing is a structural error.
pub fn enter_step(src: &mut dyn TokenSource, step: &PathStep<'_>) -> Result<()> {
    match step {
        PathStep::Field {
            field,
            allow_unknown,
        } => {
            match src.current() {
                Some(TokenKind::BeginObject) => {}
                Some(other) => return Err(Error::mismatch("object", other, src.location())),
                None => {
                    return Err(Error::structural("unexpected end of input", src.location()));
                }
            }
            loop {
                match advance_in_structure(src)? {
                    TokenKind::EndObject => {
                        return Err(Error::structural(
                            format!("field {:?} not found", field.name()),
                            src.location(),
                        ));
                    }
                    TokenKind::FieldName => {
                        if field.matches(src.text()) {
                            advance_in_structure(src)?;
                            return Ok(());
                        }
                        if !*allow_unknown {
                            return Err(Error::structural(
                                format!("unknown field {:?}", src.text()),
                                src.location(),
                            ));
                        }
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
        PathStep::Index(_) => {
            match src.current() {
                Some(TokenKind::BeginArray) => {}
                Some(other) => return Err(Error::mismatch("tuple", other, src.location())),
                None => {
                    return Err(Error::structural("unexpected end of input", src.location()));
                }
            }
            if advance_in_structure(src)? == TokenKind::EndArray {
                return Err(Error::structural(
                    "tuple ended before position 0",
                    src.location(),
                ));
            }
            Ok(())
        }
    }
}

/// Walk the stream out of one step: the target's value has been consumed
/// (current token is its last); consume the remainder of the enclosing
/// structure, leaving the current token at its closing token.
pub fn finish_step(src: &mut dyn TokenSource, step: &PathStep<'_>) -> Result<()> {
    match step {
        PathStep::Field { allow_unknown, .. } => loop {
            match advance_in_structure(src)? {
                TokenKind::EndObject => return Ok(()),
                TokenKind::FieldName => {
                    if !*allow_unknown {
                        return Err(Error::structural(
                            format!("unknown field {:?}", src.text()),
                            src.location(),
                        ));
                    }
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
        },
        PathStep::Index(_) => loop {
            // Extra positional elements are skipped, matching tuple leniency.
            if advance_in_structure(src)? == TokenKind::EndArray {
                return Ok(());
            }
            src.skip_value()?;
        },
    }
}
