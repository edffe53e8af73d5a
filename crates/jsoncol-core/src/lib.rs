//! # jsoncol
//!
//! Schema-driven decoding of JSON documents into strongly typed, columnar
//! output buffers. A user-declared [`Schema`](schema::Schema) tree is
//! compiled once into a [`Decoder`]; the decoder walks a streaming token
//! reader, validates each value against the declared shape, coerces it,
//! and appends the result to pre-allocated [`Column`](chunk::Column)s with
//! exact row-count bookkeeping across arbitrarily deep nesting.
//!
//! ```
//! use jsoncol::schema::{ArraySchema, IntSchema, ObjectField, ObjectSchema, StringSchema};
//!
//! let schema: jsoncol::schema::Schema = ObjectSchema::standard(vec![
//!     ObjectField::new("name", StringSchema::standard()),
//!     ObjectField::new("scores", ArraySchema::standard(IntSchema::standard()).unwrap()),
//! ])
//! .unwrap()
//! .into();
//!
//! let mut decoder = jsoncol::compile(&schema).unwrap();
//! let mut batch = decoder.new_batch();
//! let rows = decoder
//!     .decode_document(r#"{"name": "a", "scores": [1, 2, null]}"#, &mut batch)
//!     .unwrap();
//! assert_eq!(rows, 1);
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod chunk;
mod coerce;
pub mod compile;
pub mod error;
pub mod growbuf;
pub mod nav;
pub mod process;
pub mod schema;
pub mod tokens;

pub use chunk::{ArrayValue, Column, ColumnType};
pub use compile::{
    column_names, compile, default_column_name, output_count, output_paths, output_types, Decoder,
};
pub use error::{Error, Result};
pub use growbuf::GrowBuf;
pub use tokens::{Lexer, Location, TokenKind, TokenSource};
