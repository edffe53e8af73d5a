//! Streaming batch ingestion on top of the `jsoncol` decoder.
//!
//! A [`JsonStreamPublisher`] pulls raw JSON from a set of [`Source`]s,
//! decodes rows with worker threads, and hands fixed-size column chunks to
//! a [`BatchSink`]:
//!
//! ```
//! use jsoncol::schema::{ArraySchema, LongSchema, ObjectField, ObjectSchema, Schema};
//! use jsoncol_stream::{CollectSink, JsonStreamPublisher, PublisherOptions, Source};
//!
//! # fn main() -> jsoncol::Result<()> {
//! let payload = ArraySchema::standard(LongSchema::standard())?;
//! let schema: Schema = ObjectSchema::standard(vec![ObjectField::new("data", payload)])?.into();
//!
//! let publisher = JsonStreamPublisher::new(PublisherOptions::new(schema).chunk_rows(1024))?;
//! let sink = CollectSink::new();
//! let rows = publisher.execute(vec![Source::from(r#"{"data": [10, 20, 30]}"#)], &sink)?;
//! assert_eq!(rows, 3);
//! # Ok(())
//! # }
//! ```

#![warn(rust_2018_idioms)]

mod driver;
mod sink;
mod source;

pub use driver::{JsonStreamPublisher, PublisherOptions};
pub use sink::{Batch, BatchSink, CollectSink};
pub use source::Source;
