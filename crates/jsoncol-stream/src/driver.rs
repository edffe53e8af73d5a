//! Multi-threaded streaming batch driver
//!
//! Each worker owns an independently compiled decoder and column set, pops
//! raw sources from a shared queue, and flushes fixed-size chunks to the
//! sink. Row order within one source is preserved; cross-source order is
//! unspecified.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam::queue::SegQueue;
use tracing::{debug, warn};

use jsoncol::nav::{self, PathStep};
use jsoncol::schema::Schema;
use jsoncol::{compile, Column, Decoder, Error, Lexer, Result, TokenKind, TokenSource};

use crate::sink::{Batch, BatchSink};
use crate::source::Source;

/// Driver configuration.
pub struct PublisherOptions {
    pub schema: Schema,
    /// Rows per flushed chunk.
    pub chunk_rows: usize,
    /// Whether one source may hold a concatenation of top-level values.
    /// When false, anything after the first value is ignored.
    pub multi_value: bool,
    pub workers: usize,
}

impl PublisherOptions {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            chunk_rows: 4096,
            multi_value: false,
            workers: 1,
        }
    }

    pub fn chunk_rows(mut self, rows: usize) -> Self {
        self.chunk_rows = rows;
        self
    }

    pub fn multi_value(mut self, yes: bool) -> Self {
        self.multi_value = yes;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

/// Streams raw sources through compiled decoders into a [`BatchSink`].
///
/// The schema is first navigated down single-child envelopes; if the
/// terminal node is an array, its elements become the rows, otherwise each
/// terminal value is one row.
pub struct JsonStreamPublisher {
    options: PublisherOptions,
    shutdown: Arc<AtomicBool>,
}

impl JsonStreamPublisher {
    /// Validate the configuration (including compiling the row schema once)
    /// and build a publisher.
    pub fn new(options: PublisherOptions) -> Result<Self> {
        if options.chunk_rows == 0 {
            return Err(Error::schema("chunk_rows must be positive"));
        }
        if options.workers == 0 {
            return Err(Error::schema("at least one worker is required"));
        }
        let (_, terminal) = nav::path_to_single_value(&options.schema);
        let row_schema = match terminal {
            Schema::Array(a) => a.element(),
            other => other,
        };
        compile(row_schema)?;
        Ok(Self {
            options,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Request cooperative shutdown; workers observe the flag after each
    /// row and fail with [`Error::Shutdown`].
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Shared flag for shutting down from another thread.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Drive all sources to completion, returning the total rows decoded
    /// by workers that succeeded. Worker failures are forwarded to the
    /// sink's failure path and do not stop sibling workers.
    pub fn execute(&self, sources: Vec<Source>, sink: &dyn BatchSink) -> Result<usize> {
        let (steps, terminal) = nav::path_to_single_value(&self.options.schema);
        let (row_schema, rows_from_array, null_rows_allowed) = match terminal {
            Schema::Array(a) => (a.element(), true, a.kinds().allows_null()),
            other => (other, false, false),
        };

        let queue = SegQueue::new();
        for source in Source::flatten(sources) {
            queue.push(source);
        }

        let mut total = 0;
        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.options.workers);
            for id in 0..self.options.workers {
                let queue = &queue;
                let steps = &steps;
                let shutdown = &*self.shutdown;
                handles.push(scope.spawn(move || {
                    let mut worker = Worker::new(
                        id,
                        row_schema,
                        rows_from_array,
                        null_rows_allowed,
                        steps,
                        self.options.chunk_rows,
                        self.options.multi_value,
                        shutdown,
                        sink,
                    )?;
                    worker.run(queue)
                }));
            }
            for handle in handles {
                match handle.join() {
                    Ok(Ok(rows)) => total += rows,
                    Ok(Err(err)) => {
                        warn!(error = %err, "worker failed");
                        sink.accept_failure(err);
                    }
                    Err(_) => sink.accept_failure(Error::io("worker thread panicked")),
                }
            }
        });
        Ok(total)
    }
}

struct Worker<'a> {
    id: usize,
    decoder: Decoder,
    columns: Vec<Column>,
    rows: usize,
    total: usize,
    chunk_rows: usize,
    multi_value: bool,
    rows_from_array: bool,
    null_rows_allowed: bool,
    steps: &'a [PathStep<'a>],
    shutdown: &'a AtomicBool,
    sink: &'a dyn BatchSink,
}

impl<'a> Worker<'a> {
    #[allow(clippy::too_many_arguments)]
    fn new(
        id: usize,
        row_schema: &Schema,
        rows_from_array: bool,
        null_rows_allowed: bool,
        steps: &'a [PathStep<'a>],
        chunk_rows: usize,
        multi_value: bool,
        shutdown: &'a AtomicBool,
        sink: &'a dyn BatchSink,
    ) -> Result<Self> {
        let decoder = compile(row_schema)?;
        let columns = decoder.new_batch();
        Ok(Self {
            id,
            decoder,
            columns,
            rows: 0,
            total: 0,
            chunk_rows,
            multi_value,
            rows_from_array,
            null_rows_allowed,
            steps,
            shutdown,
            sink,
        })
    }

    fn run(&mut self, queue: &SegQueue<Source>) -> Result<usize> {
        debug!(worker = self.id, "worker started");
        while let Some(source) = queue.pop() {
            if self.shutdown.load(Ordering::Relaxed) {
                return Err(Error::Shutdown);
            }
            let text = source.into_text()?;
            self.process_text(&text)?;
        }
        self.flush();
        debug!(worker = self.id, rows = self.total, "worker finished");
        Ok(self.total)
    }

    fn process_text(&mut self, text: &str) -> Result<()> {
        let mut lexer = Lexer::new(text);
        while lexer.advance()?.is_some() {
            self.process_target(&mut lexer)?;
            if !self.multi_value {
                break;
            }
        }
        Ok(())
    }

    /// One top-level value: walk the envelope in, decode the row(s), walk
    /// back out.
    fn process_target(&mut self, src: &mut Lexer<'_>) -> Result<()> {
        for step in self.steps {
            nav::enter_step(src, step)?;
        }
        if self.rows_from_array {
            match src.current() {
                Some(TokenKind::BeginArray) => {
                    let mut kind = self.advance_in_payload(src)?;
                    while kind != TokenKind::EndArray {
                        self.decode_row(src)?;
                        kind = self.advance_in_payload(src)?;
                    }
                }
                Some(TokenKind::Null) if self.null_rows_allowed => {}
                Some(other) => return Err(Error::mismatch("array", other, src.location())),
                None => {
                    return Err(Error::structural("expected a value", src.location()));
                }
            }
        } else {
            self.decode_row(src)?;
        }
        for step in self.steps.iter().rev() {
            nav::finish_step(src, step)?;
        }
        Ok(())
    }

    fn advance_in_payload(&self, src: &mut Lexer<'_>) -> Result<TokenKind> {
        src.advance()?
            .ok_or_else(|| Error::structural("unexpected end of input", src.location()))
    }

    fn decode_row(&mut self, src: &mut dyn TokenSource) -> Result<()> {
        self.decoder.decode_value(src, &mut self.columns)?;
        self.rows += 1;
        self.total += 1;
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(Error::Shutdown);
        }
        if self.rows >= self.chunk_rows {
            self.flush();
        }
        Ok(())
    }

    fn flush(&mut self) {
        if self.rows == 0 {
            return;
        }
        debug!(worker = self.id, rows = self.rows, "flushing chunk");
        let columns = std::mem::replace(&mut self.columns, self.decoder.new_batch());
        self.sink.accept(Batch {
            columns,
            rows: self.rows,
        });
        self.rows = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::CollectSink;
    use jsoncol::schema::{ArraySchema, IntSchema, ObjectField, ObjectSchema};

    fn int_array_envelope() -> Schema {
        let data = ArraySchema::standard(IntSchema::standard()).unwrap();
        ObjectSchema::standard(vec![ObjectField::new("data", data)])
            .unwrap()
            .into()
    }

    #[test]
    fn test_rows_from_terminal_array() {
        let publisher =
            JsonStreamPublisher::new(PublisherOptions::new(int_array_envelope()).chunk_rows(2))
                .unwrap();
        let sink = CollectSink::new();
        let total = publisher
            .execute(vec![Source::from(r#"{"data": [1, 2, 3, 4, 5]}"#)], &sink)
            .unwrap();
        assert_eq!(total, 5);
        assert_eq!(sink.total_rows(), 5);
        let rows: Vec<usize> = sink.batches().iter().map(|b| b.rows).collect();
        assert_eq!(rows, [2, 2, 1]);
    }

    #[test]
    fn test_scalar_terminal_one_row_per_value() {
        let schema: Schema = IntSchema::standard().into();
        let publisher = JsonStreamPublisher::new(
            PublisherOptions::new(schema).chunk_rows(10).multi_value(true),
        )
        .unwrap();
        let sink = CollectSink::new();
        let total = publisher
            .execute(vec![Source::from("1 2 3")], &sink)
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(sink.batches().len(), 1);
        assert_eq!(sink.batches()[0].columns[0].int_values(), &[
            Some(1),
            Some(2),
            Some(3)
        ]);
    }

    #[test]
    fn test_single_value_ignores_trailing() {
        let schema: Schema = IntSchema::standard().into();
        let publisher = JsonStreamPublisher::new(PublisherOptions::new(schema)).unwrap();
        let sink = CollectSink::new();
        let total = publisher
            .execute(vec![Source::from("1 2 3")], &sink)
            .unwrap();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_decode_failure_reported_to_sink() {
        let publisher =
            JsonStreamPublisher::new(PublisherOptions::new(int_array_envelope())).unwrap();
        let sink = CollectSink::new();
        let total = publisher
            .execute(
                vec![
                    Source::from(r#"{"data": [1, "bad"]}"#),
                ],
                &sink,
            )
            .unwrap();
        assert_eq!(total, 0);
        assert_eq!(sink.failures().len(), 1);
    }

    #[test]
    fn test_shutdown_is_a_failure_not_silence() {
        let publisher =
            JsonStreamPublisher::new(PublisherOptions::new(int_array_envelope())).unwrap();
        publisher.shutdown();
        let sink = CollectSink::new();
        publisher
            .execute(vec![Source::from(r#"{"data": [1]}"#)], &sink)
            .unwrap();
        assert!(matches!(sink.failures()[0], Error::Shutdown));
    }

    #[test]
    fn test_invalid_options_rejected() {
        assert!(
            JsonStreamPublisher::new(
                PublisherOptions::new(int_array_envelope()).chunk_rows(0)
            )
            .is_err()
        );
        assert!(
            JsonStreamPublisher::new(PublisherOptions::new(int_array_envelope()).workers(0))
                .is_err()
        );
    }
}
