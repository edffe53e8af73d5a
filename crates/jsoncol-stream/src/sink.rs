//! Batch sink interface and the bundled collecting sink

use parking_lot::Mutex;

use jsoncol::{Column, Error};

/// One flushed chunk: the column set plus its row count.
#[derive(Debug, Clone)]
pub struct Batch {
    pub columns: Vec<Column>,
    pub rows: usize,
}

/// Receives flushed chunks and worker failures.
///
/// Called concurrently from worker threads. A worker that fails reports
/// through `accept_failure` and stops; chunks it already flushed remain
/// delivered (at-least-once, not exactly-once, for partially decoded
/// sources).
pub trait BatchSink: Send + Sync {
    fn accept(&self, batch: Batch);

    fn accept_failure(&self, error: Error);
}

/// In-memory sink collecting everything it receives, for tests and simple
/// callers.
#[derive(Default)]
pub struct CollectSink {
    inner: Mutex<CollectInner>,
}

#[derive(Default)]
struct CollectInner {
    batches: Vec<Batch>,
    failures: Vec<Error>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<Batch> {
        self.inner.lock().batches.clone()
    }

    pub fn failures(&self) -> Vec<Error> {
        self.inner.lock().failures.clone()
    }

    /// Total rows across all accepted batches.
    pub fn total_rows(&self) -> usize {
        self.inner.lock().batches.iter().map(|b| b.rows).sum()
    }
}

impl BatchSink for CollectSink {
    fn accept(&self, batch: Batch) {
        self.inner.lock().batches.push(batch);
    }

    fn accept_failure(&self, error: Error) {
        self.inner.lock().failures.push(error);
    }
}
