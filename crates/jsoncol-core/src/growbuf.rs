//! Amortized-growth scratch buffers for array decoding

/// A resizable scratch array used while the element count of a JSON array is
/// not yet known.
///
/// Capacity doubles on overflow; [`take`](GrowBuf::take) trims to the exact
/// final length (zero-copy when the buffer is already exact) and
/// [`reset`](GrowBuf::reset) retains capacity for the next array.
#[derive(Debug)]
pub struct GrowBuf<T> {
    buf: Box<[T]>,
    len: usize,
}

impl<T: Clone + Default> GrowBuf<T> {
    /// Create an empty buffer with no capacity.
    pub fn new() -> Self {
        Self {
            buf: Box::default(),
            len: 0,
        }
    }

    /// Logical length.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated capacity.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Append one element, doubling capacity when full.
    pub fn push(&mut self, value: T) {
        if self.len == self.buf.len() {
            self.grow();
        }
        self.buf[self.len] = value;
        self.len += 1;
    }

    /// Clear the logical length, keeping capacity for the next array.
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Hand off the elements as an exact-length vector, leaving the buffer
    /// empty. When the logical length equals capacity the backing allocation
    /// is moved out without copying.
    pub fn take(&mut self) -> Vec<T> {
        if self.len == self.buf.len() {
            self.len = 0;
            std::mem::take(&mut self.buf).into_vec()
        } else {
            let out = self.buf[..self.len].to_vec();
            self.len = 0;
            out
        }
    }

    fn grow(&mut self) {
        let new_cap = (self.buf.len() * 2).max(4);
        let mut next = vec![T::default(); new_cap].into_boxed_slice();
        for (slot, value) in next.iter_mut().zip(self.buf.iter_mut()) {
            *slot = std::mem::take(value);
        }
        self.buf = next;
    }
}

impl<T: Clone + Default> Default for GrowBuf<T> {
    fn default() -> Self {
        Self::new()
    }
}
