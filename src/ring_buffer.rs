//! Bounded, thread-safe ring buffer
//!
//! A fixed-capacity FIFO shared between producers and consumers:
//! - `add` never fails; when full it overwrites the oldest element
//! - `pop` removes the oldest element, or returns `None` when empty
//! - `readd` puts a popped element back at the head so it is retried
//!   before anything newer
//!
//! Every operation takes one exclusive lock for O(1) index arithmetic and
//! never waits for the buffer to change state.
//!
//! ```
//! use svckit::RingBuffer;
//!
//! let buf = RingBuffer::new(3);
//! for i in 1..=4 {
//!     buf.add(i);
//! }
//! assert_eq!(buf.snapshot(), vec![2, 3, 4]);
//!
//! let item = buf.pop().unwrap();
//! assert_eq!(item, 2);
//! // processing failed, put it back in front
//! buf.readd(item).unwrap();
//! assert_eq!(buf.snapshot(), vec![2, 3, 4]);
//! ```

use parking_lot::Mutex;
use std::fmt;

use crate::errors::{Result, SvcError};

/// Fixed-capacity FIFO with overwrite-on-full and put-back semantics.
///
/// Share between threads with `Arc<RingBuffer<T>>`.
pub struct RingBuffer<T> {
    inner: Mutex<Slots<T>>,
}

/// Live elements occupy `[start, start + size) mod capacity`.
struct Slots<T> {
    data: Box<[Option<T>]>,
    start: usize,
    size: usize,
}

impl<T> Slots<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            data: std::iter::repeat_with(|| None).take(capacity).collect(),
            start: 0,
            size: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }

    fn is_full(&self) -> bool {
        self.size == self.capacity()
    }

    fn push_back(&mut self, item: T) {
        let cap = self.capacity();
        let idx = (self.start + self.size) % cap;
        // When full, idx == start and the evicted element is dropped here.
        self.data[idx] = Some(item);
        if self.size < cap {
            self.size += 1;
        } else {
            self.start = (self.start + 1) % cap;
        }
    }

    fn pop_front(&mut self) -> Option<T> {
        if self.size == 0 {
            return None;
        }
        let item = self.data[self.start].take();
        self.start = (self.start + 1) % self.capacity();
        self.size -= 1;
        item
    }

    fn push_front(&mut self, item: T) -> std::result::Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        let cap = self.capacity();
        self.start = (self.start + cap - 1) % cap;
        self.data[self.start] = Some(item);
        self.size += 1;
        Ok(())
    }

    fn iter(&self) -> impl Iterator<Item = &T> {
        let cap = self.capacity();
        (0..self.size).filter_map(move |i| self.data[(self.start + i) % cap].as_ref())
    }
}

impl<T> RingBuffer<T> {
    /// Create an empty buffer holding at most `capacity` elements.
    ///
    /// # Panics
    /// Panics if `capacity` is zero. Use [`RingBuffer::try_new`] when the
    /// capacity comes from configuration.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be > 0");
        Self {
            inner: Mutex::new(Slots::with_capacity(capacity)),
        }
    }

    /// Create an empty buffer, rejecting a zero capacity.
    pub fn try_new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(SvcError::InvalidCapacity);
        }
        Ok(Self::new(capacity))
    }

    /// Append an element. If the buffer is full the oldest element is
    /// dropped to make room.
    pub fn add(&self, item: T) {
        self.inner.lock().push_back(item);
    }

    /// Remove and return the oldest element, or `None` if the buffer is empty.
    pub fn pop(&self) -> Option<T> {
        self.inner.lock().pop_front()
    }

    /// Put an element back at the head of the buffer, ahead of everything
    /// currently queued.
    ///
    /// Intended for returning an element obtained from [`RingBuffer::pop`]
    /// whose processing failed. If the buffer has filled up in the meantime
    /// the element is handed back as `Err(item)` and nothing changes.
    pub fn readd(&self, item: T) -> std::result::Result<(), T> {
        self.inner.lock().push_front(item)
    }

    /// Number of elements currently stored.
    pub fn len(&self) -> usize {
        self.inner.lock().size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.inner.lock().is_full()
    }

    /// Fixed capacity chosen at construction.
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// Remove every element, oldest first.
    pub fn drain(&self) -> Vec<T> {
        let mut slots = self.inner.lock();
        let mut out = Vec::with_capacity(slots.size);
        while let Some(item) = slots.pop_front() {
            out.push(item);
        }
        out
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Copy of the live elements, oldest first.
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.lock().iter().cloned().collect()
    }
}

impl<T> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.inner.lock();
        f.debug_struct("RingBuffer")
            .field("capacity", &slots.capacity())
            .field("len", &slots.size)
            .field("start", &slots.start)
            .finish()
    }
}
