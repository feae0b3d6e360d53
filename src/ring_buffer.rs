//! Bounded Byte Queue
//!
//! Fixed-capacity circular buffer over caller-supplied storage. Used by the
//! relay loop to decouple a producing transport from a consuming one.
//!
//! There is no locking. The queue is correct for exactly one producer and one
//! consumer polled from the same execution context. If either side moves into
//! an interrupt handler the cursor and count updates must be wrapped in a
//! critical section.

/// Circular byte queue
///
/// Invariants: `count <= capacity`, both cursors are always `< capacity`,
/// and `read`/`write` wrap modulo capacity.
pub struct RingBuffer<'a> {
    storage: &'a mut [u8],
    read: usize,
    write: usize,
    count: usize,
}

impl<'a> RingBuffer<'a> {
    /// Create an empty queue over `storage`
    ///
    /// The capacity is the length of `storage` and never changes.
    #[must_use]
    pub fn new(storage: &'a mut [u8]) -> Self {
        Self {
            storage,
            read: 0,
            write: 0,
            count: 0,
        }
    }

    /// Total number of slots
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Number of occupied slots
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Number of free slots
    #[must_use]
    pub fn free(&self) -> usize {
        self.capacity() - self.count
    }

    /// Check if empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Check if full
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    /// Append one byte at the write cursor
    ///
    /// The caller must check [`is_full`](Self::is_full) first. Inserting into
    /// a full queue is a contract violation: it trips a debug assertion, and
    /// in release builds the byte is discarded rather than overwriting
    /// unread data.
    pub fn insert(&mut self, byte: u8) {
        debug_assert!(!self.is_full(), "insert into full ring buffer");
        if self.is_full() {
            return;
        }

        self.storage[self.write] = byte;
        self.write = self.advance(self.write);
        self.count += 1;
    }

    /// Remove and return the oldest byte
    pub fn remove(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.read = self.advance(self.read);
        self.count -= 1;
        Some(byte)
    }

    /// Return the oldest byte without removing it
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        if self.is_empty() {
            None
        } else {
            Some(self.storage[self.read])
        }
    }

    /// Drop all queued bytes
    pub fn clear(&mut self) {
        self.read = 0;
        self.write = 0;
        self.count = 0;
    }

    fn advance(&self, cursor: usize) -> usize {
        let next = cursor + 1;
        if next == self.capacity() {
            0
        } else {
            next
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for RingBuffer<'_> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "RingBuffer({}/{})", self.count, self.capacity());
    }
}
