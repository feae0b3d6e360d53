//! Byte Relay
//!
//! Moves bytes from a [`ByteSource`] to a [`ByteSink`] through a
//! [`RingBuffer`], one non-blocking step per call. The caller runs
//! [`Relay::poll`] (or [`Relay::transfer`] plus its own housekeeping) forever
//! from a single loop.
//!
//! Ordering within one iteration is fixed: ingress, then egress, then
//! housekeeping. A byte leaves the queue only after the sink accepted it, so
//! a sink that is momentarily busy never loses data and byte order is kept
//! across retries.

use core::fmt;

use crate::ring_buffer::RingBuffer;

/// Why a sink did not take a byte
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendError {
    /// Sink cannot accept data right now; retry later
    NotReady,
    /// Sink reported a transfer error
    Failed,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "sink not ready"),
            Self::Failed => write!(f, "sink transfer failed"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for SendError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::NotReady => defmt::write!(f, "NotReady"),
            Self::Failed => defmt::write!(f, "Failed"),
        }
    }
}

/// Producing side of a relay
pub trait ByteSource {
    /// Take one byte if one is available, without waiting
    fn receive_byte(&mut self) -> Option<u8>;
}

/// Consuming side of a relay
pub trait ByteSink {
    /// Whether the sink can accept more data right now
    fn is_send_ready(&mut self) -> bool;

    /// Push one byte without waiting
    ///
    /// # Errors
    ///
    /// Returns [`SendError::NotReady`] if the sink filled up since the last
    /// readiness check, or [`SendError::Failed`] on a transfer error.
    fn send_byte(&mut self, byte: u8) -> Result<(), SendError>;

    /// Native block size of the sink (for USB, the endpoint packet size)
    fn chunk_limit(&self) -> usize;
}

/// Housekeeping that must run once per loop iteration
pub trait PeriodicTask {
    /// Advance the transport's own state machines
    fn periodic_task(&mut self);
}

impl<T: PeriodicTask + ?Sized> PeriodicTask for &mut T {
    fn periodic_task(&mut self) {
        (**self).periodic_task();
    }
}

/// Housekeeping that does nothing
pub struct NoHousekeeping;

impl PeriodicTask for NoHousekeeping {
    fn periodic_task(&mut self) {}
}

/// What one relay iteration moved
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransferReport {
    /// A byte was taken from the source
    pub received: bool,
    /// Bytes accepted by the sink
    pub sent: usize,
}

impl TransferReport {
    /// Whether anything moved
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        !self.received && self.sent == 0
    }
}

/// One direction of the bridge
pub struct Relay<'a> {
    queue: RingBuffer<'a>,
}

impl<'a> Relay<'a> {
    /// Create a relay queuing through `storage`
    #[must_use]
    pub fn new(storage: &'a mut [u8]) -> Self {
        Self {
            queue: RingBuffer::new(storage),
        }
    }

    /// Bytes waiting for the sink
    #[must_use]
    pub const fn pending(&self) -> usize {
        self.queue.count()
    }

    /// Read access to the queue
    #[must_use]
    pub const fn queue(&self) -> &RingBuffer<'a> {
        &self.queue
    }

    /// Drop everything queued (link reset)
    pub fn reset(&mut self) {
        self.queue.clear();
    }

    /// Run a full iteration: ingress, egress, then housekeeping
    pub fn poll<S, K, P>(&mut self, source: &mut S, sink: &mut K, housekeeping: &mut P) -> TransferReport
    where
        S: ByteSource + ?Sized,
        K: ByteSink + ?Sized,
        P: PeriodicTask + ?Sized,
    {
        let report = self.transfer(source, sink);
        housekeeping.periodic_task();
        report
    }

    /// Run ingress and egress without housekeeping
    ///
    /// Used when several relays share one loop and one housekeeping call.
    pub fn transfer<S, K>(&mut self, source: &mut S, sink: &mut K) -> TransferReport
    where
        S: ByteSource + ?Sized,
        K: ByteSink + ?Sized,
    {
        TransferReport {
            received: self.ingress(source),
            sent: self.egress(sink),
        }
    }

    /// Move at most one byte from the source into the queue
    ///
    /// The source is not touched while the queue is full, so the byte stays
    /// with the producer and its own flow control holds the host back.
    fn ingress<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> bool {
        if self.queue.is_full() {
            return false;
        }

        match source.receive_byte() {
            Some(byte) => {
                self.queue.insert(byte);
                true
            }
            None => false,
        }
    }

    /// Move up to `chunk_limit - 1` bytes from the queue into the sink
    ///
    /// One byte short of a full block so the sink never has to terminate a
    /// full-size transfer with a zero-length packet while the consumer may
    /// not be listening.
    fn egress<K: ByteSink + ?Sized>(&mut self, sink: &mut K) -> usize {
        let queued = self.queue.count();
        if queued == 0 || !sink.is_send_ready() {
            return 0;
        }

        let quota = queued.min(sink.chunk_limit().saturating_sub(1));
        let mut sent = 0;
        while sent < quota {
            let Some(byte) = self.queue.peek() else {
                break;
            };
            if sink.send_byte(byte).is_err() {
                break;
            }
            self.queue.remove();
            sent += 1;
        }
        sent
    }
}
