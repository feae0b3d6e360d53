//! Relay Loop Tests
//!
//! Tests for byte relaying between a source and a sink under backpressure.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test relay_tests

use std::collections::VecDeque;

use usb_serial_bridge::relay::{
    ByteSink, ByteSource, NoHousekeeping, PeriodicTask, Relay, SendError, TransferReport,
};

/// Host side mock: bytes the host has written, handed out one at a time
struct MockSource {
    pending: VecDeque<u8>,
    polls: usize,
}

impl MockSource {
    fn new(data: &[u8]) -> Self {
        Self {
            pending: data.iter().copied().collect(),
            polls: 0,
        }
    }
}

impl ByteSource for MockSource {
    fn receive_byte(&mut self) -> Option<u8> {
        self.polls += 1;
        self.pending.pop_front()
    }
}

/// Consumer mock with scripted readiness and failures
struct MockSink {
    received: Vec<u8>,
    chunk_limit: usize,
    ready: bool,
    /// Fail the send attempt with this index (0-based, counted across calls)
    fail_at: Option<usize>,
    attempts: usize,
}

impl MockSink {
    fn new(chunk_limit: usize) -> Self {
        Self {
            received: Vec::new(),
            chunk_limit,
            ready: true,
            fail_at: None,
            attempts: 0,
        }
    }
}

impl ByteSink for MockSink {
    fn is_send_ready(&mut self) -> bool {
        self.ready
    }

    fn send_byte(&mut self, byte: u8) -> Result<(), SendError> {
        let attempt = self.attempts;
        self.attempts += 1;
        if self.fail_at == Some(attempt) {
            return Err(SendError::NotReady);
        }
        self.received.push(byte);
        Ok(())
    }

    fn chunk_limit(&self) -> usize {
        self.chunk_limit
    }
}

#[derive(Default)]
struct CountingTask {
    calls: usize,
}

impl PeriodicTask for CountingTask {
    fn periodic_task(&mut self) {
        self.calls += 1;
    }
}

/// Fill a relay's queue directly through ingress, with a sink that never sends
fn preload(relay: &mut Relay<'_>, data: &[u8]) {
    let mut source = MockSource::new(data);
    let mut blocked = MockSink::new(16);
    blocked.ready = false;
    for _ in 0..data.len() {
        relay.transfer(&mut source, &mut blocked);
    }
}

// =============================================================================
// Ingress
// =============================================================================

#[test]
fn ingress_takes_one_byte_per_iteration() {
    let mut storage = [0u8; 16];
    let mut relay = Relay::new(&mut storage);
    let mut source = MockSource::new(b"abc");
    let mut sink = MockSink::new(16);
    sink.ready = false;

    let report = relay.transfer(&mut source, &mut sink);
    assert!(report.received);
    assert_eq!(relay.pending(), 1);
    assert_eq!(source.pending.len(), 2);
}

#[test]
fn ingress_with_no_data_does_nothing() {
    let mut storage = [0u8; 16];
    let mut relay = Relay::new(&mut storage);
    let mut source = MockSource::new(b"");
    let mut sink = MockSink::new(16);

    let report = relay.transfer(&mut source, &mut sink);
    assert_eq!(report, TransferReport::default());
    assert!(report.is_idle());
    assert_eq!(relay.pending(), 0);
}

#[test]
fn ingress_skipped_when_queue_full() {
    let mut storage = [0u8; 2];
    let mut relay = Relay::new(&mut storage);
    preload(&mut relay, b"xy");
    assert!(relay.queue().is_full());

    let mut source = MockSource::new(b"z");
    let mut sink = MockSink::new(16);
    sink.ready = false;
    let report = relay.transfer(&mut source, &mut sink);

    assert!(!report.received);
    assert_eq!(source.polls, 0, "source must not be read while full");
    assert_eq!(source.pending.len(), 1);
}

// =============================================================================
// Egress
// =============================================================================

#[test]
fn egress_sends_chunk_limit_minus_one() {
    let mut storage = [0u8; 32];
    let mut relay = Relay::new(&mut storage);
    preload(&mut relay, &[0x55; 20]);
    assert_eq!(relay.pending(), 20);

    let mut source = MockSource::new(b"");
    let mut sink = MockSink::new(8);
    let report = relay.transfer(&mut source, &mut sink);

    assert_eq!(report.sent, 7);
    assert_eq!(sink.received.len(), 7);
    assert_eq!(relay.pending(), 13);
}

#[test]
fn egress_sends_everything_below_quota() {
    let mut storage = [0u8; 32];
    let mut relay = Relay::new(&mut storage);
    preload(&mut relay, b"hi!");

    let mut sink = MockSink::new(16);
    let report = relay.transfer(&mut MockSource::new(b""), &mut sink);
    assert_eq!(report.sent, 3);
    assert_eq!(sink.received, b"hi!");
    assert_eq!(relay.pending(), 0);
}

#[test]
fn egress_waits_for_ready_sink() {
    let mut storage = [0u8; 8];
    let mut relay = Relay::new(&mut storage);
    preload(&mut relay, b"abc");

    let mut sink = MockSink::new(16);
    sink.ready = false;
    let report = relay.transfer(&mut MockSource::new(b""), &mut sink);
    assert_eq!(report.sent, 0);
    assert_eq!(sink.attempts, 0);
    assert_eq!(relay.pending(), 3);
}

#[test]
fn egress_failure_keeps_remaining_bytes() {
    let mut storage = [0u8; 16];
    let mut relay = Relay::new(&mut storage);
    preload(&mut relay, b"012345");

    let mut sink = MockSink::new(16);
    sink.fail_at = Some(2);
    let report = relay.transfer(&mut MockSource::new(b""), &mut sink);

    assert_eq!(report.sent, 2);
    assert_eq!(sink.received, b"01");
    assert_eq!(relay.pending(), 4);
    assert_eq!(relay.queue().peek(), Some(b'2'));

    // Next pass resumes at the byte that failed
    let report = relay.transfer(&mut MockSource::new(b""), &mut sink);
    assert_eq!(report.sent, 4);
    assert_eq!(sink.received, b"012345");
}

// =============================================================================
// Round Trip
// =============================================================================

#[test]
fn relay_round_trip_preserves_order() {
    let message: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
    let mut storage = [0u8; 128];
    let mut relay = Relay::new(&mut storage);
    let mut source = MockSource::new(&message);
    let mut sink = MockSink::new(16);
    let mut task = NoHousekeeping;

    for _ in 0..5000 {
        relay.poll(&mut source, &mut sink, &mut task);
        if sink.received.len() == message.len() {
            break;
        }
    }
    assert_eq!(sink.received, message);
}

#[test]
fn relay_round_trip_with_intermittent_sink() {
    let message = b"The quick brown fox jumps over the lazy dog".to_vec();
    let mut storage = [0u8; 8];
    let mut relay = Relay::new(&mut storage);
    let mut source = MockSource::new(&message);
    let mut sink = MockSink::new(4);

    for i in 0..1000 {
        sink.ready = i % 3 != 0;
        if i % 7 == 0 {
            sink.fail_at = Some(sink.attempts);
        }
        relay.transfer(&mut source, &mut sink);
    }
    assert_eq!(sink.received, message);
    assert_eq!(relay.pending(), 0);
}

// =============================================================================
// Housekeeping
// =============================================================================

#[test]
fn housekeeping_runs_once_per_poll() {
    let mut storage = [0u8; 4];
    let mut relay = Relay::new(&mut storage);
    let mut source = MockSource::new(b"ab");
    let mut sink = MockSink::new(16);
    sink.ready = false;
    let mut task = CountingTask::default();

    relay.poll(&mut source, &mut sink, &mut task);
    relay.poll(&mut source, &mut sink, &mut task);
    relay.poll(&mut source, &mut sink, &mut task);
    assert_eq!(task.calls, 3);
}

#[test]
fn housekeeping_without_work_changes_nothing() {
    let mut storage = [0u8; 4];
    let mut relay = Relay::new(&mut storage);
    preload(&mut relay, b"q");

    let mut source = MockSource::new(b"");
    let mut sink = MockSink::new(16);
    sink.ready = false;
    let mut task = NoHousekeeping;

    for _ in 0..10 {
        let report = relay.poll(&mut source, &mut sink, &mut task);
        assert!(report.is_idle());
    }
    assert_eq!(relay.pending(), 1);
    assert_eq!(relay.queue().peek(), Some(b'q'));
    assert!(sink.received.is_empty());
}

#[test]
fn housekeeping_through_mutable_reference() {
    let mut storage = [0u8; 4];
    let mut relay = Relay::new(&mut storage);
    let mut task = CountingTask::default();
    {
        let mut borrowed = &mut task;
        relay.poll(&mut MockSource::new(b""), &mut MockSink::new(16), &mut borrowed);
    }
    assert_eq!(task.calls, 1);
}

// =============================================================================
// Scenario: capacity 4
// =============================================================================

#[test]
fn relay_capacity_four_scenario() {
    let mut storage = [0u8; 4];
    let mut relay = Relay::new(&mut storage);
    preload(&mut relay, b"ABCD");
    assert!(relay.queue().is_full());

    // Host byte available but queue full: skipped
    let mut source = MockSource::new(b"E");
    let mut blocked = MockSink::new(16);
    blocked.ready = false;
    relay.transfer(&mut source, &mut blocked);
    assert_eq!(source.pending.len(), 1);

    // Sink takes exactly one byte (chunk limit 2 -> quota 1)
    let mut one = MockSink::new(2);
    relay.transfer(&mut MockSource::new(b""), &mut one);
    assert_eq!(one.received, b"A");
    assert_eq!(relay.pending(), 3);

    // Now E is accepted
    relay.transfer(&mut source, &mut blocked);
    assert_eq!(relay.pending(), 4);

    let mut drain = MockSink::new(16);
    relay.transfer(&mut MockSource::new(b""), &mut drain);
    assert_eq!(drain.received, b"BCDE");
}

// =============================================================================
// Reset
// =============================================================================

#[test]
fn relay_reset_drops_queue() {
    let mut storage = [0u8; 8];
    let mut relay = Relay::new(&mut storage);
    preload(&mut relay, b"stale");
    relay.reset();
    assert_eq!(relay.pending(), 0);

    let mut sink = MockSink::new(16);
    relay.transfer(&mut MockSource::new(b"new"), &mut sink);
    assert_eq!(sink.received, b"n");
}

#[test]
fn send_error_display() {
    assert_eq!(SendError::NotReady.to_string(), "sink not ready");
    assert_eq!(SendError::Failed.to_string(), "sink transfer failed");
}
