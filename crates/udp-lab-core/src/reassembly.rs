//! Receiver-side reordering buffer.

use std::collections::HashMap;
use tracing::debug;

/// Holds out-of-order payloads and releases them in sequence order.
///
/// There is no window limit on how far ahead a frame may arrive; anything
/// beyond the next expected sequence number is buffered until the gap in
/// front of it closes. A gap for a sequence number that was never sent
/// (suppressed at the sender) never closes, so delivery stalls there; the
/// protocol signals congestion only and does not retransmit.
#[derive(Debug, Default)]
pub struct ReassemblyBuffer {
    expected: u32,
    pending: HashMap<u32, String>,
    delivered: Vec<(u32, String)>,
}

impl ReassemblyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one received frame; returns the (seq, payload) pairs this call
    /// released to the application, in order.
    ///
    /// A stale or duplicate sequence number is absorbed into the pending map
    /// harmlessly and releases nothing: `expected` never moves backwards, so
    /// nothing already delivered can be delivered twice.
    pub fn accept(&mut self, seq: u32, payload: String) -> Vec<(u32, String)> {
        if seq != self.expected {
            debug!(seq, expected = self.expected, "buffering out-of-order frame");
            self.pending.insert(seq, payload);
            return Vec::new();
        }

        let mut released = vec![(seq, payload)];
        self.expected += 1;
        while let Some(next) = self.pending.remove(&self.expected) {
            released.push((self.expected, next));
            self.expected += 1;
        }
        self.delivered.extend(released.iter().cloned());
        released
    }

    /// The next sequence number eligible for immediate delivery.
    pub fn expected(&self) -> u32 {
        self.expected
    }

    /// Number of frames held waiting for a gap to close.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// The in-order output log, append-only.
    pub fn delivered(&self) -> &[(u32, String)] {
        &self.delivered
    }

    pub fn into_delivered(self) -> Vec<(u32, String)> {
        self.delivered
    }
}
