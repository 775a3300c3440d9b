//! The pending/in-service request handle.

use crate::clock::Instant;

/// One pending or in-service request.
///
/// Generic over the payload type so callers keep static type information
/// instead of routing an `Any`-erased value through the scheduler.
#[derive(Debug, Clone)]
pub struct Packet<T> {
    /// Caller-owned payload.
    pub payload: T,

    /// Target queue, assigned by a classifier before `enqueue` and immutable
    /// thereafter.
    pub(crate) queue_idx: usize,

    /// Monotonic per-flow sequence number, used only to verify in-order
    /// dequeue in tests.
    pub seq: u64,

    /// Stamped by `dequeue`; consumed by `finish`. `None` until dequeued.
    pub(crate) start_time: Option<Instant>,
}

impl<T> Packet<T> {
    /// Creates a new packet targeting `queue_idx`, not yet dequeued.
    pub fn new(payload: T, queue_idx: usize, seq: u64) -> Self {
        Self {
            payload,
            queue_idx,
            seq,
            start_time: None,
        }
    }

    /// The queue this packet was classified into.
    pub fn queue_idx(&self) -> usize {
        self.queue_idx
    }

    /// The instant this packet was dequeued, if it has been.
    pub fn start_time(&self) -> Option<Instant> {
        self.start_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_packet_has_no_start_time() {
        let p = Packet::new("payload", 3, 1);
        assert_eq!(p.queue_idx(), 3);
        assert_eq!(p.seq, 1);
        assert!(p.start_time().is_none());
    }
}
