//! Per-flow pending-packet FIFO plus virtual-time bookkeeping.

use std::collections::VecDeque;

use crate::packet::Packet;

/// One flow's pending packets and virtual-time cursor.
///
/// No concurrency control at this level; [`crate::scheduler::Scheduler`]'s
/// lock protects all `Queue` state.
pub struct Queue<T> {
    packets: VecDeque<Packet<T>>,
    pub(crate) vir_start: f64,
    pub(crate) requests_executing: u64,
}

impl<T> Queue<T> {
    /// Creates a new, empty queue with `vir_start` at zero.
    pub fn new() -> Self {
        Self {
            packets: VecDeque::new(),
            vir_start: 0.0,
            requests_executing: 0,
        }
    }

    /// Appends `packet` to the tail. O(1) amortized.
    pub(crate) fn enqueue(&mut self, packet: Packet<T>) {
        self.packets.push_back(packet);
    }

    /// Removes and returns the head packet, if any.
    pub(crate) fn dequeue(&mut self) -> Option<Packet<T>> {
        self.packets.pop_front()
    }

    /// Reads the head packet without popping it, for selection.
    pub(crate) fn head(&self) -> Option<&Packet<T>> {
        self.packets.front()
    }

    /// Number of pending (not yet dequeued) packets.
    pub fn pending_len(&self) -> usize {
        self.packets.len()
    }

    /// Number of packets dequeued but not yet finished.
    pub fn requests_executing(&self) -> u64 {
        self.requests_executing
    }

    /// The queue's current virtual start time cursor.
    pub fn vir_start(&self) -> f64 {
        self.vir_start
    }

    /// A queue is active iff it has pending packets or in-service requests.
    pub fn is_active(&self) -> bool {
        !self.packets.is_empty() || self.requests_executing > 0
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_is_preserved() {
        let mut q: Queue<u32> = Queue::new();
        q.enqueue(Packet::new(1, 0, 1));
        q.enqueue(Packet::new(2, 0, 2));
        assert_eq!(q.dequeue().unwrap().payload, 1);
        assert_eq!(q.dequeue().unwrap().payload, 2);
        assert!(q.dequeue().is_none());
    }

    #[test]
    fn empty_queue_is_not_active() {
        let q: Queue<u32> = Queue::new();
        assert!(!q.is_active());
    }

    #[test]
    fn queue_with_pending_packets_is_active() {
        let mut q: Queue<u32> = Queue::new();
        q.enqueue(Packet::new(1, 0, 1));
        assert!(q.is_active());
    }

    #[test]
    fn queue_with_in_service_requests_is_active_even_when_drained() {
        let mut q: Queue<u32> = Queue::new();
        q.enqueue(Packet::new(1, 0, 1));
        q.requests_executing += 1;
        q.dequeue();
        assert!(q.is_active());
    }

    #[test]
    fn head_does_not_remove() {
        let mut q: Queue<u32> = Queue::new();
        q.enqueue(Packet::new(7, 0, 1));
        assert_eq!(q.head().unwrap().payload, 7);
        assert_eq!(q.pending_len(), 1);
    }
}
