//! The fair-queueing scheduler core.
//!
//! Owns a fixed vector of [`Queue`]s and the global virtual-time clock, and
//! serializes all mutation behind a single `parking_lot::Mutex` — matching
//! the locking discipline `vakthund-engine`'s `SimulationRuntime` uses for
//! its own shared simulation state. The critical sections here are short
//! (O(N) scans over a small N of queues) so a single coarse lock is
//! preferred over fine-grained sharding; see the module-level design notes
//! in the crate docs for the reasoning.

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::clock::{Clock, Instant};
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::packet::Packet;
use crate::queue::Queue;

struct Inner<T> {
    queues: Vec<Queue<T>>,
    vt: f64,
    last_real_time: Instant,
    robin_idx: usize,
}

impl<T> Inner<T> {
    fn queue_count(&self) -> usize {
        self.queues.len()
    }

    /// The virtual-time ratio `R`: the rate at which `vt` advances per unit
    /// real time, given how many flows are active and how much of the
    /// concurrency budget is in use.
    fn virtual_time_ratio(
        active_queues: u64,
        reqs_executing: u64,
        concurrency_limit: u64,
    ) -> f64 {
        if active_queues == 0 {
            return 0.0;
        }
        reqs_executing.min(concurrency_limit) as f64 / active_queues as f64
    }

    /// Selects the queue holding the pending packet with the smallest
    /// virtual finish time, breaking ties round-robin. Advances
    /// `robin_idx` to just past the chosen queue.
    fn select_queue(&mut self, service_time_estimate: f64) -> Option<usize> {
        let n = self.queue_count();
        let mut best_idx: Option<usize> = None;
        let mut best_vf = f64::INFINITY;
        let mut chosen_robin_idx = self.robin_idx;

        for _ in 0..n {
            self.robin_idx = (self.robin_idx + 1) % n;
            let queue = &self.queues[self.robin_idx];
            if queue.head().is_none() {
                continue;
            }
            let cur_vf = queue.vir_start() + service_time_estimate;
            if cur_vf < best_vf {
                best_vf = cur_vf;
                best_idx = Some(self.robin_idx);
                chosen_robin_idx = self.robin_idx;
            }
        }

        self.robin_idx = chosen_robin_idx;
        best_idx
    }
}

/// The fair-queueing scheduler.
///
/// `T` is the packet payload type; `C` is the injectable [`Clock`]. See the
/// crate-level docs for the full lifecycle (enqueue → dequeue → finish).
pub struct Scheduler<T, C: Clock> {
    inner: Mutex<Inner<T>>,
    clock: C,
    concurrency_limit: u64,
    service_time_estimate: f64,
}

impl<T, C: Clock> Scheduler<T, C> {
    /// Creates a scheduler over `queue_count` flows.
    ///
    /// # Panics
    ///
    /// Panics if `queue_count` is zero: a scheduler with no flows cannot
    /// ever select anything, and is almost always a construction bug in the
    /// caller rather than a recoverable runtime condition.
    pub fn new(
        queue_count: usize,
        clock: C,
        concurrency_limit: u64,
        service_time_estimate: f64,
    ) -> Self {
        assert!(queue_count > 0, "scheduler requires at least one queue");
        let now = clock.now();
        let queues = (0..queue_count).map(|_| Queue::new()).collect();
        Self {
            inner: Mutex::new(Inner {
                queues,
                vt: 0.0,
                last_real_time: now,
                robin_idx: 0,
            }),
            clock,
            concurrency_limit,
            service_time_estimate,
        }
    }

    /// Builds a scheduler from a validated [`SchedulerConfig`] and an
    /// injected clock. Fails with [`SchedulerError::Config`] if `config`
    /// doesn't pass [`SchedulerConfig::validate`].
    pub fn from_config(config: SchedulerConfig, clock: C) -> Result<Self, SchedulerError> {
        config.validate()?;
        Ok(Self::new(
            config.queue_count,
            clock,
            config.concurrency_limit,
            config.service_time_estimate_ns,
        ))
    }

    /// Parses, validates, and builds a scheduler from a YAML configuration
    /// string. See [`SchedulerConfig::from_yaml_str`] for the accepted shape.
    pub fn from_yaml_str(yaml: &str, clock: C) -> Result<Self, SchedulerError> {
        let config = SchedulerConfig::from_yaml_str(yaml)?;
        Self::from_config(config, clock)
    }

    /// Parses, validates, and builds a scheduler from a YAML configuration
    /// file on disk. See [`SchedulerConfig::from_yaml_file`] for the
    /// accepted shape.
    pub fn from_yaml_file(path: impl AsRef<std::path::Path>, clock: C) -> Result<Self, SchedulerError> {
        let config = SchedulerConfig::from_yaml_file(path)?;
        Self::from_config(config, clock)
    }

    /// Number of flows (queues) this scheduler manages.
    pub fn queue_count(&self) -> usize {
        self.inner.lock().queue_count()
    }

    /// Current global virtual time, mostly useful for tests and diagnostics.
    pub fn virtual_time(&self) -> f64 {
        self.inner.lock().vt
    }

    fn sync_time(&self, inner: &mut Inner<T>) {
        let now = self.clock.now();
        let concurrency_limit = self.concurrency_limit;

        // Computed from the single `now` reading above, not a fresh call to
        // `clock.since`, so a synthetic clock under test (whose `now()`
        // advances on every call) only ticks once per synchronization step.
        let delta_r = now.elapsed_since(inner.last_real_time);
        inner.last_real_time = now;

        let mut active_queues = 0u64;
        let mut reqs_executing = 0u64;
        for queue in &inner.queues {
            reqs_executing += queue.requests_executing();
            if queue.is_active() {
                active_queues += 1;
            }
        }
        let ratio = Inner::<T>::virtual_time_ratio(active_queues, reqs_executing, concurrency_limit);
        inner.vt += delta_r * ratio;
    }

    /// Enqueues `packet`. Fails only if `packet`'s queue index is out of
    /// range; in that case no state is mutated.
    pub fn enqueue(&self, packet: Packet<T>) -> Result<(), SchedulerError> {
        let mut inner = self.inner.lock();
        self.sync_time(&mut inner);

        let queue_count = inner.queue_count();
        if packet.queue_idx() >= queue_count {
            warn!(
                queue_idx = packet.queue_idx(),
                queue_count, "rejecting enqueue: queue index out of range"
            );
            return Err(SchedulerError::InvalidQueue {
                queue_idx: packet.queue_idx(),
                queue_count,
            });
        }

        let vt = inner.vt;
        let queue_idx = packet.queue_idx();
        let queue = &mut inner.queues[queue_idx];
        queue.enqueue(packet);

        // Arrival to a previously idle flow: start fresh from current
        // virtual time instead of resuming a stale cursor.
        if queue.pending_len() == 1 && queue.requests_executing() == 0 {
            queue.vir_start = vt;
        }

        debug!(queue_idx, vt, "enqueued packet");
        Ok(())
    }

    /// Selects a queue by fair-queueing policy, pops its head packet, and
    /// returns it. Returns `None` if every queue is empty; in that case no
    /// per-queue state is mutated (only `vt`/`last_real_time` may change).
    pub fn dequeue(&self) -> Option<Packet<T>> {
        let mut inner = self.inner.lock();
        self.sync_time(&mut inner);

        let service_time_estimate = self.service_time_estimate;
        let selected_idx = inner.select_queue(service_time_estimate)?;

        let queue = &mut inner.queues[selected_idx];
        let mut packet = queue.dequeue().expect("selected queue had a head packet");
        queue.vir_start += service_time_estimate;
        queue.requests_executing += 1;

        packet.start_time = Some(self.clock.now());
        debug!(
            queue_idx = selected_idx,
            seq = packet.seq,
            "dequeued packet"
        );
        Some(packet)
    }

    /// Records that `packet` has finished service, correcting the owning
    /// queue's virtual start time with the actual service time observed.
    pub fn finish(&self, packet: &Packet<T>) -> Result<(), SchedulerError> {
        let mut inner = self.inner.lock();
        self.sync_time(&mut inner);

        let queue_count = inner.queue_count();
        let queue_idx = packet.queue_idx();
        if queue_idx >= queue_count {
            return Err(SchedulerError::InvalidQueue {
                queue_idx,
                queue_count,
            });
        }

        let start_time = packet
            .start_time()
            .expect("finish called on a packet that was never dequeued");
        let service_time = self.clock.since(start_time);

        let queue = &mut inner.queues[queue_idx];
        queue.vir_start -= self.service_time_estimate - service_time;
        queue.requests_executing = queue.requests_executing.saturating_sub(1);

        debug!(
            queue_idx,
            seq = packet.seq,
            service_time,
            "finished packet"
        );
        Ok(())
    }

    /// Atomically finishes `packet` and returns the next selection, under a
    /// single lock acquisition. Semantically identical to calling
    /// [`Scheduler::finish`] followed by [`Scheduler::dequeue`], but
    /// preserves ordering on high-contention paths where interleaving
    /// another caller's `enqueue` between the two calls would be visible.
    pub fn finish_and_dequeue(
        &self,
        packet: &Packet<T>,
    ) -> Result<Option<Packet<T>>, SchedulerError> {
        let mut inner = self.inner.lock();
        self.sync_time(&mut inner);

        let queue_count = inner.queue_count();
        let queue_idx = packet.queue_idx();
        if queue_idx >= queue_count {
            return Err(SchedulerError::InvalidQueue {
                queue_idx,
                queue_count,
            });
        }

        let start_time = packet
            .start_time()
            .expect("finish_and_dequeue called on a packet that was never dequeued");
        let service_time = self.clock.since(start_time);
        {
            let queue = &mut inner.queues[queue_idx];
            queue.vir_start -= self.service_time_estimate - service_time;
            queue.requests_executing = queue.requests_executing.saturating_sub(1);
        }

        let service_time_estimate = self.service_time_estimate;
        let selected_idx = match inner.select_queue(service_time_estimate) {
            Some(idx) => idx,
            None => return Ok(None),
        };

        let queue = &mut inner.queues[selected_idx];
        let mut next = queue.dequeue().expect("selected queue had a head packet");
        queue.vir_start += service_time_estimate;
        queue.requests_executing += 1;
        next.start_time = Some(self.clock.now());
        Ok(Some(next))
    }

    /// Subtracts `baseline` from `vt` and every queue's `vir_start`.
    ///
    /// A long-running process accumulates `vt` without bound; an `f64` loses
    /// resolution once `vt` is many orders of magnitude larger than the
    /// increments being added to it (`1e20 + 1e0 == 1e20`). Periodically
    /// renormalizing against a shared baseline (e.g. the current `vt`
    /// rounded down) keeps every cursor's magnitude bounded without
    /// changing any relative ordering, since every cursor shifts by the
    /// same amount.
    pub fn renormalize(&self, baseline: f64) {
        let mut inner = self.inner.lock();
        inner.vt -= baseline;
        for queue in &mut inner.queues {
            queue.vir_start -= baseline;
        }
    }
}
