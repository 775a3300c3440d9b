#[macro_use]
extern crate criterion;

use criterion::Criterion;

use fairqueue_core::clock::IntervalClock;
use fairqueue_core::packet::Packet;
use fairqueue_core::scheduler::Scheduler;

fn bench_enqueue_dequeue_finish(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler_cycle_throughput");

    for queue_count in [1usize, 16, 256] {
        group.throughput(criterion::Throughput::Elements(1));
        group.bench_function(format!("queues_{}", queue_count), |b| {
            let clock = IntervalClock::new(0, 1_000);
            let scheduler: Scheduler<u32, _> = Scheduler::new(queue_count, clock, 8, 1_000.0);
            let mut seq = 0u64;

            b.iter(|| {
                for q in 0..queue_count {
                    scheduler.enqueue(Packet::new(q as u32, q, seq)).unwrap();
                }
                seq += 1;
                if let Some(packet) = scheduler.dequeue() {
                    scheduler.finish(&packet).unwrap();
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_enqueue_dequeue_finish);
criterion_main!(benches);
