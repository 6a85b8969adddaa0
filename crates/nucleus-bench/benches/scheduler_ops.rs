//! Criterion micro-benchmarks for plan queue and drain-loop throughput.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nucleus_bench::{seeded_times, storm_simulation};
use nucleus_core::{PlanKey, Planner, Time};
use nucleus_engine::scheduler::PlanQueue;

fn bench_add_drain_10k(c: &mut Criterion) {
    let times = seeded_times(7, 10_000, 1_000.0);
    c.bench_function("queue_add_drain_10k", |b| {
        b.iter(|| {
            let mut queue = PlanQueue::new();
            for &time in &times {
                queue
                    .add(Time::START, time, Planner::Actor, None, Box::new(|_| Ok(())))
                    .expect("valid future time");
            }
            let mut popped = 0usize;
            while let Some(plan) = queue.pop() {
                black_box(plan.time);
                popped += 1;
            }
            assert_eq!(popped, times.len());
        })
    });
}

fn bench_keyed_cancel_half(c: &mut Criterion) {
    let times = seeded_times(11, 2_000, 500.0);
    c.bench_function("queue_keyed_cancel_half", |b| {
        b.iter(|| {
            let mut queue = PlanQueue::new();
            for (i, &time) in times.iter().enumerate() {
                queue
                    .add(
                        Time::START,
                        time,
                        Planner::Actor,
                        Some(PlanKey(i as u64)),
                        Box::new(|_| Ok(())),
                    )
                    .expect("unique key");
            }
            for i in (0..times.len()).step_by(2) {
                queue.cancel(PlanKey(i as u64));
            }
            let mut popped = 0usize;
            while queue.pop().is_some() {
                popped += 1;
            }
            assert_eq!(popped, times.len() / 2);
        })
    });
}

fn bench_full_storm_run(c: &mut Criterion) {
    c.bench_function("simulation_storm_5k", |b| {
        b.iter(|| {
            let output = storm_simulation(42, 5_000, 200.0)
                .execute()
                .expect("storm executes");
            black_box(output);
        })
    });
}

criterion_group!(
    benches,
    bench_add_drain_10k,
    bench_keyed_cancel_half,
    bench_full_storm_run
);
criterion_main!(benches);
