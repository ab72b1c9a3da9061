use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

use rcu_epoch::Rcu;

// Benchmark 1: read-path scaling across reader threads
fn bench_concurrent_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_reads");
    group.sample_size(10);

    for num_threads in [2, 4, 8].iter() {
        group.bench_with_input(
            BenchmarkId::new("rcu_epoch", num_threads),
            num_threads,
            |b, &num_threads| {
                b.iter(|| {
                    let rcu = Arc::new(Rcu::new(0u64));

                    let handles: Vec<_> = (0..num_threads)
                        .map(|_| {
                            let rcu = Arc::clone(&rcu);

                            thread::spawn(move || {
                                for _ in 0..500 {
                                    let guard = rcu.read().unwrap();
                                    black_box(*guard.get());
                                }
                            })
                        })
                        .collect();

                    for handle in handles {
                        let _ = handle.join();
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("crossbeam_epoch", num_threads),
            num_threads,
            |b, &num_threads| {
                b.iter(|| {
                    let atomic = Arc::new(crossbeam_epoch::Atomic::new(0u64));

                    let handles: Vec<_> = (0..num_threads)
                        .map(|_| {
                            let a = Arc::clone(&atomic);

                            thread::spawn(move || {
                                for _ in 0..500 {
                                    let guard = crossbeam_epoch::pin();
                                    black_box(a.load(Ordering::Acquire, &guard));
                                }
                            })
                        })
                        .collect();

                    for handle in handles {
                        let _ = handle.join();
                    }
                });
            },
        );
    }

    group.finish();
}

// Benchmark 2: submit a burst of updates and wait until published
fn bench_update_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_burst");
    group.sample_size(10);

    for burst in [16u64, 32, 48].iter() {
        group.bench_with_input(BenchmarkId::new("rcu_epoch", burst), burst, |b, &burst| {
            b.iter(|| {
                let rcu = Rcu::new(0u64);

                for _ in 0..burst {
                    while rcu.update(|v| Ok(v + 1)).is_err() {
                        thread::yield_now();
                    }
                }

                loop {
                    if *rcu.read().unwrap().get() == burst {
                        break;
                    }
                    thread::yield_now();
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_concurrent_reads, bench_update_burst);
criterion_main!(benches);
