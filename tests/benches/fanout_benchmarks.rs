//! # Fan-Out Benchmarks
//!
//! Publish-to-receive throughput as subscriber count and filter selectivity grow.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pubsub_bus::{Bus, CancellationToken, Filter, Message, TextMessage};
use std::time::Duration;
use tokio::runtime::Runtime;

const BATCH: usize = 1_000;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("tokio runtime")
}

// ============================================================================
// Fan-out: every subscriber receives every message
// ============================================================================

fn bench_fanout(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("fanout");
    group.measurement_time(Duration::from_secs(10));

    for subscribers in [1usize, 4, 16] {
        group.throughput(Throughput::Elements((BATCH * subscribers) as u64));
        group.bench_with_input(
            BenchmarkId::new("publish_receive", subscribers),
            &subscribers,
            |b, &subscribers| {
                b.to_async(&rt).iter(|| async move {
                    let bus = Bus::new();
                    let subs: Vec<_> = (0..subscribers)
                        .map(|_| bus.create_subscriber::<TextMessage>())
                        .collect();
                    let cancel = CancellationToken::new();

                    for i in 0..BATCH {
                        bus.publish(TextMessage::new(i.to_string())).await.unwrap();
                    }
                    for sub in &subs {
                        for _ in 0..BATCH {
                            black_box(sub.receive(&cancel).await.unwrap());
                        }
                    }
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// Selectivity: predicate cost when few messages match
// ============================================================================

fn bench_selective_filter(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("selective_filter");

    for modulus in [1usize, 10, 100] {
        let expected = BATCH.div_ceil(modulus);
        group.throughput(Throughput::Elements(BATCH as u64));
        group.bench_with_input(
            BenchmarkId::new("modulus", modulus),
            &modulus,
            |b, &modulus| {
                b.to_async(&rt).iter(|| async move {
                    let bus = Bus::new();
                    let sub = bus.subscribe(Filter::<TextMessage>::with_predicate(move |m| {
                        m.value().parse::<usize>().is_ok_and(|n| n % modulus == 0)
                    }));
                    let cancel = CancellationToken::new();

                    for i in 0..BATCH {
                        bus.publish(TextMessage::new(i.to_string())).await.unwrap();
                    }
                    for _ in 0..expected {
                        black_box(sub.receive(&cancel).await.unwrap());
                    }
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// Copy cost: deep copy of one message per subscriber
// ============================================================================

fn bench_deep_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_copy");

    for size in [16usize, 1_024, 65_536] {
        let message: Message = pubsub_bus::BinaryMessage::new(vec![0xAB; size]).into();
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("binary", size), &message, |b, m| {
            b.iter(|| black_box(m.deep_copy()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fanout, bench_selective_filter, bench_deep_copy);
criterion_main!(benches);
