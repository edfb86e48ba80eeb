//! Benchmarks for spark-broadcast
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use spark_broadcast::{broadcast, Connection};
use std::cell::Cell;
use std::rc::Rc;

// =============================================================================
// SUBSCRIPTION BENCHMARKS
// =============================================================================

fn bench_subscribe(c: &mut Criterion) {
    c.bench_function("subscribe", |b| {
        let bc = broadcast::<i32>();
        b.iter(|| {
            let mut conn = bc.subscribe(|_| {});
            conn.disconnect();
            black_box(conn)
        })
    });
}

fn bench_connection_clone(c: &mut Criterion) {
    let bc = broadcast::<i32>();
    let conn = bc.subscribe(|_| {});
    c.bench_function("connection_clone", |b| {
        b.iter(|| black_box(conn.clone()))
    });
}

// =============================================================================
// EMISSION BENCHMARKS
// =============================================================================

fn bench_emit_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit_fanout");

    for subscribers in [1, 10, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::new("subscribers", subscribers),
            &subscribers,
            |b, &subscribers| {
                let bc = broadcast::<i32>();
                let sum = Rc::new(Cell::new(0i64));

                let _conns: Vec<Connection> = (0..subscribers)
                    .map(|_| {
                        let s = sum.clone();
                        bc.subscribe(move |v| s.set(s.get() + *v as i64))
                    })
                    .collect();

                b.iter(|| bc.emit(black_box(&1)));
            },
        );
    }

    group.finish();
}

fn bench_emit_with_dead_nodes(c: &mut Criterion) {
    // Eight dead out of sixteen sits exactly at the sweep floor, so the
    // dead half stays linked and every emission walks past it.
    let bc = broadcast::<i32>();
    let calls = Rc::new(Cell::new(0u64));

    let mut conns: Vec<Connection> = (0..16)
        .map(|_| {
            let c = calls.clone();
            bc.subscribe(move |_| c.set(c.get() + 1))
        })
        .collect();

    for conn in conns.iter_mut().take(8) {
        conn.disconnect();
    }

    c.bench_function("emit_half_disconnected", |b| {
        b.iter(|| bc.emit(black_box(&1)))
    });
}

fn bench_emit_no_subscribers(c: &mut Criterion) {
    let bc = broadcast::<i32>();
    c.bench_function("emit_no_subscribers", |b| {
        b.iter(|| bc.emit(black_box(&1)))
    });
}

// =============================================================================
// CHURN BENCHMARKS
// =============================================================================

fn bench_subscribe_disconnect_churn(c: &mut Criterion) {
    c.bench_function("subscribe_disconnect_churn", |b| {
        let bc = broadcast::<i32>();
        let _stable: Vec<Connection> = (0..32).map(|_| bc.subscribe(|_| {})).collect();

        b.iter(|| {
            let mut conns: Vec<Connection> =
                (0..16).map(|_| bc.subscribe(|_| {})).collect();
            for conn in conns.iter_mut() {
                conn.disconnect();
            }
            bc.emit(black_box(&1));
        })
    });
}

criterion_group!(
    benches,
    bench_subscribe,
    bench_connection_clone,
    bench_emit_fanout,
    bench_emit_with_dead_nodes,
    bench_emit_no_subscribers,
    bench_subscribe_disconnect_churn
);
criterion_main!(benches);
