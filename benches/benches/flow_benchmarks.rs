use std::{
    hint::black_box,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use zflow::{consumer_from, handle_from, ConsumerEndpoint, EscalationOutcome, HandleBuilder};
use zflow_error::ProtocolViolation;

fn subscribed_endpoint() -> Arc<ConsumerEndpoint<u64>> {
    let endpoint = consumer_from(
        |_| Ok(()),
        |item: u64| {
            black_box(item);
            Ok(())
        },
        |_| Ok(()),
        || Ok(()),
    );
    let handle = handle_from(|_| Ok(()), || Ok(()));
    endpoint.on_handshake(handle).unwrap();
    endpoint
}

fn bench_request_more(c: &mut Criterion) {
    let demanded = Arc::new(AtomicU64::new(0));
    let d = demanded.clone();
    let handle = handle_from(
        move |n| {
            d.fetch_add(n, Ordering::Relaxed);
            Ok(())
        },
        || Ok(()),
    );

    c.bench_function("request_more", |b| {
        b.iter(|| handle.request_more(black_box(1)).unwrap())
    });
}

fn bench_request_more_rejected(c: &mut Criterion) {
    let handle = handle_from(|_| Ok(()), || Ok(()));
    c.bench_function("request_more_non_positive", |b| {
        b.iter(|| black_box(handle.request_more(black_box(0)).is_err()))
    });
}

fn bench_on_data(c: &mut Criterion) {
    let mut group = c.benchmark_group("on_data");
    let endpoint = subscribed_endpoint();

    group.throughput(Throughput::Elements(1_000));
    group.bench_function("1k_items", |b| {
        b.iter(|| {
            for i in 0..1_000u64 {
                endpoint.on_data(black_box(i)).unwrap();
            }
        })
    });
    group.finish();
}

fn bench_cancel(c: &mut Criterion) {
    c.bench_function("cancel_fresh_handle", |b| {
        b.iter_batched(
            || handle_from(|_| Ok(()), || Ok(())),
            |handle| handle.cancel().unwrap(),
            BatchSize::SmallInput,
        )
    });

    let cancelled = handle_from(|_| Ok(()), || Ok(()));
    cancelled.cancel().unwrap();
    c.bench_function("cancel_repeated", |b| {
        b.iter(|| cancelled.cancel().unwrap())
    });
}

fn bench_full_lifecycle(c: &mut Criterion) {
    c.bench_function("handshake_demand_complete", |b| {
        b.iter(|| {
            let endpoint = consumer_from(
                |h| h.request_more(8),
                |item: u64| {
                    black_box(item);
                    Ok(())
                },
                |_| Ok(()),
                || Ok(()),
            );
            let handle = HandleBuilder::new()
                .on_demand(|_| Ok(()))
                .on_cancellation(|| Ok(()))
                .escalate_to(endpoint.escalation_channel())
                .build()
                .unwrap();
            endpoint.on_handshake(handle).unwrap();
            for i in 0..8 {
                endpoint.on_data(i).unwrap();
            }
            endpoint.on_completion().unwrap();
        })
    });
}

fn bench_escalation(c: &mut Criterion) {
    c.bench_function("escalate_to_terminated", |b| {
        let endpoint = subscribed_endpoint();
        let channel = endpoint.escalation_channel();
        endpoint.on_completion().unwrap();
        b.iter(|| {
            let outcome = channel
                .escalate(ProtocolViolation::NonPositiveDemand(0))
                .unwrap();
            assert_eq!(outcome, EscalationOutcome::Dropped);
        })
    });
}

criterion_group!(
    benches,
    bench_request_more,
    bench_request_more_rejected,
    bench_on_data,
    bench_cancel,
    bench_full_lifecycle,
    bench_escalation
);
criterion_main!(benches);
