#![no_main]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use zflow::{
    ConsumerBuilder, ConsumerEndpoint, FlowPolicy, HandleBuilder, ProducerHandle,
    ProtocolViolation, Strictness,
};

#[derive(Debug, Arbitrary)]
enum Signal {
    Handshake(u8),
    Data(u32),
    Error,
    Completion,
    Request { handle: u8, n: i64 },
    Cancel(u8),
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    strict: bool,
    escalate: bool,
    signals: Vec<Signal>,
}

#[derive(Default)]
struct Counters {
    handshakes: AtomicUsize,
    terminals: AtomicUsize,
    cancellations: AtomicUsize,
}

fn endpoint(
    policy: FlowPolicy,
    c: &Arc<Counters>,
) -> Arc<ConsumerEndpoint<u32>> {
    let (h, e, d) = (c.clone(), c.clone(), c.clone());
    ConsumerBuilder::new()
        .on_handshake(move |_| {
            h.handshakes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .on_data(|_| Ok(()))
        .on_error(move |_| {
            e.terminals.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .on_completion(move || {
            d.terminals.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .policy(policy)
        .build()
        .unwrap()
}

fuzz_target!(|input: FuzzInput| {
    let policy = FlowPolicy::default().with_strictness(if input.strict {
        Strictness::Strict
    } else {
        Strictness::Cooperative
    });
    let c = Arc::new(Counters::default());
    let endpoint = endpoint(policy, &c);

    // небольшой пул handle'ов, чтобы получать и повторы, и разные handle'ы
    let handles: Vec<Arc<ProducerHandle>> = (0..4)
        .map(|_| {
            let cancel = c.clone();
            let mut builder = HandleBuilder::new()
                .on_demand(|n| {
                    assert!(n > 0);
                    Ok(())
                })
                .on_cancellation(move || {
                    cancel.cancellations.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .policy(policy);
            if input.escalate {
                builder = builder.escalate_to(endpoint.escalation_channel());
            }
            builder.build().unwrap()
        })
        .collect();
    let pick = |i: u8| &handles[usize::from(i) % handles.len()];

    for signal in input.signals {
        let _ = match signal {
            Signal::Handshake(i) => endpoint.on_handshake(pick(i).clone()),
            Signal::Data(item) => endpoint.on_data(item),
            Signal::Error => endpoint.on_error(ProtocolViolation::AlreadyCancelled),
            Signal::Completion => endpoint.on_completion(),
            Signal::Request { handle, n } => pick(handle).request_more(n),
            Signal::Cancel(i) => pick(i).cancel(),
        };
    }

    assert!(c.handshakes.load(Ordering::SeqCst) <= 1);
    assert!(c.terminals.load(Ordering::SeqCst) <= 1);
    assert!(c.cancellations.load(Ordering::SeqCst) <= handles.len());
});
