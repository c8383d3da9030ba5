use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use proptest::prelude::*;
use zflow::{
    ConsumerBuilder, EndpointState, FlowPolicy, HandleBuilder, ProtocolViolation, StackError,
    Strictness,
};

#[derive(Debug, Clone)]
enum Signal {
    Handshake,
    Data(u8),
    Error,
    Completion,
    Request(i64),
    Cancel,
}

fn signal() -> impl Strategy<Value = Signal> {
    prop_oneof![
        Just(Signal::Handshake),
        any::<u8>().prop_map(Signal::Data),
        Just(Signal::Error),
        Just(Signal::Completion),
        (-3i64..5).prop_map(Signal::Request),
        Just(Signal::Cancel),
    ]
}

fn strictness() -> impl Strategy<Value = Strictness> {
    prop_oneof![Just(Strictness::Strict), Just(Strictness::Cooperative)]
}

#[derive(Default)]
struct Counters {
    handshakes: AtomicUsize,
    data: AtomicUsize,
    terminals: AtomicUsize,
    demand_calls: AtomicUsize,
    bad_demand: AtomicBool,
    cancellations: AtomicUsize,
}

proptest! {
    /// Любая последовательность сигналов: не больше одного handshake и
    /// одного терминального колбэка, данные только в `Active`, спрос до
    /// производителя доходит только положительный и до отмены.
    #[test]
    fn prop_signal_sequences_respect_protocol(
        strictness in strictness(),
        signals in prop::collection::vec(signal(), 0..64),
    ) {
        let c = Arc::new(Counters::default());

        let (c1, c2, c3, c4) = (c.clone(), c.clone(), c.clone(), c.clone());
        let endpoint = ConsumerBuilder::<u8>::new()
            .on_handshake(move |_| {
                c1.handshakes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .on_data(move |_| {
                c2.data.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .on_error(move |_| {
                c3.terminals.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .on_completion(move || {
                c4.terminals.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .policy(FlowPolicy::default().with_strictness(strictness))
            .build()
            .unwrap();

        let (c5, c6) = (c.clone(), c.clone());
        let handle = HandleBuilder::new()
            .on_demand(move |n| {
                if n == 0 || c5.cancellations.load(Ordering::SeqCst) > 0 {
                    c5.bad_demand.store(true, Ordering::SeqCst);
                }
                c5.demand_calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .on_cancellation(move || {
                c6.cancellations.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .policy(FlowPolicy::default().with_strictness(strictness))
            .build()
            .unwrap();

        let mut expected_data = 0;
        let mut expected_demand = 0;
        let mut cancelled = false;

        for s in signals {
            let before = endpoint.state();
            match s {
                Signal::Handshake => {
                    let result = endpoint.on_handshake(handle.clone());
                    if before == EndpointState::Unsubscribed {
                        prop_assert!(result.is_ok());
                    } else {
                        prop_assert_eq!(endpoint.state(), before);
                        match strictness {
                            Strictness::Strict => prop_assert!(result.is_err()),
                            Strictness::Cooperative => {
                                // отклонённый handle отменяется, а это тот же handle
                                prop_assert!(result.is_ok());
                                cancelled = true;
                            }
                        }
                    }
                }
                Signal::Data(item) => {
                    let accepted = endpoint.on_data(item).is_ok();
                    prop_assert_eq!(accepted, before == EndpointState::Active);
                    if accepted {
                        expected_data += 1;
                    }
                }
                Signal::Error => {
                    let err = StackError::from(ProtocolViolation::AlreadyCancelled);
                    let accepted = endpoint.on_error(err).is_ok();
                    prop_assert_eq!(accepted, before == EndpointState::Active);
                }
                Signal::Completion => {
                    let accepted = endpoint.on_completion().is_ok();
                    prop_assert_eq!(accepted, before == EndpointState::Active);
                }
                Signal::Request(n) => {
                    let accepted = handle.request_more(n).is_ok();
                    prop_assert_eq!(accepted, n > 0 && !cancelled);
                    if accepted {
                        expected_demand += 1;
                    }
                }
                Signal::Cancel => {
                    let result = handle.cancel();
                    if cancelled && strictness == Strictness::Strict {
                        prop_assert!(result.is_err());
                    } else {
                        prop_assert!(result.is_ok());
                    }
                    cancelled = true;
                }
            }
        }

        prop_assert!(c.handshakes.load(Ordering::SeqCst) <= 1);
        prop_assert!(c.terminals.load(Ordering::SeqCst) <= 1);
        prop_assert!(c.cancellations.load(Ordering::SeqCst) <= 1);
        prop_assert_eq!(c.data.load(Ordering::SeqCst), expected_data);
        prop_assert_eq!(c.demand_calls.load(Ordering::SeqCst), expected_demand);
        prop_assert!(!c.bad_demand.load(Ordering::SeqCst));
    }
}
