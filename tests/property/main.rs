use proptest::prelude::*;
use watchflow::types::{Op, RawEvent};
use watchflow::watch::Coalescer;

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::CREATE),
        Just(Op::WRITE),
        Just(Op::REMOVE),
        Just(Op::RENAME),
        Just(Op::CHMOD),
    ]
}

fn event_strategy() -> impl Strategy<Value = RawEvent> {
    ("[a-c]{1,3}", op_strategy()).prop_map(|(name, op)| RawEvent::new(format!("/w/{name}"), op))
}

proptest! {
    // Cutting a stream into windows at arbitrary points must preserve every
    // event exactly once and in arrival order.
    #[test]
    fn windows_preserve_arrival_order(
        events in proptest::collection::vec(event_strategy(), 0..60),
        cuts in proptest::collection::vec(any::<bool>(), 60),
    ) {
        let mut coalescer = Coalescer::new();
        let mut emitted = Vec::new();

        for (event, cut) in events.iter().cloned().zip(cuts.iter().copied()) {
            coalescer.push(event);
            if cut {
                let batch = coalescer.take_batch();
                prop_assert!(batch.as_ref().is_some_and(|b| !b.is_empty()));
                emitted.extend(batch.unwrap());
            }
        }
        if let Some(rest) = coalescer.take_batch() {
            emitted.extend(rest);
        }

        prop_assert_eq!(emitted, events);
        prop_assert!(coalescer.is_empty());
        prop_assert!(coalescer.take_batch().is_none());
    }

    #[test]
    fn op_display_round_trips_through_names(bits in 1u32..32) {
        let op = Op::from_bits(bits);
        let parsed = op
            .to_string()
            .split('|')
            .map(|name| name.parse::<Op>())
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
            .into_iter()
            .fold(Op::empty(), |acc, op| acc | op);
        prop_assert_eq!(parsed, op);
    }
}
