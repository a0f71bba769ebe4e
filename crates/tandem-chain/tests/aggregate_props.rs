//! Property tests: aggregate state of a live chain always matches a fresh
//! recomputation from its units.

mod common;

use common::{MockCatalog, MockSpec};
use proptest::prelude::*;
use tandem_chain::ProcessorChain;

#[derive(Debug, Clone)]
enum Op {
    Add(usize),
    Del(usize),
    Suspend(usize, bool),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize).prop_map(Op::Add),
        (0..6usize).prop_map(Op::Del),
        (0..6usize, any::<bool>()).prop_map(|(i, s)| Op::Suspend(i, s)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn aggregate_matches_units(ops in prop::collection::vec(op(), 1..16)) {
        let mut catalog = MockCatalog::new();
        let ids = [
            catalog.add(MockSpec::new("A").tail(0.25), 7).0,
            catalog.add(MockSpec::new("B").tail(1.5).single_only(), 32).0,
            catalog.add(MockSpec::new("C"), 100).0,
        ];
        let chain = ProcessorChain::new(catalog.build());
        chain.prepare_to_play(48000.0, 256);

        for op in ops {
            match op {
                Op::Add(which) => chain.add_plugin_processor(&ids[which]).unwrap(),
                Op::Del(index) => chain.del_processor(index),
                Op::Suspend(index, suspended) => chain.set_suspended(index, suspended),
            }

            let snap = chain.snapshot();
            let active: Vec<_> = snap.units.iter().filter(|u| !u.suspended).collect();
            let latency: usize = active.iter().map(|u| u.latency_samples).sum();
            let tail = active.last().map_or(0.0, |u| u.tail_seconds);
            let double = (0..chain.len())
                .all(|i| chain.get_processor(i).is_some_and(|u| u.supports_double_precision()));

            prop_assert_eq!(chain.latency_samples(), latency);
            prop_assert_eq!(chain.tail_seconds(), tail);
            prop_assert_eq!(chain.supports_double_precision(), double);
            prop_assert_eq!(chain.extra_channels(), 0);
        }
    }
}
