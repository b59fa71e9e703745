//! Wire resolution scenarios and properties.

use gatesim_core::{DrivenValue, Strength, WireId};
use gatesim_wire::{ResolveMode, ResolverChain, WireState};
use proptest::prelude::*;

fn wire() -> WireId {
    WireId::new(3, 1)
}

fn byte(strength: u8, v: u8) -> DrivenValue {
    DrivenValue::byte(Strength(strength), v)
}

fn bit(strength: u8, v: bool) -> DrivenValue {
    DrivenValue::bit(Strength(strength), v)
}

#[test]
fn strong_driver_beats_weak_driver_in_any_order() {
    let chain = ResolverChain::new();
    let mut forward = WireState::new(wire(), ResolveMode::Exact);
    forward.push(byte(0, 1), &chain).unwrap();
    forward.push(byte(5, 2), &chain).unwrap();

    let mut backward = WireState::new(wire(), ResolveMode::Exact);
    backward.push(byte(5, 2), &chain).unwrap();
    backward.push(byte(0, 1), &chain).unwrap();

    assert_eq!(forward.winner(), &byte(0, 1));
    assert_eq!(backward.winner(), &byte(0, 1));
}

#[test]
fn equal_drivers_need_the_identical_resolver() {
    let mut without = WireState::new(wire(), ResolveMode::Exact);
    let empty = ResolverChain::new();
    without.push(byte(0, 1), &empty).unwrap();
    let err = without.push(byte(0, 1), &empty).unwrap_err();
    assert_eq!(err.wire, wire());
    assert!(err.to_string().contains("short circuit on wire#3.1"));

    let identical = ResolverChain::with_builtins(&["identical"]).unwrap();
    let mut with = WireState::new(wire(), ResolveMode::Exact);
    with.push(byte(0, 1), &identical).unwrap();
    with.push(byte(0, 1), &identical).unwrap();
    assert_eq!(with.winner(), &byte(0, 1));
}

#[test]
fn resolvers_are_tried_in_registration_order() {
    let chain = ResolverChain::with_builtins(&["wired_and", "wired_or"]).unwrap();
    let mut s = WireState::new(wire(), ResolveMode::Exact);
    s.push(bit(0, true), &chain).unwrap();
    s.push(bit(0, false), &chain).unwrap();
    assert_eq!(s.winner(), &bit(0, false));

    let chain = ResolverChain::with_builtins(&["wired_or", "wired_and"]).unwrap();
    let mut s = WireState::new(wire(), ResolveMode::Exact);
    s.push(bit(0, true), &chain).unwrap();
    s.push(bit(0, false), &chain).unwrap();
    assert_eq!(s.winner(), &bit(0, true));
}

#[test]
fn resolver_registered_later_applies_to_next_recompute() {
    let mut chain = ResolverChain::new();
    let mut s = WireState::new(wire(), ResolveMode::Exact);
    s.push(bit(0, true), &chain).unwrap();
    assert!(s.push(bit(0, false), &chain).is_err());

    chain.register_builtin("wired_or").unwrap();
    s.push(bit(0, false), &chain).unwrap();
    assert_eq!(s.winner(), &bit(0, true));
}

#[test]
fn pull_driver_yields_to_ordinary_driver() {
    let chain = ResolverChain::new();
    let mut s = WireState::new(wire(), ResolveMode::Exact);
    s.push(DrivenValue::bit(Strength::PULL, true), &chain).unwrap();
    assert_eq!(s.winner(), &DrivenValue::bit(Strength::PULL, true));
    s.push(DrivenValue::bit(Strength::STRONGEST, false), &chain).unwrap();
    assert_eq!(s.winner(), &DrivenValue::bit(Strength::STRONGEST, false));
    s.pop(&DrivenValue::bit(Strength::STRONGEST, false), &chain)
        .unwrap();
    assert_eq!(s.winner(), &DrivenValue::bit(Strength::PULL, true));
}

mod proptests {
    use super::*;

    proptest! {
        #[test]
        fn wired_or_is_order_independent(
            (bits, shuffled) in proptest::collection::vec(any::<bool>(), 1..8)
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
        ) {
            let chain = ResolverChain::with_builtins(&["wired_or"]).unwrap();
            let mut a = WireState::new(wire(), ResolveMode::Exact);
            let mut b = WireState::new(wire(), ResolveMode::Exact);
            for &v in &bits {
                a.push(bit(2, v), &chain).unwrap();
            }
            for &v in &shuffled {
                b.push(bit(2, v), &chain).unwrap();
            }
            prop_assert_eq!(a.winner(), b.winner());
            prop_assert_eq!(a.winner(), &bit(2, bits.iter().any(|&v| v)));
        }

        #[test]
        fn push_then_pop_restores_winner(
            base in proptest::collection::vec((0u8..4, any::<bool>()), 0..8),
            extra in (0u8..4, any::<bool>()),
        ) {
            let chain = ResolverChain::with_builtins(&["wired_or"]).unwrap();
            let mut s = WireState::new(wire(), ResolveMode::Exact);
            for &(strength, v) in &base {
                s.push(bit(strength, v), &chain).unwrap();
            }
            let before = s.winner().clone();
            // Reads do not disturb the state.
            prop_assert_eq!(s.winner(), &before);

            let extra = bit(extra.0, extra.1);
            s.push(extra.clone(), &chain).unwrap();
            s.pop(&extra, &chain).unwrap();
            prop_assert_eq!(s.winner(), &before);
            prop_assert_eq!(s.len(), base.len());
        }

        #[test]
        fn winner_is_stable_without_mutation(
            drivers in proptest::collection::vec((0u8..3, any::<bool>()), 0..10),
            resolver in prop_oneof![Just("wired_or"), Just("wired_and")],
        ) {
            let chain = ResolverChain::with_builtins(&[resolver]).unwrap();
            let mut s = WireState::new(wire(), ResolveMode::Exact);
            for &(strength, v) in &drivers {
                s.push(bit(strength, v), &chain).unwrap();
            }
            let first = s.winner().clone();
            let second = s.winner().clone();
            prop_assert_eq!(&first, &second);

            prop_assert_eq!(s.recompute(&chain), Ok(None));
            prop_assert_eq!(s.winner(), &first);
            let active = s.active().to_vec();
            prop_assert_eq!(
                gatesim_wire::resolve(wire(), &active, &chain),
                Ok(first.clone())
            );
        }

        #[test]
        fn unique_strongest_driver_always_wins(
            drivers in proptest::collection::btree_map(0u8..200, any::<u8>(), 1..10),
            rotate in 0usize..10,
        ) {
            let chain = ResolverChain::new();
            let mut values: Vec<DrivenValue> = drivers
                .iter()
                .map(|(&strength, &v)| byte(strength, v))
                .collect();
            let len = values.len();
            values.rotate_left(rotate % len);

            let mut s = WireState::new(wire(), ResolveMode::Exact);
            for v in values {
                s.push(v, &chain).unwrap();
            }
            let (&strength, &v) = drivers.iter().next().unwrap();
            prop_assert_eq!(s.winner(), &byte(strength, v));
        }

        #[test]
        fn sentinel_pushes_change_nothing(n in 0usize..5) {
            let chain = ResolverChain::new();
            let mut s = WireState::new(wire(), ResolveMode::Optimized);
            s.push(byte(1, 1), &chain).unwrap();
            for _ in 0..n {
                prop_assert_eq!(s.push(DrivenValue::none(), &chain), Ok(None));
            }
            prop_assert_eq!(s.len(), 1);
        }
    }
}
