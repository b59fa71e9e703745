//! Built-in resolvers, registered by name.

use std::sync::Arc;

use gatesim_core::{DrivenValue, Payload};

use crate::resolver::ResolverFn;

/// Names accepted by [`by_name`].
pub const NAMES: [&str; 4] = ["identical", "wired_and", "wired_or", "prefer_first"];

/// Look up a built-in resolver.
pub fn by_name(name: &str) -> Option<Arc<ResolverFn>> {
    let resolver: Arc<ResolverFn> = match name {
        "identical" => Arc::new(identical),
        "wired_and" => Arc::new(wired_and),
        "wired_or" => Arc::new(wired_or),
        "prefer_first" => Arc::new(prefer_first),
        _ => return None,
    };
    Some(resolver)
}

/// Structurally equal drivers agree; the value stands.
pub fn identical(first: &DrivenValue, second: &DrivenValue) -> Option<DrivenValue> {
    (first == second).then(|| first.clone())
}

/// Open-collector bus: any low driver pulls the line low.
pub fn wired_and(first: &DrivenValue, second: &DrivenValue) -> Option<DrivenValue> {
    merge_bits(first, second, |a, b| a && b)
}

/// Open-emitter bus: any high driver pulls the line high.
pub fn wired_or(first: &DrivenValue, second: &DrivenValue) -> Option<DrivenValue> {
    merge_bits(first, second, |a, b| a || b)
}

/// Keep whichever value the fold reached first. Order dependent.
pub fn prefer_first(first: &DrivenValue, _second: &DrivenValue) -> Option<DrivenValue> {
    Some(first.clone())
}

fn merge_bits(
    first: &DrivenValue,
    second: &DrivenValue,
    op: impl Fn(bool, bool) -> bool,
) -> Option<DrivenValue> {
    match (first.payload(), second.payload()) {
        (Payload::Bit(a), Payload::Bit(b)) => Some(DrivenValue::bit(first.strength(), op(*a, *b))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatesim_core::Strength;

    fn bit(v: bool) -> DrivenValue {
        DrivenValue::bit(Strength(4), v)
    }

    #[test]
    fn identical_requires_structural_equality() {
        assert_eq!(identical(&bit(true), &bit(true)), Some(bit(true)));
        assert_eq!(identical(&bit(true), &bit(false)), None);
        assert_eq!(
            identical(&DrivenValue::byte(Strength(4), 1), &DrivenValue::word(Strength(4), 1)),
            None
        );
    }

    #[test]
    fn wired_logic_truth_tables() {
        for a in [false, true] {
            for b in [false, true] {
                assert_eq!(wired_and(&bit(a), &bit(b)), Some(bit(a && b)));
                assert_eq!(wired_or(&bit(a), &bit(b)), Some(bit(a || b)));
            }
        }
    }

    #[test]
    fn wired_logic_declines_non_bits() {
        let byte = DrivenValue::byte(Strength(4), 1);
        assert_eq!(wired_and(&bit(true), &byte), None);
        assert_eq!(wired_or(&byte, &byte), None);
    }

    #[test]
    fn prefer_first_keeps_accumulator() {
        let a = DrivenValue::byte(Strength(4), 1);
        let b = DrivenValue::byte(Strength(4), 2);
        assert_eq!(prefer_first(&a, &b), Some(a.clone()));
        assert_eq!(prefer_first(&b, &a), Some(b));
    }

    #[test]
    fn every_listed_name_resolves() {
        for name in NAMES {
            assert!(by_name(name).is_some(), "{name}");
        }
        assert!(by_name("nope").is_none());
    }
}
