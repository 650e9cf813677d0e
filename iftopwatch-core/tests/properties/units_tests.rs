//! Property-based tests for unit normalization

use proptest::prelude::*;

use iftopwatch_core::{Quantity, UnitKind, to_numeric};

// ========== Strategies ==========

fn arb_kind() -> impl Strategy<Value = (UnitKind, char)> {
    prop_oneof![Just((UnitKind::Bits, 'b')), Just((UnitKind::Bytes, 'B'))]
}

fn arb_prefix() -> impl Strategy<Value = (&'static str, u64)> {
    prop_oneof![
        Just(("", 1)),
        Just(("K", 1_000)),
        Just(("M", 1_000_000)),
        Just(("G", 1_000_000_000)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Whole numbers scale exactly by their decimal multiplier
    #[test]
    fn integer_magnitudes_scale_exactly(
        value in 0u64..100_000,
        (prefix, multiplier) in arb_prefix(),
        (kind, suffix) in arb_kind(),
    ) {
        let text = format!("{value}{prefix}{suffix}");
        let quantity = Quantity::parse(&text).unwrap();
        prop_assert_eq!(quantity.value, value * multiplier);
        prop_assert_eq!(quantity.kind, kind);
    }

    /// `x.yM` equals `xy00K`: the same amount in two notations
    #[test]
    fn mega_and_kilo_notations_agree(whole in 0u64..1000, tenths in 0u64..10) {
        let mega = format!("{whole}.{tenths}Mb");
        let kilo = format!("{}Kb", whole * 1000 + tenths * 100);
        prop_assert_eq!(to_numeric(&mega).unwrap(), to_numeric(&kilo).unwrap());
    }

    /// iftop prints at most three significant digits; rounding never drifts
    /// more than half a base unit from the exact value
    #[test]
    fn hundredths_round_to_nearest(whole in 0u64..1000, hundredths in 0u64..100) {
        let text = format!("{whole}.{hundredths:02}Kb");
        prop_assert_eq!(to_numeric(&text).unwrap(), whole * 1000 + hundredths * 10);
    }

    /// Anything without a `b`/`B` suffix is rejected
    #[test]
    fn missing_suffix_is_rejected(value in 0u64..1_000_000, prefix in "[KMGT]?") {
        let text = format!("{value}{prefix}");
        prop_assert!(to_numeric(&text).is_err());
    }
}
