//! Property-based tests for identifiers, resolution and aggregation.
//!
//! Run with: `cargo test --test proptest_tests`

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use ubl2ebi::core::*;

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn arb_scheme() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop::sample::select(vec![
        "UNCL5305".to_string(),
        "UN/ECE 5153".to_string(),
        "X".to_string(),
    ]))
}

fn arb_id() -> impl Strategy<Value = String> {
    "[A-Z]{1,3}"
}

fn arb_schemed_id() -> impl Strategy<Value = SchemedId> {
    (arb_scheme(), arb_id()).prop_map(|(scheme, id)| SchemedId::new(scheme.as_deref(), &id).unwrap())
}

fn arb_key() -> impl Strategy<Value = TaxCategoryKey> {
    (arb_schemed_id(), arb_schemed_id()).prop_map(|(s, c)| TaxCategoryKey::new(s, c))
}

/// Amount in cents between -10_000.00 and 10_000.00.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_rate() -> impl Strategy<Value = BucketRate> {
    prop_oneof![
        4 => prop::sample::select(vec![0i64, 500, 1000, 1300, 2000, 2750])
            .prop_map(|raw| BucketRate::Resolved(Decimal::new(raw, 2))),
        1 => Just(BucketRate::Unresolved),
    ]
}

fn arb_subtotal() -> impl Strategy<Value = TaxSubtotal> {
    (
        arb_key(),
        prop::option::of((0i64..3000).prop_map(|p| Decimal::new(p, 2))),
        prop::option::of((arb_amount(), arb_amount())),
    )
        .prop_map(|(key, pct, amounts)| {
            let mut subtotal = TaxSubtotal::new(key);
            subtotal.declared_percentage = pct;
            if let Some((base, tax)) = amounts {
                subtotal = subtotal.amounts(base, tax);
            }
            subtotal
        })
}

proptest! {
    #[test]
    fn schemed_id_equality_is_consistent_with_hash(
        a in arb_schemed_id(),
        b in arb_schemed_id(),
        c in arb_schemed_id(),
    ) {
        prop_assert_eq!(&a, &a);
        prop_assert_eq!(a == b, b == a);
        if a == b && b == c {
            prop_assert_eq!(&a, &c);
        }
        if a == b {
            prop_assert_eq!(hash_of(&a), hash_of(&b));
        }
        let copy = SchemedId::new(a.scheme(), a.id()).unwrap();
        prop_assert_eq!(hash_of(&a), hash_of(&copy));
        prop_assert_eq!(a, copy);
    }

    #[test]
    fn key_equality_is_component_wise(a in arb_key(), b in arb_key()) {
        let components_equal =
            a.category_scheme() == b.category_scheme() && a.category_id() == b.category_id();
        prop_assert_eq!(a == b, components_equal);
        if a == b {
            prop_assert_eq!(hash_of(&a), hash_of(&b));
        }
    }

    #[test]
    fn building_the_mapping_is_idempotent(subtotals in prop::collection::vec(arb_subtotal(), 0..8)) {
        let mut first_issues = IssueSink::new();
        let mut second_issues = IssueSink::new();
        let first = build_mapping(&subtotals, 2, &mut first_issues);
        let second = build_mapping(&subtotals, 2, &mut second_issues);
        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a, b);
                prop_assert_eq!(first_issues, second_issues);
            }
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "mapping outcome differs between runs"),
        }
    }

    #[test]
    fn bucket_bases_sum_to_input(
        contributions in prop::collection::vec((arb_rate(), arb_amount()), 0..40)
    ) {
        let mut aggregator = LineTaxAggregator::new(2);
        for (rate, amount) in &contributions {
            aggregator.add_contribution(*rate, *amount).unwrap();
        }
        let buckets = aggregator.finalize();
        let input: Decimal = contributions.iter().map(|(_, a)| *a).sum();
        let output: Decimal = buckets.iter().map(|b| b.taxable_base).sum();
        prop_assert!((input - output).abs() <= Decimal::new(1, 2));
    }

    #[test]
    fn buckets_are_strictly_ascending(
        contributions in prop::collection::vec((arb_rate(), arb_amount()), 0..40)
    ) {
        let mut aggregator = LineTaxAggregator::new(2);
        for (rate, amount) in contributions {
            aggregator.add_contribution(rate, amount).unwrap();
        }
        let buckets = aggregator.finalize();
        for pair in buckets.windows(2) {
            prop_assert!(pair[0].rate < pair[1].rate);
        }
        let resolved: Vec<_> = buckets.iter().filter(|b| b.rate.is_resolved()).collect();
        for pair in resolved.windows(2) {
            prop_assert!(pair[0].percentage() < pair[1].percentage());
        }
        if let Some(pos) = buckets.iter().position(|b| !b.rate.is_resolved()) {
            prop_assert_eq!(pos, buckets.len() - 1);
        }
    }

    #[test]
    fn bucket_tax_is_within_rounding_of_base(
        contributions in prop::collection::vec((arb_rate(), arb_amount()), 1..40)
    ) {
        let mut aggregator = LineTaxAggregator::new(2);
        for (rate, amount) in contributions {
            aggregator.add_contribution(rate, amount).unwrap();
        }
        for bucket in aggregator.finalize() {
            let expected = bucket.taxable_base * bucket.percentage() / Decimal::ONE_HUNDRED;
            prop_assert!((bucket.tax_amount - expected).abs() <= Decimal::new(1, 2));
        }
    }

    #[test]
    fn extreme_amounts_are_rejected_not_panicking(
        contributions in prop::collection::vec((any::<i64>(), 0u32..=28, any::<i64>()), 1..20)
    ) {
        let mut aggregator = LineTaxAggregator::new(2);
        for (mantissa, scale, percentage) in contributions {
            let rate = BucketRate::Resolved(Decimal::from(percentage).abs());
            match aggregator.add_contribution(rate, Decimal::new(mantissa, scale)) {
                Ok(()) | Err(ConversionError::InvalidInput(_)) => {}
                Err(other) => prop_assert!(false, "unexpected error {}", other),
            }
        }
        match TaxBreakdown::from_aggregator(aggregator) {
            Ok(_) | Err(ConversionError::InvalidInput(_)) => {}
            Err(other) => prop_assert!(false, "unexpected error {}", other),
        }
    }
}
