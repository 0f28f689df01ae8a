#![cfg(feature = "typeclass")]
//! Property-based tests for the Semigroup and Monoid laws.

use effio::typeclass::{Max, Min, Monoid, Product, Semigroup, Sum};
use proptest::prelude::*;

// =============================================================================
// Semigroup Associativity
// =============================================================================

proptest! {
    #[test]
    fn prop_string_combine_is_associative(a: String, b: String, c: String) {
        let left = a.clone().combine(b.clone()).combine(c.clone());
        let right = a.combine(b.combine(c));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn prop_vec_combine_is_associative(
        a in prop::collection::vec(any::<i32>(), 0..8),
        b in prop::collection::vec(any::<i32>(), 0..8),
        c in prop::collection::vec(any::<i32>(), 0..8),
    ) {
        let left = a.clone().combine(b.clone()).combine(c.clone());
        let right = a.combine(b.combine(c));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn prop_sum_combine_is_associative(a in -1000_i64..1000, b in -1000_i64..1000, c in -1000_i64..1000) {
        let left = Sum(a).combine(Sum(b)).combine(Sum(c));
        let right = Sum(a).combine(Sum(b).combine(Sum(c)));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn prop_max_and_min_pick_extremes(a: i32, b: i32) {
        prop_assert_eq!(Max(a).combine(Max(b)), Max(a.max(b)));
        prop_assert_eq!(Min(a).combine(Min(b)), Min(a.min(b)));
    }

    #[test]
    fn prop_option_combine_is_associative(a: Option<String>, b: Option<String>, c: Option<String>) {
        let left = a.clone().combine(b.clone()).combine(c.clone());
        let right = a.combine(b.combine(c));
        prop_assert_eq!(left, right);
    }
}

// =============================================================================
// Monoid Identity
// =============================================================================

proptest! {
    #[test]
    fn prop_string_empty_is_identity(value: String) {
        prop_assert_eq!(String::empty().combine(value.clone()), value.clone());
        prop_assert_eq!(value.clone().combine(String::empty()), value);
    }

    #[test]
    fn prop_product_empty_is_identity(value in -1000_i64..1000) {
        prop_assert_eq!(Product::empty().combine(Product(value)), Product(value));
        prop_assert_eq!(Product(value).combine(Product::empty()), Product(value));
    }

    #[test]
    fn prop_combine_all_matches_fold(values in prop::collection::vec(-100_i32..100, 0..16)) {
        let expected: i32 = values.iter().sum();
        prop_assert_eq!(Sum::combine_all(values.into_iter().map(Sum)), Sum(expected));
    }
}
