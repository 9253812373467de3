//! Unit tests for the Money module
//!
//! Tests cover creation, predicates, checked arithmetic and display.

use core_kernel::{Money, MoneyError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_keeps_exact_amount() {
        let m = Money::new(dec!(100.123456789));
        assert_eq!(m.amount(), dec!(100.123456789));
    }

    #[test]
    fn test_from_minor_converts_cents_correctly() {
        assert_eq!(Money::from_minor(10050).amount(), dec!(100.50));
        assert_eq!(Money::from_minor(-5).amount(), dec!(-0.05));
    }

    #[test]
    fn test_zero_and_default_agree() {
        assert_eq!(Money::zero(), Money::default());
        assert!(Money::ZERO.is_zero());
    }
}

mod predicates {
    use super::*;

    #[test]
    fn test_zero_is_neither_positive_nor_negative() {
        let m = Money::zero();
        assert!(!m.is_positive());
        assert!(!m.is_negative());
    }

    #[test]
    fn test_sign_predicates() {
        assert!(Money::new(dec!(0.01)).is_positive());
        assert!(Money::new(dec!(-0.01)).is_negative());
        assert_eq!(Money::new(dec!(-3)).abs(), Money::new(dec!(3)));
    }

    #[test]
    fn test_ordering_compares_amounts() {
        assert!(Money::new(dec!(40)) < Money::new(dec!(100)));
        assert!(Money::new(dec!(100)) >= Money::new(dec!(100.00)));
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_checked_add_and_sub() {
        let a = Money::new(dec!(100));
        let b = Money::new(dec!(40));
        assert_eq!(a.checked_sub(&b).unwrap(), Money::new(dec!(60)));
        assert_eq!(a.checked_add(&b).unwrap(), Money::new(dec!(140)));
    }

    #[test]
    fn test_checked_add_overflow() {
        let max = Money::new(Decimal::MAX);
        assert_eq!(max.checked_add(&Money::new(dec!(1))), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_checked_mul_by_fractional_quantity() {
        let price = Money::new(dec!(85000));
        assert_eq!(price.checked_mul(dec!(2.5)).unwrap(), Money::new(dec!(212500)));
    }

    #[test]
    fn test_sum_of_empty_iterator_is_zero() {
        let empty: Vec<Money> = Vec::new();
        assert_eq!(Money::checked_sum(&empty).unwrap(), Money::ZERO);
        assert_eq!(empty.into_iter().sum::<Money>(), Money::ZERO);
    }

    #[test]
    fn test_round_to_cents_uses_bankers_rounding() {
        assert_eq!(Money::new(dec!(1.005)).round_to_cents().amount(), dec!(1.00));
        assert_eq!(Money::new(dec!(1.015)).round_to_cents().amount(), dec!(1.02));
    }
}

mod serialization {
    use super::*;

    #[test]
    fn test_money_serializes_transparently() {
        let json = serde_json::to_string(&Money::new(dec!(60))).unwrap();
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::new(dec!(60)));
        assert!(!json.contains('{'));
    }
}
