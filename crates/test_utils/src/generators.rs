//! Property-Based Test Generators
//!
//! Provides proptest strategies for ledger quantities, prices and payment
//! schedules.

use proptest::prelude::*;
use rust_decimal::Decimal;

/// Quantities from 0.01 to 1000.00
pub fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=100_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Whole-unit quantities from 1 to 50
pub fn whole_quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=50i64).prop_map(Decimal::from)
}

/// Unit prices from 0.01 to 100000.00
pub fn price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Between one and `max_lines` (quantity, price) pairs
pub fn line_amounts_strategy(max_lines: usize) -> impl Strategy<Value = Vec<(Decimal, Decimal)>> {
    proptest::collection::vec((quantity_strategy(), price_strategy()), 1..=max_lines)
}

/// Fraction of a total in hundredths, from 0 to 1 inclusive
pub fn payment_fraction_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=100i64).prop_map(|n| Decimal::new(n, 2))
}

/// Relative weights for splitting a balance into installments
pub fn installment_weights_strategy(max_installments: usize) -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::vec(1u32..=10u32, 1..=max_installments)
}

/// Splits `amount` into parts proportional to `weights`.
///
/// Parts are rounded down to cents; the last part absorbs the remainder, so
/// the parts always sum to `amount`. Zero parts are dropped.
pub fn split_by_weights(amount: Decimal, weights: &[u32]) -> Vec<Decimal> {
    let total_weight: u32 = weights.iter().sum();
    if total_weight == 0 || amount <= Decimal::ZERO {
        return Vec::new();
    }

    let mut parts = Vec::with_capacity(weights.len());
    let mut allocated = Decimal::ZERO;
    for weight in &weights[..weights.len() - 1] {
        let part = (amount * Decimal::from(*weight) / Decimal::from(total_weight))
            .round_dp_with_strategy(2, rust_decimal::RoundingStrategy::ToZero);
        allocated += part;
        parts.push(part);
    }
    parts.push(amount - allocated);

    parts.into_iter().filter(|p| *p > Decimal::ZERO).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_split_sums_to_amount() {
        let parts = split_by_weights(dec!(100), &[1, 1, 1]);
        assert_eq!(parts, vec![dec!(33.33), dec!(33.33), dec!(33.34)]);
        assert_eq!(parts.iter().sum::<Decimal>(), dec!(100));
    }

    #[test]
    fn test_split_drops_zero_parts() {
        let parts = split_by_weights(dec!(0.01), &[1, 1]);
        assert_eq!(parts, vec![dec!(0.01)]);
    }

    proptest! {
        #[test]
        fn split_always_sums_to_amount(
            minor in 1i64..10_000_000i64,
            weights in installment_weights_strategy(6)
        ) {
            let amount = Decimal::new(minor, 2);
            let parts = split_by_weights(amount, &weights);
            prop_assert_eq!(parts.iter().copied().sum::<Decimal>(), amount);
            prop_assert!(parts.iter().all(|p| *p > Decimal::ZERO));
        }
    }
}
