//! Property Tests
//!
//! Randomised transactions and payment schedules must always leave the
//! ledger consistent: totals equal the sum of line totals, credit never
//! passes the total, and customer debt tracks outstanding transaction debt.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::Money;
use domain_ledger::PaymentStatus;
use test_utils::{
    assert_ledger_consistent, installment_weights_strategy, line_amounts_strategy,
    payment_fraction_strategy, split_by_weights, whole_quantity_strategy, LedgerFixture,
    TransactionRequestBuilder,
};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn total_is_sum_of_line_totals(
        lines in line_amounts_strategy(5),
        fraction in payment_fraction_strategy()
    ) {
        runtime().block_on(async {
            let fixture = LedgerFixture::new().await;
            let mut builder = TransactionRequestBuilder::inbound(fixture.customer.id);
            let mut expected = Decimal::ZERO;
            for (i, (quantity, price)) in lines.iter().enumerate() {
                let item = fixture.add_item(&format!("Item {}", i), dec!(0)).await;
                builder = builder.line(&item, *quantity, *price);
                expected += *quantity * *price;
            }
            let payment = (expected * fraction).round_dp(2).min(expected);

            let tx = fixture
                .engine()
                .create_transaction(builder.payment(payment).build())
                .await
                .unwrap();

            assert_eq!(tx.total, Money::new(expected));
            assert_eq!(tx.debt, Money::new(expected - payment));
            assert_eq!(tx.payment_status == PaymentStatus::Paid, payment == expected);
            assert_ledger_consistent(&fixture.store.snapshot().await);
        });
    }

    #[test]
    fn outbound_never_empties_stock(
        stock in whole_quantity_strategy(),
        quantity in whole_quantity_strategy()
    ) {
        runtime().block_on(async {
            let fixture = LedgerFixture::new().await;
            let item = fixture.add_item("Cement", stock).await;

            let result = fixture
                .engine()
                .create_transaction(
                    TransactionRequestBuilder::outbound(fixture.customer.id)
                        .line(&item, quantity, dec!(10))
                        .build(),
                )
                .await;

            let remaining = fixture.stock_of(&item).await;
            assert_eq!(result.is_ok(), quantity < stock);
            assert!(remaining > Decimal::ZERO);
            assert_eq!(remaining, if quantity < stock { stock - quantity } else { stock });
        });
    }

    #[test]
    fn installments_settle_exactly_at_total(
        weights in installment_weights_strategy(6)
    ) {
        runtime().block_on(async {
            let fixture = LedgerFixture::new().await;
            let item = fixture.add_item("Cement", dec!(1000)).await;
            let tx = fixture
                .engine()
                .create_transaction(
                    TransactionRequestBuilder::outbound(fixture.customer.id)
                        .line(&item, dec!(7), dec!(13.37))
                        .build(),
                )
                .await
                .unwrap();

            let settlement = fixture.settlement();
            let parts = split_by_weights(tx.total.amount(), &weights);
            for (i, part) in parts.iter().enumerate() {
                let receipt = settlement
                    .apply_credit_payment(&tx.invoice_number, *part, "siti")
                    .await
                    .unwrap();
                let last = i + 1 == parts.len();
                assert_eq!(receipt.transaction.payment_status.is_paid(), last);
            }

            let state = fixture.store.snapshot().await;
            assert!(state.customers[&fixture.customer.id].debt.is_zero());
            assert_ledger_consistent(&state);
        });
    }
}
