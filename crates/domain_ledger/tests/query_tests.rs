//! Read-side query tests: lookups, pagination, payment history and stock
//! movement.

use chrono::Duration;
use rust_decimal_macros::dec;

use core_kernel::{ItemId, TransactionId};
use domain_ledger::{ErrorKind, LedgerError, Transaction};
use test_utils::{assert_error_kind, business_date, LedgerFixture, TransactionRequestBuilder};

async fn create_outbound(fixture: &LedgerFixture, count: usize) -> Vec<Transaction> {
    let cement = fixture.add_item("Cement", dec!(1000)).await;
    let engine = fixture.engine();

    let mut created = Vec::with_capacity(count);
    for _ in 0..count {
        created.push(
            engine
                .create_transaction(
                    TransactionRequestBuilder::outbound(fixture.customer.id)
                        .line(&cement, dec!(1), dec!(10))
                        .build(),
                )
                .await
                .unwrap(),
        );
    }
    created
}

#[tokio::test]
async fn test_lookup_by_id_and_invoice_agree() {
    let fixture = LedgerFixture::new().await;
    let created = create_outbound(&fixture, 1).await;
    let queries = fixture.queries();

    let by_id = queries.transaction_by_id(created[0].id).await.unwrap();
    let by_invoice = queries
        .transaction_by_invoice_number(&created[0].invoice_number)
        .await
        .unwrap();

    assert_eq!(by_id, created[0]);
    assert_eq!(by_invoice, created[0]);
}

#[tokio::test]
async fn test_missing_lookups_are_not_found() {
    let fixture = LedgerFixture::new().await;
    let queries = fixture.queries();

    assert_error_kind(
        &queries.transaction_by_id(TransactionId::new()).await,
        ErrorKind::NotFound,
    );
    match queries.transaction_by_invoice_number("INV-20240309-0000").await {
        Err(LedgerError::NotFound { entity, .. }) => assert_eq!(entity, "Invoice"),
        other => panic!("expected not found, got {:?}", other),
    }
}

#[tokio::test]
async fn test_pages_are_newest_first() {
    let fixture = LedgerFixture::new().await;
    let created = create_outbound(&fixture, 5).await;

    let page = fixture.queries().list_transactions(1, 2).await.unwrap();

    assert_eq!(page.total_items, 5);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.page, 1);
    assert_eq!(
        page.items.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![created[4].id, created[3].id]
    );
}

#[tokio::test]
async fn test_out_of_range_pages_are_clamped() {
    let fixture = LedgerFixture::new().await;
    let created = create_outbound(&fixture, 5).await;
    let queries = fixture.queries();

    let last = queries.list_transactions(99, 2).await.unwrap();
    assert_eq!(last.page, 3);
    assert_eq!(last.items.len(), 1);
    assert_eq!(last.items[0].id, created[0].id);

    let first = queries.list_transactions(-3, 2).await.unwrap();
    assert_eq!(first.page, 1);
    assert_eq!(first.items.len(), 2);
}

#[tokio::test]
async fn test_empty_ledger_lists_one_empty_page() {
    let fixture = LedgerFixture::new().await;

    let page = fixture.queries().list_transactions(1, 10).await.unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total_items, 0);
    assert_eq!(page.total_pages, 0);
    assert_eq!(page.page, 1);
}

#[tokio::test]
async fn test_zero_page_size_is_rejected() {
    let fixture = LedgerFixture::new().await;

    assert_error_kind(
        &fixture.queries().list_transactions(1, 0).await,
        ErrorKind::Validation,
    );
}

#[tokio::test]
async fn test_inactive_transactions_are_not_listed() {
    let fixture = LedgerFixture::new().await;
    let created = create_outbound(&fixture, 3).await;
    fixture.store.deactivate_transaction(created[1].id).await;

    let page = fixture.queries().list_transactions(1, 10).await.unwrap();

    assert_eq!(page.total_items, 2);
    assert!(page.items.iter().all(|t| t.id != created[1].id));
}

#[tokio::test]
async fn test_voided_transaction_is_invisible_to_lookups() {
    let fixture = LedgerFixture::new().await;
    let created = create_outbound(&fixture, 2).await;
    fixture.engine().void_transaction(created[0].id, "admin").await.unwrap();
    let queries = fixture.queries();

    assert_error_kind(&queries.transaction_by_id(created[0].id).await, ErrorKind::NotFound);
    assert_error_kind(
        &queries.transaction_by_invoice_number(&created[0].invoice_number).await,
        ErrorKind::NotFound,
    );
    assert_error_kind(
        &queries.credit_payments(&created[0].invoice_number).await,
        ErrorKind::NotFound,
    );

    assert_eq!(queries.transaction_by_id(created[1].id).await.unwrap(), created[1]);
}

#[tokio::test]
async fn test_deactivated_transaction_is_invisible_to_lookups() {
    let fixture = LedgerFixture::new().await;
    let created = create_outbound(&fixture, 1).await;
    fixture.store.deactivate_transaction(created[0].id).await;
    let queries = fixture.queries();

    assert_error_kind(&queries.transaction_by_id(created[0].id).await, ErrorKind::NotFound);
    assert_error_kind(
        &queries.transaction_by_invoice_number(&created[0].invoice_number).await,
        ErrorKind::NotFound,
    );
}

#[tokio::test]
async fn test_payment_history_is_newest_first() {
    let fixture = LedgerFixture::new().await;
    let created = create_outbound(&fixture, 1).await;
    let invoice = &created[0].invoice_number;
    let settlement = fixture.settlement();

    settlement.apply_credit_payment(invoice, dec!(3), "siti").await.unwrap();
    settlement.apply_credit_payment(invoice, dec!(7), "siti").await.unwrap();

    let history = fixture.queries().credit_payments(invoice).await.unwrap();

    assert_eq!(
        history.iter().map(|p| p.notes.as_str()).collect::<Vec<_>>(),
        vec!["Settled", "2nd Installment", "Down Payment"]
    );
}

#[tokio::test]
async fn test_payment_history_of_unknown_invoice_is_not_found() {
    let fixture = LedgerFixture::new().await;

    assert_error_kind(
        &fixture.queries().credit_payments("MJP-20240309-0000").await,
        ErrorKind::NotFound,
    );
}

#[tokio::test]
async fn test_stock_movement_sums_by_direction() {
    let fixture = LedgerFixture::new().await;
    let cement = fixture.add_item("Cement", dec!(10)).await;
    let engine = fixture.engine();

    engine
        .create_transaction(
            TransactionRequestBuilder::inbound(fixture.customer.id)
                .line(&cement, dec!(20), dec!(8))
                .build(),
        )
        .await
        .unwrap();
    engine
        .create_transaction(
            TransactionRequestBuilder::outbound(fixture.customer.id)
                .line(&cement, dec!(4), dec!(10))
                .line(&cement, dec!(3), dec!(10))
                .build(),
        )
        .await
        .unwrap();

    let queries = fixture.queries();
    let movement = queries.stock_movement(cement.id, business_date()).await.unwrap();
    assert_eq!(movement.stock_in, dec!(20));
    assert_eq!(movement.stock_out, dec!(7));
    assert_eq!(movement.net(), dec!(13));

    let later = queries
        .stock_movement(cement.id, business_date() + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(later.stock_in, dec!(0));
    assert_eq!(later.stock_out, dec!(0));
}

#[tokio::test]
async fn test_stock_movement_of_unknown_item_is_not_found() {
    let fixture = LedgerFixture::new().await;

    assert_error_kind(
        &fixture.queries().stock_movement(ItemId::new(), business_date()).await,
        ErrorKind::NotFound,
    );
}
