mod common;

use card_ledger::models::{LedgerStatus, Transaction, UpdateTransactionRequest};
use card_ledger::stores::StoreOp;
use card_ledger::{ErrorKind, ServiceError};
use chrono::Utc;
use common::{Fixture, MERCHANT_KEY, payment};

fn amend(transaction_id: i32, amount: i64) -> UpdateTransactionRequest {
    UpdateTransactionRequest {
        transaction_id,
        card_number: "C1".to_string(),
        amount,
        payment_method: "visa".to_string(),
        transaction_time: Utc::now(),
    }
}

/// Payer C1 (user 1) and merchant "shop" owned by user 2, who holds card M1.
async fn shop() -> Fixture {
    let fx = Fixture::new();
    fx.card(1, "C1", 100_000).await;
    fx.store.insert_merchant("shop", MERCHANT_KEY, 2).await;
    fx.card(2, "M1", 0).await;
    fx
}

async fn paid(fx: &Fixture) -> Transaction {
    fx.services
        .transaction
        .create_transaction(MERCHANT_KEY, &payment("C1", 25_000))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_payment_moves_funds_to_merchant() {
    let fx = shop().await;

    let entry = paid(&fx).await;

    assert_eq!(fx.balance("C1").await, 75_000);
    assert_eq!(fx.balance("M1").await, 25_000);
    assert_eq!(entry.status, Some(LedgerStatus::Success));
    assert_eq!(entry.amount, 25_000);

    let found = fx.services.transaction.find_by_id(entry.id).await.unwrap();
    assert_eq!(found.merchant_id, entry.merchant_id);
}

#[tokio::test]
async fn test_payment_with_unknown_api_key() {
    let fx = shop().await;

    let err = fx
        .services
        .transaction
        .create_transaction("not-a-key", &payment("C1", 25_000))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::MerchantNotFound));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(fx.balance("C1").await, 100_000);
    assert!(fx.store.transactions().await.is_empty());
}

#[tokio::test]
async fn test_underfunded_payment_is_rejected() {
    let fx = shop().await;

    let err = fx
        .services
        .transaction
        .create_transaction(MERCHANT_KEY, &payment("C1", 150_000))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InsufficientBalance));
    assert_eq!(fx.balance("C1").await, 100_000);
    assert_eq!(fx.balance("M1").await, 0);
    assert!(fx.store.transactions().await.is_empty());
}

#[tokio::test]
async fn test_payment_from_unknown_card() {
    let fx = shop().await;

    let err = fx
        .services
        .transaction
        .create_transaction(MERCHANT_KEY, &payment("C9", 1))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::CardNotFound));
    assert!(fx.store.transactions().await.is_empty());
}

#[tokio::test]
async fn test_payment_entry_failure_credits_payer_back() {
    let fx = shop().await;
    fx.store.fail_on(StoreOp::CreateTransaction).await;

    let err = fx
        .services
        .transaction
        .create_transaction(MERCHANT_KEY, &payment("C1", 25_000))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::CreateTransactionFailed(_)));
    assert_eq!(fx.balance("C1").await, 100_000);
    assert_eq!(fx.balance("M1").await, 0);
    assert!(fx.store.transactions().await.is_empty());
}

#[tokio::test]
async fn test_merchant_without_card_leaves_payer_debited() {
    let fx = Fixture::new();
    fx.card(1, "C1", 100_000).await;
    fx.store.insert_merchant("shop", MERCHANT_KEY, 2).await;

    let err = fx
        .services
        .transaction
        .create_transaction(MERCHANT_KEY, &payment("C1", 25_000))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::CardNotFound));
    assert_eq!(fx.balance("C1").await, 75_000);
    let entries = fx.store.transactions().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, Some(LedgerStatus::Success));
}

#[tokio::test]
async fn test_merchant_credit_failure_is_not_compensated() {
    let fx = shop().await;
    // First write debits the payer, the second credits the merchant.
    fx.store.fail_on_call(StoreOp::UpdateBalance, 2).await;

    let err = fx
        .services
        .transaction
        .create_transaction(MERCHANT_KEY, &payment("C1", 25_000))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::BalanceUpdateFailed(_)));
    assert_eq!(fx.balance("C1").await, 75_000);
    assert_eq!(fx.balance("M1").await, 0);
    assert_eq!(
        fx.store.transactions().await[0].status,
        Some(LedgerStatus::Success)
    );
}

#[tokio::test]
async fn test_update_payment_rebalances_payer_only() {
    let fx = shop().await;
    let entry = paid(&fx).await;

    let updated = fx
        .services
        .transaction
        .update_transaction(MERCHANT_KEY, &amend(entry.id, 40_000))
        .await
        .unwrap();

    assert_eq!(updated.amount, 40_000);
    assert_eq!(updated.status, Some(LedgerStatus::Success));
    assert_eq!(fx.balance("C1").await, 60_000);
    assert_eq!(fx.balance("M1").await, 25_000);
}

#[tokio::test]
async fn test_update_payment_by_other_merchant_is_forbidden() {
    let fx = shop().await;
    fx.store.insert_merchant("rival", "rival-key", 3).await;
    let entry = paid(&fx).await;

    let err = fx
        .services
        .transaction
        .update_transaction("rival-key", &amend(entry.id, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::TransactionForbidden));
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(fx.balance("C1").await, 75_000);
    let stored = fx.services.transaction.find_by_id(entry.id).await.unwrap();
    assert_eq!(stored.amount, 25_000);
    assert_eq!(stored.status, Some(LedgerStatus::Failed));
}

#[tokio::test]
async fn test_update_payment_with_unknown_key_marks_failed() {
    let fx = shop().await;
    let entry = paid(&fx).await;

    let err = fx
        .services
        .transaction
        .update_transaction("not-a-key", &amend(entry.id, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::MerchantNotFound));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(fx.balance("C1").await, 75_000);
    assert_eq!(
        fx.store.transactions().await[0].status,
        Some(LedgerStatus::Failed)
    );
}

#[tokio::test]
async fn test_update_payment_insufficient_keeps_restored_amount() {
    let fx = shop().await;
    let entry = paid(&fx).await;

    let err = fx
        .services
        .transaction
        .update_transaction(MERCHANT_KEY, &amend(entry.id, 150_000))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InsufficientBalance));
    // The old amount was credited back before the check and stays credited.
    assert_eq!(fx.balance("C1").await, 100_000);
    assert_eq!(fx.balance("M1").await, 25_000);
    assert_eq!(
        fx.store.transactions().await[0].status,
        Some(LedgerStatus::Failed)
    );
}

#[tokio::test]
async fn test_update_payment_entry_failure_keeps_new_debit() {
    let fx = shop().await;
    let entry = paid(&fx).await;
    fx.store.fail_on(StoreOp::UpdateTransaction).await;

    let err = fx
        .services
        .transaction
        .update_transaction(MERCHANT_KEY, &amend(entry.id, 40_000))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::UpdateTransactionFailed(_)));
    assert_eq!(err.code(), "update_transaction_failed");
    assert_eq!(fx.balance("C1").await, 60_000);
    let stored = fx.store.transactions().await.remove(0);
    assert_eq!(stored.amount, 25_000);
    assert_eq!(stored.status, Some(LedgerStatus::Failed));
}

#[tokio::test]
async fn test_update_unknown_payment() {
    let fx = shop().await;

    let err = fx
        .services
        .transaction
        .update_transaction(MERCHANT_KEY, &amend(404, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::TransactionNotFound));
    assert_eq!(fx.balance("C1").await, 100_000);
}
