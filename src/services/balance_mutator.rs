//! Balance Mutator: the only writer of `total_balance`.
//!
//! Orchestrators read a balance, compute the new total themselves and write it
//! back through here. Compensation writes go through `restore*`, which never
//! fail the caller: a failed compensation is logged as an inconsistent state
//! and the orchestration carries on to its terminal error.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::locks::{CardGuard, CardLocks};
use crate::error::ServiceError;
use crate::models::{Balance, UpdateBalance, UpdateWithdrawBalance};
use crate::stores::{BalanceStore, StoreResult};

#[derive(Clone)]
pub struct BalanceMutator {
    store: Arc<dyn BalanceStore>,
    locks: CardLocks,
}

impl BalanceMutator {
    pub fn new(store: Arc<dyn BalanceStore>, locks: CardLocks) -> Self {
        Self { store, locks }
    }

    /// Serialize mutations of the given cards for as long as the guard lives.
    ///
    /// A no-op unless card locking is enabled.
    pub async fn lock(&self, card_numbers: &[&str]) -> CardGuard {
        self.locks.acquire(card_numbers).await
    }

    /// Resolve the balance of a card.
    pub async fn find(&self, card_number: &str) -> Result<Balance, ServiceError> {
        self.store
            .find_by_card_number(card_number)
            .await?
            .ok_or(ServiceError::BalanceNotFound)
    }

    /// Overwrite a card's total balance.
    pub async fn set(&self, card_number: &str, total_balance: i64) -> StoreResult<Balance> {
        self.store
            .update_balance(&UpdateBalance {
                card_number: card_number.to_string(),
                total_balance,
            })
            .await
    }

    /// Overwrite a card's total balance and record the withdrawal that caused it.
    pub async fn set_withdraw(
        &self,
        card_number: &str,
        total_balance: i64,
        withdraw_amount: i64,
        withdraw_time: DateTime<Utc>,
    ) -> StoreResult<Balance> {
        self.store
            .update_withdraw_balance(&UpdateWithdrawBalance {
                card_number: card_number.to_string(),
                total_balance,
                withdraw_amount,
                withdraw_time,
            })
            .await
    }

    /// Compensation: put a card's total back to `total_balance`.
    pub async fn restore(&self, card_number: &str, total_balance: i64) {
        tracing::warn!(card_number, total_balance, "compensating balance write");

        if let Err(err) = self.set(card_number, total_balance).await {
            tracing::error!(
                card_number,
                total_balance,
                error = %err,
                inconsistent_state = true,
                "balance compensation failed"
            );
        }
    }

    /// Compensation for the withdraw-specific write.
    pub async fn restore_withdraw(
        &self,
        card_number: &str,
        total_balance: i64,
        withdraw_amount: i64,
        withdraw_time: DateTime<Utc>,
    ) {
        tracing::warn!(card_number, total_balance, "compensating withdraw balance write");

        if let Err(err) = self
            .set_withdraw(card_number, total_balance, withdraw_amount, withdraw_time)
            .await
        {
            tracing::error!(
                card_number,
                total_balance,
                error = %err,
                inconsistent_state = true,
                "withdraw balance compensation failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::{MemoryStore, StoreOp};

    fn mutator(store: &Arc<MemoryStore>) -> BalanceMutator {
        BalanceMutator::new(store.clone(), CardLocks::new(false))
    }

    #[tokio::test]
    async fn find_missing_balance_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let err = mutator(&store).find("C1").await.unwrap_err();
        assert!(matches!(err, ServiceError::BalanceNotFound));
    }

    #[tokio::test]
    async fn find_store_failure_is_store_error() {
        let store = Arc::new(MemoryStore::new());
        store.fail_on(StoreOp::FindBalance).await;
        let err = mutator(&store).find("C1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)));
    }

    #[tokio::test]
    async fn set_withdraw_stamps_metadata() {
        let store = Arc::new(MemoryStore::new());
        store.insert_balance("C1", 500).await;
        let now = Utc::now();

        let balance = mutator(&store).set_withdraw("C1", 300, 200, now).await.unwrap();

        assert_eq!(balance.total_balance, 300);
        assert_eq!(balance.withdraw_amount, Some(200));
        assert_eq!(balance.withdraw_time, Some(now));
    }

    #[tokio::test]
    async fn failed_restore_is_swallowed() {
        let store = Arc::new(MemoryStore::new());
        store.insert_balance("C1", 500).await;
        store.fail_on(StoreOp::UpdateBalance).await;

        mutator(&store).restore("C1", 100).await;

        assert_eq!(store.balance_of("C1").await, Some(500));
    }
}
