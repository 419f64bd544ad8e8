use async_trait::async_trait;

use super::PgStore;
use crate::models::{Balance, UpdateBalance, UpdateWithdrawBalance};
use crate::stores::{BalanceStore, StoreError, StoreResult};

#[async_trait]
impl BalanceStore for PgStore {
    async fn find_by_card_number(&self, card_number: &str) -> StoreResult<Option<Balance>> {
        let balance = sqlx::query_as::<_, Balance>("SELECT * FROM saldos WHERE card_number = $1")
            .bind(card_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(balance)
    }

    async fn update_balance(&self, request: &UpdateBalance) -> StoreResult<Balance> {
        sqlx::query_as::<_, Balance>(
            r#"
            UPDATE saldos
            SET total_balance = $1,
                updated_at = NOW()
            WHERE card_number = $2
            RETURNING *
            "#,
        )
        .bind(request.total_balance)
        .bind(&request.card_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("saldo for card {}", request.card_number)))
    }

    async fn update_withdraw_balance(
        &self,
        request: &UpdateWithdrawBalance,
    ) -> StoreResult<Balance> {
        sqlx::query_as::<_, Balance>(
            r#"
            UPDATE saldos
            SET total_balance = $1,
                withdraw_amount = $2,
                withdraw_time = $3,
                updated_at = NOW()
            WHERE card_number = $4
            RETURNING *
            "#,
        )
        .bind(request.total_balance)
        .bind(request.withdraw_amount)
        .bind(request.withdraw_time)
        .bind(&request.card_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("saldo for card {}", request.card_number)))
    }
}
