use async_trait::async_trait;
use uuid::Uuid;

use super::PgStore;
use crate::models::{CreateWithdrawRequest, LedgerStatus, UpdateWithdrawRequest, Withdraw};
use crate::stores::{StoreError, StoreResult, WithdrawStore};

#[async_trait]
impl WithdrawStore for PgStore {
    async fn create_withdraw(&self, request: &CreateWithdrawRequest) -> StoreResult<Withdraw> {
        let withdraw = sqlx::query_as::<_, Withdraw>(
            r#"
            INSERT INTO withdraws (withdraw_no, card_number, withdraw_amount, withdraw_time)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.card_number)
        .bind(request.withdraw_amount)
        .bind(request.withdraw_time)
        .fetch_one(&self.pool)
        .await?;

        Ok(withdraw)
    }

    async fn find_withdraw_by_id(&self, withdraw_id: i32) -> StoreResult<Option<Withdraw>> {
        let withdraw = sqlx::query_as::<_, Withdraw>("SELECT * FROM withdraws WHERE id = $1")
            .bind(withdraw_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(withdraw)
    }

    async fn update_withdraw(&self, request: &UpdateWithdrawRequest) -> StoreResult<Withdraw> {
        sqlx::query_as::<_, Withdraw>(
            r#"
            UPDATE withdraws
            SET card_number = $1,
                withdraw_amount = $2,
                withdraw_time = $3,
                updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&request.card_number)
        .bind(request.withdraw_amount)
        .bind(request.withdraw_time)
        .bind(request.withdraw_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("withdraw {}", request.withdraw_id)))
    }

    async fn update_withdraw_status(
        &self,
        withdraw_id: i32,
        status: LedgerStatus,
    ) -> StoreResult<Withdraw> {
        sqlx::query_as::<_, Withdraw>(
            "UPDATE withdraws SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(status)
        .bind(withdraw_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("withdraw {withdraw_id}")))
    }
}
