use async_trait::async_trait;
use uuid::Uuid;

use super::PgStore;
use crate::models::{CreateTopupRequest, LedgerStatus, Topup, UpdateTopupRequest};
use crate::stores::{StoreError, StoreResult, TopupStore};

#[async_trait]
impl TopupStore for PgStore {
    async fn create_topup(&self, request: &CreateTopupRequest) -> StoreResult<Topup> {
        let topup = sqlx::query_as::<_, Topup>(
            r#"
            INSERT INTO topups (topup_no, card_number, topup_amount, topup_method, topup_time)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.card_number)
        .bind(request.topup_amount)
        .bind(&request.topup_method)
        .bind(request.topup_time)
        .fetch_one(&self.pool)
        .await?;

        Ok(topup)
    }

    async fn find_topup_by_id(&self, topup_id: i32) -> StoreResult<Option<Topup>> {
        let topup = sqlx::query_as::<_, Topup>("SELECT * FROM topups WHERE id = $1")
            .bind(topup_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(topup)
    }

    async fn update_topup(&self, request: &UpdateTopupRequest) -> StoreResult<Topup> {
        sqlx::query_as::<_, Topup>(
            r#"
            UPDATE topups
            SET card_number = $1,
                topup_amount = $2,
                topup_method = $3,
                topup_time = $4,
                updated_at = NOW()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&request.card_number)
        .bind(request.topup_amount)
        .bind(&request.topup_method)
        .bind(request.topup_time)
        .bind(request.topup_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("topup {}", request.topup_id)))
    }

    async fn update_topup_amount(&self, topup_id: i32, topup_amount: i64) -> StoreResult<Topup> {
        sqlx::query_as::<_, Topup>(
            "UPDATE topups SET topup_amount = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(topup_amount)
        .bind(topup_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("topup {topup_id}")))
    }

    async fn update_topup_status(
        &self,
        topup_id: i32,
        status: LedgerStatus,
    ) -> StoreResult<Topup> {
        sqlx::query_as::<_, Topup>(
            "UPDATE topups SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(status)
        .bind(topup_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("topup {topup_id}")))
    }
}
