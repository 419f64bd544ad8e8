use async_trait::async_trait;
use uuid::Uuid;

use super::PgStore;
use crate::models::{CreateTransferRequest, LedgerStatus, Transfer, UpdateTransferRequest};
use crate::stores::{StoreError, StoreResult, TransferStore};

#[async_trait]
impl TransferStore for PgStore {
    async fn create_transfer(&self, request: &CreateTransferRequest) -> StoreResult<Transfer> {
        let transfer = sqlx::query_as::<_, Transfer>(
            r#"
            INSERT INTO transfers (transfer_no, transfer_from, transfer_to, transfer_amount, transfer_time)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.transfer_from)
        .bind(&request.transfer_to)
        .bind(request.transfer_amount)
        .fetch_one(&self.pool)
        .await?;

        Ok(transfer)
    }

    async fn find_transfer_by_id(&self, transfer_id: i32) -> StoreResult<Option<Transfer>> {
        let transfer = sqlx::query_as::<_, Transfer>("SELECT * FROM transfers WHERE id = $1")
            .bind(transfer_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(transfer)
    }

    async fn update_transfer(&self, request: &UpdateTransferRequest) -> StoreResult<Transfer> {
        sqlx::query_as::<_, Transfer>(
            r#"
            UPDATE transfers
            SET transfer_from = $1,
                transfer_to = $2,
                transfer_amount = $3,
                transfer_time = NOW(),
                updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&request.transfer_from)
        .bind(&request.transfer_to)
        .bind(request.transfer_amount)
        .bind(request.transfer_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("transfer {}", request.transfer_id)))
    }

    async fn update_transfer_status(
        &self,
        transfer_id: i32,
        status: LedgerStatus,
    ) -> StoreResult<Transfer> {
        sqlx::query_as::<_, Transfer>(
            "UPDATE transfers SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(status)
        .bind(transfer_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("transfer {transfer_id}")))
    }
}
