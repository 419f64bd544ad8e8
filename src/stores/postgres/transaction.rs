use async_trait::async_trait;
use uuid::Uuid;

use super::PgStore;
use crate::models::{
    CreateTransactionRequest, LedgerStatus, Transaction, UpdateTransactionRequest,
};
use crate::stores::{StoreError, StoreResult, TransactionStore};

#[async_trait]
impl TransactionStore for PgStore {
    async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
        merchant_id: i32,
    ) -> StoreResult<Transaction> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (
                transaction_no,
                card_number,
                amount,
                payment_method,
                merchant_id,
                transaction_time
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.card_number)
        .bind(request.amount)
        .bind(&request.payment_method)
        .bind(merchant_id)
        .bind(request.transaction_time)
        .fetch_one(&self.pool)
        .await?;

        Ok(transaction)
    }

    async fn find_transaction_by_id(
        &self,
        transaction_id: i32,
    ) -> StoreResult<Option<Transaction>> {
        let transaction =
            sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
                .bind(transaction_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(transaction)
    }

    async fn update_transaction(
        &self,
        request: &UpdateTransactionRequest,
    ) -> StoreResult<Transaction> {
        sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions
            SET card_number = $1,
                amount = $2,
                payment_method = $3,
                transaction_time = $4,
                updated_at = NOW()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&request.card_number)
        .bind(request.amount)
        .bind(&request.payment_method)
        .bind(request.transaction_time)
        .bind(request.transaction_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("transaction {}", request.transaction_id)))
    }

    async fn update_transaction_status(
        &self,
        transaction_id: i32,
        status: LedgerStatus,
    ) -> StoreResult<Transaction> {
        sqlx::query_as::<_, Transaction>(
            "UPDATE transactions SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(status)
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("transaction {transaction_id}")))
    }
}
