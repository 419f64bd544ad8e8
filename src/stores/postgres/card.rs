use async_trait::async_trait;

use super::PgStore;
use crate::models::card::EXPIRE_DATE_FORMAT;
use crate::models::{Card, UpdateCard};
use crate::stores::{CardStore, StoreError, StoreResult};

#[async_trait]
impl CardStore for PgStore {
    async fn find_card_by_number(&self, card_number: &str) -> StoreResult<Option<Card>> {
        let card = sqlx::query_as::<_, Card>("SELECT * FROM cards WHERE card_number = $1")
            .bind(card_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(card)
    }

    async fn find_card_by_user_id(&self, user_id: i32) -> StoreResult<Option<Card>> {
        // A user may hold several cards; the oldest one receives merchant payments.
        let card = sqlx::query_as::<_, Card>(
            "SELECT * FROM cards WHERE user_id = $1 ORDER BY id ASC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(card)
    }

    async fn update_card(&self, request: &UpdateCard) -> StoreResult<Card> {
        sqlx::query_as::<_, Card>(
            r#"
            UPDATE cards
            SET user_id = $1,
                card_type = $2,
                expire_date = $3,
                cvv = $4,
                card_provider = $5,
                updated_at = NOW()
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(&request.card_type)
        .bind(request.expire_date.format(EXPIRE_DATE_FORMAT).to_string())
        .bind(&request.cvv)
        .bind(&request.card_provider)
        .bind(request.card_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("card {}", request.card_id)))
    }
}
