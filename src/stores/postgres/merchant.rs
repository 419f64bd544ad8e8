use async_trait::async_trait;

use super::PgStore;
use crate::models::Merchant;
use crate::models::merchant::hash_api_key;
use crate::stores::{MerchantStore, StoreResult};

#[async_trait]
impl MerchantStore for PgStore {
    async fn find_by_api_key(&self, api_key: &str) -> StoreResult<Option<Merchant>> {
        let merchant =
            sqlx::query_as::<_, Merchant>("SELECT * FROM merchants WHERE api_key_hash = $1")
                .bind(hash_api_key(api_key))
                .fetch_optional(&self.pool)
                .await?;

        Ok(merchant)
    }
}
