//! Store ports consumed by the orchestrators.
//!
//! Every store call is a separate round trip; nothing here spans more than one
//! record, and no trait offers a multi-statement transaction. Adapters:
//! - `postgres::PgStore` backed by sqlx
//! - `memory::MemoryStore` for tests and local runs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::{
    Balance, Card, CreateTopupRequest, CreateTransactionRequest, CreateTransferRequest,
    CreateWithdrawRequest, LedgerStatus, Merchant, Topup, Transaction, Transfer, UpdateBalance,
    UpdateCard, UpdateTopupRequest, UpdateTransactionRequest, UpdateTransferRequest,
    UpdateWithdrawBalance, UpdateWithdrawRequest, Withdraw,
};

pub use memory::{MemoryStore, StoreOp};
pub use postgres::PgStore;

/// Failure of a single store call.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A write targeted a record that does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The backing store refused or could not serve the call.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait BalanceStore: Send + Sync {
    async fn find_by_card_number(&self, card_number: &str) -> StoreResult<Option<Balance>>;

    /// Overwrite the total balance with the given value.
    async fn update_balance(&self, request: &UpdateBalance) -> StoreResult<Balance>;

    /// Overwrite the total balance and stamp the last-withdraw fields.
    async fn update_withdraw_balance(&self, request: &UpdateWithdrawBalance)
    -> StoreResult<Balance>;
}

#[async_trait]
pub trait CardStore: Send + Sync {
    async fn find_card_by_number(&self, card_number: &str) -> StoreResult<Option<Card>>;
    async fn find_card_by_user_id(&self, user_id: i32) -> StoreResult<Option<Card>>;
    async fn update_card(&self, request: &UpdateCard) -> StoreResult<Card>;
}

#[async_trait]
pub trait MerchantStore: Send + Sync {
    /// Resolve a merchant from the plain API key a caller presented.
    async fn find_by_api_key(&self, api_key: &str) -> StoreResult<Option<Merchant>>;
}

#[async_trait]
pub trait TopupStore: Send + Sync {
    async fn create_topup(&self, request: &CreateTopupRequest) -> StoreResult<Topup>;
    async fn find_topup_by_id(&self, topup_id: i32) -> StoreResult<Option<Topup>>;
    async fn update_topup(&self, request: &UpdateTopupRequest) -> StoreResult<Topup>;
    async fn update_topup_amount(&self, topup_id: i32, topup_amount: i64) -> StoreResult<Topup>;
    async fn update_topup_status(&self, topup_id: i32, status: LedgerStatus)
    -> StoreResult<Topup>;
}

#[async_trait]
pub trait WithdrawStore: Send + Sync {
    async fn create_withdraw(&self, request: &CreateWithdrawRequest) -> StoreResult<Withdraw>;
    async fn find_withdraw_by_id(&self, withdraw_id: i32) -> StoreResult<Option<Withdraw>>;
    async fn update_withdraw(&self, request: &UpdateWithdrawRequest) -> StoreResult<Withdraw>;
    async fn update_withdraw_status(
        &self,
        withdraw_id: i32,
        status: LedgerStatus,
    ) -> StoreResult<Withdraw>;
}

#[async_trait]
pub trait TransferStore: Send + Sync {
    async fn create_transfer(&self, request: &CreateTransferRequest) -> StoreResult<Transfer>;
    async fn find_transfer_by_id(&self, transfer_id: i32) -> StoreResult<Option<Transfer>>;
    async fn update_transfer(&self, request: &UpdateTransferRequest) -> StoreResult<Transfer>;
    async fn update_transfer_status(
        &self,
        transfer_id: i32,
        status: LedgerStatus,
    ) -> StoreResult<Transfer>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Insert a payment attributed to the merchant resolved by the caller.
    async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
        merchant_id: i32,
    ) -> StoreResult<Transaction>;
    async fn find_transaction_by_id(&self, transaction_id: i32)
    -> StoreResult<Option<Transaction>>;
    async fn update_transaction(
        &self,
        request: &UpdateTransactionRequest,
    ) -> StoreResult<Transaction>;
    async fn update_transaction_status(
        &self,
        transaction_id: i32,
        status: LedgerStatus,
    ) -> StoreResult<Transaction>;
}
