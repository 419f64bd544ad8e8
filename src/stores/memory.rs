//! In-memory implementation of every store port.
//!
//! Used by the test suite and for local runs without Postgres. Failures can be
//! injected per operation to drive the orchestrators down their compensation
//! paths.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{
    BalanceStore, CardStore, MerchantStore, StoreError, StoreResult, TopupStore,
    TransactionStore, TransferStore, WithdrawStore,
};
use crate::models::card::EXPIRE_DATE_FORMAT;
use crate::models::merchant::hash_api_key;
use crate::models::{
    Balance, Card, CreateTopupRequest, CreateTransactionRequest, CreateTransferRequest,
    CreateWithdrawRequest, LedgerStatus, Merchant, Topup, Transaction, Transfer, UpdateBalance,
    UpdateCard, UpdateTopupRequest, UpdateTransactionRequest, UpdateTransferRequest,
    UpdateWithdrawBalance, UpdateWithdrawRequest, Withdraw,
};

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    FindBalance,
    UpdateBalance,
    UpdateWithdrawBalance,
    FindCardByNumber,
    FindCardByUserId,
    UpdateCard,
    FindMerchant,
    CreateTopup,
    FindTopup,
    UpdateTopup,
    UpdateTopupAmount,
    UpdateTopupStatus,
    CreateWithdraw,
    FindWithdraw,
    UpdateWithdraw,
    UpdateWithdrawStatus,
    CreateTransfer,
    FindTransfer,
    UpdateTransfer,
    UpdateTransferStatus,
    CreateTransaction,
    FindTransaction,
    UpdateTransaction,
    UpdateTransactionStatus,
}

#[derive(Debug, Clone, Copy)]
enum Fault {
    Always,
    /// Fail only the n-th call (1-based) counted from when the fault was set.
    OnCall(usize),
}

#[derive(Default)]
struct Faults {
    plans: HashMap<StoreOp, Fault>,
    calls: HashMap<StoreOp, usize>,
}

#[derive(Default)]
struct State {
    next_id: i32,
    cards: HashMap<String, Card>,
    balances: HashMap<String, Balance>,
    merchants: HashMap<String, Merchant>,
    topups: BTreeMap<i32, Topup>,
    withdraws: BTreeMap<i32, Withdraw>,
    transfers: BTreeMap<i32, Transfer>,
    transactions: BTreeMap<i32, Transaction>,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// A thread-safe in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    faults: Mutex<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call of `op` fail.
    pub async fn fail_on(&self, op: StoreOp) {
        let mut faults = self.faults.lock().await;
        faults.plans.insert(op, Fault::Always);
        faults.calls.remove(&op);
    }

    /// Make only the `nth` call (1-based) of `op` fail.
    pub async fn fail_on_call(&self, op: StoreOp, nth: usize) {
        let mut faults = self.faults.lock().await;
        faults.plans.insert(op, Fault::OnCall(nth));
        faults.calls.remove(&op);
    }

    pub async fn clear_faults(&self) {
        let mut faults = self.faults.lock().await;
        faults.plans.clear();
        faults.calls.clear();
    }

    async fn check(&self, op: StoreOp) -> StoreResult<()> {
        let mut faults = self.faults.lock().await;
        let calls = faults.calls.entry(op).or_insert(0);
        *calls += 1;
        let call = *calls;

        let fails = match faults.plans.get(&op) {
            Some(Fault::Always) => true,
            Some(Fault::OnCall(nth)) => *nth == call,
            None => false,
        };

        if fails {
            return Err(StoreError::Unavailable(format!("injected failure on {op:?}")));
        }
        Ok(())
    }

    /// Register a card.
    pub async fn insert_card(&self, user_id: i32, card_number: &str, expire_date: &str) -> Card {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let card = Card {
            id: state.next_id(),
            user_id,
            card_number: card_number.to_string(),
            card_type: "debit".to_string(),
            expire_date: expire_date.to_string(),
            cvv: "123".to_string(),
            card_provider: "visa".to_string(),
            created_at: now,
            updated_at: now,
        };
        state.cards.insert(card.card_number.clone(), card.clone());
        card
    }

    /// Register a balance row for a card.
    pub async fn insert_balance(&self, card_number: &str, total_balance: i64) -> Balance {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let balance = Balance {
            id: state.next_id(),
            card_number: card_number.to_string(),
            total_balance,
            withdraw_amount: None,
            withdraw_time: None,
            created_at: now,
            updated_at: now,
        };
        state.balances.insert(balance.card_number.clone(), balance.clone());
        balance
    }

    /// Register a merchant; the API key is stored hashed.
    pub async fn insert_merchant(&self, name: &str, api_key: &str, user_id: i32) -> Merchant {
        let mut state = self.state.write().await;
        let merchant = Merchant {
            id: state.next_id(),
            name: name.to_string(),
            api_key_hash: hash_api_key(api_key),
            user_id,
            status: "active".to_string(),
            created_at: Utc::now(),
        };
        state
            .merchants
            .insert(merchant.api_key_hash.clone(), merchant.clone());
        merchant
    }

    pub async fn balance_of(&self, card_number: &str) -> Option<i64> {
        let state = self.state.read().await;
        state.balances.get(card_number).map(|b| b.total_balance)
    }

    pub async fn balance_record(&self, card_number: &str) -> Option<Balance> {
        let state = self.state.read().await;
        state.balances.get(card_number).cloned()
    }

    pub async fn card(&self, card_number: &str) -> Option<Card> {
        let state = self.state.read().await;
        state.cards.get(card_number).cloned()
    }

    pub async fn topups(&self) -> Vec<Topup> {
        self.state.read().await.topups.values().cloned().collect()
    }

    pub async fn withdraws(&self) -> Vec<Withdraw> {
        self.state.read().await.withdraws.values().cloned().collect()
    }

    pub async fn transfers(&self) -> Vec<Transfer> {
        self.state.read().await.transfers.values().cloned().collect()
    }

    pub async fn transactions(&self) -> Vec<Transaction> {
        self.state.read().await.transactions.values().cloned().collect()
    }
}

fn missing(what: &str, key: impl std::fmt::Display) -> StoreError {
    StoreError::NotFound(format!("{what} {key}"))
}

#[async_trait]
impl BalanceStore for MemoryStore {
    async fn find_by_card_number(&self, card_number: &str) -> StoreResult<Option<Balance>> {
        self.check(StoreOp::FindBalance).await?;
        Ok(self.state.read().await.balances.get(card_number).cloned())
    }

    async fn update_balance(&self, request: &UpdateBalance) -> StoreResult<Balance> {
        self.check(StoreOp::UpdateBalance).await?;
        let mut state = self.state.write().await;
        let balance = state
            .balances
            .get_mut(&request.card_number)
            .ok_or_else(|| missing("saldo for card", &request.card_number))?;
        balance.total_balance = request.total_balance;
        balance.updated_at = Utc::now();
        Ok(balance.clone())
    }

    async fn update_withdraw_balance(
        &self,
        request: &UpdateWithdrawBalance,
    ) -> StoreResult<Balance> {
        self.check(StoreOp::UpdateWithdrawBalance).await?;
        let mut state = self.state.write().await;
        let balance = state
            .balances
            .get_mut(&request.card_number)
            .ok_or_else(|| missing("saldo for card", &request.card_number))?;
        balance.total_balance = request.total_balance;
        balance.withdraw_amount = Some(request.withdraw_amount);
        balance.withdraw_time = Some(request.withdraw_time);
        balance.updated_at = Utc::now();
        Ok(balance.clone())
    }
}

#[async_trait]
impl CardStore for MemoryStore {
    async fn find_card_by_number(&self, card_number: &str) -> StoreResult<Option<Card>> {
        self.check(StoreOp::FindCardByNumber).await?;
        Ok(self.state.read().await.cards.get(card_number).cloned())
    }

    async fn find_card_by_user_id(&self, user_id: i32) -> StoreResult<Option<Card>> {
        self.check(StoreOp::FindCardByUserId).await?;
        let state = self.state.read().await;
        Ok(state
            .cards
            .values()
            .filter(|c| c.user_id == user_id)
            .min_by_key(|c| c.id)
            .cloned())
    }

    async fn update_card(&self, request: &UpdateCard) -> StoreResult<Card> {
        self.check(StoreOp::UpdateCard).await?;
        let mut state = self.state.write().await;
        let card = state
            .cards
            .values_mut()
            .find(|c| c.id == request.card_id)
            .ok_or_else(|| missing("card", request.card_id))?;
        card.user_id = request.user_id;
        card.card_type = request.card_type.clone();
        card.expire_date = request.expire_date.format(EXPIRE_DATE_FORMAT).to_string();
        card.cvv = request.cvv.clone();
        card.card_provider = request.card_provider.clone();
        card.updated_at = Utc::now();
        Ok(card.clone())
    }
}

#[async_trait]
impl MerchantStore for MemoryStore {
    async fn find_by_api_key(&self, api_key: &str) -> StoreResult<Option<Merchant>> {
        self.check(StoreOp::FindMerchant).await?;
        let state = self.state.read().await;
        Ok(state.merchants.get(&hash_api_key(api_key)).cloned())
    }
}

#[async_trait]
impl TopupStore for MemoryStore {
    async fn create_topup(&self, request: &CreateTopupRequest) -> StoreResult<Topup> {
        self.check(StoreOp::CreateTopup).await?;
        let mut state = self.state.write().await;
        let now = Utc::now();
        let topup = Topup {
            id: state.next_id(),
            topup_no: Uuid::new_v4(),
            card_number: request.card_number.clone(),
            topup_amount: request.topup_amount,
            topup_method: request.topup_method.clone(),
            topup_time: request.topup_time,
            status: None,
            created_at: now,
            updated_at: now,
        };
        state.topups.insert(topup.id, topup.clone());
        Ok(topup)
    }

    async fn find_topup_by_id(&self, topup_id: i32) -> StoreResult<Option<Topup>> {
        self.check(StoreOp::FindTopup).await?;
        Ok(self.state.read().await.topups.get(&topup_id).cloned())
    }

    async fn update_topup(&self, request: &UpdateTopupRequest) -> StoreResult<Topup> {
        self.check(StoreOp::UpdateTopup).await?;
        let mut state = self.state.write().await;
        let topup = state
            .topups
            .get_mut(&request.topup_id)
            .ok_or_else(|| missing("topup", request.topup_id))?;
        topup.card_number = request.card_number.clone();
        topup.topup_amount = request.topup_amount;
        topup.topup_method = request.topup_method.clone();
        topup.topup_time = request.topup_time;
        topup.updated_at = Utc::now();
        Ok(topup.clone())
    }

    async fn update_topup_amount(&self, topup_id: i32, topup_amount: i64) -> StoreResult<Topup> {
        self.check(StoreOp::UpdateTopupAmount).await?;
        let mut state = self.state.write().await;
        let topup = state
            .topups
            .get_mut(&topup_id)
            .ok_or_else(|| missing("topup", topup_id))?;
        topup.topup_amount = topup_amount;
        topup.updated_at = Utc::now();
        Ok(topup.clone())
    }

    async fn update_topup_status(
        &self,
        topup_id: i32,
        status: LedgerStatus,
    ) -> StoreResult<Topup> {
        self.check(StoreOp::UpdateTopupStatus).await?;
        let mut state = self.state.write().await;
        let topup = state
            .topups
            .get_mut(&topup_id)
            .ok_or_else(|| missing("topup", topup_id))?;
        topup.status = Some(status);
        topup.updated_at = Utc::now();
        Ok(topup.clone())
    }
}

#[async_trait]
impl WithdrawStore for MemoryStore {
    async fn create_withdraw(&self, request: &CreateWithdrawRequest) -> StoreResult<Withdraw> {
        self.check(StoreOp::CreateWithdraw).await?;
        let mut state = self.state.write().await;
        let now = Utc::now();
        let withdraw = Withdraw {
            id: state.next_id(),
            withdraw_no: Uuid::new_v4(),
            card_number: request.card_number.clone(),
            withdraw_amount: request.withdraw_amount,
            withdraw_time: request.withdraw_time,
            status: None,
            created_at: now,
            updated_at: now,
        };
        state.withdraws.insert(withdraw.id, withdraw.clone());
        Ok(withdraw)
    }

    async fn find_withdraw_by_id(&self, withdraw_id: i32) -> StoreResult<Option<Withdraw>> {
        self.check(StoreOp::FindWithdraw).await?;
        Ok(self.state.read().await.withdraws.get(&withdraw_id).cloned())
    }

    async fn update_withdraw(&self, request: &UpdateWithdrawRequest) -> StoreResult<Withdraw> {
        self.check(StoreOp::UpdateWithdraw).await?;
        let mut state = self.state.write().await;
        let withdraw = state
            .withdraws
            .get_mut(&request.withdraw_id)
            .ok_or_else(|| missing("withdraw", request.withdraw_id))?;
        withdraw.card_number = request.card_number.clone();
        withdraw.withdraw_amount = request.withdraw_amount;
        withdraw.withdraw_time = request.withdraw_time;
        withdraw.updated_at = Utc::now();
        Ok(withdraw.clone())
    }

    async fn update_withdraw_status(
        &self,
        withdraw_id: i32,
        status: LedgerStatus,
    ) -> StoreResult<Withdraw> {
        self.check(StoreOp::UpdateWithdrawStatus).await?;
        let mut state = self.state.write().await;
        let withdraw = state
            .withdraws
            .get_mut(&withdraw_id)
            .ok_or_else(|| missing("withdraw", withdraw_id))?;
        withdraw.status = Some(status);
        withdraw.updated_at = Utc::now();
        Ok(withdraw.clone())
    }
}

#[async_trait]
impl TransferStore for MemoryStore {
    async fn create_transfer(&self, request: &CreateTransferRequest) -> StoreResult<Transfer> {
        self.check(StoreOp::CreateTransfer).await?;
        let mut state = self.state.write().await;
        let now = Utc::now();
        let transfer = Transfer {
            id: state.next_id(),
            transfer_no: Uuid::new_v4(),
            transfer_from: request.transfer_from.clone(),
            transfer_to: request.transfer_to.clone(),
            transfer_amount: request.transfer_amount,
            transfer_time: now,
            status: None,
            created_at: now,
            updated_at: now,
        };
        state.transfers.insert(transfer.id, transfer.clone());
        Ok(transfer)
    }

    async fn find_transfer_by_id(&self, transfer_id: i32) -> StoreResult<Option<Transfer>> {
        self.check(StoreOp::FindTransfer).await?;
        Ok(self.state.read().await.transfers.get(&transfer_id).cloned())
    }

    async fn update_transfer(&self, request: &UpdateTransferRequest) -> StoreResult<Transfer> {
        self.check(StoreOp::UpdateTransfer).await?;
        let mut state = self.state.write().await;
        let transfer = state
            .transfers
            .get_mut(&request.transfer_id)
            .ok_or_else(|| missing("transfer", request.transfer_id))?;
        let now = Utc::now();
        transfer.transfer_from = request.transfer_from.clone();
        transfer.transfer_to = request.transfer_to.clone();
        transfer.transfer_amount = request.transfer_amount;
        transfer.transfer_time = now;
        transfer.updated_at = now;
        Ok(transfer.clone())
    }

    async fn update_transfer_status(
        &self,
        transfer_id: i32,
        status: LedgerStatus,
    ) -> StoreResult<Transfer> {
        self.check(StoreOp::UpdateTransferStatus).await?;
        let mut state = self.state.write().await;
        let transfer = state
            .transfers
            .get_mut(&transfer_id)
            .ok_or_else(|| missing("transfer", transfer_id))?;
        transfer.status = Some(status);
        transfer.updated_at = Utc::now();
        Ok(transfer.clone())
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
        merchant_id: i32,
    ) -> StoreResult<Transaction> {
        self.check(StoreOp::CreateTransaction).await?;
        let mut state = self.state.write().await;
        let now = Utc::now();
        let transaction = Transaction {
            id: state.next_id(),
            transaction_no: Uuid::new_v4(),
            card_number: request.card_number.clone(),
            amount: request.amount,
            payment_method: request.payment_method.clone(),
            merchant_id,
            transaction_time: request.transaction_time,
            status: None,
            created_at: now,
            updated_at: now,
        };
        state.transactions.insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    async fn find_transaction_by_id(
        &self,
        transaction_id: i32,
    ) -> StoreResult<Option<Transaction>> {
        self.check(StoreOp::FindTransaction).await?;
        Ok(self.state.read().await.transactions.get(&transaction_id).cloned())
    }

    async fn update_transaction(
        &self,
        request: &UpdateTransactionRequest,
    ) -> StoreResult<Transaction> {
        self.check(StoreOp::UpdateTransaction).await?;
        let mut state = self.state.write().await;
        let transaction = state
            .transactions
            .get_mut(&request.transaction_id)
            .ok_or_else(|| missing("transaction", request.transaction_id))?;
        transaction.card_number = request.card_number.clone();
        transaction.amount = request.amount;
        transaction.payment_method = request.payment_method.clone();
        transaction.transaction_time = request.transaction_time;
        transaction.updated_at = Utc::now();
        Ok(transaction.clone())
    }

    async fn update_transaction_status(
        &self,
        transaction_id: i32,
        status: LedgerStatus,
    ) -> StoreResult<Transaction> {
        self.check(StoreOp::UpdateTransactionStatus).await?;
        let mut state = self.state.write().await;
        let transaction = state
            .transactions
            .get_mut(&transaction_id)
            .ok_or_else(|| missing("transaction", transaction_id))?;
        transaction.status = Some(status);
        transaction.updated_at = Utc::now();
        Ok(transaction.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_balance_round_trip() {
        let store = MemoryStore::new();
        store.insert_balance("C1", 100).await;

        let updated = store
            .update_balance(&UpdateBalance {
                card_number: "C1".to_string(),
                total_balance: 250,
            })
            .await
            .unwrap();

        assert_eq!(updated.total_balance, 250);
        assert_eq!(store.balance_of("C1").await, Some(250));
        assert!(store.find_by_card_number("C2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_balance_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update_balance(&UpdateBalance {
                card_number: "nope".to_string(),
                total_balance: 1,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_fail_on_call_only_hits_nth_call() {
        let store = MemoryStore::new();
        store.insert_balance("C1", 0).await;
        store.fail_on_call(StoreOp::FindBalance, 2).await;

        assert!(store.find_by_card_number("C1").await.is_ok());
        assert!(store.find_by_card_number("C1").await.is_err());
        assert!(store.find_by_card_number("C1").await.is_ok());
    }

    #[tokio::test]
    async fn test_fail_on_until_cleared() {
        let store = MemoryStore::new();
        store.fail_on(StoreOp::FindMerchant).await;

        assert!(store.find_by_api_key("key").await.is_err());
        assert!(store.find_by_api_key("key").await.is_err());

        store.clear_faults().await;
        assert!(store.find_by_api_key("key").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_merchant_lookup_uses_hashed_key() {
        let store = MemoryStore::new();
        let merchant = store.insert_merchant("shop", "secret-key", 9).await;

        assert_ne!(merchant.api_key_hash, "secret-key");
        let found = store.find_by_api_key("secret-key").await.unwrap().unwrap();
        assert_eq!(found.id, merchant.id);
        assert!(store.find_by_api_key("wrong").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_card_by_user_picks_oldest() {
        let store = MemoryStore::new();
        let first = store.insert_card(5, "C1", "2030-01-01").await;
        store.insert_card(5, "C2", "2030-01-01").await;

        let found = store.find_card_by_user_id(5).await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn test_ledger_status_starts_empty() {
        let store = MemoryStore::new();
        let topup = store
            .create_topup(&CreateTopupRequest {
                card_number: "C1".to_string(),
                topup_amount: 10,
                topup_method: "bank".to_string(),
                topup_time: Utc::now(),
            })
            .await
            .unwrap();
        assert_eq!(topup.status, None);

        let marked = store
            .update_topup_status(topup.id, LedgerStatus::Failed)
            .await
            .unwrap();
        assert_eq!(marked.status, Some(LedgerStatus::Failed));
    }
}
