#![allow(dead_code)]

use std::sync::Arc;

use card_ledger::models::{
    CreateTopupRequest, CreateTransactionRequest, CreateTransferRequest, CreateWithdrawRequest,
};
use card_ledger::stores::MemoryStore;
use card_ledger::{ServiceOptions, Services, Stores};
use chrono::Utc;

pub const EXPIRE_DATE: &str = "2030-12-31";
pub const MERCHANT_KEY: &str = "shop-api-key";

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub services: Services,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_options(ServiceOptions::default())
    }

    pub fn with_options(options: ServiceOptions) -> Self {
        let store = Arc::new(MemoryStore::new());
        let services = Services::new(Stores::shared(store.clone()), options);
        Self { store, services }
    }

    /// Register a card with a balance row.
    pub async fn card(&self, user_id: i32, card_number: &str, balance: i64) {
        self.store.insert_card(user_id, card_number, EXPIRE_DATE).await;
        self.store.insert_balance(card_number, balance).await;
    }

    pub async fn balance(&self, card_number: &str) -> i64 {
        self.store
            .balance_of(card_number)
            .await
            .expect("balance row exists")
    }
}

pub fn topup(card_number: &str, amount: i64) -> CreateTopupRequest {
    CreateTopupRequest {
        card_number: card_number.to_string(),
        topup_amount: amount,
        topup_method: "bank_transfer".to_string(),
        topup_time: Utc::now(),
    }
}

pub fn withdraw(card_number: &str, amount: i64) -> CreateWithdrawRequest {
    CreateWithdrawRequest {
        card_number: card_number.to_string(),
        withdraw_amount: amount,
        withdraw_time: Utc::now(),
    }
}

pub fn transfer(from: &str, to: &str, amount: i64) -> CreateTransferRequest {
    CreateTransferRequest {
        transfer_from: from.to_string(),
        transfer_to: to.to_string(),
        transfer_amount: amount,
    }
}

pub fn payment(card_number: &str, amount: i64) -> CreateTransactionRequest {
    CreateTransactionRequest {
        card_number: card_number.to_string(),
        amount,
        payment_method: "visa".to_string(),
        transaction_time: Utc::now(),
    }
}
