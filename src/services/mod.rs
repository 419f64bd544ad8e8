//! Business logic services.
//!
//! Each orchestrator sequences independent store calls for one kind of money
//! movement. There is no enclosing database transaction: consistency after a
//! partial failure depends on the compensation writes each orchestrator issues.

pub mod balance_mutator;
pub mod locks;
pub mod topup_service;
pub mod transaction_service;
pub mod transfer_service;
pub mod withdraw_service;

use std::sync::Arc;

use crate::stores::{
    BalanceStore, CardStore, MerchantStore, TopupStore, TransactionStore, TransferStore,
    WithdrawStore,
};

pub use balance_mutator::BalanceMutator;
pub use locks::CardLocks;
pub use topup_service::TopupService;
pub use transaction_service::TransactionService;
pub use transfer_service::TransferService;
pub use withdraw_service::WithdrawService;

/// Orchestrator settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceOptions {
    /// Serialize balance read-compute-write sequences per card.
    pub card_locking: bool,
}

/// The store ports the orchestrators depend on.
#[derive(Clone)]
pub struct Stores {
    pub balance: Arc<dyn BalanceStore>,
    pub card: Arc<dyn CardStore>,
    pub merchant: Arc<dyn MerchantStore>,
    pub topup: Arc<dyn TopupStore>,
    pub withdraw: Arc<dyn WithdrawStore>,
    pub transfer: Arc<dyn TransferStore>,
    pub transaction: Arc<dyn TransactionStore>,
}

impl Stores {
    /// Use one adapter for every port.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: BalanceStore
            + CardStore
            + MerchantStore
            + TopupStore
            + WithdrawStore
            + TransferStore
            + TransactionStore
            + 'static,
    {
        Self {
            balance: store.clone(),
            card: store.clone(),
            merchant: store.clone(),
            topup: store.clone(),
            withdraw: store.clone(),
            transfer: store.clone(),
            transaction: store,
        }
    }
}

/// All four orchestrators, sharing one Balance Mutator and lock table.
#[derive(Clone)]
pub struct Services {
    pub topup: TopupService,
    pub withdraw: WithdrawService,
    pub transfer: TransferService,
    pub transaction: TransactionService,
}

impl Services {
    pub fn new(stores: Stores, options: ServiceOptions) -> Self {
        let balances = BalanceMutator::new(stores.balance, CardLocks::new(options.card_locking));

        Self {
            topup: TopupService::new(stores.card.clone(), stores.topup, balances.clone()),
            withdraw: WithdrawService::new(stores.withdraw, balances.clone()),
            transfer: TransferService::new(stores.card.clone(), stores.transfer, balances.clone()),
            transaction: TransactionService::new(
                stores.merchant,
                stores.card,
                stores.transaction,
                balances,
            ),
        }
    }
}
