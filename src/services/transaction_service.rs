//! Transaction service - merchant payments.
//!
//! This service handles:
//! - Resolving the merchant behind an API key
//! - Debiting the payer card and crediting the merchant's card
//! - Ledger status bookkeeping for each attempt
//!
//! # Consistency
//!
//! There is no enclosing database transaction. Only one failure is
//! compensated: a failed ledger insert credits the payer back. Known gaps:
//! - creation: once the entry is marked `success`, failing to resolve or
//!   credit the merchant's card leaves the payer debited
//! - amendment: a failure after the balance restore or re-debit marks the
//!   entry `failed` without reversing those writes

use std::sync::Arc;

use super::BalanceMutator;
use crate::error::ServiceError;
use crate::models::{
    CreateTransactionRequest, LedgerStatus, Merchant, Transaction, UpdateTransactionRequest,
};
use crate::stores::{CardStore, MerchantStore, TransactionStore};

#[derive(Clone)]
pub struct TransactionService {
    merchants: Arc<dyn MerchantStore>,
    cards: Arc<dyn CardStore>,
    transactions: Arc<dyn TransactionStore>,
    balances: BalanceMutator,
}

impl TransactionService {
    pub fn new(
        merchants: Arc<dyn MerchantStore>,
        cards: Arc<dyn CardStore>,
        transactions: Arc<dyn TransactionStore>,
        balances: BalanceMutator,
    ) -> Self {
        Self {
            merchants,
            cards,
            transactions,
            balances,
        }
    }

    /// Get a payment by ID.
    pub async fn find_by_id(&self, transaction_id: i32) -> Result<Transaction, ServiceError> {
        self.transactions
            .find_transaction_by_id(transaction_id)
            .await?
            .ok_or(ServiceError::TransactionNotFound)
    }

    /// Pay the merchant identified by `api_key`.
    ///
    /// # Process
    ///
    /// 1. Resolve merchant, payer card and payer balance
    /// 2. Reject if the payer holds less than the amount
    /// 3. Debit the payer
    /// 4. Write the ledger entry (failure credits the payer back)
    /// 5. Mark the entry `success`
    /// 6. Credit the card owned by the merchant's user
    pub async fn create_transaction(
        &self,
        api_key: &str,
        request: &CreateTransactionRequest,
    ) -> Result<Transaction, ServiceError> {
        let merchant = self.resolve_merchant(api_key).await?;
        let payer = request.card_number.as_str();
        let amount = request.amount;

        let transaction = {
            let _guard = self.balances.lock(&[payer]).await;

            if self.cards.find_card_by_number(payer).await?.is_none() {
                tracing::warn!(card_number = payer, "payer card not found");
                return Err(ServiceError::CardNotFound);
            }

            let balance = self.balances.find(payer).await?;

            if balance.total_balance < amount {
                tracing::warn!(
                    card_number = payer,
                    balance = balance.total_balance,
                    amount,
                    "payment rejected: insufficient balance"
                );
                return Err(ServiceError::InsufficientBalance);
            }

            self.balances
                .set(payer, balance.total_balance - amount)
                .await
                .map_err(ServiceError::BalanceUpdateFailed)?;

            let transaction = match self
                .transactions
                .create_transaction(request, merchant.id)
                .await
            {
                Ok(transaction) => transaction,
                Err(err) => {
                    tracing::error!(
                        card_number = payer,
                        merchant_id = merchant.id,
                        error = %err,
                        "failed to create transaction, crediting payer back"
                    );
                    self.balances.restore(payer, balance.total_balance).await;
                    return Err(ServiceError::CreateTransactionFailed(err));
                }
            };

            self.transactions
                .update_transaction_status(transaction.id, LedgerStatus::Success)
                .await
                .map_err(ServiceError::CreateTransactionFailed)?
        };

        // The payer is already debited and the entry already marked success;
        // nothing below is compensated.
        let merchant_card = self
            .cards
            .find_card_by_user_id(merchant.user_id)
            .await?
            .ok_or_else(|| {
                tracing::error!(
                    transaction_id = transaction.id,
                    merchant_id = merchant.id,
                    inconsistent_state = true,
                    "merchant card not found after payer debit"
                );
                ServiceError::CardNotFound
            })?;

        let _guard = self.balances.lock(&[merchant_card.card_number.as_str()]).await;

        let merchant_balance = self.balances.find(&merchant_card.card_number).await?;

        self.balances
            .set(
                &merchant_card.card_number,
                merchant_balance.total_balance + amount,
            )
            .await
            .map_err(|err| {
                tracing::error!(
                    transaction_id = transaction.id,
                    card_number = %merchant_card.card_number,
                    error = %err,
                    inconsistent_state = true,
                    "failed to credit merchant after payer debit"
                );
                ServiceError::BalanceUpdateFailed(err)
            })?;

        tracing::info!(
            transaction_id = transaction.id,
            merchant_id = merchant.id,
            card_number = payer,
            amount,
            "payment completed"
        );

        Ok(transaction)
    }

    /// Amend a payment.
    ///
    /// The old amount is credited back to the payer, then the new amount is
    /// debited. The merchant's balance is not touched.
    pub async fn update_transaction(
        &self,
        api_key: &str,
        request: &UpdateTransactionRequest,
    ) -> Result<Transaction, ServiceError> {
        let id = request.transaction_id;

        let existing = self
            .transactions
            .find_transaction_by_id(id)
            .await?
            .ok_or(ServiceError::TransactionNotFound)?;

        match self.merchants.find_by_api_key(api_key).await {
            Ok(Some(merchant)) if merchant.id == existing.merchant_id => {}
            Ok(Some(_)) => return Err(self.fail(id, ServiceError::TransactionForbidden).await),
            Ok(None) => return Err(self.fail(id, ServiceError::MerchantNotFound).await),
            Err(err) => return Err(self.fail(id, err.into()).await),
        }

        let payer = request.card_number.as_str();
        let _guard = self.balances.lock(&[payer]).await;

        match self.cards.find_card_by_number(payer).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(self.fail(id, ServiceError::CardNotFound).await),
            Err(err) => return Err(self.fail(id, err.into()).await),
        }

        let balance = match self.balances.find(payer).await {
            Ok(balance) => balance,
            Err(err) => return Err(self.fail(id, err).await),
        };

        let restored = balance.total_balance + existing.amount;
        if let Err(err) = self.balances.set(payer, restored).await {
            return Err(self.fail(id, ServiceError::BalanceUpdateFailed(err)).await);
        }

        if restored < request.amount {
            return Err(self.fail(id, ServiceError::InsufficientBalance).await);
        }

        let new_balance = restored - request.amount;
        if let Err(err) = self.balances.set(payer, new_balance).await {
            return Err(self.fail(id, ServiceError::BalanceUpdateFailed(err)).await);
        }

        if let Err(err) = self.transactions.update_transaction(request).await {
            return Err(self
                .fail(id, ServiceError::UpdateTransactionFailed(err))
                .await);
        }

        let transaction = self
            .transactions
            .update_transaction_status(id, LedgerStatus::Success)
            .await
            .map_err(ServiceError::UpdateTransactionFailed)?;

        tracing::info!(
            transaction_id = id,
            old_amount = existing.amount,
            new_amount = request.amount,
            new_balance,
            "payment updated"
        );

        Ok(transaction)
    }

    async fn resolve_merchant(&self, api_key: &str) -> Result<Merchant, ServiceError> {
        self.merchants
            .find_by_api_key(api_key)
            .await?
            .ok_or_else(|| {
                tracing::warn!("no merchant for presented api key");
                ServiceError::MerchantNotFound
            })
    }

    async fn fail(&self, transaction_id: i32, err: ServiceError) -> ServiceError {
        tracing::warn!(transaction_id, error = %err, "transaction failed");

        if let Err(status_err) = self
            .transactions
            .update_transaction_status(transaction_id, LedgerStatus::Failed)
            .await
        {
            tracing::error!(
                transaction_id,
                error = %status_err,
                "failed to mark transaction as failed"
            );
        }

        err
    }
}
