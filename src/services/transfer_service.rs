//! Transfer service: moves money from one card to another.
//!
//! # Write order
//!
//! 1. Debit sender
//! 2. Credit receiver (failure restores the sender)
//! 3. Write the ledger entry (failure restores both cards)
//!
//! Balances are written as absolute totals computed from the values read at
//! the start of the call, so compensation writes put back exactly what was read.
//! Both sides must therefore be distinct cards: a transfer to the sending card
//! is rejected before anything is read or written.

use std::sync::Arc;

use super::BalanceMutator;
use crate::error::ServiceError;
use crate::models::{CreateTransferRequest, LedgerStatus, Transfer, UpdateTransferRequest};
use crate::stores::{CardStore, TransferStore};

#[derive(Clone)]
pub struct TransferService {
    cards: Arc<dyn CardStore>,
    transfers: Arc<dyn TransferStore>,
    balances: BalanceMutator,
}

impl TransferService {
    pub fn new(
        cards: Arc<dyn CardStore>,
        transfers: Arc<dyn TransferStore>,
        balances: BalanceMutator,
    ) -> Self {
        Self {
            cards,
            transfers,
            balances,
        }
    }

    /// Get a transfer by ID.
    pub async fn find_by_id(&self, transfer_id: i32) -> Result<Transfer, ServiceError> {
        self.transfers
            .find_transfer_by_id(transfer_id)
            .await?
            .ok_or(ServiceError::TransferNotFound)
    }

    /// Execute a transfer between two cards.
    ///
    /// # Errors
    ///
    /// - `SameCardTransfer`: sender and receiver are the same card
    /// - `CardNotFound` / `BalanceNotFound`: either side is missing
    /// - `InsufficientBalance`: sender holds less than the amount (checked before any write)
    /// - `BalanceUpdateFailed`: a balance write failed
    /// - `CreateTransferFailed`: the ledger entry could not be written
    pub async fn create_transfer(
        &self,
        request: &CreateTransferRequest,
    ) -> Result<Transfer, ServiceError> {
        let from = request.transfer_from.as_str();
        let to = request.transfer_to.as_str();
        let amount = request.transfer_amount;

        if from == to {
            tracing::warn!(card_number = from, "transfer rejected: same card on both sides");
            return Err(ServiceError::SameCardTransfer);
        }

        let _guard = self.balances.lock(&[from, to]).await;

        for card_number in [from, to] {
            if self.cards.find_card_by_number(card_number).await?.is_none() {
                tracing::warn!(card_number, "transfer card not found");
                return Err(ServiceError::CardNotFound);
            }
        }

        let sender = self.balances.find(from).await?;
        let receiver = self.balances.find(to).await?;

        if sender.total_balance < amount {
            tracing::warn!(
                card_number = from,
                balance = sender.total_balance,
                amount,
                "transfer rejected: insufficient balance"
            );
            return Err(ServiceError::InsufficientBalance);
        }

        self.balances
            .set(from, sender.total_balance - amount)
            .await
            .map_err(ServiceError::BalanceUpdateFailed)?;

        if let Err(err) = self.balances.set(to, receiver.total_balance + amount).await {
            tracing::error!(card_number = to, error = %err, "failed to credit receiver");
            self.balances.restore(from, sender.total_balance).await;
            return Err(ServiceError::BalanceUpdateFailed(err));
        }

        let transfer = match self.transfers.create_transfer(request).await {
            Ok(transfer) => transfer,
            Err(err) => {
                tracing::error!(
                    transfer_from = from,
                    transfer_to = to,
                    error = %err,
                    "failed to create transfer, reverting both balances"
                );
                self.balances.restore(from, sender.total_balance).await;
                self.balances.restore(to, receiver.total_balance).await;
                return Err(ServiceError::CreateTransferFailed(err));
            }
        };

        let transfer = self
            .transfers
            .update_transfer_status(transfer.id, LedgerStatus::Success)
            .await
            .map_err(ServiceError::CreateTransferFailed)?;

        tracing::info!(
            transfer_id = transfer.id,
            transfer_from = from,
            transfer_to = to,
            amount,
            "transfer completed"
        );

        Ok(transfer)
    }

    /// Change the amount of a transfer.
    ///
    /// Only the difference between the new and stored amounts moves: the
    /// sender is debited by it and the receiver credited by it. A negative
    /// difference moves money back to the sender.
    pub async fn update_transfer(
        &self,
        request: &UpdateTransferRequest,
    ) -> Result<Transfer, ServiceError> {
        let from = request.transfer_from.as_str();
        let to = request.transfer_to.as_str();
        let id = request.transfer_id;

        let _guard = self.balances.lock(&[from, to]).await;

        let existing = self
            .transfers
            .find_transfer_by_id(id)
            .await?
            .ok_or(ServiceError::TransferNotFound)?;

        if from == to {
            return Err(self.fail(id, ServiceError::SameCardTransfer).await);
        }

        let difference = request.transfer_amount - existing.transfer_amount;

        let sender = match self.balances.find(from).await {
            Ok(balance) => balance,
            Err(err) => return Err(self.fail(id, err).await),
        };

        let new_sender_balance = sender.total_balance - difference;
        if new_sender_balance < 0 {
            return Err(self.fail(id, ServiceError::InsufficientBalance).await);
        }

        if let Err(err) = self.balances.set(from, new_sender_balance).await {
            return Err(self.fail(id, ServiceError::BalanceUpdateFailed(err)).await);
        }

        let receiver = match self.balances.find(to).await {
            Ok(balance) => balance,
            Err(err) => {
                self.balances.restore(from, sender.total_balance).await;
                return Err(self.fail(id, err).await);
            }
        };

        let new_receiver_balance = receiver.total_balance + difference;
        if let Err(err) = self.balances.set(to, new_receiver_balance).await {
            self.balances.restore(from, sender.total_balance).await;
            self.balances.restore(to, receiver.total_balance).await;
            return Err(self.fail(id, ServiceError::BalanceUpdateFailed(err)).await);
        }

        if let Err(err) = self.transfers.update_transfer(request).await {
            self.balances.restore(from, sender.total_balance).await;
            self.balances.restore(to, receiver.total_balance).await;
            return Err(self.fail(id, ServiceError::UpdateTransferFailed(err)).await);
        }

        let transfer = self
            .transfers
            .update_transfer_status(id, LedgerStatus::Success)
            .await
            .map_err(ServiceError::UpdateTransferFailed)?;

        tracing::info!(
            transfer_id = id,
            difference,
            new_sender_balance,
            new_receiver_balance,
            "transfer updated"
        );

        Ok(transfer)
    }

    async fn fail(&self, transfer_id: i32, err: ServiceError) -> ServiceError {
        tracing::warn!(transfer_id, error = %err, "transfer failed");

        if let Err(status_err) = self
            .transfers
            .update_transfer_status(transfer_id, LedgerStatus::Failed)
            .await
        {
            tracing::error!(transfer_id, error = %status_err, "failed to mark transfer as failed");
        }

        err
    }
}
