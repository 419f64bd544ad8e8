//! Withdraw service: debits one card; the funds leave the system.
//!
//! The balance is debited before the ledger entry is written. If the entry
//! write fails, the debit is reverted with the same withdraw-specific update.

use std::sync::Arc;

use super::BalanceMutator;
use crate::error::ServiceError;
use crate::models::{CreateWithdrawRequest, LedgerStatus, UpdateWithdrawRequest, Withdraw};
use crate::stores::WithdrawStore;

#[derive(Clone)]
pub struct WithdrawService {
    withdraws: Arc<dyn WithdrawStore>,
    balances: BalanceMutator,
}

impl WithdrawService {
    pub fn new(withdraws: Arc<dyn WithdrawStore>, balances: BalanceMutator) -> Self {
        Self {
            withdraws,
            balances,
        }
    }

    /// Get a withdrawal by ID.
    pub async fn find_by_id(&self, withdraw_id: i32) -> Result<Withdraw, ServiceError> {
        self.withdraws
            .find_withdraw_by_id(withdraw_id)
            .await?
            .ok_or(ServiceError::WithdrawNotFound)
    }

    /// Debit a card.
    ///
    /// Rejections (`BalanceNotFound`, `InsufficientBalance`) happen before any
    /// write, so they leave neither a balance change nor a ledger entry behind.
    pub async fn create_withdraw(
        &self,
        request: &CreateWithdrawRequest,
    ) -> Result<Withdraw, ServiceError> {
        let _guard = self.balances.lock(&[request.card_number.as_str()]).await;

        let balance = self.balances.find(&request.card_number).await?;

        if balance.total_balance < request.withdraw_amount {
            tracing::warn!(
                card_number = %request.card_number,
                balance = balance.total_balance,
                amount = request.withdraw_amount,
                "withdraw rejected: insufficient balance"
            );
            return Err(ServiceError::InsufficientBalance);
        }

        let new_balance = balance.total_balance - request.withdraw_amount;
        self.balances
            .set_withdraw(
                &request.card_number,
                new_balance,
                request.withdraw_amount,
                request.withdraw_time,
            )
            .await
            .map_err(ServiceError::BalanceUpdateFailed)?;

        let withdraw = match self.withdraws.create_withdraw(request).await {
            Ok(withdraw) => withdraw,
            Err(err) => {
                tracing::error!(
                    card_number = %request.card_number,
                    error = %err,
                    "failed to create withdraw, reverting debit"
                );
                // No entry was written, so there is no status to mark.
                self.balances
                    .restore_withdraw(
                        &request.card_number,
                        balance.total_balance,
                        request.withdraw_amount,
                        request.withdraw_time,
                    )
                    .await;
                return Err(ServiceError::CreateWithdrawFailed(err));
            }
        };

        let withdraw = self
            .withdraws
            .update_withdraw_status(withdraw.id, LedgerStatus::Success)
            .await
            .map_err(ServiceError::CreateWithdrawFailed)?;

        tracing::info!(
            withdraw_id = withdraw.id,
            card_number = %withdraw.card_number,
            amount = withdraw.withdraw_amount,
            "withdraw completed"
        );

        Ok(withdraw)
    }

    /// Amend a withdrawal.
    ///
    /// Mirrors creation: the full new amount is debited from the current
    /// balance (not the difference to the stored amount), then the entry is
    /// rewritten. A failed rewrite restores the pre-update balance.
    pub async fn update_withdraw(
        &self,
        request: &UpdateWithdrawRequest,
    ) -> Result<Withdraw, ServiceError> {
        let _guard = self.balances.lock(&[request.card_number.as_str()]).await;

        self.withdraws
            .find_withdraw_by_id(request.withdraw_id)
            .await?
            .ok_or(ServiceError::WithdrawNotFound)?;

        let balance = match self.balances.find(&request.card_number).await {
            Ok(balance) => balance,
            Err(err) => return Err(self.fail(request.withdraw_id, err).await),
        };

        if balance.total_balance < request.withdraw_amount {
            return Err(self
                .fail(request.withdraw_id, ServiceError::InsufficientBalance)
                .await);
        }

        let new_balance = balance.total_balance - request.withdraw_amount;
        if let Err(err) = self
            .balances
            .set_withdraw(
                &request.card_number,
                new_balance,
                request.withdraw_amount,
                request.withdraw_time,
            )
            .await
        {
            return Err(self
                .fail(request.withdraw_id, ServiceError::BalanceUpdateFailed(err))
                .await);
        }

        if let Err(err) = self.withdraws.update_withdraw(request).await {
            self.balances
                .restore_withdraw(
                    &request.card_number,
                    balance.total_balance,
                    request.withdraw_amount,
                    request.withdraw_time,
                )
                .await;
            return Err(self
                .fail(request.withdraw_id, ServiceError::UpdateWithdrawFailed(err))
                .await);
        }

        let withdraw = self
            .withdraws
            .update_withdraw_status(request.withdraw_id, LedgerStatus::Success)
            .await
            .map_err(ServiceError::UpdateWithdrawFailed)?;

        tracing::info!(withdraw_id = withdraw.id, new_balance, "withdraw updated");

        Ok(withdraw)
    }

    async fn fail(&self, withdraw_id: i32, err: ServiceError) -> ServiceError {
        tracing::warn!(withdraw_id, error = %err, "withdraw failed");

        if let Err(status_err) = self
            .withdraws
            .update_withdraw_status(withdraw_id, LedgerStatus::Failed)
            .await
        {
            tracing::error!(withdraw_id, error = %status_err, "failed to mark withdraw as failed");
        }

        err
    }
}
