//! Topup service: credits one card with externally sourced funds.
//!
//! # Known gap
//!
//! When the card expiry cannot be parsed or the card rewrite fails, the
//! balance has already been credited and stays credited; only the ledger
//! entry is marked `failed`.

use std::sync::Arc;

use super::BalanceMutator;
use crate::error::ServiceError;
use crate::models::{CreateTopupRequest, LedgerStatus, Topup, UpdateCard, UpdateTopupRequest};
use crate::stores::{CardStore, TopupStore};

#[derive(Clone)]
pub struct TopupService {
    cards: Arc<dyn CardStore>,
    topups: Arc<dyn TopupStore>,
    balances: BalanceMutator,
}

impl TopupService {
    pub fn new(
        cards: Arc<dyn CardStore>,
        topups: Arc<dyn TopupStore>,
        balances: BalanceMutator,
    ) -> Self {
        Self {
            cards,
            topups,
            balances,
        }
    }

    /// Get a top-up by ID.
    pub async fn find_by_id(&self, topup_id: i32) -> Result<Topup, ServiceError> {
        self.topups
            .find_topup_by_id(topup_id)
            .await?
            .ok_or(ServiceError::TopupNotFound)
    }

    /// Credit a card.
    ///
    /// # Process
    ///
    /// 1. Resolve the card (no ledger entry exists yet on failure)
    /// 2. Create the top-up entry
    /// 3. Resolve the balance and write `balance + amount`
    /// 4. Parse the card expiry and rewrite the card record
    /// 5. Mark the entry `success`
    ///
    /// Any failure after step 2 marks the entry `failed`.
    pub async fn create_topup(&self, request: &CreateTopupRequest) -> Result<Topup, ServiceError> {
        let _guard = self.balances.lock(&[request.card_number.as_str()]).await;

        let card = self
            .cards
            .find_card_by_number(&request.card_number)
            .await?
            .ok_or_else(|| {
                tracing::warn!(card_number = %request.card_number, "topup card not found");
                ServiceError::CardNotFound
            })?;

        let topup = self.topups.create_topup(request).await.map_err(|err| {
            tracing::error!(card_number = %request.card_number, error = %err, "failed to create topup");
            ServiceError::CreateTopupFailed(err)
        })?;

        let balance = match self.balances.find(&request.card_number).await {
            Ok(balance) => balance,
            Err(err) => return Err(self.fail(topup.id, err).await),
        };

        let new_balance = balance.total_balance + request.topup_amount;
        if let Err(err) = self.balances.set(&request.card_number, new_balance).await {
            return Err(self
                .fail(topup.id, ServiceError::BalanceUpdateFailed(err))
                .await);
        }

        // From here on the credit is not rolled back.
        let expire_date = match card.parsed_expire_date() {
            Ok(date) => date,
            Err(err) => {
                tracing::warn!(
                    topup_id = topup.id,
                    expire_date = %card.expire_date,
                    "card expiry unparseable after balance credit"
                );
                return Err(self.fail(topup.id, ServiceError::from(err)).await);
            }
        };

        if let Err(err) = self
            .cards
            .update_card(&UpdateCard::from_card(&card, expire_date))
            .await
        {
            return Err(self
                .fail(topup.id, ServiceError::CardUpdateFailed(err))
                .await);
        }

        let topup = self
            .topups
            .update_topup_status(topup.id, LedgerStatus::Success)
            .await
            .map_err(ServiceError::CreateTopupFailed)?;

        tracing::info!(
            topup_id = topup.id,
            card_number = %topup.card_number,
            amount = topup.topup_amount,
            "topup completed"
        );

        Ok(topup)
    }

    /// Amend a top-up and apply the amount difference to the card balance.
    ///
    /// The entry is rewritten before the balance; if the balance write then
    /// fails, the entry amount is put back (best effort).
    pub async fn update_topup(&self, request: &UpdateTopupRequest) -> Result<Topup, ServiceError> {
        let _guard = self.balances.lock(&[request.card_number.as_str()]).await;

        match self.cards.find_card_by_number(&request.card_number).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(self.fail(request.topup_id, ServiceError::CardNotFound).await),
            Err(err) => return Err(self.fail(request.topup_id, err.into()).await),
        }

        let existing = match self.topups.find_topup_by_id(request.topup_id).await {
            Ok(Some(topup)) => topup,
            Ok(None) => return Err(self.fail(request.topup_id, ServiceError::TopupNotFound).await),
            Err(err) => return Err(self.fail(request.topup_id, err.into()).await),
        };

        let difference = request.topup_amount - existing.topup_amount;

        if let Err(err) = self.topups.update_topup(request).await {
            return Err(self
                .fail(request.topup_id, ServiceError::UpdateTopupFailed(err))
                .await);
        }

        let balance = match self.balances.find(&request.card_number).await {
            Ok(balance) => balance,
            Err(err) => return Err(self.fail(request.topup_id, err).await),
        };

        let new_balance = balance.total_balance + difference;
        if let Err(err) = self.balances.set(&request.card_number, new_balance).await {
            if let Err(rollback) = self
                .topups
                .update_topup_amount(request.topup_id, existing.topup_amount)
                .await
            {
                tracing::error!(
                    topup_id = request.topup_id,
                    error = %rollback,
                    inconsistent_state = true,
                    "failed to restore topup amount"
                );
            }
            return Err(self
                .fail(request.topup_id, ServiceError::BalanceUpdateFailed(err))
                .await);
        }

        match self.topups.find_topup_by_id(request.topup_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(self.fail(request.topup_id, ServiceError::TopupNotFound).await),
            Err(err) => return Err(self.fail(request.topup_id, err.into()).await),
        }

        let topup = self
            .topups
            .update_topup_status(request.topup_id, LedgerStatus::Success)
            .await
            .map_err(ServiceError::UpdateTopupFailed)?;

        tracing::info!(
            topup_id = topup.id,
            difference,
            new_balance,
            "topup updated"
        );

        Ok(topup)
    }

    /// Mark the entry `failed` and hand back the error that caused it.
    async fn fail(&self, topup_id: i32, err: ServiceError) -> ServiceError {
        tracing::warn!(topup_id, error = %err, "topup failed");

        if let Err(status_err) = self
            .topups
            .update_topup_status(topup_id, LedgerStatus::Failed)
            .await
        {
            tracing::error!(topup_id, error = %status_err, "failed to mark topup as failed");
        }

        err
    }
}
