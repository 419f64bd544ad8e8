//! Error types returned by the orchestrators.
//!
//! Each orchestration call ends in at most one `ServiceError`. Callers see the
//! classification and message only; which compensations ran (or failed) is
//! visible in the logs, never in the error.

use serde::Serialize;

use crate::stores::StoreError;

/// Terminal error of one orchestration call.
///
/// # Error Categories
///
/// - **Not found**: a card, balance, merchant or ledger entry is missing
/// - **Insufficient balance**: pre-mutation guard rejected the request
/// - **Forbidden**: the API key does not own the payment being amended
/// - **Invalid request**: the request cannot be executed as stated
/// - **Write failed**: a store call returned an error
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Card not found")]
    CardNotFound,

    #[error("Balance not found")]
    BalanceNotFound,

    #[error("Merchant not found")]
    MerchantNotFound,

    #[error("Topup not found")]
    TopupNotFound,

    #[error("Withdraw not found")]
    WithdrawNotFound,

    #[error("Transfer not found")]
    TransferNotFound,

    #[error("Transaction not found")]
    TransactionNotFound,

    /// The debited card holds less than the requested amount.
    #[error("Insufficient balance")]
    InsufficientBalance,

    /// Sender and receiver name the same card.
    #[error("Cannot transfer to the same card")]
    SameCardTransfer,

    #[error("Failed to update balance")]
    BalanceUpdateFailed(#[source] StoreError),

    /// The card's stored expiry could not be parsed.
    #[error("Invalid card expire date: {0}")]
    InvalidExpireDate(#[from] chrono::ParseError),

    #[error("Failed to update card")]
    CardUpdateFailed(#[source] StoreError),

    #[error("Failed to create topup")]
    CreateTopupFailed(#[source] StoreError),

    #[error("Failed to update topup")]
    UpdateTopupFailed(#[source] StoreError),

    #[error("Failed to create withdraw")]
    CreateWithdrawFailed(#[source] StoreError),

    #[error("Failed to update withdraw")]
    UpdateWithdrawFailed(#[source] StoreError),

    #[error("Failed to create transfer")]
    CreateTransferFailed(#[source] StoreError),

    #[error("Failed to update transfer")]
    UpdateTransferFailed(#[source] StoreError),

    #[error("Failed to create transaction")]
    CreateTransactionFailed(#[source] StoreError),

    #[error("Failed to update transaction")]
    UpdateTransactionFailed(#[source] StoreError),

    /// The API key belongs to a merchant other than the one on the payment.
    #[error("Failed to update transaction: merchant does not own this transaction")]
    TransactionForbidden,

    /// A lookup call itself errored (as opposed to finding nothing).
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Coarse classification of a `ServiceError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InsufficientBalance,
    Forbidden,
    InvalidRequest,
    WriteFailed,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::CardNotFound
            | ServiceError::BalanceNotFound
            | ServiceError::MerchantNotFound
            | ServiceError::TopupNotFound
            | ServiceError::WithdrawNotFound
            | ServiceError::TransferNotFound
            | ServiceError::TransactionNotFound => ErrorKind::NotFound,
            ServiceError::InsufficientBalance => ErrorKind::InsufficientBalance,
            ServiceError::TransactionForbidden => ErrorKind::Forbidden,
            ServiceError::SameCardTransfer => ErrorKind::InvalidRequest,
            ServiceError::BalanceUpdateFailed(_)
            | ServiceError::InvalidExpireDate(_)
            | ServiceError::CardUpdateFailed(_)
            | ServiceError::CreateTopupFailed(_)
            | ServiceError::UpdateTopupFailed(_)
            | ServiceError::CreateWithdrawFailed(_)
            | ServiceError::UpdateWithdrawFailed(_)
            | ServiceError::CreateTransferFailed(_)
            | ServiceError::UpdateTransferFailed(_)
            | ServiceError::CreateTransactionFailed(_)
            | ServiceError::UpdateTransactionFailed(_)
            | ServiceError::Store(_) => ErrorKind::WriteFailed,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::CardNotFound => "card_not_found",
            ServiceError::BalanceNotFound => "balance_not_found",
            ServiceError::MerchantNotFound => "merchant_not_found",
            ServiceError::TopupNotFound => "topup_not_found",
            ServiceError::WithdrawNotFound => "withdraw_not_found",
            ServiceError::TransferNotFound => "transfer_not_found",
            ServiceError::TransactionNotFound => "transaction_not_found",
            ServiceError::InsufficientBalance => "insufficient_balance",
            ServiceError::SameCardTransfer => "same_card_transfer",
            ServiceError::BalanceUpdateFailed(_) => "balance_update_failed",
            ServiceError::InvalidExpireDate(_) => "invalid_expire_date",
            ServiceError::CardUpdateFailed(_) => "card_update_failed",
            ServiceError::CreateTopupFailed(_) => "create_topup_failed",
            ServiceError::UpdateTopupFailed(_) => "update_topup_failed",
            ServiceError::CreateWithdrawFailed(_) => "create_withdraw_failed",
            ServiceError::UpdateWithdrawFailed(_) => "update_withdraw_failed",
            ServiceError::CreateTransferFailed(_) => "create_transfer_failed",
            ServiceError::UpdateTransferFailed(_) => "update_transfer_failed",
            ServiceError::CreateTransactionFailed(_) => "create_transaction_failed",
            ServiceError::UpdateTransactionFailed(_) | ServiceError::TransactionForbidden => {
                "update_transaction_failed"
            }
            ServiceError::Store(_) => "internal_error",
        }
    }

    /// Render the error for a transport layer.
    ///
    /// Store failures are reported without their details.
    pub fn to_body(&self) -> ErrorBody {
        let message = match self {
            ServiceError::Store(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                kind: self.kind(),
                message,
            },
        }
    }
}

/// Error envelope handed to transport callers.
///
/// ```json
/// {
///   "error": {
///     "code": "insufficient_balance",
///     "kind": "insufficient_balance",
///     "message": "Insufficient balance"
///   }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub kind: ErrorKind,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_classify_as_not_found() {
        assert_eq!(ServiceError::CardNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(ServiceError::TransferNotFound.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn write_failures_classify_as_write_failed() {
        let err = ServiceError::CreateTransferFailed(StoreError::Unavailable("down".into()));
        assert_eq!(err.kind(), ErrorKind::WriteFailed);
        assert_eq!(err.code(), "create_transfer_failed");
    }

    #[test]
    fn merchant_mismatch_is_forbidden() {
        let err = ServiceError::TransactionForbidden;
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.code(), "update_transaction_failed");
    }

    #[test]
    fn same_card_transfer_is_invalid_request() {
        let err = ServiceError::SameCardTransfer;
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(err.code(), "same_card_transfer");
    }

    #[test]
    fn body_hides_store_details() {
        let err = ServiceError::Store(StoreError::Unavailable("connection reset".into()));
        let body = serde_json::to_value(err.to_body()).unwrap();

        assert_eq!(body["error"]["code"], "internal_error");
        assert_eq!(body["error"]["kind"], "write_failed");
        assert_eq!(body["error"]["message"], "An internal error occurred");
    }

    #[test]
    fn body_carries_message() {
        let body = serde_json::to_value(ServiceError::InsufficientBalance.to_body()).unwrap();
        assert_eq!(body["error"]["message"], "Insufficient balance");
        assert_eq!(body["error"]["kind"], "insufficient_balance");
    }
}
