//! Data models representing stored entities and orchestration requests.

/// Per-card balance record
pub mod balance;
/// Card metadata
pub mod card;
/// Merchant resolved from an API key
pub mod merchant;
/// Ledger entry status
pub mod status;
/// Top-up ledger entries
pub mod topup;
/// Merchant payment ledger entries
pub mod transaction;
/// Peer-to-peer transfer ledger entries
pub mod transfer;
/// Withdrawal ledger entries
pub mod withdraw;

pub use balance::{Balance, UpdateBalance, UpdateWithdrawBalance};
pub use card::{Card, UpdateCard};
pub use merchant::Merchant;
pub use status::LedgerStatus;
pub use topup::{CreateTopupRequest, Topup, UpdateTopupRequest};
pub use transaction::{CreateTransactionRequest, Transaction, UpdateTransactionRequest};
pub use transfer::{CreateTransferRequest, Transfer, UpdateTransferRequest};
pub use withdraw::{CreateWithdrawRequest, UpdateWithdrawRequest, Withdraw};
