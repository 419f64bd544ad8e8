//! Peer-to-peer transfer ledger entries and requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LedgerStatus;

/// Represents a transfer record from the database.
///
/// # Database Table
///
/// Maps to the `transfers` table. Each transfer:
/// - Debits the card in `transfer_from`
/// - Credits the card in `transfer_to`
/// - Stores the amount in minor units
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct Transfer {
    pub id: i32,
    pub transfer_no: Uuid,

    /// Sender card number
    pub transfer_from: String,

    /// Receiver card number
    pub transfer_to: String,

    pub transfer_amount: i64,
    pub transfer_time: DateTime<Utc>,
    pub status: Option<LedgerStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to move money between two cards.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransferRequest {
    pub transfer_from: String,
    pub transfer_to: String,
    pub transfer_amount: i64,
}

/// Request to change the amount of an existing transfer.
///
/// Balance effects are derived from the difference between the stored amount
/// and `transfer_amount`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTransferRequest {
    pub transfer_id: i32,
    pub transfer_from: String,
    pub transfer_to: String,
    pub transfer_amount: i64,
}
