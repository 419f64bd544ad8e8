//! Withdrawal ledger entries and requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LedgerStatus;

/// Represents a withdrawal record from the database.
///
/// Maps to the `withdraws` table. Funds debited by a withdrawal leave the system.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct Withdraw {
    pub id: i32,
    pub withdraw_no: Uuid,
    pub card_number: String,
    pub withdraw_amount: i64,
    pub withdraw_time: DateTime<Utc>,
    pub status: Option<LedgerStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWithdrawRequest {
    pub card_number: String,
    pub withdraw_amount: i64,
    pub withdraw_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWithdrawRequest {
    pub withdraw_id: i32,
    pub card_number: String,
    pub withdraw_amount: i64,
    pub withdraw_time: DateTime<Utc>,
}
