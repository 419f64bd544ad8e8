//! Top-up ledger entries and requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LedgerStatus;

/// Represents a top-up record from the database.
///
/// # Database Table
///
/// Maps to the `topups` table. A top-up credits one card with externally
/// sourced funds.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct Topup {
    pub id: i32,

    /// Public reference number
    pub topup_no: Uuid,

    pub card_number: String,
    pub topup_amount: i64,
    pub topup_method: String,
    pub topup_time: DateTime<Utc>,

    /// `None` until the orchestration attempt finishes
    pub status: Option<LedgerStatus>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to credit a card.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTopupRequest {
    pub card_number: String,
    pub topup_amount: i64,
    pub topup_method: String,
    pub topup_time: DateTime<Utc>,
}

/// Request to amend an existing top-up.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTopupRequest {
    pub topup_id: i32,
    pub card_number: String,
    pub topup_amount: i64,
    pub topup_method: String,
    pub topup_time: DateTime<Utc>,
}
