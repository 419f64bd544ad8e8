//! Balance ("saldo") record: the spendable amount held by one card.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a balance record from the database.
///
/// # Database Table
///
/// Maps to the `saldos` table, one row per card number.
///
/// Amounts are integer minor currency units. `total_balance` is intended to
/// stay non-negative but nothing below the orchestrators enforces it.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct Balance {
    pub id: i32,

    /// Card this balance belongs to (unique)
    pub card_number: String,

    /// Current spendable amount
    pub total_balance: i64,

    /// Amount of the most recent withdrawal
    ///
    /// Written only by the withdraw path; never used for balance math.
    pub withdraw_amount: Option<i64>,

    /// Time of the most recent withdrawal
    pub withdraw_time: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Overwrite a card's total balance.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBalance {
    pub card_number: String,
    pub total_balance: i64,
}

/// Overwrite a card's total balance and stamp the last-withdraw metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWithdrawBalance {
    pub card_number: String,
    pub total_balance: i64,
    pub withdraw_amount: i64,
    pub withdraw_time: DateTime<Utc>,
}
