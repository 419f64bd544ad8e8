//! Merchant payment ledger entries and requests.
//!
//! This module defines:
//! - `Transaction`: a payment from a card to the card owned by a merchant's user
//! - Request types for creating and amending payments
//!
//! The merchant is never part of a request body; it is resolved from the API
//! key presented alongside the request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LedgerStatus;

/// Represents a payment record from the database.
///
/// # Database Table
///
/// Maps to the `transactions` table. Each payment:
/// - Debits the payer card (`card_number`)
/// - References the merchant that authorised it (`merchant_id`)
/// - Tracks status (success, failed, or none while in flight)
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct Transaction {
    pub id: i32,

    /// Public reference number
    pub transaction_no: Uuid,

    /// Payer card
    pub card_number: String,

    /// Amount in minor units
    pub amount: i64,

    pub payment_method: String,

    /// Merchant resolved from the API key at creation time
    pub merchant_id: i32,

    pub transaction_time: DateTime<Utc>,
    pub status: Option<LedgerStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to pay a merchant.
///
/// # JSON Example
///
/// ```json
/// {
///   "card_number": "4111111111111111",
///   "amount": 25000,
///   "payment_method": "visa",
///   "transaction_time": "2025-12-21T16:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransactionRequest {
    pub card_number: String,
    pub amount: i64,
    pub payment_method: String,
    pub transaction_time: DateTime<Utc>,
}

/// Request to amend a payment.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTransactionRequest {
    pub transaction_id: i32,
    pub card_number: String,
    pub amount: i64,
    pub payment_method: String,
    pub transaction_time: DateTime<Utc>,
}
