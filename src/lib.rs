//! Card ledger - balance-mutation orchestration for a card payment gateway.
//!
//! Four orchestrators move money between per-card balances and record each
//! movement as a ledger entry:
//! - top-up: external funds credited to a card
//! - withdraw: funds debited from a card and leaving the system
//! - transfer: one card debited, another credited
//! - transaction: a payer card debited, a merchant's card credited
//!
//! # Architecture
//!
//! - **Stores**: async traits for balances, cards, merchants and each ledger kind
//! - **Adapters**: PostgreSQL via sqlx, or in memory
//! - **Services**: the orchestrators, writing balances only through the Balance Mutator
//!
//! Every store call is independent. When a later step fails, earlier balance
//! writes are reverted by explicit compensation writes, and the ledger entry is
//! marked `failed`.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod stores;

pub use error::{ErrorKind, ServiceError};
pub use services::{ServiceOptions, Services, Stores};
