//! Postgres implementation of the store ports.
//!
//! One `PgStore` implements every port; each call runs as its own statement on
//! the shared pool, so no two writes ever share a database transaction.

mod balance;
mod card;
mod merchant;
mod topup;
mod transaction;
mod transfer;
mod withdraw;

use crate::db::DbPool;

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}
