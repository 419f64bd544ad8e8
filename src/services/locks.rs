//! Per-card lock table used when card locking is enabled.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// In-process mutual exclusion keyed by card number.
///
/// Disabled tables hand out empty guards, leaving concurrent read-compute-write
/// sequences on the same card unguarded.
///
/// The table only keeps entries for cards that are locked or awaited; idle
/// entries are pruned on the next acquire.
#[derive(Clone, Default)]
pub struct CardLocks {
    enabled: bool,
    table: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

/// Holds the locks of every card named in one `CardLocks::acquire` call.
#[must_use]
pub struct CardGuard {
    guards: Vec<OwnedMutexGuard<()>>,
}

impl CardGuard {
    pub fn held(&self) -> usize {
        self.guards.len()
    }
}

impl CardLocks {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            table: Arc::default(),
        }
    }

    /// Lock every listed card, in sorted order so that two multi-card
    /// operations cannot deadlock.
    pub async fn acquire(&self, card_numbers: &[&str]) -> CardGuard {
        if !self.enabled {
            return CardGuard { guards: Vec::new() };
        }

        let mut keys: Vec<&str> = card_numbers.to_vec();
        keys.sort_unstable();
        keys.dedup();

        let mutexes: Vec<Arc<Mutex<()>>> = {
            let mut table = self.table.lock().await;
            // An entry referenced only by the table has no holder and no waiter.
            table.retain(|_, mutex| Arc::strong_count(mutex) > 1);
            keys.iter()
                .map(|key| table.entry((*key).to_string()).or_default().clone())
                .collect()
        };

        let mut guards = Vec::with_capacity(mutexes.len());
        for mutex in mutexes {
            guards.push(mutex.lock_owned().await);
        }

        CardGuard { guards }
    }
}
