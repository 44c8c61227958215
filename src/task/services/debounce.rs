//! Keyed trailing-edge debouncing for field intents.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Collapses bursts of submissions per key into the last submitted value.
///
/// Each caller parks its value under a ticket and sleeps for the window.
/// Only the caller still holding the newest ticket when it wakes receives
/// the value; everyone it overtook gets `None`.
#[derive(Debug)]
pub struct Debouncer<K, V> {
    pending: Mutex<HashMap<K, (u64, V)>>,
    next_ticket: AtomicU64,
}

impl<K, V> Default for Debouncer<K, V> {
    fn default() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            next_ticket: AtomicU64::new(0),
        }
    }
}

impl<K, V> Debouncer<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty debouncer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Submits `value` under `key` and waits out the window.
    ///
    /// Returns the value when no newer submission for `key` arrived in the
    /// meantime. A zero window still yields once, so concurrent callers are
    /// ordered by ticket. Dropping the future unparks its value if it is
    /// still the newest.
    pub async fn settle(&self, key: K, value: V, window: Duration) -> Option<V> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(key.clone(), (ticket, value));
        let parked = Parked {
            debouncer: self,
            key,
            ticket,
        };

        if window.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(window).await;
        }

        parked.take()
    }

    fn take_if_latest(&self, key: &K, ticket: u64) -> Option<V> {
        let mut pending = self.lock();
        match pending.get(key) {
            Some((latest, _)) if *latest == ticket => pending.remove(key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Returns the number of keys with a parked value.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, (u64, V)>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A submission waiting out its window.
struct Parked<'a, K, V>
where
    K: Eq + Hash + Clone,
{
    debouncer: &'a Debouncer<K, V>,
    key: K,
    ticket: u64,
}

impl<K, V> Parked<'_, K, V>
where
    K: Eq + Hash + Clone,
{
    fn take(self) -> Option<V> {
        self.debouncer.take_if_latest(&self.key, self.ticket)
    }
}

impl<K, V> Drop for Parked<'_, K, V>
where
    K: Eq + Hash + Clone,
{
    fn drop(&mut self) {
        drop(self.debouncer.take_if_latest(&self.key, self.ticket));
    }
}
