//! Per-key async lock manager for cache slots
//!
//! Serializes writers of the same `(namespace, projection)` key. Every key
//! gets its own mutex, so writers of different keys never wait on each
//! other. The key table is split into stripes (picked by xxh3 hash) so that
//! looking up a key's mutex only contends with keys of the same stripe, and
//! only for the lookup itself.
//!
//! Guards may be held across `.await` (the recovery fetch runs under the
//! key's lock). Acquisition waits as long as it takes: a writer that gave up
//! would drop its change.

use crate::types::ProjectionKey;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use xxhash_rust::xxh3::xxh3_64;

/// Default number of stripes
pub const DEFAULT_LOCK_STRIPES: usize = 256;

type Stripe = Mutex<HashMap<ProjectionKey, Arc<AsyncMutex<()>>>>;

/// Per-key writer locks
///
/// # Example
///
/// ```ignore
/// let locks = KeyLockManager::with_stripes(256);
/// let key = ProjectionKey::new("acme", "graph");
///
/// let _guard = locks.lock(&key).await;
/// // exclusive access to acme/graph until the guard drops
/// ```
pub struct KeyLockManager {
    stripes: Vec<Stripe>,
}

/// Exclusive hold on one key, released on drop.
///
/// The key's entry is removed from the table once nobody holds or waits
/// for it.
pub struct KeyGuard<'a> {
    stripe: &'a Stripe,
    key: ProjectionKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        let mut table = self.stripe.lock();
        drop(self.guard.take());

        // Waiters clone the entry under the table lock, so a count of one
        // means only the table still refers to it
        if table
            .get(&self.key)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            table.remove(&self.key);
        }
    }
}

impl KeyLockManager {
    /// Create a lock manager with `num_stripes` stripes
    ///
    /// # Panics
    ///
    /// Panics if `num_stripes` is 0.
    pub fn with_stripes(num_stripes: usize) -> Self {
        assert!(num_stripes > 0, "num_stripes must be positive");
        let stripes = (0..num_stripes).map(|_| Mutex::new(HashMap::new())).collect();

        Self { stripes }
    }

    fn stripe_index(&self, key: &ProjectionKey) -> usize {
        let hash = xxh3_64(&key.to_bytes());
        (hash as usize) % self.stripes.len()
    }

    /// Acquire the lock for exactly `key`
    pub async fn lock(&self, key: &ProjectionKey) -> KeyGuard<'_> {
        let stripe = &self.stripes[self.stripe_index(key)];
        let entry = stripe
            .lock()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();

        KeyGuard {
            stripe,
            key: key.clone(),
            guard: Some(entry.lock_owned().await),
        }
    }

    pub fn num_stripes(&self) -> usize {
        self.stripes.len()
    }

    /// Keys currently held or waited for
    pub fn active_keys(&self) -> usize {
        self.stripes.iter().map(|stripe| stripe.lock().len()).sum()
    }
}

impl Default for KeyLockManager {
    fn default() -> Self {
        Self::with_stripes(DEFAULT_LOCK_STRIPES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_stripe_distribution() {
        let lm = KeyLockManager::with_stripes(256);
        assert_eq!(lm.num_stripes(), 256);

        let a = ProjectionKey::new("acme", "graph");
        let idx = lm.stripe_index(&a);
        assert!(idx < 256);

        // Same key always maps to the same stripe
        assert_eq!(idx, lm.stripe_index(&ProjectionKey::new("acme", "graph")));
    }

    #[tokio::test]
    async fn test_unrelated_keys_do_not_contend() {
        // Single stripe, so both keys share one table
        let lm = KeyLockManager::with_stripes(1);

        let _held = lm.lock(&ProjectionKey::new("a", "x")).await;

        let other = tokio::time::timeout(
            Duration::from_millis(100),
            lm.lock(&ProjectionKey::new("b", "y")),
        )
        .await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn test_entries_removed_when_released() {
        let lm = KeyLockManager::with_stripes(4);
        let key = ProjectionKey::new("acme", "graph");

        let guard = lm.lock(&key).await;
        assert_eq!(lm.active_keys(), 1);
        drop(guard);
        assert_eq!(lm.active_keys(), 0);

        // Relocking after removal works
        let _guard = lm.lock(&key).await;
        assert_eq!(lm.active_keys(), 1);
    }

    #[tokio::test]
    async fn test_same_key_is_serialized() {
        let lm = Arc::new(KeyLockManager::with_stripes(16));
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lm = lm.clone();
                let inside = inside.clone();
                let max_inside = max_inside.clone();
                tokio::spawn(async move {
                    let key = ProjectionKey::new("acme", "graph");
                    let _guard = lm.lock(&key).await;
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(lm.active_keys(), 0);
    }

    #[test]
    #[should_panic(expected = "num_stripes must be positive")]
    fn test_zero_stripes_panics() {
        let _ = KeyLockManager::with_stripes(0);
    }
}
