//! Keyed async locks for serializing mutations per entity.
//!
//! All writes to one car's calendar, and all balance mutations for one user,
//! must be serialized even though the store itself runs single-node: two
//! booking requests racing for the same car must produce exactly one winner.
//! [`IdLocks`] hands out one async mutex per entity id on demand.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-id async mutexes.
#[derive(Debug, Default)]
pub struct IdLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl IdLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for `id`, creating it on first use.
    ///
    /// The registry lock is released before awaiting the entity lock, so a
    /// long-held entity lock never blocks acquisition for unrelated ids.
    pub async fn acquire(&self, id: i64) -> OwnedMutexGuard<()> {
        let entry = {
            let mut map = self.inner.lock().await;
            Arc::clone(map.entry(id).or_default())
        };
        entry.lock_owned().await
    }

    /// Acquires the locks for two ids in ascending order.
    ///
    /// Ordering makes concurrent pair acquisitions deadlock-free. When both
    /// ids are equal a single guard is returned.
    pub async fn acquire_pair(
        &self,
        a: i64,
        b: i64,
    ) -> (OwnedMutexGuard<()>, Option<OwnedMutexGuard<()>>) {
        if a == b {
            return (self.acquire(a).await, None);
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first_guard = self.acquire(first).await;
        let second_guard = self.acquire(second).await;
        (first_guard, Some(second_guard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_serializes_same_id() {
        let locks = IdLocks::new();

        let guard = locks.acquire(1).await;

        // A second acquisition of the same id must wait for the guard
        let locks_ref = &locks;
        let pending = locks_ref.acquire(1);
        tokio::pin!(pending);
        assert!(
            futures_is_pending(&mut pending).await,
            "second acquire should block while the first guard is held"
        );

        drop(guard);
        let _second = pending.await;
    }

    #[tokio::test]
    async fn test_acquire_independent_ids_do_not_block() {
        let locks = IdLocks::new();

        let _first = locks.acquire(1).await;
        // Unrelated id is immediately available
        let _second = locks.acquire(2).await;
    }

    #[tokio::test]
    async fn test_acquire_pair_same_id_yields_single_guard() {
        let locks = IdLocks::new();

        let (_guard, extra) = locks.acquire_pair(5, 5).await;
        assert!(extra.is_none());
    }

    #[tokio::test]
    async fn test_acquire_pair_orders_ids() {
        let locks = IdLocks::new();

        // Acquiring (2, 1) and (1, 2) concurrently must not deadlock; both
        // orders lock id 1 first. Sequential sanity check here:
        let (g1, g2) = locks.acquire_pair(2, 1).await;
        assert!(g2.is_some());
        drop(g1);
        drop(g2);

        let (g1, g2) = locks.acquire_pair(1, 2).await;
        assert!(g2.is_some());
    }

    /// Polls a future once and reports whether it is still pending.
    async fn futures_is_pending<F: Future + Unpin>(fut: &mut F) -> bool {
        use std::task::Poll;
        std::future::poll_fn(|cx| {
            let polled = std::pin::Pin::new(&mut *fut).poll(cx);
            Poll::Ready(matches!(polled, Poll::Pending))
        })
        .await
    }
}
