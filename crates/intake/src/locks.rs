//! Per-identity mutual exclusion for the intake decision
//!
//! The rate-limit count, dedupe lookup and insert for one `(tenant, email)`
//! run under the same async mutex, so two concurrent submissions for one
//! identity cannot both see "no duplicate" and both insert. Different
//! identities never contend.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type IdentityKey = (String, String);

#[derive(Default)]
pub struct IdentityLocks {
    locks: DashMap<IdentityKey, Arc<Mutex<()>>>,
}

impl IdentityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `(tenant_id, email)`
    pub async fn acquire(&self, tenant_id: &str, email: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry((tenant_id.to_string(), email.to_string()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drop locks nobody holds or waits on; returns how many were removed
    pub fn prune(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before.saturating_sub(self.locks.len())
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_identity_serialises() {
        let locks = Arc::new(IdentityLocks::new());
        let guard = locks.acquire("t1", "a@b.com").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.acquire("t1", "a@b.com").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        // a different identity is not blocked
        let _other = locks.acquire("t1", "c@d.com").await;

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_prune_keeps_held_locks() {
        let locks = IdentityLocks::new();
        let held = locks.acquire("t1", "a@b.com").await;
        drop(locks.acquire("t1", "c@d.com").await);
        assert_eq!(locks.len(), 2);

        assert_eq!(locks.prune(), 1);
        assert_eq!(locks.len(), 1);

        drop(held);
        assert_eq!(locks.prune(), 1);
        assert!(locks.is_empty());
    }
}
