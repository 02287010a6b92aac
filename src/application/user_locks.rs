//! Per-user async locks.
//!
//! Serialises billing workflows for the same user within this process.
//! Cross-process safety comes from idempotency keys and conditional writes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;

use crate::domain::foundation::UserId;

/// Registry of one async mutex per user.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access for `user_id`.
    ///
    /// The lock is released when the returned guard is dropped.
    pub async fn acquire(&self, user_id: &UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop entries nobody holds so the map stays bounded by active users
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            Arc::clone(locks.entry(user_id.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of users with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn same_user_waits_for_release() {
        let locks = Arc::new(UserLocks::new());
        let guard = locks.acquire(&user("a")).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _g = locks.acquire(&user("a")).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_users_do_not_block() {
        let locks = UserLocks::new();
        let _a = locks.acquire(&user("a")).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire(&user("b"))).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn released_entries_are_pruned() {
        let locks = UserLocks::new();
        drop(locks.acquire(&user("a")).await);
        drop(locks.acquire(&user("b")).await);
        assert_eq!(locks.len(), 1);
    }
}
