//! Runtime for executing dialog effects
//!
//! Loads a user's session, runs the pure transition, and executes the
//! resulting effects against the session store and lesson catalog.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{DialogRuntime, MAX_ATTEMPTS};
pub use traits::*;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = DialogRuntime<DatabaseStorage, DatabaseStorage>;

/// Per-user async locks so one user's events are handled one at a time.
///
/// Entries are removed once nobody holds or waits on them.
#[derive(Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, user_id: &str) -> UserLockGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(user_id.to_string()).or_default())
        };
        let guard = lock.lock_owned().await;
        UserLockGuard {
            owner: self,
            user_id: user_id.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of users with a live lock entry
    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

pub struct UserLockGuard<'a> {
    owner: &'a UserLocks,
    user_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserLockGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self
            .owner
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.user_id);
        }
    }
}
