//! Dialog runtime executor

use super::traits::{LessonCatalog, SessionStore, StoreError};
use super::UserLocks;

use crate::catalog;
use crate::db::StoredSession;
use crate::reply::{self, Reply};
use crate::state_machine::state::Coordinate;
use crate::state_machine::transition::TransitionResult;
use crate::state_machine::{transition, DialogContext, Effect, Event};

/// Read, transition, write attempts before giving up on a contended session
pub const MAX_ATTEMPTS: usize = 3;

/// Generic dialog runtime that can work with any store and catalog implementations
pub struct DialogRuntime<S, C>
where
    S: SessionStore,
    C: LessonCatalog,
{
    context: DialogContext,
    store: S,
    catalog: C,
    locks: UserLocks,
}

impl<S, C> DialogRuntime<S, C>
where
    S: SessionStore,
    C: LessonCatalog,
{
    pub fn new(context: DialogContext, store: S, catalog: C) -> Self {
        Self {
            context,
            store,
            catalog,
            locks: UserLocks::new(),
        }
    }

    /// Current stored session for a user
    pub async fn session(&self, user_id: &str) -> Result<StoredSession, StoreError> {
        self.store.load(user_id).await
    }

    /// Handle one channel event for one user and return the reply to send.
    ///
    /// Never fails: store errors become a transient-failure reply. Unfollow
    /// has no reply.
    pub async fn handle(&self, user_id: &str, event: Event) -> Option<Reply> {
        let _guard = self.locks.acquire(user_id).await;
        let wants_reply = event != Event::Unfollow;

        for attempt in 1..=MAX_ATTEMPTS {
            match self.attempt(user_id, event.clone()).await {
                Ok(answer) => return answer,
                Err(StoreError::Conflict) => {
                    tracing::debug!(user_id, attempt, "Session version conflict, retrying");
                }
                Err(StoreError::Backend(e)) => {
                    tracing::error!(user_id, error = %e, "Session store failure");
                    return wants_reply.then(reply::transient_failure);
                }
            }
        }

        tracing::warn!(user_id, attempts = MAX_ATTEMPTS, "Giving up on contended session");
        wants_reply.then(reply::transient_failure)
    }

    async fn attempt(&self, user_id: &str, event: Event) -> Result<Option<Reply>, StoreError> {
        let stored = self.store.load(user_id).await?;
        let TransitionResult {
            new_record,
            effects,
        } = transition(&stored.record, &self.context, event);

        let mut answer = None;
        for effect in effects {
            match effect {
                Effect::PersistSession => {
                    let version = self.store.save(user_id, &new_record, stored.version).await?;
                    tracing::debug!(user_id, version, step = new_record.step, "Session saved");
                }
                Effect::DeleteSession => {
                    self.store.delete(user_id).await?;
                    tracing::info!(user_id, "Session deleted");
                }
                Effect::Reply(reply) => answer = Some(reply),
                Effect::RunCumulativeQuery { coordinate, phrase } => {
                    answer = Some(self.run_query(user_id, &coordinate, &phrase).await);
                }
            }
        }
        Ok(answer)
    }

    /// Resolve a query phrase. Catalog failures reply with an error and
    /// leave the session where it is.
    async fn run_query(&self, user_id: &str, coordinate: &Coordinate, phrase: &str) -> Reply {
        match self.catalog.lessons_for_publisher(coordinate.publisher).await {
            Ok(docs) => {
                let set = catalog::aggregate(&docs, coordinate);
                let outcome = catalog::partition(phrase, &set);
                tracing::info!(
                    user_id,
                    learned = outcome.learned.len(),
                    total = outcome.total(),
                    "Cumulative query answered"
                );
                reply::query_result(&outcome)
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "Lesson catalog read failed");
                reply::query_failed()
            }
        }
    }
}
