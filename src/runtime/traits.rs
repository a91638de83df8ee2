//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the dialog runtime with mock implementations.

use crate::db::{Database, DbError, StoredSession};
use crate::lexicon::Publisher;
use crate::state_machine::SessionRecord;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Another writer changed the record since it was loaded
    #[error("session version conflict")]
    Conflict,
    #[error("session store error: {0}")]
    Backend(String),
}

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::VersionConflict { .. } => StoreError::Conflict,
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Per-user session persistence with optimistic concurrency
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a record; absent users get the default record at version 0
    async fn load(&self, user_id: &str) -> Result<StoredSession, StoreError>;

    /// Write `record` if the stored version still equals `expected_version`.
    /// Returns the new version.
    async fn save(
        &self,
        user_id: &str,
        record: &SessionRecord,
        expected_version: i64,
    ) -> Result<i64, StoreError>;

    async fn delete(&self, user_id: &str) -> Result<(), StoreError>;
}

/// Read access to raw catalog lesson documents
#[async_trait]
pub trait LessonCatalog: Send + Sync {
    async fn lessons_for_publisher(&self, publisher: Publisher) -> Result<Vec<Value>, String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn load(&self, user_id: &str) -> Result<StoredSession, StoreError> {
        (**self).load(user_id).await
    }

    async fn save(
        &self,
        user_id: &str,
        record: &SessionRecord,
        expected_version: i64,
    ) -> Result<i64, StoreError> {
        (**self).save(user_id, record, expected_version).await
    }

    async fn delete(&self, user_id: &str) -> Result<(), StoreError> {
        (**self).delete(user_id).await
    }
}

#[async_trait]
impl<T: LessonCatalog + ?Sized> LessonCatalog for Arc<T> {
    async fn lessons_for_publisher(&self, publisher: Publisher) -> Result<Vec<Value>, String> {
        (**self).lessons_for_publisher(publisher).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use Database as session store and lesson catalog
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for DatabaseStorage {
    async fn load(&self, user_id: &str) -> Result<StoredSession, StoreError> {
        Ok(self.db.get_session(user_id)?)
    }

    async fn save(
        &self,
        user_id: &str,
        record: &SessionRecord,
        expected_version: i64,
    ) -> Result<i64, StoreError> {
        Ok(self.db.put_session(user_id, record, expected_version)?)
    }

    async fn delete(&self, user_id: &str) -> Result<(), StoreError> {
        Ok(self.db.delete_session(user_id)?)
    }
}

#[async_trait]
impl LessonCatalog for DatabaseStorage {
    async fn lessons_for_publisher(&self, publisher: Publisher) -> Result<Vec<Value>, String> {
        self.db
            .lessons_for_publisher(publisher.name())
            .map_err(|e| e.to_string())
    }
}
