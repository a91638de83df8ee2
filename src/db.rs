//! Database module for hanzi-helper
//!
//! Persists session records, catalog lessons and character details.

mod schema;

pub use schema::*;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Database lock poisoned")]
    Poisoned,
    #[error("Version conflict for {user_id}: expected {expected}")]
    VersionConflict { user_id: String, expected: i64 },
    #[error("Character not found: {0}")]
    CharacterNotFound(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        self.conn()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Session Operations ====================

    /// Load a user's session. Absent rows read as the default record at
    /// version 0, deleted ones as the default record at their last version.
    pub fn get_session(&self, user_id: &str) -> DbResult<StoredSession> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT record, version, updated_at FROM user_sessions WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((json, version, updated_at)) = row else {
            return Ok(StoredSession::absent());
        };

        let record = match json {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!(user_id, version, error = %e, "Undecodable session record, using default");
                Default::default()
            }),
            None => Default::default(),
        };

        Ok(StoredSession {
            record,
            version,
            updated_at: Some(parse_datetime(&updated_at)),
        })
    }

    /// Compare-and-swap write. Returns the new version.
    pub fn put_session(
        &self,
        user_id: &str,
        record: &crate::state_machine::SessionRecord,
        expected_version: i64,
    ) -> DbResult<i64> {
        let conn = self.conn()?;
        let json = serde_json::to_string(record)?;
        let now = Utc::now().to_rfc3339();
        let new_version = expected_version + 1;

        let changed = if expected_version == 0 {
            conn.execute(
                "INSERT INTO user_sessions (user_id, record, version, updated_at)
                 VALUES (?1, ?2, 1, ?3)
                 ON CONFLICT(user_id) DO NOTHING",
                params![user_id, json, now],
            )?
        } else {
            conn.execute(
                "UPDATE user_sessions SET record = ?2, version = ?3, updated_at = ?4
                 WHERE user_id = ?1 AND version = ?5",
                params![user_id, json, new_version, now, expected_version],
            )?
        };

        if changed == 0 {
            return Err(DbError::VersionConflict {
                user_id: user_id.to_string(),
                expected: expected_version,
            });
        }
        Ok(new_version)
    }

    /// Clear a user's session; deleting an absent or cleared row is a no-op.
    ///
    /// The row stays behind as a tombstone with a bumped version, so a writer
    /// holding the pre-delete version conflicts instead of overwriting.
    pub fn delete_session(&self, user_id: &str) -> DbResult<()> {
        self.conn()?.execute(
            "UPDATE user_sessions SET record = NULL, version = version + 1, updated_at = ?2
             WHERE user_id = ?1 AND record IS NOT NULL",
            params![user_id, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    // ==================== Lesson Operations ====================

    pub fn upsert_lesson(&self, id: &str, document: &Value) -> DbResult<()> {
        let publisher = document
            .get("publisher")
            .and_then(Value::as_str)
            .unwrap_or_default();
        self.conn()?.execute(
            "INSERT INTO lessons (id, publisher, document, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET publisher = ?2, document = ?3, updated_at = ?4",
            params![id, publisher, document.to_string(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Raw lesson documents of one publisher. Rows whose JSON no longer
    /// parses are logged and left out.
    pub fn lessons_for_publisher(&self, publisher: &str) -> DbResult<Vec<Value>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, document FROM lessons WHERE publisher = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![publisher], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, json) = row?;
            match serde_json::from_str(&json) {
                Ok(doc) => docs.push(doc),
                Err(e) => tracing::warn!(lesson_id = %id, error = %e, "Unparseable lesson row"),
            }
        }
        Ok(docs)
    }

    pub fn lesson_count(&self) -> DbResult<i64> {
        Ok(self
            .conn()?
            .query_row("SELECT COUNT(*) FROM lessons", [], |row| row.get(0))?)
    }

    // ==================== Character Operations ====================

    pub fn upsert_character(&self, info: &CharacterInfo) -> DbResult<()> {
        self.conn()?.execute(
            "INSERT INTO characters (character, info) VALUES (?1, ?2)
             ON CONFLICT(character) DO UPDATE SET info = ?2",
            params![info.character, serde_json::to_string(info)?],
        )?;
        Ok(())
    }

    pub fn get_character(&self, character: &str) -> DbResult<CharacterInfo> {
        let json: String = self
            .conn()?
            .query_row(
                "SELECT info FROM characters WHERE character = ?1",
                params![character],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| DbError::CharacterNotFound(character.to_string()))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Up to `limit` characters in random order
    pub fn random_characters(&self, limit: usize) -> DbResult<Vec<CharacterInfo>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT info FROM characters ORDER BY RANDOM() LIMIT ?1")?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], |row| row.get::<_, String>(0))?;

        let mut infos = Vec::new();
        for json in rows {
            infos.push(serde_json::from_str(&json?)?);
        }
        Ok(infos)
    }

    // ==================== Seeding ====================

    /// Upsert every lesson and character in a seed file
    pub fn import_catalog(&self, seed: &CatalogSeed) -> DbResult<ImportSummary> {
        for lesson in &seed.lessons {
            self.upsert_lesson(&lesson.id, &Value::Object(lesson.document.clone()))?;
        }
        for info in &seed.characters {
            self.upsert_character(info)?;
        }
        Ok(ImportSummary {
            lessons: seed.lessons.len(),
            characters: seed.characters.len(),
        })
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
