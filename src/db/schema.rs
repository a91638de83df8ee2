//! Database schema and types

use crate::state_machine::SessionRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS user_sessions (
    user_id TEXT PRIMARY KEY,
    -- NULL once deleted; the row keeps the version counter
    record TEXT,
    version INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lessons (
    id TEXT PRIMARY KEY,
    publisher TEXT NOT NULL,
    document TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_lessons_publisher ON lessons(publisher);

CREATE TABLE IF NOT EXISTS characters (
    character TEXT PRIMARY KEY,
    info TEXT NOT NULL
);
";

/// A session record with its compare-and-swap version.
///
/// Version 0 means no row exists yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredSession {
    pub record: SessionRecord,
    pub version: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoredSession {
    pub fn absent() -> Self {
        Self {
            record: SessionRecord::default(),
            version: 0,
            updated_at: None,
        }
    }
}

/// Reference details for one character
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterInfo {
    pub character: String,
    /// Zhuyin reading
    #[serde(default)]
    pub phonetic: String,
    #[serde(default)]
    pub stroke_count: u32,
    #[serde(default)]
    pub radical: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// A catalog lesson as it appears in a seed file: an id plus the raw document
#[derive(Debug, Clone, Deserialize)]
pub struct SeedLesson {
    pub id: String,
    #[serde(flatten)]
    pub document: serde_json::Map<String, Value>,
}

/// Startup catalog import file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub lessons: Vec<SeedLesson>,
    #[serde(default)]
    pub characters: Vec<CharacterInfo>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub lessons: usize,
    pub characters: usize,
}
