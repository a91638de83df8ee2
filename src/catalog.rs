//! Lesson catalog decoding and cumulative character aggregation
//!
//! Catalog documents are loosely typed JSON. Decoding is explicit: a lesson
//! without a usable coordinate is skipped, and so is any malformed entry in
//! its `characters` list. Skips are counted and logged, never fatal.

use crate::lexicon::{self, Publisher};
use crate::state_machine::state::Coordinate;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

/// A decoded catalog lesson
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    pub publisher: String,
    pub grade: u32,
    pub semester: u32,
    pub number: u32,
    pub title: Option<String>,
    pub unit: Option<String>,
    pub characters: Vec<String>,
}

/// Why a catalog document was not usable as a lesson
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotAnObject,
    MissingField(&'static str),
}

/// A lesson plus the number of character entries dropped while decoding it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLesson {
    pub lesson: Lesson,
    pub skipped_entries: usize,
}

fn int_field(doc: &serde_json::Map<String, Value>, key: &'static str) -> Result<u32, SkipReason> {
    doc.get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(SkipReason::MissingField(key))
}

fn string_field(doc: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    doc.get(key).and_then(Value::as_str).map(String::from)
}

/// A character entry is either a bare string or an object with `character`
fn character_entry(entry: &Value) -> Option<String> {
    match entry {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("character").and_then(Value::as_str).map(String::from),
        _ => None,
    }
}

/// Decode one catalog document
pub fn decode_lesson(doc: &Value) -> Result<DecodedLesson, SkipReason> {
    let Value::Object(map) = doc else {
        return Err(SkipReason::NotAnObject);
    };

    let publisher = string_field(map, "publisher").ok_or(SkipReason::MissingField("publisher"))?;
    let grade = int_field(map, "grade")?;
    let semester = int_field(map, "semester")?;
    let number = int_field(map, "lesson")?;

    let entries = map
        .get("characters")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let characters: Vec<String> = entries.iter().filter_map(character_entry).collect();
    let skipped_entries = entries.len() - characters.len();

    Ok(DecodedLesson {
        lesson: Lesson {
            publisher,
            grade,
            semester,
            number,
            title: string_field(map, "title"),
            unit: string_field(map, "unit"),
            characters,
        },
        skipped_entries,
    })
}

// ============================================================
// Ordering
// ============================================================

impl Lesson {
    /// Included in the cumulative set for `target`: same publisher and at or
    /// before it in (grade, semester, lesson) order, the target lesson itself
    /// counting
    pub fn is_at_or_before(&self, target: &Coordinate) -> bool {
        self.publisher == target.publisher.name()
            && (self.grade, self.semester, self.number)
                <= (target.grade, target.semester, target.lesson)
    }
}

// ============================================================
// Aggregation
// ============================================================

/// Cumulative character set plus decode bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CumulativeSet {
    pub characters: HashSet<String>,
    pub lessons_included: usize,
    pub lessons_skipped: usize,
    pub entries_skipped: usize,
}

impl CumulativeSet {
    pub fn contains(&self, c: char) -> bool {
        let mut buf = [0u8; 4];
        self.characters.contains(&*c.encode_utf8(&mut buf))
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }
}

/// Every character taught at or before `target`, from the given catalog docs
pub fn aggregate(docs: &[Value], target: &Coordinate) -> CumulativeSet {
    let mut set = CumulativeSet::default();

    for doc in docs {
        match decode_lesson(doc) {
            Ok(decoded) => {
                if !decoded.lesson.is_at_or_before(target) {
                    continue;
                }
                set.lessons_included += 1;
                set.entries_skipped += decoded.skipped_entries;
                set.characters.extend(decoded.lesson.characters);
            }
            Err(reason) => {
                set.lessons_skipped += 1;
                tracing::warn!(?reason, "Skipping malformed catalog lesson");
            }
        }
    }

    if set.entries_skipped > 0 {
        tracing::warn!(
            entries_skipped = set.entries_skipped,
            "Skipped malformed character entries"
        );
    }
    tracing::debug!(
        publisher = %target.publisher,
        grade = target.grade,
        semester = target.semester,
        lesson = target.lesson,
        lessons_included = set.lessons_included,
        lessons_skipped = set.lessons_skipped,
        characters = set.len(),
        "Aggregated cumulative set"
    );
    set
}

// ============================================================
// Query resolution
// ============================================================

/// Split of a query phrase's ideographs into learned and not learned.
///
/// Phrase order is kept inside each side and duplicates are not collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryOutcome {
    pub learned: Vec<char>,
    pub not_learned: Vec<char>,
}

impl QueryOutcome {
    pub fn total(&self) -> usize {
        self.learned.len() + self.not_learned.len()
    }
}

pub fn partition(phrase: &str, set: &CumulativeSet) -> QueryOutcome {
    let (learned, not_learned) = lexicon::ideographs(phrase)
        .into_iter()
        .partition(|c| set.contains(*c));
    QueryOutcome {
        learned,
        not_learned,
    }
}

// ============================================================
// Learning progress
// ============================================================

#[derive(Debug, Clone, Serialize)]
pub struct LessonSummary {
    pub semester: u32,
    pub lesson: u32,
    pub title: Option<String>,
    pub unit: Option<String>,
    pub character_count: usize,
}

/// Lessons of one grade (optionally one semester) with character totals
#[derive(Debug, Clone, Serialize)]
pub struct LearningProgress {
    pub publisher: Publisher,
    pub grade: u32,
    pub semester: Option<u32>,
    pub lessons: Vec<LessonSummary>,
    pub total_lessons: usize,
    /// Unique characters across the listed lessons
    pub total_characters: usize,
    /// Unique characters taught up to the end of this grade/semester
    pub cumulative_characters: usize,
}

pub fn learning_progress(
    docs: &[Value],
    publisher: Publisher,
    grade: u32,
    semester: Option<u32>,
) -> LearningProgress {
    let mut lessons: Vec<Lesson> = docs
        .iter()
        .filter_map(|doc| decode_lesson(doc).ok())
        .map(|decoded| decoded.lesson)
        .filter(|l| {
            l.publisher == publisher.name()
                && l.grade == grade
                && semester.is_none_or(|s| l.semester == s)
        })
        .collect();
    lessons.sort_by_key(|l| (l.semester, l.number));

    let unique: HashSet<&str> = lessons
        .iter()
        .flat_map(|l| l.characters.iter().map(String::as_str))
        .collect();

    let end_of_range = Coordinate {
        publisher,
        grade,
        semester: semester.unwrap_or(2),
        lesson: u32::MAX,
    };
    let cumulative_characters = aggregate(docs, &end_of_range).len();

    LearningProgress {
        publisher,
        grade,
        semester,
        total_lessons: lessons.len(),
        total_characters: unique.len(),
        cumulative_characters,
        lessons: lessons
            .into_iter()
            .map(|l| LessonSummary {
                semester: l.semester,
                lesson: l.number,
                character_count: l.characters.len(),
                title: l.title,
                unit: l.unit,
            })
            .collect(),
    }
}

/// Titles of lessons teaching `character`, at most `limit`
pub fn lessons_teaching(docs: &[Value], character: &str, limit: usize) -> Vec<String> {
    docs.iter()
        .filter_map(|doc| decode_lesson(doc).ok())
        .filter(|d| d.lesson.characters.iter().any(|c| c == character))
        .filter_map(|d| d.lesson.title)
        .take(limit)
        .collect()
}
