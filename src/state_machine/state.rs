//! Session record and dialog state types

use crate::lexicon::Publisher;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Mode
// ============================================================================

/// Whether the dialog engine is inside the cumulative-query wizard.
///
/// Stored as a plain string: `""` for idle, `"cumulative_query"` otherwise.
/// Unrecognised strings read back as idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mode {
    #[default]
    Idle,
    CumulativeQuery,
}

impl From<String> for Mode {
    fn from(value: String) -> Self {
        if value == "cumulative_query" {
            Mode::CumulativeQuery
        } else {
            Mode::Idle
        }
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Idle => String::new(),
            Mode::CumulativeQuery => "cumulative_query".to_string(),
        }
    }
}

// ============================================================================
// Step
// ============================================================================

/// Wizard position, decoded from the persisted integer tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Remembered preferences found; reuse, edit lesson, or start over
    ConfirmPreferences,
    AwaitingPublisher,
    AwaitingGrade,
    AwaitingSemester,
    AwaitingLesson,
    /// Coordinate fixed; every phrase is a query until exit
    Querying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown step tag {0}")]
pub struct UnknownStep(pub i64);

impl Step {
    pub fn tag(self) -> i64 {
        match self {
            Step::ConfirmPreferences => -1,
            Step::AwaitingPublisher => 0,
            Step::AwaitingGrade => 1,
            Step::AwaitingSemester => 2,
            Step::AwaitingLesson => 3,
            Step::Querying => 4,
        }
    }
}

impl TryFrom<i64> for Step {
    type Error = UnknownStep;

    fn try_from(tag: i64) -> Result<Self, Self::Error> {
        match tag {
            -1 => Ok(Step::ConfirmPreferences),
            0 => Ok(Step::AwaitingPublisher),
            1 => Ok(Step::AwaitingGrade),
            2 => Ok(Step::AwaitingSemester),
            3 => Ok(Step::AwaitingLesson),
            4 => Ok(Step::Querying),
            other => Err(UnknownStep(other)),
        }
    }
}

// ============================================================================
// Session Record
// ============================================================================

/// Per-user dialog state, persisted as one flat document.
///
/// Only primitive fields, all defaulted, so a legacy document missing newer
/// fields still decodes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRecord {
    pub mode: Mode,
    pub step: i64,
    pub publisher: String,
    pub grade: u32,
    pub semester: u32,
    pub lesson: u32,
    pub preferred_publisher: String,
    pub preferred_grade: u32,
    pub preferred_semester: u32,
}

impl SessionRecord {
    /// Decoded step; meaningful only in cumulative-query mode
    pub fn step(&self) -> Result<Step, UnknownStep> {
        Step::try_from(self.step)
    }

    pub fn in_query(&self) -> bool {
        self.mode == Mode::CumulativeQuery
    }

    pub fn preferences(&self) -> Option<Preferences> {
        let publisher = Publisher::from_name(&self.preferred_publisher)?;
        if self.preferred_grade == 0 || self.preferred_semester == 0 {
            return None;
        }
        Some(Preferences {
            publisher,
            grade: self.preferred_grade,
            semester: self.preferred_semester,
        })
    }

    pub fn has_any_preference(&self) -> bool {
        !self.preferred_publisher.is_empty()
            || self.preferred_grade > 0
            || self.preferred_semester > 0
    }

    /// Working publisher, grade and semester, if all three decode
    pub fn working_preferences(&self) -> Option<Preferences> {
        let publisher = Publisher::from_name(&self.publisher)?;
        if self.grade == 0 || self.semester == 0 {
            return None;
        }
        Some(Preferences {
            publisher,
            grade: self.grade,
            semester: self.semester,
        })
    }

    /// Fully decoded working coordinate, if every field is set
    pub fn coordinate(&self) -> Option<Coordinate> {
        let publisher = Publisher::from_name(&self.publisher)?;
        if self.grade == 0 || self.semester == 0 || self.lesson == 0 {
            return None;
        }
        Some(Coordinate {
            publisher,
            grade: self.grade,
            semester: self.semester,
            lesson: self.lesson,
        })
    }

    /// Drop the in-progress query, keeping remembered preferences
    pub fn exited(&self) -> Self {
        Self {
            mode: Mode::Idle,
            step: 0,
            publisher: String::new(),
            grade: 0,
            semester: 0,
            lesson: 0,
            ..self.clone()
        }
    }

    pub fn clear_working(&mut self) {
        self.publisher.clear();
        self.grade = 0;
        self.semester = 0;
        self.lesson = 0;
    }

    /// Write the remembered triple as one group from the working fields
    pub fn remember_working(&mut self) {
        self.preferred_publisher.clone_from(&self.publisher);
        self.preferred_grade = self.grade;
        self.preferred_semester = self.semester;
    }

    pub fn forget_preferences(&mut self) {
        self.preferred_publisher.clear();
        self.preferred_grade = 0;
        self.preferred_semester = 0;
    }

    pub fn set_step(&mut self, step: Step) {
        self.step = step.tag();
    }
}

// ============================================================================
// Coordinate and Preferences
// ============================================================================

/// A point in the curriculum ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinate {
    pub publisher: Publisher,
    pub grade: u32,
    pub semester: u32,
    pub lesson: u32,
}

/// Remembered (publisher, grade, semester) defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    pub publisher: Publisher,
    pub grade: u32,
    pub semester: u32,
}

// ============================================================================
// Dialog Context
// ============================================================================

/// Default upper bound on query phrase length, in code points
pub const DEFAULT_MAX_QUERY_CHARS: usize = 10;

/// Immutable configuration for the dialog engine
#[derive(Debug, Clone)]
pub struct DialogContext {
    pub worksheet_url: String,
    pub tablet_practice_url: String,
    pub max_query_chars: usize,
}

impl Default for DialogContext {
    fn default() -> Self {
        Self {
            worksheet_url: "https://hanziplay.com/practice-sheet".to_string(),
            tablet_practice_url: "https://hanziplay.com/characters/practice".to_string(),
            max_query_chars: DEFAULT_MAX_QUERY_CHARS,
        }
    }
}
