//! Lexical classifiers for user utterances
//!
//! Pure functions that turn raw reply text into typed tokens. All lookups are
//! closed tables: anything outside them fails to parse.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static HAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\p{Han}").expect("valid Han regex"));

/// Curriculum publishers known to the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Publisher {
    #[serde(rename = "康軒")]
    KangHsuan,
    #[serde(rename = "南一")]
    NanI,
    #[serde(rename = "翰林")]
    HanLin,
}

impl Publisher {
    /// Display order used for quick-reply options
    pub const ALL: [Publisher; 3] = [Publisher::KangHsuan, Publisher::NanI, Publisher::HanLin];

    /// The name users type (and the catalog stores)
    pub fn name(self) -> &'static str {
        match self {
            Publisher::KangHsuan => "康軒",
            Publisher::NanI => "南一",
            Publisher::HanLin => "翰林",
        }
    }

    /// URL parameter used by the worksheet site
    pub fn slug(self) -> &'static str {
        match self {
            Publisher::KangHsuan => "kang-hsuan",
            Publisher::NanI => "nan-i",
            Publisher::HanLin => "han-lin",
        }
    }

    pub fn from_name(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == text)
    }

    /// Accepts either the display name or the slug
    pub fn lookup(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == text || p.slug() == text)
    }
}

impl std::fmt::Display for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub const MIN_GRADE: u32 = 1;
pub const MAX_GRADE: u32 = 6;

/// Grade 1-6 from an Arabic digit or the matching CJK numeral, with an
/// optional `年級` suffix
pub fn parse_grade(text: &str) -> Option<u32> {
    match text.strip_suffix("年級").unwrap_or(text) {
        "1" | "一" => Some(1),
        "2" | "二" => Some(2),
        "3" | "三" => Some(3),
        "4" | "四" => Some(4),
        "5" | "五" => Some(5),
        "6" | "六" => Some(6),
        _ => None,
    }
}

/// Semester 1 (上) or 2 (下)
pub fn parse_semester(text: &str) -> Option<u32> {
    match text {
        "1" | "上" | "上學期" => Some(1),
        "2" | "下" | "下學期" => Some(2),
        _ => None,
    }
}

pub fn semester_label(semester: u32) -> &'static str {
    if semester == 2 {
        "下學期"
    } else {
        "上學期"
    }
}

/// Lesson number from the leading digit run of the text.
///
/// `"5"` and `"5課"` both give 5; zero, negatives and text that does not
/// start with a digit are rejected.
pub fn parse_lesson(text: &str) -> Option<u32> {
    let unsigned = text.strip_prefix('+').unwrap_or(text);
    let digits: String = unsigned.chars().take_while(char::is_ascii_digit).collect();
    match digits.parse::<u32>() {
        Ok(n) if n > 0 => Some(n),
        _ => None,
    }
}

pub fn is_ideograph(c: char) -> bool {
    let mut buf = [0u8; 4];
    HAN.is_match(c.encode_utf8(&mut buf))
}

/// Han-script code points of `text`, in order, duplicates kept
pub fn ideographs(text: &str) -> Vec<char> {
    text.chars().filter(|c| is_ideograph(*c)).collect()
}

/// Whether `text` is acceptable as a step-4 query phrase
pub fn is_query_phrase(text: &str, max_chars: usize) -> bool {
    HAN.is_match(text) && text.chars().count() <= max_chars
}
