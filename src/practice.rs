//! Character practice questions
//!
//! Questions are generated from random catalog characters and cached by id
//! until answered or expired.

use crate::db::{CharacterInfo, Database};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;

pub const DEFAULT_QUESTION_TTL: Duration = Duration::from_secs(60 * 60);

const OPTION_COUNT: usize = 4;
/// Characters drawn per question; extras supply phonetic distractors
const DRAW_SIZE: usize = 8;
/// Largest offset from the true stroke count used for distractors
const STROKE_SPREAD: u32 = 3;
const FALLBACK_PHONETICS: [&str; 5] = ["ㄅㄚ", "ㄆㄧ", "ㄇㄛ", "ㄈㄟ", "ㄉㄨ"];

#[derive(Debug, Error)]
pub enum PracticeError {
    #[error("no characters available for a {0} question")]
    NoCharacters(QuestionKind),
    #[error("character source error: {0}")]
    Source(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Phonetic,
    Stroke,
    Sentence,
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            QuestionKind::Phonetic => "phonetic",
            QuestionKind::Stroke => "stroke",
            QuestionKind::Sentence => "sentence",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: String,
    pub kind: QuestionKind,
    pub character: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Index of the right option, as text; empty for sentence questions
    #[serde(skip)]
    pub correct_answer: String,
    #[serde(skip)]
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub correct: bool,
    pub explanation: String,
}

impl Verdict {
    fn expired() -> Self {
        Self {
            correct: false,
            explanation: "問題已過期，請重新開始練習".to_string(),
        }
    }
}

/// Source of random characters for question generation
#[async_trait]
pub trait CharacterSource: Send + Sync {
    async fn random_characters(&self, limit: usize) -> Result<Vec<CharacterInfo>, String>;
}

#[async_trait]
impl CharacterSource for Database {
    async fn random_characters(&self, limit: usize) -> Result<Vec<CharacterInfo>, String> {
        Database::random_characters(self, limit).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl<T: CharacterSource + ?Sized> CharacterSource for Arc<T> {
    async fn random_characters(&self, limit: usize) -> Result<Vec<CharacterInfo>, String> {
        (**self).random_characters(limit).await
    }
}

struct CachedQuestion {
    question: Question,
    created: Instant,
}

pub struct PracticeService<S: CharacterSource> {
    source: S,
    ttl: Duration,
    cache: Mutex<HashMap<String, CachedQuestion>>,
}

impl<S: CharacterSource> PracticeService<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, CachedQuestion>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Generate and cache a question of the given kind
    pub async fn generate(&self, kind: QuestionKind) -> Result<Question, PracticeError> {
        let drawn = self
            .source
            .random_characters(DRAW_SIZE)
            .await
            .map_err(PracticeError::Source)?;

        let question = match kind {
            QuestionKind::Phonetic => phonetic_question(&drawn),
            QuestionKind::Stroke => stroke_question(&drawn),
            QuestionKind::Sentence => drawn.first().map(sentence_question),
        }
        .ok_or(PracticeError::NoCharacters(kind))?;

        tracing::debug!(question_id = %question.id, %kind, character = %question.character, "Generated practice question");
        self.cache().insert(
            question.id.clone(),
            CachedQuestion {
                question: question.clone(),
                created: Instant::now(),
            },
        );
        Ok(question)
    }

    /// Judge an answer. Unknown or expired ids get an expired verdict.
    pub fn check_answer(&self, question_id: &str, answer: &str) -> Verdict {
        let cache = self.cache();
        let Some(cached) = cache.get(question_id) else {
            return Verdict::expired();
        };
        if cached.created.elapsed() >= self.ttl {
            return Verdict::expired();
        }

        let question = &cached.question;
        match question.kind {
            QuestionKind::Phonetic | QuestionKind::Stroke => Verdict {
                correct: answer.trim() == question.correct_answer,
                explanation: question.explanation.clone(),
            },
            QuestionKind::Sentence => {
                if answer.contains(question.character.as_str()) {
                    Verdict {
                        correct: true,
                        explanation: format!("很棒的句子！你成功使用了「{}」這個字。", question.character),
                    }
                } else {
                    Verdict {
                        correct: false,
                        explanation: format!("請確保句子中包含「{}」這個字。", question.character),
                    }
                }
            }
        }
    }

    /// Drop questions older than the TTL; returns how many were removed
    pub fn sweep_expired(&self) -> usize {
        let mut cache = self.cache();
        let before = cache.len();
        cache.retain(|_, cached| cached.created.elapsed() < self.ttl);
        let removed = before - cache.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = cache.len(), "Swept expired practice questions");
        }
        removed
    }

    #[cfg(test)]
    fn cached_count(&self) -> usize {
        self.cache().len()
    }
}

// ============================================================
// Question builders
// ============================================================

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Shuffle `options` and return them with the index of `correct`
fn shuffled(mut options: Vec<String>, correct: &str) -> (Vec<String>, String) {
    options.shuffle(&mut rand::thread_rng());
    let index = options.iter().position(|o| o == correct).unwrap_or_default();
    (options, index.to_string())
}

fn phonetic_question(drawn: &[CharacterInfo]) -> Option<Question> {
    let target = drawn.iter().find(|c| !c.phonetic.is_empty())?;

    let mut options = vec![target.phonetic.clone()];
    let distractors = drawn
        .iter()
        .map(|c| c.phonetic.as_str())
        .chain(FALLBACK_PHONETICS);
    for candidate in distractors {
        if options.len() == OPTION_COUNT {
            break;
        }
        if !candidate.is_empty() && !options.iter().any(|o| o == candidate) {
            options.push(candidate.to_string());
        }
    }

    let (options, correct_answer) = shuffled(options, &target.phonetic);
    Some(Question {
        id: new_id(),
        kind: QuestionKind::Phonetic,
        character: target.character.clone(),
        prompt: format!("請選擇「{}」的正確注音：", target.character),
        options,
        correct_answer,
        explanation: format!("「{}」的注音是「{}」", target.character, target.phonetic),
    })
}

fn stroke_question(drawn: &[CharacterInfo]) -> Option<Question> {
    let target = drawn.iter().find(|c| c.stroke_count > 0)?;
    let strokes = target.stroke_count;

    let mut counts = vec![strokes];
    for offset in 1..=STROKE_SPREAD {
        if counts.len() < OPTION_COUNT && strokes > offset {
            counts.push(strokes - offset);
        }
        if counts.len() < OPTION_COUNT {
            counts.push(strokes + offset);
        }
    }

    let options = counts.iter().map(u32::to_string).collect();
    let (options, correct_answer) = shuffled(options, &strokes.to_string());
    Some(Question {
        id: new_id(),
        kind: QuestionKind::Stroke,
        character: target.character.clone(),
        prompt: format!("請選擇「{}」的筆畫數：", target.character),
        options,
        correct_answer,
        explanation: format!("「{}」的筆畫數是 {} 畫", target.character, strokes),
    })
}

fn sentence_question(target: &CharacterInfo) -> Question {
    Question {
        id: new_id(),
        kind: QuestionKind::Sentence,
        character: target.character.clone(),
        prompt: format!("請用「{}」造句：", target.character),
        options: Vec::new(),
        correct_answer: String::new(),
        explanation: String::new(),
    }
}
