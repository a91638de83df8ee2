//! API request and response types

use crate::catalog::LearningProgress;
use crate::db::{CharacterInfo, StoredSession};
use crate::practice::QuestionKind;
use crate::reply::Reply;
use crate::state_machine::Event;
use serde::{Deserialize, Serialize};

// ============================================================
// Webhook
// ============================================================

/// Batch of channel events delivered to the webhook
#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    #[serde(default)]
    pub events: Vec<ChannelEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelEvent {
    /// A message; `text` is absent for stickers, images and the like
    Message {
        user_id: String,
        #[serde(default)]
        text: Option<String>,
    },
    Follow {
        user_id: String,
    },
    Unfollow {
        user_id: String,
    },
    #[serde(other)]
    Unsupported,
}

impl ChannelEvent {
    /// The sender and dialog event, or `None` for event types the bot ignores
    pub fn into_dialog_event(self) -> Option<(String, Event)> {
        match self {
            ChannelEvent::Message {
                user_id,
                text: Some(text),
            } => Some((user_id, Event::Utterance { text })),
            ChannelEvent::Message { user_id, text: None } => Some((user_id, Event::NonText)),
            ChannelEvent::Follow { user_id } => Some((user_id, Event::Follow)),
            ChannelEvent::Unfollow { user_id } => Some((user_id, Event::Unfollow)),
            ChannelEvent::Unsupported => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserReply {
    pub user_id: String,
    pub reply: Reply,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub replies: Vec<UserReply>,
}

// ============================================================
// Inspection and catalog
// ============================================================

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: String,
    #[serde(flatten)]
    pub session: StoredSession,
}

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    pub publisher: String,
    pub grade: u32,
    pub semester: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    #[serde(flatten)]
    pub progress: LearningProgress,
}

#[derive(Debug, Serialize)]
pub struct CharacterResponse {
    #[serde(flatten)]
    pub info: CharacterInfo,
    /// Titles of lessons that teach the character
    pub lessons: Vec<String>,
}

// ============================================================
// Practice
// ============================================================

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub kind: QuestionKind,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question_id: String,
    pub answer: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
