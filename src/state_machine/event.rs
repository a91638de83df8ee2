//! Events delivered by the chat channel

/// One inbound channel event for a single user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A text message
    Utterance { text: String },
    /// A sticker, image or other non-text message
    NonText,
    /// The user added the bot
    Follow,
    /// The user blocked or removed the bot
    Unfollow,
}

impl Event {
    pub fn utterance(text: impl Into<String>) -> Self {
        Event::Utterance { text: text.into() }
    }
}
