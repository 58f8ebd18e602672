//! Thread message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Author of a thread message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Wrapped text payload of a content block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextValue {
    pub value: String,
}

/// One content block of a message. Non-text blocks are kept but carry no payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextValue },
    #[serde(other)]
    Other,
}

impl MessageContent {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            text: TextValue {
                value: value.into(),
            },
        }
    }
}

/// A message stored on a remote thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub content: Vec<MessageContent>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

impl ThreadMessage {
    /// Create a single-text-block message.
    pub fn with_text(
        id: impl Into<String>,
        role: Role,
        text: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            role,
            content: vec![MessageContent::text(text)],
            created_at,
        }
    }

    /// Value of the first `text` content block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            MessageContent::Text { text } => Some(text.value.as_str()),
            MessageContent::Other => None,
        })
    }
}

/// Newest assistant message created after the message `prompt_id`.
///
/// Messages are ordered ascending by `created_at` (stable, so ties keep the
/// store's order). Earlier assistant messages answer earlier prompts and are
/// ignored. When the prompt is not among `messages` the whole list counts.
pub fn reply_to<'a>(messages: &'a [ThreadMessage], prompt_id: &str) -> Option<&'a ThreadMessage> {
    let mut ordered: Vec<&ThreadMessage> = messages.iter().collect();
    ordered.sort_by_key(|m| m.created_at);
    let start = ordered
        .iter()
        .position(|m| m.id == prompt_id)
        .map_or(0, |i| i + 1);
    ordered[start..]
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
        .copied()
}
