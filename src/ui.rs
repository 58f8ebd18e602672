//! Chat UI boundary: where notices, replies and attachments are shown.

use std::path::PathBuf;

use async_trait::async_trait;

/// Something to show in the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Agent name, or `None` for status notices from Ferry itself.
    pub author: Option<String>,
    pub content: String,
    /// Downloadable file shown with the message.
    pub attachment: Option<PathBuf>,
}

impl ChatMessage {
    pub fn notice(content: impl Into<String>) -> Self {
        Self {
            author: None,
            content: content.into(),
            attachment: None,
        }
    }

    pub fn from_agent(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author: Some(author.into()),
            content: content.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachment = Some(path.into());
        self
    }
}

/// One user's chat connection. Output only; nothing flows back into routing.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send(&self, message: ChatMessage);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait]
impl ChatSink for NullSink {
    async fn send(&self, _message: ChatMessage) {}
}
