//! Inline handoff markers in agent replies.
//!
//! An agent asks another agent for help by writing
//! `@handoff:<agent name>:<question>` anywhere in its reply. The agent name
//! runs up to the next colon; the question runs to the end of that line.

use std::sync::OnceLock;

use regex::Regex;

/// What a reply asks the driver to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyDirective {
    /// Show the reply as-is.
    Plain(String),
    /// Ask `target` the `question` on the same thread.
    Handoff { target: String, question: String },
}

fn handoff_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"@handoff:([^:\r\n]+):([^\r\n]+)").expect("handoff pattern is valid")
    })
}

/// Classify a reply. Only the first marker is honoured; a marker with a blank
/// target or question is treated as plain text.
pub fn parse_reply(text: &str) -> ReplyDirective {
    if let Some(caps) = handoff_pattern().captures(text) {
        let target = caps[1].trim();
        let question = caps[2].trim();
        if !target.is_empty() && !question.is_empty() {
            return ReplyDirective::Handoff {
                target: target.to_string(),
                question: question.to_string(),
            };
        }
    }
    ReplyDirective::Plain(text.to_string())
}
