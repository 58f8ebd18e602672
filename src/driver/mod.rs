//! One exchange with a hosted agent, including handoffs and document output.
//!
//! [`ConversationDriver::drive`] appends the user's text to the thread, runs
//! the agent, waits for the run, and reads back the newest assistant reply.
//! A reply carrying a handoff marker (see [`crate::handoff`]) sends the
//! embedded question to the named agent on the same thread; that agent's
//! reply becomes the answer. A reply from the document agent to a "generate
//! integration flow" style request is saved as a `.docx` instead.

pub mod poll;

pub use poll::{wait_for_run, PollPolicy};

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::FerryConfig;
use crate::document::{format_flow, DocumentWriter, DEFAULT_TITLE};
use crate::error::{FerryError, Result};
use crate::handoff::{parse_reply, ReplyDirective};
use crate::roster::AgentRoster;
use crate::service::{AgentService, MessageStore, RunExecutor};
use crate::types::{reply_to, Agent, Role, Thread};
use crate::ui::{ChatMessage, ChatSink};

/// Phrases in the user's original message that ask for a flow document.
pub const DOCUMENT_TRIGGERS: [&str; 4] = [
    "generate integration flow",
    "create integration flow document",
    "integration flow doc",
    "integration flow documentation",
];

/// Tunables for [`ConversationDriver`].
#[derive(Debug, Clone, Builder)]
pub struct DriverOptions {
    #[builder(default = Duration::from_secs(1))]
    pub poll_interval: Duration,
    #[builder(default = Duration::from_secs(60))]
    pub run_timeout: Duration,
    /// Handoffs allowed per top-level message.
    #[builder(default = 1)]
    pub max_handoff_depth: usize,
    /// Agent whose replies may become documents. `None` disables documents.
    #[builder(into)]
    pub document_agent: Option<String>,
    #[builder(default = DOCUMENT_TRIGGERS.iter().map(|t| t.to_string()).collect())]
    pub document_triggers: Vec<String>,
    #[builder(default = DEFAULT_TITLE.to_string(), into)]
    pub document_title: String,
    #[builder(into)]
    pub document_dir: Option<PathBuf>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DriverOptions {
    pub fn from_config(config: &FerryConfig) -> Self {
        Self::builder()
            .poll_interval(config.run.poll_interval())
            .run_timeout(config.run.timeout())
            .max_handoff_depth(config.run.max_handoff_depth)
            .document_agent(config.agents.document_agent.clone())
            .document_title(config.documents.title.clone())
            .document_dir(config.documents.output_dir.clone())
            .build()
    }

    fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: self.poll_interval,
            timeout: self.run_timeout,
        }
    }

    /// Case-insensitive substring match against the trigger phrases.
    pub fn wants_document(&self, original_text: &str) -> bool {
        let lowered = original_text.to_lowercase();
        self.document_triggers
            .iter()
            .any(|t| lowered.contains(&t.to_lowercase()))
    }
}

/// What the exchange produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Reply text for direct display.
    Text { agent: String, text: String },
    /// Reply rendered into a flow document at `path`.
    Document { agent: String, path: PathBuf },
}

impl Reply {
    /// Name of the agent that produced the final answer.
    pub fn agent(&self) -> &str {
        match self {
            Self::Text { agent, .. } | Self::Document { agent, .. } => agent,
        }
    }
}

/// Per-message context shared by every hop of one exchange.
pub struct Turn<'a> {
    pub roster: &'a AgentRoster,
    pub thread: &'a Thread,
    /// The user's text as typed, before grounding. Document triggers look here.
    pub original_text: &'a str,
    pub sink: &'a dyn ChatSink,
    pub cancel: &'a CancellationToken,
}

/// Runs exchanges against the hosted agent service.
pub struct ConversationDriver {
    service: Arc<dyn AgentService>,
    options: DriverOptions,
}

impl ConversationDriver {
    pub fn new(service: Arc<dyn AgentService>, options: DriverOptions) -> Self {
        Self { service, options }
    }

    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    /// Send `user_text` to `agent` and follow handoffs to a final reply.
    ///
    /// Every hop appends a user message to the thread; nothing is rolled back
    /// on failure.
    pub async fn drive(&self, turn: &Turn<'_>, agent: &Agent, user_text: &str) -> Result<Reply> {
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(agent.name.clone());

        let mut current = agent.clone();
        let mut text = user_text.to_string();
        let mut handed_from: Option<String> = None;
        let mut depth = 0;

        loop {
            let reply = match self.ask(turn, &current, &text).await {
                Ok(reply) => reply,
                Err(FerryError::EmptyReply { agent }) => {
                    return Err(match handed_from {
                        Some(from) => FerryError::HandoffNotAnswered { from, target: agent },
                        None => FerryError::EmptyReply { agent },
                    })
                }
                Err(e) => return Err(e),
            };

            match parse_reply(&reply) {
                ReplyDirective::Plain(text) => {
                    return self.finish(turn, &current, handed_from.is_some(), text).await
                }
                ReplyDirective::Handoff { target, question } => {
                    let target = turn
                        .roster
                        .get(&target)
                        .map(|a| a.name.clone())
                        .unwrap_or(target);
                    if visited.contains(&target) {
                        return Err(FerryError::HandoffLoop(format!(
                            "`{}` handed off to `{target}`, which already took part in this exchange",
                            current.name
                        )));
                    }
                    if depth >= self.options.max_handoff_depth {
                        return Err(FerryError::HandoffLoop(format!(
                            "`{}` handed off to `{target}` beyond the limit of {} handoff(s)",
                            current.name, self.options.max_handoff_depth
                        )));
                    }
                    let next = turn.roster.get(&target).ok_or_else(|| {
                        FerryError::Routing(format!(
                            "`{}` handed off to `{target}`, which is not available",
                            current.name
                        ))
                    })?;

                    info!(from = %current.name, to = %target, "handoff");
                    turn.sink
                        .send(ChatMessage::notice(format!(
                            "`{}` is asking `{target}`...",
                            current.name
                        )))
                        .await;

                    visited.insert(target);
                    depth += 1;
                    handed_from = Some(current.name.clone());
                    current = next.clone();
                    text = question;
                }
            }
        }
    }

    /// Append, run, wait, and read back the newest assistant text after the prompt.
    async fn ask(&self, turn: &Turn<'_>, agent: &Agent, text: &str) -> Result<String> {
        let thread_id = turn.thread.id.as_str();
        let prompt = self
            .service
            .create_message(thread_id, Role::User, text)
            .await?;

        let run = self.service.create_run(thread_id, &agent.id).await?;
        debug!(agent = %agent.name, run_id = %run.id, "waiting for run");
        wait_for_run(
            self.service.as_ref(),
            run,
            &self.options.poll_policy(),
            turn.cancel,
        )
        .await?;

        let messages = self.service.list_messages(thread_id).await?;
        reply_to(&messages, &prompt.id)
            .and_then(|m| m.first_text())
            .map(str::to_string)
            .ok_or_else(|| FerryError::EmptyReply {
                agent: agent.name.clone(),
            })
    }

    /// Shape the final plain reply: a saved document or the text itself.
    ///
    /// Only the routed agent's own answer can become a document.
    async fn finish(
        &self,
        turn: &Turn<'_>,
        agent: &Agent,
        handed_off: bool,
        text: String,
    ) -> Result<Reply> {
        let is_document_agent = !handed_off
            && self.options.document_agent.as_deref() == Some(agent.name.as_str());
        let dir = match &self.options.document_dir {
            Some(dir) if is_document_agent && self.options.wants_document(turn.original_text) => {
                dir.clone()
            }
            _ => {
                return Ok(Reply::Text {
                    agent: agent.name.clone(),
                    text,
                })
            }
        };

        let document = format_flow(&self.options.document_title, &text);
        let writer = DocumentWriter::new(dir);
        let path = tokio::task::spawn_blocking(move || writer.save(&document))
            .await
            .map_err(|e| FerryError::Document(format!("document task failed: {e}")))??;

        Ok(Reply::Document {
            agent: agent.name.clone(),
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_match_the_stock_policy() {
        let options = DriverOptions::default();
        assert_eq!(options.poll_interval, Duration::from_secs(1));
        assert_eq!(options.run_timeout, Duration::from_secs(60));
        assert_eq!(options.max_handoff_depth, 1);
        assert_eq!(options.document_agent, None);
        assert_eq!(options.document_title, "Integration Flow");
    }

    #[test]
    fn document_triggers_are_case_insensitive_substrings() {
        let options = DriverOptions::default();
        assert!(options.wants_document("Please GENERATE INTEGRATION FLOW for the order sync"));
        assert!(options.wants_document("I need the integration flow documentation"));
        assert!(!options.wants_document("generate a flow for integration"));
    }

    #[test]
    fn from_config_enables_documents_for_the_document_agent() {
        let options = DriverOptions::from_config(&FerryConfig::default());
        assert_eq!(options.document_agent.as_deref(), Some("AIS Developer"));
        assert_eq!(options.document_dir, Some(PathBuf::from("generated_docs")));
    }
}
