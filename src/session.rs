//! A chat session: one roster, one thread, one message at a time.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::driver::{ConversationDriver, DriverOptions, Reply, Turn};
use crate::error::{ErrorKind, FerryError, Result};
use crate::grounding::Grounding;
use crate::roster::AgentRoster;
use crate::router::Router;
use crate::service::{AgentService, ThreadStore};
use crate::types::{Agent, Thread};
use crate::ui::{ChatMessage, ChatSink};

/// Shown instead of starting a session when none of the agents exist.
pub const NO_AGENTS_MESSAGE: &str = "No agents found. Please check your agent service setup.";

/// Shown when a run finished without an assistant text reply.
pub const NO_REPLY_MESSAGE: &str = "No reply found from the agent.";

/// A file the user attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputAttachment {
    pub mime: String,
    pub path: PathBuf,
}

/// What the user sent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserInput {
    pub text: String,
    pub attachments: Vec<InputAttachment>,
}

impl UserInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, mime: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.attachments.push(InputAttachment {
            mime: mime.into(),
            path: path.into(),
        });
        self
    }

    /// Text submitted to the agent: the message plus one line per uploaded image.
    pub fn submission_text(&self) -> String {
        let mut text = self.text.clone();
        for attachment in self.attachments.iter().filter(|a| a.mime.starts_with("image/")) {
            text.push_str(&format!("\n[uploaded image] {}", attachment.path.display()));
        }
        text
    }
}

/// Final outcome of one user message, ready to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Reply { agent: String, text: String },
    Attachment { agent: String, path: PathBuf },
    /// No agent could be chosen; the text lists what the router understands.
    Help(String),
    Failure { kind: ErrorKind, message: String },
}

impl Response {
    /// Error kind for anything other than a successful reply.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Reply { .. } | Self::Attachment { .. } => None,
            Self::Help(_) => Some(ErrorKind::RoutingFailure),
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn to_chat_message(&self) -> ChatMessage {
        match self {
            Self::Reply { agent, text } => ChatMessage::from_agent(agent, text),
            Self::Attachment { agent, path } => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                ChatMessage::from_agent(agent, format!("Integration flow document ready: {name}"))
                    .with_attachment(path)
            }
            Self::Help(text) => ChatMessage::notice(text),
            Self::Failure { message, .. } => ChatMessage::notice(message),
        }
    }

    fn routing_failure(error: &FerryError) -> Self {
        let message = match error {
            FerryError::Routing(_) => error.to_string(),
            other => format!("Could not route message: {other}"),
        };
        Self::Failure {
            kind: error.kind(),
            message,
        }
    }

    fn from_error(error: &FerryError, agent: &Agent) -> Self {
        let kind = error.kind();
        let message = match (kind, error) {
            (ErrorKind::EmptyReply, _) => NO_REPLY_MESSAGE.to_string(),
            (_, FerryError::RunTimedOut { timeout_ms, .. }) => format!(
                "`{}` did not finish within {}.",
                agent.name,
                seconds(*timeout_ms)
            ),
            (ErrorKind::RemoteCallFailure | ErrorKind::RunFailed, _) => {
                format!("Error running `{}`: {error}", agent.name)
            }
            _ => format!("{error}."),
        };
        Self::Failure { kind, message }
    }
}

/// `60s`, `1.5s`, `0.25s`.
fn seconds(ms: u64) -> String {
    if ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else {
        let text = format!("{:.3}", ms as f64 / 1000.0);
        format!("{}s", text.trim_end_matches('0'))
    }
}

/// One user's conversation with the agent roster.
pub struct Session {
    service: Arc<dyn AgentService>,
    router: Arc<dyn Router>,
    driver: ConversationDriver,
    grounding: Option<Grounding>,
    roster: AgentRoster,
    thread: Thread,
    turn_lock: Mutex<()>,
    cancel: CancellationToken,
}

impl Session {
    /// Resolve `agent_names` and create the session's thread.
    ///
    /// Fails with a configuration error when none of the agents exist, before
    /// any thread is created.
    pub async fn start(
        service: Arc<dyn AgentService>,
        router: Arc<dyn Router>,
        options: DriverOptions,
        agent_names: &[String],
        grounding: Option<Grounding>,
    ) -> Result<Self> {
        let roster = AgentRoster::resolve(service.as_ref(), agent_names).await?;
        if roster.is_empty() {
            return Err(FerryError::Configuration(NO_AGENTS_MESSAGE.into()));
        }
        let thread = service.create_thread().await?;
        info!(thread_id = %thread.id, agents = roster.len(), "session started");

        Ok(Self {
            driver: ConversationDriver::new(service.clone(), options),
            service,
            router,
            grounding,
            roster,
            thread,
            turn_lock: Mutex::new(()),
            cancel: CancellationToken::new(),
        })
    }

    pub fn roster(&self) -> &AgentRoster {
        &self.roster
    }

    pub fn thread(&self) -> &Thread {
        &self.thread
    }

    /// Cancelling this token aborts any run wait in progress.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Route, ground, drive and shape one message. Never fails: every problem
    /// becomes a [`Response`] for the user.
    ///
    /// Concurrent calls are serialized so the thread only ever has one
    /// exchange in flight.
    pub async fn handle_message(&self, input: &UserInput, sink: &dyn ChatSink) -> Response {
        let _turn = self.turn_lock.lock().await;

        let agent = match self.router.route(&input.text, &self.roster).await {
            Ok(Some(name)) => self.roster.get(&name),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "routing failed");
                return Response::routing_failure(&e);
            }
        };
        let Some(agent) = agent else {
            return Response::Help(self.router.help_message());
        };

        sink.send(ChatMessage::notice(format!("`{}` is processing...", agent.name)))
            .await;

        let submission = input.submission_text();
        let submission = match &self.grounding {
            Some(grounding) => grounding.augment(&submission).await,
            None => submission,
        };

        let turn = Turn {
            roster: &self.roster,
            thread: &self.thread,
            original_text: &input.text,
            sink,
            cancel: &self.cancel,
        };

        match self.driver.drive(&turn, agent, &submission).await {
            Ok(Reply::Text { agent, text }) => Response::Reply { agent, text },
            Ok(Reply::Document { agent, path }) => Response::Attachment { agent, path },
            Err(e) => {
                warn!(
                    agent = %agent.name,
                    kind = %e.kind(),
                    retryable = e.is_retryable(),
                    error = %e,
                    "exchange failed"
                );
                Response::from_error(&e, agent)
            }
        }
    }

    /// Abort pending waits and delete the thread. Deletion errors are logged only.
    pub async fn close(&self) {
        self.cancel.cancel();
        match self.service.delete_thread(&self.thread.id).await {
            Ok(()) => info!(thread_id = %self.thread.id, "session closed"),
            Err(e) => warn!(thread_id = %self.thread.id, error = %e, "failed to delete thread"),
        }
    }
}

#[cfg(feature = "foundry")]
impl Session {
    /// Start a session against the configured agent service, router and search index.
    pub async fn from_config(config: &crate::config::FerryConfig) -> Result<Self> {
        use crate::config::RoutingStrategy;
        use crate::router::KeywordRouter;
        use crate::service::foundry::FoundryClient;

        let service: Arc<dyn AgentService> = Arc::new(FoundryClient::from_config(config)?);

        let router: Arc<dyn Router> = match config.agents.routing {
            RoutingStrategy::Keyword => Arc::new(KeywordRouter::default()),
            #[cfg(feature = "triage")]
            RoutingStrategy::Triage => {
                use crate::router::triage::{AzureChatModel, TriageRouter};
                let model = AzureChatModel::from_settings(&config.chat)?;
                Arc::new(TriageRouter::new(Arc::new(model)))
            }
            #[cfg(not(feature = "triage"))]
            RoutingStrategy::Triage => {
                return Err(FerryError::Configuration(
                    "triage routing needs the `triage` feature".into(),
                ))
            }
        };

        #[cfg(feature = "search")]
        let grounding = if config.search.is_configured() {
            let client = crate::service::search::SearchClient::from_settings(&config.search)?;
            Some(Grounding::new(Arc::new(client), config.search.top_k))
        } else {
            None
        };
        #[cfg(not(feature = "search"))]
        let grounding = None;

        Self::start(
            service,
            router,
            DriverOptions::from_config(config),
            &config.agents.names,
            grounding,
        )
        .await
    }
}
