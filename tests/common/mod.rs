//! Shared test helpers: an in-memory agent service and a recording chat sink.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use ferry::error::{FerryError, Result};
use ferry::service::{AgentDirectory, GroundingSearch, MessageStore, RunExecutor, ThreadStore};
use ferry::types::*;
use ferry::ui::{ChatMessage, ChatSink};

/// How a scripted agent answers its next run.
#[derive(Debug, Clone)]
pub enum Script {
    /// Completes and posts this text as an assistant message.
    Reply(String),
    /// Completes without posting anything.
    Silent,
    /// Ends with the given terminal status and no message.
    End(RunStatus),
    /// Stays in progress for this many polls, then completes with the text.
    Slow { polls: u32, text: String },
    /// Stays in progress forever.
    Hang,
}

#[derive(Default)]
struct State {
    next_id: u64,
    clock: i64,
    threads: Vec<String>,
    deleted_threads: Vec<String>,
    messages: HashMap<String, Vec<ThreadMessage>>,
    runs: HashMap<String, Run>,
    slow_runs: HashMap<String, (u32, String)>,
    run_agents: Vec<String>,
}

impl State {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_{}", self.next_id)
    }

    fn now(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        Utc.timestamp_opt(1_700_000_000 + self.clock, 0).unwrap()
    }

    fn post_reply(&mut self, thread_id: &str, text: String) {
        let id = self.id("msg");
        let created_at = self.now();
        let reply = ThreadMessage::with_text(id, Role::Assistant, text, created_at);
        if let Some(messages) = self.messages.get_mut(thread_id) {
            messages.push(reply);
        }
    }
}

/// An agent service that answers from per-agent scripts.
///
/// Agents without a script left answer `Script::Silent`.
pub struct MockAgentService {
    agents: Vec<Agent>,
    scripts: Mutex<HashMap<String, VecDeque<Script>>>,
    state: Mutex<State>,
    fail_messages: Mutex<bool>,
}

impl MockAgentService {
    pub fn new(agents: &[(&str, &str)]) -> Self {
        Self {
            agents: agents.iter().map(|(id, name)| Agent::new(*id, *name)).collect(),
            scripts: Mutex::new(HashMap::new()),
            state: Mutex::new(State::default()),
            fail_messages: Mutex::new(false),
        }
    }

    /// The three stock AIS agents.
    pub fn ais() -> Self {
        Self::new(&[
            ("asst_req", "AIS Requirements"),
            ("asst_arch", "AIS Architect"),
            ("asst_dev", "AIS Developer"),
        ])
    }

    pub fn agent(&self, name: &str) -> Agent {
        self.agents
            .iter()
            .find(|a| a.name == name)
            .cloned()
            .unwrap_or_else(|| panic!("no mock agent named {name}"))
    }

    /// Queue the next answer of `agent_name`.
    pub fn script(&self, agent_name: &str, script: Script) -> &Self {
        let id = self.agent(agent_name).id;
        self.scripts
            .lock()
            .unwrap()
            .entry(id)
            .or_default()
            .push_back(script);
        self
    }

    pub fn reply(&self, agent_name: &str, text: &str) -> &Self {
        self.script(agent_name, Script::Reply(text.to_string()))
    }

    /// Make every `create_message` call fail with a 500.
    pub fn fail_messages(&self) {
        *self.fail_messages.lock().unwrap() = true;
    }

    /// Texts of user messages posted to `thread_id`, oldest first.
    pub fn user_messages(&self, thread_id: &str) -> Vec<String> {
        self.texts(thread_id, Role::User)
    }

    pub fn assistant_messages(&self, thread_id: &str) -> Vec<String> {
        self.texts(thread_id, Role::Assistant)
    }

    /// Every message of `thread_id` as `role: text`, oldest first.
    pub fn transcript(&self, thread_id: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .messages
            .get(thread_id)
            .map(|messages| {
                messages
                    .iter()
                    .map(|m| {
                        let role = if m.role == Role::User { "user" } else { "assistant" };
                        format!("{role}: {}", m.first_text().unwrap_or_default())
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn texts(&self, thread_id: &str, role: Role) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .messages
            .get(thread_id)
            .map(|messages| {
                messages
                    .iter()
                    .filter(|m| m.role == role)
                    .filter_map(|m| m.first_text().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Agent ids in the order runs were started.
    pub fn run_agents(&self) -> Vec<String> {
        self.state.lock().unwrap().run_agents.clone()
    }

    pub fn threads(&self) -> Vec<String> {
        self.state.lock().unwrap().threads.clone()
    }

    pub fn deleted_threads(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted_threads.clone()
    }
}

#[async_trait]
impl AgentDirectory for MockAgentService {
    async fn list_agents(&self) -> Result<Vec<Agent>> {
        Ok(self.agents.clone())
    }

    async fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        self.agents
            .iter()
            .find(|a| a.id == agent_id)
            .cloned()
            .ok_or_else(|| FerryError::api(404, format!("No assistant found with id '{agent_id}'.")))
    }
}

#[async_trait]
impl ThreadStore for MockAgentService {
    async fn create_thread(&self) -> Result<Thread> {
        let mut state = self.state.lock().unwrap();
        let id = state.id("thread");
        state.threads.push(id.clone());
        state.messages.insert(id.clone(), Vec::new());
        Ok(Thread::new(id))
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.deleted_threads.push(thread_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl MessageStore for MockAgentService {
    async fn create_message(&self, thread_id: &str, role: Role, content: &str) -> Result<ThreadMessage> {
        if *self.fail_messages.lock().unwrap() {
            return Err(FerryError::api(500, "message store unavailable"));
        }
        let mut state = self.state.lock().unwrap();
        let id = state.id("msg");
        let created_at = state.now();
        let message = ThreadMessage::with_text(id, role, content, created_at);
        state
            .messages
            .get_mut(thread_id)
            .ok_or_else(|| FerryError::api(404, format!("No thread found with id '{thread_id}'.")))?
            .push(message.clone());
        Ok(message)
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let state = self.state.lock().unwrap();
        state
            .messages
            .get(thread_id)
            .cloned()
            .ok_or_else(|| FerryError::api(404, format!("No thread found with id '{thread_id}'.")))
    }
}

#[async_trait]
impl RunExecutor for MockAgentService {
    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<Run> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(agent_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Script::Silent);

        let mut state = self.state.lock().unwrap();
        let run_id = state.id("run");
        state.run_agents.push(agent_id.to_string());

        let status = match script {
            Script::Reply(text) => {
                state.post_reply(thread_id, text);
                RunStatus::Completed
            }
            Script::Slow { polls, text } => {
                state.slow_runs.insert(run_id.clone(), (polls, text));
                RunStatus::InProgress
            }
            Script::Silent => RunStatus::Completed,
            Script::End(status) => status,
            Script::Hang => RunStatus::InProgress,
        };
        state
            .runs
            .insert(run_id.clone(), Run::new(&run_id, thread_id, agent_id, status));

        Ok(Run::new(run_id, thread_id, agent_id, RunStatus::Queued))
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let mut state = self.state.lock().unwrap();
        let finished = match state.slow_runs.get_mut(run_id) {
            Some((polls, _)) => {
                *polls = polls.saturating_sub(1);
                *polls == 0
            }
            None => false,
        };
        if finished {
            if let Some((_, text)) = state.slow_runs.remove(run_id) {
                state.post_reply(thread_id, text);
            }
            if let Some(run) = state.runs.get_mut(run_id) {
                run.status = RunStatus::Completed;
            }
        }
        state
            .runs
            .get(run_id)
            .cloned()
            .ok_or_else(|| FerryError::api(404, format!("No run found with id '{run_id}'.")))
    }
}

/// Collects everything sent to the chat.
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<ChatMessage>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.lock().unwrap().clone()
    }

    /// Contents of author-less status notices.
    pub fn notices(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|m| m.author.is_none())
            .map(|m| m.content)
            .collect()
    }
}

#[async_trait]
impl ChatSink for RecordingSink {
    async fn send(&self, message: ChatMessage) {
        self.messages.lock().unwrap().push(message);
    }
}

/// Search index returning fixed documents and remembering queries.
#[derive(Default)]
pub struct FixedSearch {
    pub docs: Vec<String>,
    pub queries: Mutex<Vec<String>>,
}

impl FixedSearch {
    pub fn new(docs: &[&str]) -> Self {
        Self {
            docs: docs.iter().map(|d| d.to_string()).collect(),
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl GroundingSearch for FixedSearch {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.docs.iter().take(top_k).cloned().collect())
    }
}
