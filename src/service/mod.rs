//! Remote collaborator traits and their HTTP implementations.
//!
//! The agent service is split along the capabilities the driver consumes:
//! [`AgentDirectory`], [`ThreadStore`], [`MessageStore`] and [`RunExecutor`].
//! Anything implementing all four is an [`AgentService`].

pub mod http;

#[cfg(feature = "foundry")]
pub mod foundry;

#[cfg(feature = "search")]
pub mod search;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Agent, Role, Run, Thread, ThreadMessage};

/// Lookup of hosted agents.
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    async fn list_agents(&self) -> Result<Vec<Agent>>;

    async fn get_agent(&self, agent_id: &str) -> Result<Agent>;
}

/// Creation and disposal of conversation threads.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    async fn create_thread(&self) -> Result<Thread>;

    async fn delete_thread(&self, thread_id: &str) -> Result<()>;
}

/// Append-only message log of a thread.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<ThreadMessage>;

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>>;
}

/// Starts runs and reports their status.
#[async_trait]
pub trait RunExecutor: Send + Sync {
    /// Start a run of `agent_id` over the thread's history. Returns as soon as
    /// the service accepted it; completion is observed through [`get_run`].
    ///
    /// [`get_run`]: RunExecutor::get_run
    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<Run>;

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;
}

/// The full hosted agent service.
pub trait AgentService: AgentDirectory + ThreadStore + MessageStore + RunExecutor {}

impl<T> AgentService for T where T: AgentDirectory + ThreadStore + MessageStore + RunExecutor {}

/// Document index queried for grounding text.
#[async_trait]
pub trait GroundingSearch: Send + Sync {
    /// Up to `top_k` document bodies, best match first.
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<String>>;
}
