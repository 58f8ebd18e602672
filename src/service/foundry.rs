//! HTTP client for the hosted agent service (agents, threads, messages, runs).

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::FerryConfig;
use crate::error::Result;
use crate::types::{Agent, Role, Run, Thread, ThreadMessage};

use super::http::{bearer_headers, build_client, join_url, send_json, status_to_error};
use super::{AgentDirectory, MessageStore, RunExecutor, ThreadStore};

const PAGE_LIMIT: &str = "100";

/// Agent service client speaking the assistants-style REST surface.
pub struct FoundryClient {
    endpoint: String,
    api_key: String,
    api_version: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for FoundryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FoundryClient")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct ListPage<T> {
    data: Vec<T>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    last_id: Option<String>,
}

#[derive(Deserialize)]
struct AgentRecord {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

impl From<AgentRecord> for Agent {
    fn from(record: AgentRecord) -> Self {
        Agent::new(record.id, record.name.unwrap_or_default())
    }
}

#[derive(Serialize)]
struct CreateMessageBody<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Serialize)]
struct CreateRunBody<'a> {
    assistant_id: &'a str,
}

impl FoundryClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            api_version: api_version.into(),
            http: build_client()?,
        })
    }

    /// Build from the `[project]` section of the config.
    pub fn from_config(config: &FerryConfig) -> Result<Self> {
        let (endpoint, api_key) = config.project_credentials()?;
        Self::new(endpoint, api_key, config.project.api_version.clone())
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, join_url(&self.endpoint, path))
            .headers(bearer_headers(&self.api_key))
            .query(&[("api-version", self.api_version.as_str())])
    }

    /// Follow `has_more`/`last_id` cursors until the listing is exhausted.
    async fn list_all<T: DeserializeOwned>(&self, path: &str, order: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let mut request = self
                .request(reqwest::Method::GET, path)
                .query(&[("limit", PAGE_LIMIT), ("order", order)]);
            if let Some(cursor) = &after {
                request = request.query(&[("after", cursor.as_str())]);
            }
            let page: ListPage<T> = send_json(request).await?;
            items.extend(page.data);
            match (page.has_more, page.last_id) {
                (true, Some(last)) => after = Some(last),
                _ => break,
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl AgentDirectory for FoundryClient {
    async fn list_agents(&self) -> Result<Vec<Agent>> {
        debug!(endpoint = %self.endpoint, "listing agents");
        let records: Vec<AgentRecord> = self.list_all("assistants", "desc").await?;
        Ok(records.into_iter().map(Agent::from).collect())
    }

    async fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        let record: AgentRecord = send_json(
            self.request(reqwest::Method::GET, &format!("assistants/{agent_id}")),
        )
        .await?;
        Ok(record.into())
    }
}

#[async_trait]
impl ThreadStore for FoundryClient {
    async fn create_thread(&self) -> Result<Thread> {
        let thread: Thread = send_json(
            self.request(reqwest::Method::POST, "threads")
                .json(&serde_json::json!({})),
        )
        .await?;
        debug!(thread_id = %thread.id, "created thread");
        Ok(thread)
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let resp = self
            .request(reqwest::Method::DELETE, &format!("threads/{thread_id}"))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), &body_text));
        }
        debug!(thread_id, "deleted thread");
        Ok(())
    }
}

#[async_trait]
impl MessageStore for FoundryClient {
    async fn create_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<ThreadMessage> {
        send_json(
            self.request(reqwest::Method::POST, &format!("threads/{thread_id}/messages"))
                .json(&CreateMessageBody { role, content }),
        )
        .await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        self.list_all(&format!("threads/{thread_id}/messages"), "asc")
            .await
    }
}

#[async_trait]
impl RunExecutor for FoundryClient {
    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<Run> {
        let run: Run = send_json(
            self.request(reqwest::Method::POST, &format!("threads/{thread_id}/runs"))
                .json(&CreateRunBody {
                    assistant_id: agent_id,
                }),
        )
        .await?;
        debug!(run_id = %run.id, thread_id, agent_id, status = %run.status, "started run");
        Ok(run)
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        send_json(self.request(
            reqwest::Method::GET,
            &format!("threads/{thread_id}/runs/{run_id}"),
        ))
        .await
    }
}
