//! Per-session name -> agent mapping.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::error::Result;
use crate::service::AgentDirectory;
use crate::types::Agent;

/// Agents resolved once at session start. Never mutated afterwards; a remote
/// roster change during the session is not noticed.
#[derive(Debug, Clone, Default)]
pub struct AgentRoster {
    agents: HashMap<String, Agent>,
    order: Vec<String>,
}

impl AgentRoster {
    /// Build from already-fetched agents, keeping the first agent per name.
    pub fn from_agents(agents: impl IntoIterator<Item = Agent>) -> Self {
        let mut roster = Self::default();
        for agent in agents {
            if roster.agents.contains_key(&agent.name) {
                continue;
            }
            roster.order.push(agent.name.clone());
            roster.agents.insert(agent.name.clone(), agent);
        }
        roster
    }

    /// List the directory once and keep the agents whose names are wanted.
    ///
    /// Missing names are logged and skipped; the caller decides whether an
    /// empty roster is fatal.
    pub async fn resolve<D>(directory: &D, names: &[String]) -> Result<Self>
    where
        D: AgentDirectory + ?Sized,
    {
        let available = directory.list_agents().await?;
        let mut found = Vec::with_capacity(names.len());
        for name in names {
            match available.iter().find(|a| &a.name == name) {
                Some(agent) => found.push(agent.clone()),
                None => warn!(agent = %name, "agent not found in directory"),
            }
        }
        let roster = Self::from_agents(found);
        info!(agents = ?roster.names(), "resolved agent roster");
        Ok(roster)
    }

    /// Exact name first, then a case-insensitive match.
    pub fn get(&self, name: &str) -> Option<&Agent> {
        self.agents.get(name).or_else(|| {
            self.order
                .iter()
                .find(|known| known.eq_ignore_ascii_case(name))
                .and_then(|known| self.agents.get(known))
        })
    }

    /// Names in the order they were requested.
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.order.iter().filter_map(|name| self.agents.get(name))
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
