//! Configuration system (layered: code > env > `ferry.toml` > defaults).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use strum::{Display, EnumString};

use crate::error::{FerryError, Result};

/// File name looked up in the working directory and the platform config dir.
pub const CONFIG_FILE_NAME: &str = "ferry.toml";

/// Agents looked up by name at session start.
pub const DEFAULT_AGENT_NAMES: [&str; 3] = ["AIS Requirements", "AIS Architect", "AIS Developer"];

/// Agent whose replies may be turned into a flow document.
pub const DEFAULT_DOCUMENT_AGENT: &str = "AIS Developer";

/// How the session picks an agent for each message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RoutingStrategy {
    #[default]
    Keyword,
    Triage,
}

/// Hosted agent service connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub api_version: String,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            api_version: "2025-05-01".to_string(),
        }
    }
}

/// Grounding search index connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub index: Option<String>,
    pub api_version: String,
    pub top_k: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            index: None,
            api_version: "2023-11-01".to_string(),
            top_k: 5,
        }
    }
}

impl SearchSettings {
    /// Grounding is only enabled when the endpoint, key and index are all set.
    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.api_key.is_some() && self.index.is_some()
    }
}

/// Chat-completions deployment used by the triage router.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub api_version: String,
    pub deployment: Option<String>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            api_version: "2024-06-01".to_string(),
            deployment: None,
        }
    }
}

/// Agent roster and routing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub names: Vec<String>,
    pub document_agent: String,
    pub routing: RoutingStrategy,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            names: DEFAULT_AGENT_NAMES.iter().map(|n| n.to_string()).collect(),
            document_agent: DEFAULT_DOCUMENT_AGENT.to_string(),
            routing: RoutingStrategy::Keyword,
        }
    }
}

/// Run polling and handoff bounds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub poll_interval_ms: u64,
    pub timeout_secs: u64,
    pub max_handoff_depth: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            timeout_secs: 60,
            max_handoff_depth: 1,
        }
    }
}

impl RunSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Generated document output.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    pub output_dir: PathBuf,
    pub title: String,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("generated_docs"),
            title: crate::document::DEFAULT_TITLE.to_string(),
        }
    }
}

/// Layered configuration for Ferry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FerryConfig {
    pub project: ProjectSettings,
    pub search: SearchSettings,
    pub chat: ChatSettings,
    pub agents: AgentSettings,
    pub run: RunSettings,
    pub documents: DocumentSettings,
}

impl FerryConfig {
    /// Load `.env`, then the config file (if any), then environment overrides.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = match config_file_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Defaults overlaid with the current process environment.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw).map_err(|e| {
            FerryError::Configuration(format!("{}: {e}", path.display()))
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| FerryError::Configuration(e.to_string()))
    }

    /// Overlay values from an environment lookup. Later aliases win.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| keys.iter().rev().find_map(|k| lookup(*k));

        if let Some(v) = first(&["AIPROJECT_ENDPOINT", "FERRY_PROJECT_ENDPOINT"]) {
            self.project.endpoint = Some(v);
        }
        if let Some(v) = first(&["AIPROJECT_API_KEY", "FERRY_PROJECT_API_KEY"]) {
            self.project.api_key = Some(v);
        }
        if let Some(v) = first(&["FERRY_PROJECT_API_VERSION"]) {
            self.project.api_version = v;
        }

        if let Some(v) = first(&["AZURE_SEARCH_ENDPOINT"]) {
            self.search.endpoint = Some(v);
        }
        if let Some(v) = first(&["AZURE_SEARCH_KEY"]) {
            self.search.api_key = Some(v);
        }
        if let Some(v) = first(&["AZURE_SEARCH_INDEX_NAME"]) {
            self.search.index = Some(v);
        }
        if let Some(v) = first(&["FERRY_SEARCH_TOP_K"]) {
            self.search.top_k = parse_number("FERRY_SEARCH_TOP_K", &v)?;
        }

        if let Some(v) = first(&["AZURE_OPENAI_ENDPOINT"]) {
            self.chat.endpoint = Some(v);
        }
        if let Some(v) = first(&["MY_OPENAI_API_KEY", "AZURE_OPENAI_API_KEY"]) {
            self.chat.api_key = Some(v);
        }
        if let Some(v) = first(&["AZURE_OPENAI_API_VERSION"]) {
            self.chat.api_version = v;
        }
        if let Some(v) = first(&["AZURE_OPENAI_GPT35", "FERRY_TRIAGE_DEPLOYMENT"]) {
            self.chat.deployment = Some(v);
        }

        if let Some(v) = first(&["FERRY_AGENT_NAMES"]) {
            self.agents.names = v
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = first(&["FERRY_DOCUMENT_AGENT"]) {
            self.agents.document_agent = v;
        }
        if let Some(v) = first(&["FERRY_ROUTING"]) {
            self.agents.routing = v.parse().map_err(|_| {
                FerryError::Configuration(format!(
                    "FERRY_ROUTING must be `keyword` or `triage`, got `{v}`"
                ))
            })?;
        }

        if let Some(v) = first(&["FERRY_POLL_INTERVAL_MS"]) {
            self.run.poll_interval_ms = parse_number("FERRY_POLL_INTERVAL_MS", &v)?;
        }
        if let Some(v) = first(&["FERRY_RUN_TIMEOUT_SECS"]) {
            self.run.timeout_secs = parse_number("FERRY_RUN_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = first(&["FERRY_MAX_HANDOFF_DEPTH"]) {
            self.run.max_handoff_depth = parse_number("FERRY_MAX_HANDOFF_DEPTH", &v)?;
        }

        if let Some(v) = first(&["FERRY_DOCS_DIR"]) {
            self.documents.output_dir = PathBuf::from(v);
        }

        Ok(())
    }

    /// Endpoint and key for the agent service, or a configuration error naming what is missing.
    pub fn project_credentials(&self) -> Result<(&str, &str)> {
        let endpoint = self.project.endpoint.as_deref().ok_or_else(|| {
            FerryError::Configuration("Missing AIPROJECT_ENDPOINT".into())
        })?;
        let api_key = self.project.api_key.as_deref().ok_or_else(|| {
            FerryError::Configuration("Missing AIPROJECT_API_KEY".into())
        })?;
        Ok((endpoint, api_key))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| FerryError::Configuration(format!("{key} must be a number, got `{value}`")))
}

/// `FERRY_CONFIG`, then `./ferry.toml`, then the platform config directory.
fn config_file_path() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var("FERRY_CONFIG") {
        return Some(PathBuf::from(explicit));
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    directories::ProjectDirs::from("", "", "ferry")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_stock_roster() {
        let config = FerryConfig::default();
        assert_eq!(config.agents.names, DEFAULT_AGENT_NAMES);
        assert_eq!(config.agents.document_agent, "AIS Developer");
        assert_eq!(config.run.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.run.timeout(), Duration::from_secs(60));
        assert_eq!(config.run.max_handoff_depth, 1);
        assert!(!config.search.is_configured());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = FerryConfig::from_toml_str(
            r#"
            [project]
            endpoint = "https://file.example"

            [run]
            timeout_secs = 30
            "#,
        )
        .unwrap();

        config
            .apply_env_with(lookup(&[
                ("AIPROJECT_ENDPOINT", "https://env.example"),
                ("FERRY_AGENT_NAMES", "Alpha, Beta ,,"),
                ("FERRY_ROUTING", "Triage"),
            ]))
            .unwrap();

        assert_eq!(config.project.endpoint.as_deref(), Some("https://env.example"));
        assert_eq!(config.run.timeout_secs, 30);
        assert_eq!(config.agents.names, vec!["Alpha", "Beta"]);
        assert_eq!(config.agents.routing, RoutingStrategy::Triage);
    }

    #[test]
    fn ferry_prefixed_alias_wins_over_legacy_name() {
        let mut config = FerryConfig::default();
        config
            .apply_env_with(lookup(&[
                ("AIPROJECT_API_KEY", "legacy"),
                ("FERRY_PROJECT_API_KEY", "preferred"),
            ]))
            .unwrap();
        assert_eq!(config.project.api_key.as_deref(), Some("preferred"));
    }

    #[test]
    fn bad_number_is_a_configuration_error() {
        let mut config = FerryConfig::default();
        let err = config
            .apply_env_with(lookup(&[("FERRY_RUN_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, FerryError::Configuration(msg) if msg.contains("FERRY_RUN_TIMEOUT_SECS")));
    }

    #[test]
    fn project_credentials_name_the_missing_variable() {
        let config = FerryConfig::default();
        let err = config.project_credentials().unwrap_err();
        assert!(err.to_string().contains("AIPROJECT_ENDPOINT"));
    }

    #[test]
    fn unknown_toml_routing_is_rejected() {
        let err = FerryConfig::from_toml_str("[agents]\nrouting = \"random\"\n").unwrap_err();
        assert!(matches!(err, FerryError::Configuration(_)));
    }
}
