//! Model-instructed routing: a triage model picks one agent from the roster.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::ChatSettings;
use crate::error::{FerryError, Result};
use crate::roster::AgentRoster;
use crate::service::http::{api_key_headers, build_client, join_url, send_json};

use super::Router;

/// Single-shot chat completion.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Chat completions against an Azure OpenAI deployment.
pub struct AzureChatModel {
    url: String,
    api_key: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl AzureChatModel {
    /// `endpoint`: e.g. "https://myresource.openai.azure.com"
    pub fn new(
        endpoint: &str,
        deployment: &str,
        api_key: impl Into<String>,
        api_version: &str,
    ) -> Result<Self> {
        let url = format!(
            "{}?api-version={api_version}",
            join_url(
                endpoint,
                &format!("openai/deployments/{deployment}/chat/completions")
            )
        );
        Ok(Self {
            url,
            api_key: api_key.into(),
            http: build_client()?,
        })
    }

    pub fn from_settings(settings: &ChatSettings) -> Result<Self> {
        match (&settings.endpoint, &settings.deployment, &settings.api_key) {
            (Some(endpoint), Some(deployment), Some(api_key)) => {
                Self::new(endpoint, deployment, api_key.clone(), &settings.api_version)
            }
            _ => Err(FerryError::Configuration(
                "Triage routing needs AZURE_OPENAI_ENDPOINT, AZURE_OPENAI_API_KEY and AZURE_OPENAI_GPT35"
                    .into(),
            )),
        }
    }
}

#[async_trait]
impl ChatModel for AzureChatModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let body = json!({
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "temperature": 0,
        });
        let data: ChatResponse = send_json(
            self.http
                .post(&self.url)
                .headers(api_key_headers(&self.api_key))
                .json(&body),
        )
        .await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| FerryError::api(200, "No choices in chat completion response"))?;
        Ok(choice.message.content.unwrap_or_default())
    }
}

/// Routes by asking a model which roster agent should answer.
pub struct TriageRouter {
    model: Arc<dyn ChatModel>,
    descriptions: HashMap<String, String>,
}

impl TriageRouter {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        let descriptions = [
            (
                "AIS Requirements",
                "Captures the requirements of an integration: incoming payload, mappings, destination endpoint and payload.",
            ),
            (
                "AIS Architect",
                "Designs the Azure Integration Services architecture for an integration.",
            ),
            (
                "AIS Developer",
                "Works on the integration project itself and produces integration flow documents.",
            ),
        ]
        .into_iter()
        .map(|(name, desc)| (name.to_string(), desc.to_string()))
        .collect();
        Self {
            model,
            descriptions,
        }
    }

    /// Describe (or re-describe) an agent for the triage prompt.
    pub fn with_description(mut self, agent: impl Into<String>, description: impl Into<String>) -> Self {
        self.descriptions.insert(agent.into(), description.into());
        self
    }

    fn instructions(&self, roster: &AgentRoster) -> String {
        let mut prompt = String::from(
            "You are a triage agent. Decide which specialist agent should handle the user's message. \
Do not answer the message yourself.\n\nAgents:\n",
        );
        for name in roster.names() {
            match self.descriptions.get(name) {
                Some(desc) => prompt.push_str(&format!("- {name}: {desc}\n")),
                None => prompt.push_str(&format!("- {name}\n")),
            }
        }
        prompt.push_str("\nReply with exactly one agent name from the list, or `none` if no agent fits.");
        prompt
    }
}

/// Match a model answer against the roster: exact (case-insensitive) name, or the
/// one roster name the answer mentions. Anything else is no match.
pub fn parse_choice(answer: &str, roster: &AgentRoster) -> Option<String> {
    let cleaned = answer
        .trim()
        .trim_matches(|c: char| c == '`' || c == '"' || c == '\'' || c == '.')
        .trim()
        .to_lowercase();
    if cleaned.is_empty() || cleaned == "none" {
        return None;
    }
    let names = roster.names();
    if let Some(exact) = names.iter().find(|n| n.to_lowercase() == cleaned) {
        return Some(exact.to_string());
    }
    let mentioned: Vec<&&str> = names
        .iter()
        .filter(|n| cleaned.contains(&n.to_lowercase()))
        .collect();
    match mentioned.as_slice() {
        [only] => Some(only.to_string()),
        _ => None,
    }
}

#[async_trait]
impl Router for TriageRouter {
    async fn route(&self, text: &str, roster: &AgentRoster) -> Result<Option<String>> {
        if roster.is_empty() {
            return Ok(None);
        }
        let answer = self.model.complete(&self.instructions(roster), text).await?;
        let choice = parse_choice(&answer, roster);
        debug!(answer = %answer.trim(), choice = ?choice, "triage decision");
        Ok(choice)
    }

    fn help_message(&self) -> String {
        let mut names: Vec<&str> = self.descriptions.keys().map(String::as_str).collect();
        names.sort_unstable();
        format!(
            "Could not determine which agent to use. Try describing what you need from one of: {}.",
            names.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::types::Agent;

    struct ScriptedModel {
        answer: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(&self, system: &str, _user: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(system.to_string());
            Ok(self.answer.clone())
        }
    }

    fn roster() -> AgentRoster {
        AgentRoster::from_agents(vec![
            Agent::new("a1", "AIS Requirements"),
            Agent::new("a2", "AIS Architect"),
            Agent::new("a3", "AIS Developer"),
        ])
    }

    fn scripted(answer: &str) -> Arc<ScriptedModel> {
        Arc::new(ScriptedModel {
            answer: answer.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn parse_choice_accepts_decorated_exact_names() {
        assert_eq!(parse_choice("`ais architect`.", &roster()).as_deref(), Some("AIS Architect"));
    }

    #[test]
    fn parse_choice_accepts_a_single_mention() {
        assert_eq!(
            parse_choice("I would send this to AIS Requirements", &roster()).as_deref(),
            Some("AIS Requirements")
        );
    }

    #[test]
    fn parse_choice_rejects_none_ambiguity_and_strangers() {
        assert_eq!(parse_choice("none", &roster()), None);
        assert_eq!(parse_choice("AIS Architect or AIS Developer", &roster()), None);
        assert_eq!(parse_choice("Triage Agent", &roster()), None);
    }

    #[tokio::test]
    async fn route_lists_roster_agents_in_the_prompt() {
        let model = scripted("AIS Developer");
        let router = TriageRouter::new(model.clone());

        let routed = router.route("build the flow", &roster()).await.unwrap();

        assert_eq!(routed.as_deref(), Some("AIS Developer"));
        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("- AIS Architect: Designs"));
        assert!(prompts[0].contains("`none`"));
    }

    #[tokio::test]
    async fn empty_roster_never_calls_the_model() {
        let model = scripted("AIS Developer");
        let router = TriageRouter::new(model.clone());

        let routed = router.route("anything", &AgentRoster::default()).await.unwrap();

        assert_eq!(routed, None);
        assert!(model.prompts.lock().unwrap().is_empty());
    }
}
