//! Choosing which agent receives a user message.
//!
//! [`KeywordRouter`] is the default: a fixed, ordered list of substring rules
//! where the first match wins. [`triage::TriageRouter`] asks a chat model to
//! pick among the roster instead.

#[cfg(feature = "triage")]
pub mod triage;

use async_trait::async_trait;

use crate::error::Result;
use crate::roster::AgentRoster;

/// Shown when no agent could be chosen.
pub const HELP_MESSAGE: &str = "Could not determine which agent to use. Try including keywords like \
`requirements`, `architecture`, `project` or `integration`.";

/// Picks a target agent name for a message.
#[async_trait]
pub trait Router: Send + Sync {
    /// `Ok(None)` means "cannot route"; it is a normal outcome, not an error.
    async fn route(&self, text: &str, roster: &AgentRoster) -> Result<Option<String>>;

    /// Text shown to the user when [`route`](Router::route) returns `None`.
    fn help_message(&self) -> String {
        HELP_MESSAGE.to_string()
    }
}

/// One routing rule: any keyword (case-insensitive substring) selects `agent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule {
    pub keywords: Vec<String>,
    pub agent: String,
}

impl KeywordRule {
    pub fn new(agent: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            agent: agent.into(),
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

/// Ordered substring rules; the first matching rule wins.
#[derive(Debug, Clone)]
pub struct KeywordRouter {
    rules: Vec<KeywordRule>,
}

impl Default for KeywordRouter {
    fn default() -> Self {
        Self::new(vec![
            KeywordRule::new("AIS Requirements", &["requirement"]),
            KeywordRule::new("AIS Architect", &["architecture"]),
            KeywordRule::new("AIS Developer", &["project", "integration"]),
        ])
    }
}

impl KeywordRouter {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    /// Agent for `text`, or `None` if no rule matches.
    pub fn detect(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| rule.agent.as_str())
    }
}

#[async_trait]
impl Router for KeywordRouter {
    async fn route(&self, text: &str, _roster: &AgentRoster) -> Result<Option<String>> {
        Ok(self.detect(text).map(str::to_string))
    }
}

/// Route with the stock rules.
pub fn detect_target_agent(text: &str) -> Option<String> {
    KeywordRouter::default().detect(text).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requirement_matches_any_case() {
        assert_eq!(
            detect_target_agent("List the REQUIREMENTS please").as_deref(),
            Some("AIS Requirements")
        );
    }

    #[test]
    fn priority_holds_when_keywords_co_occur() {
        assert_eq!(
            detect_target_agent("architecture for the requirement of this project").as_deref(),
            Some("AIS Requirements")
        );
        assert_eq!(
            detect_target_agent("integration architecture").as_deref(),
            Some("AIS Architect")
        );
    }

    #[test]
    fn project_and_integration_both_reach_the_developer() {
        assert_eq!(detect_target_agent("new project").as_deref(), Some("AIS Developer"));
        assert_eq!(
            detect_target_agent("generate integration flow").as_deref(),
            Some("AIS Developer")
        );
    }

    #[test]
    fn no_keyword_is_no_match() {
        assert_eq!(detect_target_agent("hello there"), None);
        assert_eq!(detect_target_agent(""), None);
    }

    #[test]
    fn custom_rules_are_lowercased() {
        let router = KeywordRouter::new(vec![KeywordRule::new("Ops", &["Deploy"])]);
        assert_eq!(router.detect("please DEPLOY it"), Some("Ops"));
    }

    #[tokio::test]
    async fn router_trait_returns_owned_name() {
        let router = KeywordRouter::default();
        let routed = router
            .route("what is the architecture?", &AgentRoster::default())
            .await
            .unwrap();
        assert_eq!(routed.as_deref(), Some("AIS Architect"));
        assert!(router.help_message().contains("`requirements`"));
    }
}
