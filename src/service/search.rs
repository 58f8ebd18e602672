//! HTTP client for the grounding search index.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::SearchSettings;
use crate::error::{FerryError, Result};

use super::http::{api_key_headers, build_client, join_url, send_json};
use super::GroundingSearch;

/// Full-text search against one index.
pub struct SearchClient {
    endpoint: String,
    index: String,
    api_key: String,
    api_version: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<Value>,
}

impl SearchClient {
    pub fn new(
        endpoint: impl Into<String>,
        index: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            endpoint: endpoint.into(),
            index: index.into(),
            api_key: api_key.into(),
            api_version: api_version.into(),
            http: build_client()?,
        })
    }

    /// Build from `[search]` settings; all of endpoint, key and index are required.
    pub fn from_settings(settings: &SearchSettings) -> Result<Self> {
        match (&settings.endpoint, &settings.index, &settings.api_key) {
            (Some(endpoint), Some(index), Some(api_key)) => Self::new(
                endpoint.clone(),
                index.clone(),
                api_key.clone(),
                settings.api_version.clone(),
            ),
            _ => Err(FerryError::Configuration(
                "Search needs AZURE_SEARCH_ENDPOINT, AZURE_SEARCH_KEY and AZURE_SEARCH_INDEX_NAME"
                    .into(),
            )),
        }
    }
}

/// Body text of a search hit: `content`, else `text`, else the whole document.
pub fn document_text(document: &Value) -> String {
    ["content", "text"]
        .iter()
        .find_map(|field| document.get(field).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| document.to_string())
}

#[async_trait]
impl GroundingSearch for SearchClient {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        let url = join_url(&self.endpoint, &format!("indexes/{}/docs/search", self.index));
        debug!(index = %self.index, top_k, "searching grounding index");

        let response: SearchResponse = send_json(
            self.http
                .post(url)
                .headers(api_key_headers(&self.api_key))
                .query(&[("api-version", self.api_version.as_str())])
                .json(&json!({ "search": query, "top": top_k })),
        )
        .await?;

        Ok(response.value.iter().map(document_text).collect())
    }
}
