//! Retrieval-augmented input: prepend search hits to the user's message.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::service::GroundingSearch;

const PREVIEW_CHARS: usize = 200;

/// Search-backed context preamble for outgoing messages.
#[derive(Clone)]
pub struct Grounding {
    search: Arc<dyn GroundingSearch>,
    top_k: usize,
}

impl Grounding {
    pub fn new(search: Arc<dyn GroundingSearch>, top_k: usize) -> Self {
        Self { search, top_k }
    }

    /// The text to submit for `query`.
    ///
    /// A failed search is logged and the query goes out unchanged.
    pub async fn augment(&self, query: &str) -> String {
        match self.search.search(query, self.top_k).await {
            Ok(docs) => {
                for (i, doc) in docs.iter().enumerate() {
                    debug!(doc = i + 1, preview = %preview(doc), "retrieved grounding document");
                }
                augment_query(query, &docs)
            }
            Err(e) => {
                warn!(error = %e, "grounding search failed, sending query without context");
                query.to_string()
            }
        }
    }
}

/// `[Doc 1]: ..\n\n[Doc 2]: ..\n\nUser Query: <query>`, or the bare query when nothing was found.
pub fn augment_query(query: &str, docs: &[String]) -> String {
    if docs.is_empty() {
        return query.to_string();
    }
    let context = docs
        .iter()
        .enumerate()
        .map(|(i, doc)| format!("[Doc {}]: {doc}", i + 1))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{context}\n\nUser Query: {query}")
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
