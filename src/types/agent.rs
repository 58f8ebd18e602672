//! Remote identities: agents and threads.

use serde::{Deserialize, Serialize};

/// A hosted conversational persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
}

impl Agent {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// An opaque remote conversation context shared by every agent in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
}

impl Thread {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}
