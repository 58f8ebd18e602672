//! Convenience re-exports for common use.

pub use crate::config::{FerryConfig, RoutingStrategy};
pub use crate::driver::{ConversationDriver, DriverOptions, Reply};
pub use crate::error::{ErrorKind, FerryError, Result};
pub use crate::grounding::Grounding;
pub use crate::roster::AgentRoster;
pub use crate::router::{KeywordRouter, Router};
pub use crate::service::{
    AgentDirectory, AgentService, GroundingSearch, MessageStore, RunExecutor, ThreadStore,
};
pub use crate::session::{InputAttachment, Response, Session, UserInput};
pub use crate::types::{Agent, Role, Run, RunStatus, Thread, ThreadMessage};
pub use crate::ui::{ChatMessage, ChatSink, NullSink};
