//! Machine-readable error classification.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Closed set of outcomes a caller can assert on instead of message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// A directory, thread, message, run, or search call failed.
    RemoteCallFailure,
    /// No agent could be chosen for the message.
    RoutingFailure,
    /// The run finished but left no assistant text.
    EmptyReply,
    /// A handoff target produced no reply.
    HandoffNotAnswered,
    /// A handoff revisited an agent or exceeded the depth bound.
    HandoffLoop,
    RunTimedOut,
    RunFailed,
    Cancelled,
    Configuration,
    Document,
}
