//! Ferry: a chat front door for a team of hosted AI agents.
//!
//! A user message is routed to one agent (by keyword or by a triage model),
//! optionally grounded with search results, appended to a shared thread, run
//! and polled until the agent answers. Agents may hand a question off to a
//! colleague, and a designated agent's "integration flow" answers are saved
//! as Word documents.
//!
//! # Quick Start
//!
//! ```no_run
//! use ferry::prelude::*;
//!
//! # async fn example() -> ferry::error::Result<()> {
//! let config = FerryConfig::load()?;
//! let session = Session::from_config(&config).await?;
//!
//! let input = UserInput::new("What are the requirements for module X?");
//! let response = session.handle_message(&input, &NullSink).await;
//! println!("{}", response.to_chat_message().content);
//!
//! session.close().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod document;
pub mod driver;
pub mod error;
pub mod grounding;
pub mod handoff;
pub mod prelude;
pub mod roster;
pub mod router;
pub mod service;
pub mod session;
pub mod types;
pub mod ui;

#[cfg(feature = "cli")]
pub mod cli;
