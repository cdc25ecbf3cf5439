//! Docent: a conversational assistant backend.
//!
//! Answers user queries through a tool-augmented language-model loop whose
//! `search` tool fans out to a content index and web search, and tracks
//! per-client sessions in memory before flushing them to durable storage.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use docent::prelude::*;
//! use docent::search::{AzureContentIndex, BingWebSearch};
//! use docent::session::MemoryRecordStore;
//!
//! # async fn example() -> docent::error::Result<()> {
//! let config = DocentConfig::from_env()?;
//! let assistant = Assistant::from_config(
//!     &config,
//!     Arc::new(AzureOpenAiProvider::from_endpoints(&config.endpoints)?),
//!     Arc::new(AzureContentIndex::from_endpoints(&config.endpoints, &config.search)?),
//!     Arc::new(BingWebSearch::from_endpoints(&config.endpoints)?),
//!     Arc::new(MemoryRecordStore::new()),
//! )?;
//! let client_id = assistant.sessions().create_session("token");
//! let reply = assistant.ask("token", &client_id, "What are your hours?", "en-US").await?;
//! println!("{}", reply.assistant_text);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod assistant;
pub mod config;
pub mod error;
pub mod localization;
pub mod prelude;
pub mod provider;
pub mod search;
pub mod session;
pub mod tools;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
