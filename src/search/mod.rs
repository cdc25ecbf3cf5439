//! Multi-source search: content index and web branches behind one `search` tool.

pub mod azure_index;
pub mod bing;
pub mod fanout;
pub mod tool;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DocentError;

pub use azure_index::AzureContentIndex;
pub use bing::BingWebSearch;
pub use fanout::{FanoutResult, SearchFanout};
pub use tool::{SearchArgs, SearchTool, SEARCH_TOOL_NAME};

/// Branch label for the content-index lookup.
pub const LOCAL_BRANCH: &str = "local_search";
/// Branch label for the web lookup.
pub const INTERNET_BRANCH: &str = "internet_search";

/// One ranked hit from the content index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalResult {
    pub summary: String,
    pub details: String,
    /// Reranker confidence; `None` when the service did not rank the hit.
    pub score: Option<f64>,
    pub images: Vec<String>,
}

/// One ranked hit from web search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebResult {
    pub title: String,
    pub snippet: String,
}

/// Semantic/vector search over the deployment's own content.
#[async_trait]
pub trait ContentIndex: Send + Sync {
    async fn search(&self, query: &str, cap: usize) -> Result<Vec<LocalResult>, DocentError>;
}

/// Public web search.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, cap: usize) -> Result<Vec<WebResult>, DocentError>;
}

/// Backend for a branch whose service is not configured; every lookup fails.
#[derive(Debug, Clone)]
pub struct Unavailable {
    service: &'static str,
}

impl Unavailable {
    pub fn new(service: &'static str) -> Self {
        Self { service }
    }

    fn error(&self) -> DocentError {
        DocentError::Configuration(format!("{} is not configured", self.service))
    }
}

#[async_trait]
impl ContentIndex for Unavailable {
    async fn search(&self, _query: &str, _cap: usize) -> Result<Vec<LocalResult>, DocentError> {
        Err(self.error())
    }
}

#[async_trait]
impl WebSearch for Unavailable {
    async fn search(&self, _query: &str, _cap: usize) -> Result<Vec<WebResult>, DocentError> {
        Err(self.error())
    }
}

/// Instruction describing how the model should weigh search results for the
/// enabled branches. Doubles as the `search` tool description.
pub fn search_mode_prompt(local: bool, internet: bool) -> &'static str {
    match (local, internet) {
        (true, true) => {
            "The given information is a combination of both Local Search Results and Internet Search Results, \
             please always prioritize local search results if both return usable results."
        }
        (true, false) => {
            "Please give that answer based on the Local Search Results if it returns the usable results. \
             You are only allowed to use the context provided from tool_calls. Do not generate answers based on any other knowledge."
        }
        (false, true) => {
            "Please give that answer based on the Internet Search Results if it returns the usable results."
        }
        (false, false) => "Please give that answer based on your knowledge.",
    }
}

/// Human-readable date, e.g. `Monday, October 19, 2026`.
pub fn format_current_date(now: DateTime<Utc>) -> String {
    now.format("%A, %B %d, %Y").to_string()
}
