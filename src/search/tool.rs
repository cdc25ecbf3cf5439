//! The `search` tool exposed to the model.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::{search_mode_prompt, SearchFanout};
use crate::error::DocentError;
use crate::tools::{AgentToolParameters, ToolExecutionContext, ToolOutput, TypedTool};

pub const SEARCH_TOOL_NAME: &str = "search";

/// Arguments of the `search` tool.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchArgs {
    pub query: String,
}

/// Fan-out search as a typed tool. Its description follows the enabled branches.
pub struct SearchTool {
    fanout: Arc<SearchFanout>,
    description: String,
}

impl SearchTool {
    pub fn new(fanout: Arc<SearchFanout>) -> Self {
        let settings = fanout.settings();
        let description =
            search_mode_prompt(settings.local_enabled(), settings.internet_enabled()).to_string();
        Self {
            fanout,
            description,
        }
    }
}

#[async_trait]
impl TypedTool for SearchTool {
    type Args = SearchArgs;

    fn name(&self) -> &str {
        SEARCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> AgentToolParameters {
        AgentToolParameters::object()
            .string("query", "The search query", true)
            .build()
    }

    async fn call(
        &self,
        args: SearchArgs,
        _ctx: &ToolExecutionContext,
    ) -> Result<ToolOutput, DocentError> {
        let result = self.fanout.search(&args.query).await;
        Ok(ToolOutput::text(result.text).with_images(result.images))
    }
}
