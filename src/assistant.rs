//! Per-request flow: history read, orchestration loop, turn append.

use std::sync::Arc;

use tracing::info;

use crate::agent::{Agent, Conversation, LoopSettings, PromptBuilder};
use crate::config::DocentConfig;
use crate::error::DocentError;
use crate::provider::ModelProvider;
use crate::search::{ContentIndex, SearchFanout, SearchTool, WebSearch};
use crate::session::{RecordStore, SessionPersister, SessionStore};
use crate::tools::ToolRegistry;
use crate::types::{HistoryEntry, Role};

/// Answer to one user query.
#[derive(Debug, Clone, PartialEq)]
pub struct AskReply {
    pub assistant_text: String,
    pub images: Vec<String>,
    /// System prompt, replayed history, the query, and the answer.
    pub history: Vec<HistoryEntry>,
}

/// Session-aware conversational assistant.
pub struct Assistant {
    sessions: Arc<SessionStore>,
    agent: Agent,
    prompts: PromptBuilder,
    max_images: usize,
}

impl Assistant {
    pub fn new(
        sessions: Arc<SessionStore>,
        agent: Agent,
        prompts: PromptBuilder,
        max_images: usize,
    ) -> Self {
        Self {
            sessions,
            agent,
            prompts,
            max_images,
        }
    }

    /// Wire the full stack from configuration and service clients.
    pub fn from_config(
        config: &DocentConfig,
        provider: Arc<dyn ModelProvider>,
        index: Arc<dyn ContentIndex>,
        web: Arc<dyn WebSearch>,
        records: Arc<dyn RecordStore>,
    ) -> Result<Self, DocentError> {
        let fanout = Arc::new(SearchFanout::new(index, web, config.search.clone()));
        let mut tools = ToolRegistry::new();
        tools.register_typed(SearchTool::new(fanout))?;

        let agent = Agent::new(
            provider,
            tools,
            config.localization.clone(),
            LoopSettings::for_search(&config.search),
        );
        let prompts = PromptBuilder::new(
            config.persona.clone(),
            config.localization.clone(),
            &config.search,
        );
        let persister = SessionPersister::new(
            records,
            config.storage.client_table.clone(),
            config.storage.conversation_table.clone(),
        );
        let sessions = Arc::new(SessionStore::new(persister, config.sessions.clone()));

        Ok(Self::new(sessions, agent, prompts, config.search.max_images))
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Answer `user_query` within the session, recording the exchange.
    ///
    /// Fails only for an empty query or an inactive session; model and tool
    /// failures produce the localized fallback answer.
    pub async fn ask(
        &self,
        access_token: &str,
        client_id: &str,
        user_query: &str,
        language: &str,
    ) -> Result<AskReply, DocentError> {
        let user_query = user_query.trim();
        if user_query.is_empty() {
            return Err(DocentError::InvalidArgument(
                "user_query is required".to_string(),
            ));
        }

        let system_prompt = self.prompts.system_prompt(language);
        let recent = self.sessions.recent_turns(access_token, client_id)?;
        let mut conversation = Conversation::compose(system_prompt.clone(), recent, user_query);

        let mut history: Vec<HistoryEntry> = conversation.history();
        let reply = self.agent.run_turn(language, &mut conversation).await;

        self.sessions.append_turn(
            access_token,
            client_id,
            language,
            &system_prompt,
            user_query,
            &reply.text,
        );
        info!(
            access_token,
            client_id,
            language,
            images = reply.images.len(),
            "answered query"
        );

        history.push(HistoryEntry {
            role: Role::Assistant,
            content: reply.text.clone(),
        });
        let mut images = reply.images;
        images.truncate(self.max_images);

        Ok(AskReply {
            assistant_text: reply.text,
            images,
            history,
        })
    }
}
