//! Shared test helpers: scripted model provider and mock search backends.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use docent::config::SessionSettings;
use docent::error::DocentError;
use docent::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use docent::search::{ContentIndex, LocalResult, WebResult, WebSearch};
use docent::session::{MemoryRecordStore, SessionPersister, SessionStore};
use docent::types::*;

/// A provider that replays queued responses and records every request.
pub struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a final text answer.
    pub fn queue_text(&self, text: &str) {
        self.responses.lock().unwrap().push(ProviderResponse {
            text: text.to_string(),
            usage: Usage {
                input_tokens: 10,
                output_tokens: 20,
                total_tokens: 30,
            },
            tool_calls: vec![],
            finish_reason: Some(FinishReason::Stop),
        });
    }

    /// Queue a response blocked by content policy.
    pub fn queue_filtered(&self) {
        self.responses.lock().unwrap().push(ProviderResponse {
            finish_reason: Some(FinishReason::ContentFilter),
            ..Default::default()
        });
    }

    /// Queue a single tool call.
    pub fn queue_tool_call(&self, id: &str, name: &str, args: serde_json::Value) {
        self.queue_tool_calls(vec![(id, name, args)]);
    }

    /// Queue one response requesting several tool calls.
    pub fn queue_tool_calls(&self, calls: Vec<(&str, &str, serde_json::Value)>) {
        self.responses.lock().unwrap().push(ProviderResponse {
            text: String::new(),
            usage: Usage {
                input_tokens: 8,
                output_tokens: 2,
                total_tokens: 10,
            },
            tool_calls: calls
                .into_iter()
                .map(|(id, name, arguments)| AgentToolCall {
                    id: id.to_string(),
                    name: name.to_string(),
                    arguments,
                })
                .collect(),
            finish_reason: Some(FinishReason::ToolCalls),
        });
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn max_tokens(&self) -> Vec<Option<u32>> {
        self.requests()
            .iter()
            .map(|r| r.settings.max_tokens)
            .collect()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }

    async fn generate_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, DocentError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(ProviderResponse {
                text: "Mock response".to_string(),
                finish_reason: Some(FinishReason::Stop),
                ..Default::default()
            });
        }
        Ok(responses.remove(0))
    }
}

/// Content index returning fixed results, or failing.
pub struct MockIndex {
    results: Result<Vec<LocalResult>, String>,
    delay: Option<Duration>,
    honor_cap: bool,
    pub queries: Mutex<Vec<String>>,
}

impl MockIndex {
    fn build(results: Result<Vec<LocalResult>, String>) -> Self {
        Self {
            results,
            delay: None,
            honor_cap: true,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_results(results: Vec<LocalResult>) -> Arc<Self> {
        Arc::new(Self::build(Ok(results)))
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self::build(Err(message.to_string())))
    }

    /// Answers only after `delay`.
    pub fn slow(results: Vec<LocalResult>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::build(Ok(results))
        })
    }

    /// Returns every result regardless of the requested cap.
    pub fn ignoring_cap(results: Vec<LocalResult>) -> Arc<Self> {
        Arc::new(Self {
            honor_cap: false,
            ..Self::build(Ok(results))
        })
    }
}

#[async_trait]
impl ContentIndex for MockIndex {
    async fn search(&self, query: &str, cap: usize) -> Result<Vec<LocalResult>, DocentError> {
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let cap = if self.honor_cap { cap } else { usize::MAX };
        match &self.results {
            Ok(results) => Ok(results.iter().take(cap).cloned().collect()),
            Err(message) => Err(DocentError::api(503, message.clone())),
        }
    }
}

/// Web search returning fixed results, or failing.
pub struct MockWeb {
    results: Result<Vec<WebResult>, String>,
    delay: Option<Duration>,
    pub queries: Mutex<Vec<String>>,
}

impl MockWeb {
    fn build(results: Result<Vec<WebResult>, String>) -> Self {
        Self {
            results,
            delay: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_results(results: Vec<WebResult>) -> Arc<Self> {
        Arc::new(Self::build(Ok(results)))
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self::build(Err(message.to_string())))
    }

    /// Answers only after `delay`.
    pub fn slow(results: Vec<WebResult>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::build(Ok(results))
        })
    }
}

#[async_trait]
impl WebSearch for MockWeb {
    async fn search(&self, query: &str, cap: usize) -> Result<Vec<WebResult>, DocentError> {
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.results {
            Ok(results) => Ok(results.iter().take(cap).cloned().collect()),
            Err(message) => Err(DocentError::api(504, message.clone())),
        }
    }
}

pub fn local_hit(summary: &str, details: &str, score: f64, images: &[&str]) -> LocalResult {
    LocalResult {
        summary: summary.to_string(),
        details: details.to_string(),
        score: Some(score),
        images: images.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn web_hit(title: &str, snippet: &str) -> WebResult {
    WebResult {
        title: title.to_string(),
        snippet: snippet.to_string(),
    }
}

/// A session store over an in-memory record store.
pub fn memory_sessions(settings: SessionSettings) -> (Arc<MemoryRecordStore>, SessionStore) {
    let records = Arc::new(MemoryRecordStore::new());
    let persister = SessionPersister::new(records.clone(), "clients", "conversations");
    (records, SessionStore::new(persister, settings))
}
