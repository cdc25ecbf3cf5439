//! End-to-end request flow: history, orchestration loop, search, and turn append.

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use docent::agent::GROUNDING_INSTRUCTION;
use docent::assistant::Assistant;
use docent::config::{DocentConfig, SearchSettings};
use docent::error::DocentError;
use docent::session::MemoryRecordStore;
use docent::types::Role;

use common::{local_hit, MockIndex, MockWeb, ScriptedProvider};

fn local_only_config() -> DocentConfig {
    DocentConfig {
        search: SearchSettings {
            internet_search: 0,
            ..SearchSettings::default()
        },
        ..DocentConfig::default()
    }
}

fn assistant(
    config: &DocentConfig,
    provider: Arc<ScriptedProvider>,
    index: Arc<MockIndex>,
    web: Arc<MockWeb>,
) -> Assistant {
    Assistant::from_config(config, provider, index, web, Arc::new(MemoryRecordStore::new()))
        .unwrap()
}

#[tokio::test]
async fn answers_from_local_search_and_records_one_turn() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.queue_tool_call("call_1", "search", json!({ "query": "opening hours" }));
    provider.queue_text("We are open from 9 to 5.");
    let index = MockIndex::with_results(vec![local_hit(
        "Opening hours",
        "Daily from 9 to 5",
        2.5,
        &["https://cdn.example/front.jpg"],
    )]);
    let web = MockWeb::with_results(Vec::new());
    let assistant = assistant(&local_only_config(), provider.clone(), index, web.clone());

    let client_id = assistant.sessions().create_session("tok");
    let reply = assistant
        .ask("tok", &client_id, "What are your hours?", "en-US")
        .await
        .unwrap();

    assert_eq!(reply.assistant_text, "We are open from 9 to 5.");
    assert_eq!(reply.images, vec!["https://cdn.example/front.jpg".to_string()]);
    assert!(web.queries.lock().unwrap().is_empty());

    let grounded = &provider.requests()[1].messages;
    let tool_msg = &grounded[grounded.len() - 2];
    assert_eq!(tool_msg.role, Role::Tool);
    assert!(tool_msg.text().contains("Daily from 9 to 5"));
    assert!(!tool_msg.text().contains("Internet Search Results"));
    assert_eq!(grounded.last().unwrap().text(), GROUNDING_INSTRUCTION);

    let session = assistant.sessions().snapshot("tok", &client_id).unwrap();
    assert_eq!(session.turns.len(), 1);
    assert_eq!(session.turns[0].user_text, "What are your hours?");
    assert_eq!(session.turns[0].assistant_text, "We are open from 9 to 5.");
    assert_eq!(session.language, "en-US");

    let roles: Vec<Role> = reply.history.iter().map(|e| e.role).collect();
    assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
}

#[tokio::test]
async fn previous_turns_are_replayed() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.queue_text("Hello!");
    provider.queue_text("Still here.");
    let assistant = assistant(
        &DocentConfig::default(),
        provider.clone(),
        MockIndex::with_results(Vec::new()),
        MockWeb::with_results(Vec::new()),
    );

    assistant.ask("tok", "c1", "hi", "vi-VN").await.unwrap();
    let reply = assistant.ask("tok", "c1", "are you there?", "vi-VN").await.unwrap();

    let contents: Vec<String> = provider.requests()[1]
        .messages
        .iter()
        .skip(1)
        .map(|m| m.text())
        .collect();
    assert_eq!(contents, vec!["hi", "Hello!", "are you there?"]);
    assert_eq!(reply.history.len(), 5);
    assert!(reply.history[0].content.contains("Vietnamese"));
}

#[tokio::test]
async fn blank_query_is_rejected() {
    let provider = Arc::new(ScriptedProvider::new());
    let assistant = assistant(
        &DocentConfig::default(),
        provider.clone(),
        MockIndex::with_results(Vec::new()),
        MockWeb::with_results(Vec::new()),
    );

    let err = assistant.ask("tok", "c1", "   ", "en-US").await.unwrap_err();
    assert!(matches!(err, DocentError::InvalidArgument(_)));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn closed_session_is_rejected_without_recording() {
    let provider = Arc::new(ScriptedProvider::new());
    let assistant = assistant(
        &DocentConfig::default(),
        provider.clone(),
        MockIndex::with_results(Vec::new()),
        MockWeb::with_results(Vec::new()),
    );
    let client_id = assistant.sessions().create_session("tok");
    assistant.sessions().close_session("tok", &client_id).unwrap();

    let err = assistant
        .ask("tok", &client_id, "hello", "en-US")
        .await
        .unwrap_err();
    assert!(matches!(err, DocentError::Inactive { .. }));
    assert_eq!(provider.calls(), 0);
    assert!(assistant
        .sessions()
        .snapshot("tok", &client_id)
        .unwrap()
        .turns
        .is_empty());
}

#[tokio::test]
async fn images_are_capped() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.queue_tool_call("call_1", "search", json!({ "query": "rooms" }));
    provider.queue_text("Here are our rooms.");
    let index = MockIndex::with_results(vec![
        local_hit("Room A", "a", 3.1, &["1.jpg", "2.jpg"]),
        local_hit("Room B", "b", 2.9, &["3.jpg", "4.jpg"]),
    ]);
    let assistant = assistant(
        &local_only_config(),
        provider,
        index,
        MockWeb::with_results(Vec::new()),
    );

    let reply = assistant.ask("tok", "c1", "Show rooms", "en-US").await.unwrap();

    assert_eq!(reply.images, vec!["1.jpg", "2.jpg", "3.jpg"]);
}

#[tokio::test]
async fn model_failure_still_records_fallback_turn() {
    let provider = Arc::new(ScriptedProvider::new());
    for _ in 0..4 {
        provider.queue_filtered();
    }
    let config = DocentConfig::default();
    let assistant = assistant(
        &config,
        provider,
        MockIndex::with_results(Vec::new()),
        MockWeb::with_results(Vec::new()),
    );

    let reply = assistant.ask("tok", "c1", "hello", "en-US").await.unwrap();

    assert_eq!(reply.assistant_text, config.localization.fallback("en-US"));
    assert!(reply.images.is_empty());
    let session = assistant.sessions().snapshot("tok", "c1").unwrap();
    assert_eq!(session.turns.len(), 1);
}

#[tokio::test]
async fn sessions_flush_to_record_store() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.queue_text("Hi!");
    let records = Arc::new(MemoryRecordStore::new());
    let config = DocentConfig::default();
    let assistant = Assistant::from_config(
        &config,
        provider,
        MockIndex::with_results(Vec::new()),
        MockWeb::with_results(Vec::new()),
        records.clone(),
    )
    .unwrap();

    assistant.ask("tok", "c1", "hello", "en-US").await.unwrap();
    let report = assistant.sessions().persist().await;

    assert_eq!(report.turns_written, 1);
    assert_eq!(records.count(&config.storage.conversation_table).await, 1);
    assert_eq!(records.count(&config.storage.client_table).await, 1);
}
