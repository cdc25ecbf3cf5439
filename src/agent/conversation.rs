//! Ordered message log for one turn of the orchestration loop.

use crate::types::{HistoryEntry, ModelMessage, Role};

/// Append-only conversation log.
///
/// The only removal is [`rollback_last`](Self::rollback_last), used to drop a
/// tool-call message whose round was rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<ModelMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a conversation: system prompt, replayed history, then the user's message.
    pub fn compose(
        system_prompt: impl Into<String>,
        history: impl IntoIterator<Item = HistoryEntry>,
        user_text: impl Into<String>,
    ) -> Self {
        let mut messages = vec![ModelMessage::system(system_prompt)];
        messages.extend(history.into_iter().map(ModelMessage::from));
        messages.push(ModelMessage::user(user_text));
        Self { messages }
    }

    pub fn push(&mut self, message: ModelMessage) {
        self.messages.push(message);
    }

    /// Remove and return the most recent message.
    pub fn rollback_last(&mut self) -> Option<ModelMessage> {
        self.messages.pop()
    }

    pub fn messages(&self) -> &[ModelMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages as plain role/content entries, skipping tool traffic.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.messages
            .iter()
            .filter(|m| m.role != Role::Tool && m.tool_calls().is_empty())
            .map(|m| HistoryEntry {
                role: m.role,
                content: m.text(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AgentToolCall;

    #[test]
    fn compose_orders_messages() {
        let history = vec![
            HistoryEntry {
                role: Role::User,
                content: "hi".into(),
            },
            HistoryEntry {
                role: Role::Assistant,
                content: "hello".into(),
            },
        ];
        let conv = Conversation::compose("sys", history, "what now?");
        let roles: Vec<Role> = conv.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(conv.messages()[3].text(), "what now?");
    }

    #[test]
    fn rollback_removes_only_last() {
        let mut conv = Conversation::compose("sys", Vec::new(), "q");
        let call = AgentToolCall {
            id: "c1".into(),
            name: "search".into(),
            arguments: serde_json::json!({}),
        };
        conv.push(ModelMessage::assistant_tool_calls("", &[call]));
        let removed = conv.rollback_last().unwrap();
        assert_eq!(removed.tool_calls().len(), 1);
        assert_eq!(conv.len(), 2);
    }

    #[test]
    fn history_skips_tool_traffic() {
        let mut conv = Conversation::compose("sys", Vec::new(), "q");
        let call = AgentToolCall {
            id: "c1".into(),
            name: "search".into(),
            arguments: serde_json::json!({ "query": "q" }),
        };
        conv.push(ModelMessage::assistant_tool_calls("", &[call]));
        conv.push(ModelMessage::tool_result("c1", "search", "results"));
        conv.push(ModelMessage::assistant("answer"));
        let history = conv.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[2].content, "answer");
    }
}
