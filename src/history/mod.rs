//! Conversation state.
//!
//! Conversations live in memory for one dashboard session and never reach
//! the model provider; the query flow is single-turn by contract. The
//! registry owns their lifecycle: created at session start, dropped at
//! session end.

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::llm::ChatMessage;

/// Append-only ordered sequence of role/content pairs.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: &str, content: &str) {
        self.messages.push(ChatMessage {
            role: role.to_string(),
            content: content.to_string(),
        });
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// In-memory session registry keyed by session id.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Conversation>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session with an empty conversation; returns its id.
    pub async fn create(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), Conversation::new());
        session_id
    }

    pub async fn exists(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    pub async fn messages(&self, session_id: &str) -> Option<Vec<ChatMessage>> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|conversation| conversation.messages().to_vec())
    }

    /// Append a completed user/assistant exchange. Returns false when the
    /// session is unknown.
    pub async fn append_turn(&self, session_id: &str, user: &str, assistant: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session_id) {
            Some(conversation) => {
                conversation.push("user", user);
                conversation.push("assistant", assistant);
                true
            }
            None => false,
        }
    }

    /// End a session, dropping its conversation.
    pub async fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_preserves_order() {
        let mut conversation = Conversation::new();
        conversation.push("user", "first");
        conversation.push("assistant", "second");
        conversation.push("user", "third");

        let roles: Vec<&str> = conversation
            .messages()
            .iter()
            .map(|m| m.role.as_str())
            .collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);

        conversation.clear();
        assert!(conversation.is_empty());
    }

    #[tokio::test]
    async fn sessions_are_created_appended_and_removed() {
        let registry = SessionRegistry::new();

        let id = registry.create().await;
        assert!(registry.exists(&id).await);
        assert!(registry.messages(&id).await.unwrap().is_empty());

        assert!(registry.append_turn(&id, "hello", "hi there").await);
        let messages = registry.messages(&id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "hello");
        assert_eq!(messages[1].role, "assistant");

        assert!(registry.remove(&id).await);
        assert!(!registry.exists(&id).await);
        assert!(registry.messages(&id).await.is_none());
    }

    #[tokio::test]
    async fn unknown_sessions_reject_turns() {
        let registry = SessionRegistry::new();
        assert!(!registry.append_turn("missing", "a", "b").await);
        assert!(!registry.remove("missing").await);
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let registry = SessionRegistry::new();
        let first = registry.create().await;
        let second = registry.create().await;
        assert_ne!(first, second);

        registry.append_turn(&first, "q", "a").await;
        assert_eq!(registry.messages(&first).await.unwrap().len(), 2);
        assert!(registry.messages(&second).await.unwrap().is_empty());
    }
}
