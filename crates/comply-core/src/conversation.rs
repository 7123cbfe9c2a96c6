//! Per-policy conversation lifecycle over the chat-history port.
//!
//! Every conversation starts with a synthetic greeting carrying a fixed id.
//! The greeting is UI furniture: it is persisted with the rest of the history
//! but never sent to the gateway.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;

use crate::storage::ChatHistoryStore;
use crate::types::{ChatMessage, ChatRole, ChatTurn, Policy};

/// Fixed id of the synthetic greeting turn.
pub const GREETING_MESSAGE_ID: &str = "greeting";

pub struct ConversationManager {
    store: Arc<dyn ChatHistoryStore>,
}

impl ConversationManager {
    pub fn new(store: Arc<dyn ChatHistoryStore>) -> Self {
        Self { store }
    }

    pub fn greeting(policy: &Policy) -> ChatMessage {
        ChatMessage {
            id: GREETING_MESSAGE_ID.to_string(),
            role: ChatRole::Model,
            text: format!(
                "Hello! I am the policy assistant for \"{}\".\n\n\
                 I can help you understand compliance requirements, check specific rules, \
                 or clarify procedures. What would you like to know?",
                policy.title
            ),
            timestamp: Utc::now(),
        }
    }

    /// Load the persisted history for a policy, seeding a fresh greeting when
    /// none exists (first contact, or the policy context just changed).
    pub async fn open_conversation(&self, policy: &Policy) -> Result<Vec<ChatMessage>> {
        match self.store.load(&policy.id).await? {
            Some(messages) if !messages.is_empty() => Ok(messages),
            _ => Ok(vec![Self::greeting(policy)]),
        }
    }

    /// Append a turn and sync the whole history to the store. The sync is a
    /// side effect of the state update, not a transaction with the send: a
    /// crash between response receipt and this call loses the latest turn.
    pub async fn record_turn(
        &self,
        policy_id: &str,
        messages: &mut Vec<ChatMessage>,
        message: ChatMessage,
    ) -> Result<()> {
        messages.push(message);
        self.store.save(policy_id, messages).await
    }

    /// Drop the persisted history and restart from a fresh greeting.
    pub async fn clear(&self, policy: &Policy) -> Result<Vec<ChatMessage>> {
        self.store.clear(&policy.id).await?;
        Ok(vec![Self::greeting(policy)])
    }

    /// History as sent to the gateway: greeting turns stripped, text only.
    pub fn wire_history(messages: &[ChatMessage]) -> Vec<ChatTurn> {
        messages
            .iter()
            .filter(|m| m.id != GREETING_MESSAGE_ID)
            .map(|m| ChatTurn {
                role: m.role,
                text: m.text.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ChatHistoryStore as _, LocalChatHistoryStore};

    async fn manager(dir: &std::path::Path) -> ConversationManager {
        let store = Arc::new(LocalChatHistoryStore::new(dir));
        store.open().await.unwrap();
        ConversationManager::new(store)
    }

    #[test]
    fn wire_history_excludes_the_greeting() {
        let policy = Policy::new("p1", "Dock Safety");
        let messages = vec![
            ConversationManager::greeting(&policy),
            ChatMessage::user("Are chocks required?"),
            ChatMessage::model("Yes, before loading begins."),
        ];

        let wire = ConversationManager::wire_history(&messages);
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[0].role, ChatRole::User);
        assert_eq!(wire[1].role, ChatRole::Model);
    }

    #[tokio::test]
    async fn first_contact_seeds_a_greeting() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path()).await;
        let policy = Policy::new("p1", "Dock Safety");

        let messages = manager.open_conversation(&policy).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, GREETING_MESSAGE_ID);
        assert!(messages[0].text.contains("Dock Safety"));
    }

    #[tokio::test]
    async fn recorded_turns_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path()).await;
        let policy = Policy::new("p1", "Dock Safety");

        let mut messages = manager.open_conversation(&policy).await.unwrap();
        manager
            .record_turn(&policy.id, &mut messages, ChatMessage::user("hi"))
            .await
            .unwrap();

        let reloaded = manager.open_conversation(&policy).await.unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded[1].text, "hi");
    }

    #[tokio::test]
    async fn clear_resets_to_a_single_greeting() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path()).await;
        let policy = Policy::new("p1", "Dock Safety");

        let mut messages = manager.open_conversation(&policy).await.unwrap();
        manager
            .record_turn(&policy.id, &mut messages, ChatMessage::user("hi"))
            .await
            .unwrap();

        let cleared = manager.clear(&policy).await.unwrap();
        assert_eq!(cleared.len(), 1);
        assert_eq!(cleared[0].id, GREETING_MESSAGE_ID);

        let reloaded = manager.open_conversation(&policy).await.unwrap();
        assert_eq!(reloaded.len(), 1);
    }
}
