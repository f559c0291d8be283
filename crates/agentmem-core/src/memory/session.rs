//! Memory session manager.
//!
//! Binds a [`BoxMemoryClient`] to one [`MemoryConfig`] and exposes the three
//! things an agent needs from managed memory: the prior turns of its session,
//! a way to record new turns, and long-term records relevant to a prompt.

use chrono::Utc;
use tracing::{debug, warn};

use agentmem_types::error::MemoryError;
use agentmem_types::llm::{Message, MessageRole};
use agentmem_types::memory::{
    ConversationRole, MemoryConfig, MemoryEvent, MemoryRecord, NewMemoryEvent, RetrievalQuery,
};

use super::box_client::BoxMemoryClient;

/// Maximum number of short-term events restored into a conversation.
const HISTORY_LIMIT: u32 = 100;

/// Long-term record recalled for a prompt, tagged with its namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct RecalledRecord {
    pub namespace: String,
    pub record: MemoryRecord,
}

/// Session-scoped view over a managed memory resource.
pub struct MemorySessionManager {
    config: MemoryConfig,
    client: BoxMemoryClient,
}

impl MemorySessionManager {
    pub fn new(config: MemoryConfig, client: BoxMemoryClient) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Restore the session's prior turns as a model-ready conversation.
    pub async fn load_history(&self) -> Result<Vec<Message>, MemoryError> {
        let mut events = self
            .client
            .list_events(
                &self.config.memory_id,
                &self.config.actor_id,
                &self.config.session_id,
                Some(HISTORY_LIMIT),
            )
            .await?;
        events.sort_by_key(|event| event.event_timestamp);

        let history = normalize_history(events.iter().filter_map(MemoryEvent::to_message));
        debug!(
            session_id = %self.config.session_id,
            events = events.len(),
            messages = history.len(),
            "Restored session history"
        );
        Ok(history)
    }

    /// Record one conversational turn.
    pub async fn append(&self, role: MessageRole, text: &str) -> Result<MemoryEvent, MemoryError> {
        let event = NewMemoryEvent {
            actor_id: self.config.actor_id.clone(),
            session_id: self.config.session_id.clone(),
            role: ConversationRole::from(role),
            text: text.to_string(),
            timestamp: Utc::now(),
        };
        self.client.create_event(&self.config.memory_id, &event).await
    }

    /// Long-term records relevant to `query` across every configured
    /// namespace. A namespace whose retrieval fails contributes nothing.
    pub async fn recall(&self, query: &str) -> Vec<RecalledRecord> {
        let mut recalled = Vec::new();
        for (namespace, retrieval) in &self.config.retrieval {
            let request = RetrievalQuery {
                namespace: namespace.clone(),
                search_query: query.to_string(),
                top_k: retrieval.top_k,
            };
            match self
                .client
                .retrieve_memory_records(&self.config.memory_id, &request)
                .await
            {
                Ok(records) => {
                    let total = records.len();
                    recalled.extend(
                        records
                            .into_iter()
                            .filter(|record| record.is_relevant(retrieval.relevance_score))
                            .map(|record| RecalledRecord {
                                namespace: namespace.clone(),
                                record,
                            }),
                    );
                    debug!(namespace = %namespace, total, "Retrieved long-term records");
                }
                Err(e) => {
                    warn!(namespace = %namespace, error = %e, "Long-term retrieval failed");
                }
            }
        }
        recalled
    }
}

/// Make a restored conversation acceptable to the model: it must start with
/// a user turn and roles must alternate. Consecutive turns of the same role
/// are merged. The result may still end on a user turn whose reply was never
/// recorded.
fn normalize_history(messages: impl IntoIterator<Item = Message>) -> Vec<Message> {
    let mut history: Vec<Message> = Vec::new();
    for message in messages {
        if history.is_empty() && message.role != MessageRole::User {
            continue;
        }
        match history.last_mut() {
            Some(last) if last.role == message.role => last.content.extend(message.content),
            _ => history.push(message),
        }
    }
    history
}
