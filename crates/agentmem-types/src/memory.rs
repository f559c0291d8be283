//! Memory types for agentmem.
//!
//! These types model what the managed memory service stores on our behalf:
//! short-term conversational events scoped to (actor, session), and long-term
//! records extracted by the service into namespaces such as
//! `/users/{actor_id}/facts`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::{Message, MessageRole};

/// Retrieval settings for one long-term memory namespace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum number of records to fetch.
    pub top_k: u32,
    /// Records scoring below this threshold are dropped.
    pub relevance_score: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            relevance_score: 0.5,
        }
    }
}

/// Binding of an agent to a memory resource, actor and session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    pub memory_id: String,
    pub session_id: String,
    pub actor_id: String,
    /// Namespace -> retrieval settings.
    pub retrieval: BTreeMap<String, RetrievalConfig>,
}

impl MemoryConfig {
    /// Config retrieving the actor's facts and preferences namespaces.
    pub fn for_actor(
        memory_id: impl Into<String>,
        actor_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        let actor_id = actor_id.into();
        let mut retrieval = BTreeMap::new();
        retrieval.insert(format!("/users/{actor_id}/facts"), RetrievalConfig::default());
        retrieval.insert(
            format!("/users/{actor_id}/preferences"),
            RetrievalConfig::default(),
        );
        Self {
            memory_id: memory_id.into(),
            session_id: session_id.into(),
            actor_id,
            retrieval,
        }
    }
}

/// Role recorded on a conversational memory event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationRole {
    User,
    Assistant,
    Tool,
    Other,
}

impl fmt::Display for ConversationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationRole::User => write!(f, "USER"),
            ConversationRole::Assistant => write!(f, "ASSISTANT"),
            ConversationRole::Tool => write!(f, "TOOL"),
            ConversationRole::Other => write!(f, "OTHER"),
        }
    }
}

impl FromStr for ConversationRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USER" => Ok(ConversationRole::User),
            "ASSISTANT" => Ok(ConversationRole::Assistant),
            "TOOL" => Ok(ConversationRole::Tool),
            "OTHER" => Ok(ConversationRole::Other),
            other => Err(format!("invalid conversation role: '{other}'")),
        }
    }
}

impl From<MessageRole> for ConversationRole {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => ConversationRole::User,
            MessageRole::Assistant => ConversationRole::Assistant,
        }
    }
}

/// A conversational turn to be written to short-term memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMemoryEvent {
    pub actor_id: String,
    pub session_id: String,
    pub role: ConversationRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// A conversational event stored in short-term memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEvent {
    pub event_id: String,
    pub event_timestamp: DateTime<Utc>,
    pub role: ConversationRole,
    pub text: String,
}

impl MemoryEvent {
    /// Convert to a conversation message. Tool and other roles have no
    /// conversation counterpart and are skipped.
    pub fn to_message(&self) -> Option<Message> {
        match self.role {
            ConversationRole::User => Some(Message::user(self.text.clone())),
            ConversationRole::Assistant => Some(Message::assistant(self.text.clone())),
            ConversationRole::Tool | ConversationRole::Other => None,
        }
    }
}

/// A long-term record extracted by the memory service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub record_id: String,
    pub text: String,
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

impl MemoryRecord {
    /// Whether the record clears `threshold`. Unscored records pass.
    pub fn is_relevant(&self, threshold: f64) -> bool {
        self.score.is_none_or(|score| score >= threshold)
    }
}

/// Long-term retrieval query against one namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalQuery {
    pub namespace: String,
    pub search_query: String,
    pub top_k: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_actor_builds_user_namespaces() {
        let config = MemoryConfig::for_actor("mem-1", "alice", "sess-1");
        let namespaces: Vec<&str> = config.retrieval.keys().map(String::as_str).collect();
        assert_eq!(
            namespaces,
            vec!["/users/alice/facts", "/users/alice/preferences"]
        );
        for retrieval in config.retrieval.values() {
            assert_eq!(retrieval.top_k, 3);
            assert!((retrieval.relevance_score - 0.5).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_conversation_role_wire_names() {
        assert_eq!(
            serde_json::to_string(&ConversationRole::Assistant).unwrap(),
            "\"ASSISTANT\""
        );
        assert_eq!("user".parse::<ConversationRole>().unwrap(), ConversationRole::User);
    }

    #[test]
    fn test_record_relevance() {
        let mut record = MemoryRecord {
            record_id: "r1".into(),
            text: "likes chocolate".into(),
            namespaces: vec![],
            score: Some(0.49),
        };
        assert!(!record.is_relevant(0.5));
        record.score = Some(0.5);
        assert!(record.is_relevant(0.5));
        record.score = None;
        assert!(record.is_relevant(0.5));
    }

    #[test]
    fn test_tool_events_have_no_message() {
        let event = MemoryEvent {
            event_id: "e1".into(),
            event_timestamp: Utc::now(),
            role: ConversationRole::Tool,
            text: "42".into(),
        };
        assert!(event.to_message().is_none());
    }
}
