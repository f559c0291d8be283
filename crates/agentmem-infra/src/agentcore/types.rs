//! AgentCore Memory wire types.
//!
//! Timestamps arrive as epoch seconds (possibly fractional); RFC 3339
//! strings are accepted too.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agentmem_types::memory::{ConversationRole, MemoryEvent, MemoryRecord};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub actor_id: String,
    pub session_id: String,
    pub event_timestamp: f64,
    pub payload: Vec<PayloadItem>,
    pub client_token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayloadItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversational: Option<Conversational>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversational {
    pub content: ConversationalContent,
    pub role: ConversationRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationalContent {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventResponse {
    pub event: WireEvent,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEvent {
    pub event_id: String,
    pub event_timestamp: WireTimestamp,
    #[serde(default)]
    pub payload: Vec<PayloadItem>,
}

impl WireEvent {
    /// The first conversational payload as a domain event. Events that
    /// carry only blobs yield `None`.
    pub fn into_domain(self) -> Option<MemoryEvent> {
        let conversational = self
            .payload
            .into_iter()
            .find_map(|item| item.conversational)?;
        Some(MemoryEvent {
            event_id: self.event_id,
            event_timestamp: self.event_timestamp.into_datetime(),
            role: conversational.role,
            text: conversational.content.text,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsRequest {
    pub include_payloads: bool,
    pub max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsResponse {
    #[serde(default)]
    pub events: Vec<WireEvent>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveRecordsRequest {
    pub namespace: String,
    pub search_criteria: SearchCriteria,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    pub search_query: String,
    pub top_k: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveRecordsResponse {
    #[serde(default)]
    pub memory_record_summaries: Vec<WireRecordSummary>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRecordSummary {
    pub memory_record_id: String,
    pub content: ConversationalContent,
    #[serde(default)]
    pub namespaces: Vec<String>,
    pub score: Option<f64>,
}

impl From<WireRecordSummary> for MemoryRecord {
    fn from(summary: WireRecordSummary) -> Self {
        MemoryRecord {
            record_id: summary.memory_record_id,
            text: summary.content.text,
            namespaces: summary.namespaces,
            score: summary.score,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireTimestamp {
    EpochSeconds(f64),
    Rfc3339(DateTime<Utc>),
}

impl WireTimestamp {
    pub fn into_datetime(self) -> DateTime<Utc> {
        match self {
            WireTimestamp::EpochSeconds(secs) => {
                DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
                    .unwrap_or_default()
            }
            WireTimestamp::Rfc3339(at) => at,
        }
    }
}

/// Epoch seconds with millisecond precision.
pub fn epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}
