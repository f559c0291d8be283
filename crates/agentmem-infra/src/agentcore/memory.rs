//! AgentCoreMemoryClient -- [`MemoryClient`] over the AgentCore Memory data plane.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use agentmem_core::memory::client::MemoryClient;
use agentmem_types::error::MemoryError;
use agentmem_types::memory::{MemoryEvent, MemoryRecord, NewMemoryEvent, RetrievalQuery};

use super::DataPlane;
use super::types::{
    Conversational, ConversationalContent, CreateEventRequest, CreateEventResponse,
    ListEventsRequest, ListEventsResponse, PayloadItem, RetrieveRecordsRequest,
    RetrieveRecordsResponse, SearchCriteria, epoch_seconds,
};
use crate::aws::CredentialsProvider;
use crate::aws::sigv4::uri_encode;

/// Largest page the ListEvents API returns.
const MAX_PAGE: u32 = 100;

/// Memory client for one region.
#[derive(Debug, Clone)]
pub struct AgentCoreMemoryClient {
    plane: DataPlane,
}

impl AgentCoreMemoryClient {
    pub fn new(
        credentials: Arc<CredentialsProvider>,
        region: &str,
        endpoint: Option<&str>,
    ) -> Result<Self, MemoryError> {
        Ok(Self {
            plane: DataPlane::new(credentials, region, endpoint).map_err(MemoryError::Request)?,
        })
    }

    pub fn region(&self) -> &str {
        self.plane.region()
    }

    async fn call<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, MemoryError> {
        let body = serde_json::to_vec(body).map_err(|e| MemoryError::Request(e.to_string()))?;
        let response = self
            .plane
            .post(path, body, &[])
            .await
            .map_err(MemoryError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, path = %path, "AgentCore Memory error response");
            return Err(match status.as_u16() {
                404 => MemoryError::NotFound(body),
                429 => MemoryError::Throttled,
                s => MemoryError::Service { status: s, body },
            });
        }

        response
            .json()
            .await
            .map_err(|e| MemoryError::Deserialization(e.to_string()))
    }
}

impl MemoryClient for AgentCoreMemoryClient {
    async fn create_event(
        &self,
        memory_id: &str,
        event: &NewMemoryEvent,
    ) -> Result<MemoryEvent, MemoryError> {
        let request = CreateEventRequest {
            actor_id: event.actor_id.clone(),
            session_id: event.session_id.clone(),
            event_timestamp: epoch_seconds(event.timestamp),
            payload: vec![PayloadItem {
                conversational: Some(Conversational {
                    content: ConversationalContent {
                        text: event.text.clone(),
                    },
                    role: event.role,
                }),
            }],
            client_token: Uuid::new_v4().to_string(),
        };
        let path = format!("/memories/{}/events", uri_encode(memory_id, true));
        let response: CreateEventResponse = self.call(&path, &request).await?;

        let event_id = response.event.event_id.clone();
        tracing::debug!(event_id = %event_id, role = %event.role, "Created memory event");
        Ok(response.event.into_domain().unwrap_or_else(|| MemoryEvent {
            event_id,
            event_timestamp: event.timestamp,
            role: event.role,
            text: event.text.clone(),
        }))
    }

    async fn list_events(
        &self,
        memory_id: &str,
        actor_id: &str,
        session_id: &str,
        max_results: Option<u32>,
    ) -> Result<Vec<MemoryEvent>, MemoryError> {
        let path = format!(
            "/memories/{}/actor/{}/sessions/{}",
            uri_encode(memory_id, true),
            uri_encode(actor_id, true),
            uri_encode(session_id, true),
        );
        let limit = max_results.map(|m| m as usize);
        let mut events = Vec::new();
        let mut next_token = None;

        loop {
            let remaining = limit.map(|l| l.saturating_sub(events.len()));
            let page_size = remaining
                .map(|r| r.min(MAX_PAGE as usize) as u32)
                .unwrap_or(MAX_PAGE);
            let request = ListEventsRequest {
                include_payloads: true,
                max_results: page_size,
                next_token: next_token.take(),
            };
            let page: ListEventsResponse = self.call(&path, &request).await?;
            events.extend(page.events.into_iter().filter_map(|e| e.into_domain()));

            let full = limit.is_some_and(|l| events.len() >= l);
            match page.next_token {
                Some(token) if !full => next_token = Some(token),
                _ => break,
            }
        }

        if let Some(limit) = limit {
            events.truncate(limit);
        }
        Ok(events)
    }

    async fn retrieve_memory_records(
        &self,
        memory_id: &str,
        query: &RetrievalQuery,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        let request = RetrieveRecordsRequest {
            namespace: query.namespace.clone(),
            search_criteria: SearchCriteria {
                search_query: query.search_query.clone(),
                top_k: query.top_k,
            },
        };
        let path = format!("/memories/{}/retrieve", uri_encode(memory_id, true));
        let response: RetrieveRecordsResponse = self.call(&path, &request).await?;
        Ok(response
            .memory_record_summaries
            .into_iter()
            .map(MemoryRecord::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentmem_types::memory::ConversationRole;
    use chrono::Utc;
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::aws::AwsCredentials;

    fn client(server: &MockServer) -> AgentCoreMemoryClient {
        let credentials = Arc::new(CredentialsProvider::fixed(AwsCredentials::new(
            "AKIDEXAMPLE",
            SecretString::from("secret"),
            None,
        )));
        AgentCoreMemoryClient::new(credentials, "us-west-2", Some(&server.uri())).unwrap()
    }

    fn wire_event(id: &str, ts: f64, role: &str, text: &str) -> serde_json::Value {
        json!({
            "eventId": id,
            "eventTimestamp": ts,
            "payload": [{"conversational": {"content": {"text": text}, "role": role}}]
        })
    }

    #[tokio::test]
    async fn test_create_event_is_signed_and_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/memories/mem-1/events"))
            .and(header_exists("authorization"))
            .and(header_exists("x-amz-date"))
            .and(body_partial_json(json!({
                "actorId": "alice",
                "sessionId": "s-1",
                "payload": [{"conversational": {"content": {"text": "hello"}, "role": "USER"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "event": wire_event("evt-1", 1736000000.0, "USER", "hello")
            })))
            .expect(1)
            .mount(&server)
            .await;

        let event = client(&server)
            .create_event(
                "mem-1",
                &NewMemoryEvent {
                    actor_id: "alice".into(),
                    session_id: "s-1".into(),
                    role: ConversationRole::User,
                    text: "hello".into(),
                    timestamp: Utc::now(),
                },
            )
            .await
            .unwrap();
        assert_eq!(event.event_id, "evt-1");
        assert_eq!(event.text, "hello");
    }

    #[tokio::test]
    async fn test_list_events_follows_pages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/memories/mem-1/actor/alice/sessions/s-1"))
            .and(body_partial_json(json!({"nextToken": "page-2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "events": [wire_event("e1", 1736000000.0, "USER", "I am Alice")]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/memories/mem-1/actor/alice/sessions/s-1"))
            .and(body_partial_json(json!({"includePayloads": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "events": [
                    wire_event("e3", 1736000020.0, "ASSISTANT", "Noted"),
                    wire_event("e2", 1736000010.0, "USER", "I like chocolate")
                ],
                "nextToken": "page-2"
            })))
            .mount(&server)
            .await;

        let events = client(&server)
            .list_events("mem-1", "alice", "s-1", Some(10))
            .await
            .unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["e3", "e2", "e1"]);
    }

    #[tokio::test]
    async fn test_retrieve_records() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/memories/mem-1/retrieve"))
            .and(body_partial_json(json!({
                "namespace": "/users/alice/preferences",
                "searchCriteria": {"searchQuery": "what do I like?", "topK": 3}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "memoryRecordSummaries": [{
                    "memoryRecordId": "rec-1",
                    "content": {"text": "Likes chocolate ice cream"},
                    "memoryStrategyId": "prefs",
                    "namespaces": ["/users/alice/preferences"],
                    "createdAt": 1736000000,
                    "score": 0.82
                }]
            })))
            .mount(&server)
            .await;

        let records = client(&server)
            .retrieve_memory_records(
                "mem-1",
                &RetrievalQuery {
                    namespace: "/users/alice/preferences".into(),
                    search_query: "what do I like?".into(),
                    top_k: 3,
                },
            )
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "Likes chocolate ice cream");
        assert_eq!(records[0].score, Some(0.82));
    }

    #[tokio::test]
    async fn test_error_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/memories/missing/retrieve"))
            .respond_with(ResponseTemplate::new(404).set_body_string("ResourceNotFoundException"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/memories/busy/retrieve"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = client(&server);
        let query = RetrievalQuery {
            namespace: "/users/a/facts".into(),
            search_query: "q".into(),
            top_k: 3,
        };
        assert!(matches!(
            client.retrieve_memory_records("missing", &query).await,
            Err(MemoryError::NotFound(_))
        ));
        assert!(matches!(
            client.retrieve_memory_records("busy", &query).await,
            Err(MemoryError::Throttled)
        ));
    }
}
