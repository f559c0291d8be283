//! In-process doubles for the provider and memory ports, shared by the unit
//! tests of this crate.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use agentmem_types::error::MemoryError;
use agentmem_types::llm::{
    ContentBlock, ConverseRequest, ConverseResponse, LlmError, Message, MessageRole, StopReason,
    Usage,
};
use agentmem_types::memory::{MemoryEvent, MemoryRecord, NewMemoryEvent, RetrievalQuery};

use crate::llm::provider::LlmProvider;
use crate::memory::client::MemoryClient;

#[derive(Default)]
struct MemoryState {
    events: Vec<(String, String, String, MemoryEvent)>,
    records: HashMap<String, Vec<MemoryRecord>>,
    retrieval_queries: Vec<RetrievalQuery>,
    fail_retrieval: bool,
}

/// Memory client backed by a vector; clones share state.
#[derive(Clone, Default)]
pub struct InMemoryMemoryClient {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryMemoryClient {
    pub fn with_record(self, namespace: &str, text: &str, score: Option<f64>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let records = state.records.entry(namespace.to_string()).or_default();
            let record_id = format!("rec-{}", records.len());
            records.push(MemoryRecord {
                record_id,
                text: text.to_string(),
                namespaces: vec![namespace.to_string()],
                score,
            });
        }
        self
    }

    pub fn failing_retrieval(self) -> Self {
        self.state.lock().unwrap().fail_retrieval = true;
        self
    }

    pub fn seed_event(&self, memory_id: &str, actor_id: &str, session_id: &str, event: MemoryEvent) {
        self.state.lock().unwrap().events.push((
            memory_id.to_string(),
            actor_id.to_string(),
            session_id.to_string(),
            event,
        ));
    }

    pub fn events(&self) -> Vec<MemoryEvent> {
        self.state
            .lock()
            .unwrap()
            .events
            .iter()
            .map(|(_, _, _, event)| event.clone())
            .collect()
    }

    pub fn retrieval_queries(&self) -> Vec<RetrievalQuery> {
        self.state.lock().unwrap().retrieval_queries.clone()
    }
}

impl MemoryClient for InMemoryMemoryClient {
    async fn create_event(
        &self,
        memory_id: &str,
        event: &NewMemoryEvent,
    ) -> Result<MemoryEvent, MemoryError> {
        let mut state = self.state.lock().unwrap();
        let stored = MemoryEvent {
            event_id: format!("evt-{}", state.events.len()),
            event_timestamp: event.timestamp,
            role: event.role,
            text: event.text.clone(),
        };
        state.events.push((
            memory_id.to_string(),
            event.actor_id.clone(),
            event.session_id.clone(),
            stored.clone(),
        ));
        Ok(stored)
    }

    async fn list_events(
        &self,
        memory_id: &str,
        actor_id: &str,
        session_id: &str,
        max_results: Option<u32>,
    ) -> Result<Vec<MemoryEvent>, MemoryError> {
        let state = self.state.lock().unwrap();
        let limit = max_results.map(|m| m as usize).unwrap_or(usize::MAX);
        // Newest first, like the service.
        Ok(state
            .events
            .iter()
            .rev()
            .filter(|(m, a, s, _)| m == memory_id && a == actor_id && s == session_id)
            .map(|(_, _, _, event)| event.clone())
            .take(limit)
            .collect())
    }

    async fn retrieve_memory_records(
        &self,
        _memory_id: &str,
        query: &RetrievalQuery,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        let mut state = self.state.lock().unwrap();
        state.retrieval_queries.push(query.clone());
        if state.fail_retrieval {
            return Err(MemoryError::Throttled);
        }
        Ok(state
            .records
            .get(&query.namespace)
            .map(|records| records.iter().take(query.top_k as usize).cloned().collect())
            .unwrap_or_default())
    }
}

/// Provider replaying queued responses; clones share state.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    responses: Arc<Mutex<VecDeque<Result<ConverseResponse, LlmError>>>>,
    requests: Arc<Mutex<Vec<ConverseRequest>>>,
}

impl ScriptedProvider {
    pub fn reply(self, text: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(text_response(text, StopReason::EndTurn)));
        self
    }

    pub fn tool_call(self, id: &str, name: &str, input: serde_json::Value) -> Self {
        self.responses.lock().unwrap().push_back(Ok(ConverseResponse {
            message: Message {
                role: MessageRole::Assistant,
                content: vec![ContentBlock::ToolUse {
                    id: id.to_string(),
                    name: name.to_string(),
                    input,
                }],
            },
            stop_reason: StopReason::ToolUse,
            usage: Usage {
                input_tokens: 10,
                output_tokens: 5,
            },
        }));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(LlmError::Provider {
                message: message.to_string(),
            }));
        self
    }

    pub fn requests(&self) -> Vec<ConverseRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn text_response(text: &str, stop_reason: StopReason) -> ConverseResponse {
    ConverseResponse {
        message: Message::assistant(text),
        stop_reason,
        usage: Usage {
            input_tokens: 12,
            output_tokens: 7,
        },
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn converse(&self, request: &ConverseRequest) -> Result<ConverseResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(text_response("Hi there!", StopReason::EndTurn)))
    }
}

pub fn event(id: &str, seconds_ago: i64, role: agentmem_types::memory::ConversationRole, text: &str) -> MemoryEvent {
    MemoryEvent {
        event_id: id.to_string(),
        event_timestamp: Utc::now() - chrono::Duration::seconds(seconds_ago),
        role,
        text: text.to_string(),
    }
}
