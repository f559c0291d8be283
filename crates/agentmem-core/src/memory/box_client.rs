//! BoxMemoryClient -- object-safe dynamic dispatch wrapper for MemoryClient.
//!
//! Same blanket-impl pattern as `BoxLlmProvider`.

use std::future::Future;
use std::pin::Pin;

use agentmem_types::error::MemoryError;
use agentmem_types::memory::{MemoryEvent, MemoryRecord, NewMemoryEvent, RetrievalQuery};

use super::client::MemoryClient;

/// Object-safe version of [`MemoryClient`] with boxed futures.
pub trait MemoryClientDyn: Send + Sync {
    fn create_event_boxed<'a>(
        &'a self,
        memory_id: &'a str,
        event: &'a NewMemoryEvent,
    ) -> Pin<Box<dyn Future<Output = Result<MemoryEvent, MemoryError>> + Send + 'a>>;

    fn list_events_boxed<'a>(
        &'a self,
        memory_id: &'a str,
        actor_id: &'a str,
        session_id: &'a str,
        max_results: Option<u32>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<MemoryEvent>, MemoryError>> + Send + 'a>>;

    fn retrieve_memory_records_boxed<'a>(
        &'a self,
        memory_id: &'a str,
        query: &'a RetrievalQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<MemoryRecord>, MemoryError>> + Send + 'a>>;
}

impl<T: MemoryClient> MemoryClientDyn for T {
    fn create_event_boxed<'a>(
        &'a self,
        memory_id: &'a str,
        event: &'a NewMemoryEvent,
    ) -> Pin<Box<dyn Future<Output = Result<MemoryEvent, MemoryError>> + Send + 'a>> {
        Box::pin(self.create_event(memory_id, event))
    }

    fn list_events_boxed<'a>(
        &'a self,
        memory_id: &'a str,
        actor_id: &'a str,
        session_id: &'a str,
        max_results: Option<u32>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<MemoryEvent>, MemoryError>> + Send + 'a>> {
        Box::pin(self.list_events(memory_id, actor_id, session_id, max_results))
    }

    fn retrieve_memory_records_boxed<'a>(
        &'a self,
        memory_id: &'a str,
        query: &'a RetrievalQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<MemoryRecord>, MemoryError>> + Send + 'a>> {
        Box::pin(self.retrieve_memory_records(memory_id, query))
    }
}

/// Type-erased memory client.
pub struct BoxMemoryClient {
    inner: Box<dyn MemoryClientDyn + Send + Sync>,
}

impl BoxMemoryClient {
    pub fn new<T: MemoryClient + 'static>(client: T) -> Self {
        Self {
            inner: Box::new(client),
        }
    }

    pub async fn create_event(
        &self,
        memory_id: &str,
        event: &NewMemoryEvent,
    ) -> Result<MemoryEvent, MemoryError> {
        self.inner.create_event_boxed(memory_id, event).await
    }

    pub async fn list_events(
        &self,
        memory_id: &str,
        actor_id: &str,
        session_id: &str,
        max_results: Option<u32>,
    ) -> Result<Vec<MemoryEvent>, MemoryError> {
        self.inner
            .list_events_boxed(memory_id, actor_id, session_id, max_results)
            .await
    }

    pub async fn retrieve_memory_records(
        &self,
        memory_id: &str,
        query: &RetrievalQuery,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        self.inner.retrieve_memory_records_boxed(memory_id, query).await
    }
}
