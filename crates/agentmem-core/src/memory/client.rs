//! MemoryClient trait definition.
//!
//! Short-term memory is a log of conversational events per (actor, session);
//! long-term memory is a set of records the service extracts asynchronously
//! into namespaces. Follows the same RPITIT pattern as `LlmProvider`.

use agentmem_types::error::MemoryError;
use agentmem_types::memory::{MemoryEvent, MemoryRecord, NewMemoryEvent, RetrievalQuery};

/// Client for a managed memory resource.
///
/// Implementations live in agentmem-infra (e.g., `AgentCoreMemoryClient`).
pub trait MemoryClient: Send + Sync {
    /// Append a conversational event to short-term memory.
    fn create_event(
        &self,
        memory_id: &str,
        event: &NewMemoryEvent,
    ) -> impl std::future::Future<Output = Result<MemoryEvent, MemoryError>> + Send;

    /// List the events of one session. Pages are followed until exhausted or
    /// `max_results` events have been collected.
    fn list_events(
        &self,
        memory_id: &str,
        actor_id: &str,
        session_id: &str,
        max_results: Option<u32>,
    ) -> impl std::future::Future<Output = Result<Vec<MemoryEvent>, MemoryError>> + Send;

    /// Semantic search over the long-term records of one namespace.
    fn retrieve_memory_records(
        &self,
        memory_id: &str,
        query: &RetrievalQuery,
    ) -> impl std::future::Future<Output = Result<Vec<MemoryRecord>, MemoryError>> + Send;
}
