//! Agent execution engine for agentmem.
//!
//! `Agent` coordinates one invocation: restore the session's history from
//! managed memory on first use, record the user turn, recall long-term
//! records into the system prompt, run the model/tool loop, and record the
//! final assistant turn. GenAI spans instrument every model call.

use tokio::sync::Mutex;
use tracing::field::Empty;
use tracing::{Instrument, debug, info_span, warn};

use agentmem_observe::genai::{
    GEN_AI_RESPONSE_FINISH_REASONS, GEN_AI_USAGE_INPUT_TOKENS, GEN_AI_USAGE_OUTPUT_TOKENS,
    OP_CHAT, OP_EXECUTE_TOOL, OP_INVOKE_AGENT,
};

use agentmem_types::agent::{AgentConfig, AgentResult};
use agentmem_types::error::AgentError;
use agentmem_types::llm::{
    ContentBlock, ConverseRequest, Message, MessageRole, StopReason, ToolResultStatus, Usage,
};

use crate::llm::box_provider::BoxLlmProvider;
use crate::memory::session::MemorySessionManager;
use crate::tools::ToolRegistry;

use super::prompt::SystemPromptBuilder;

/// A conversational agent bound to one memory session.
///
/// The conversation lives behind a mutex, so concurrent invocations are
/// served one at a time in arrival order.
pub struct Agent {
    config: AgentConfig,
    provider: BoxLlmProvider,
    session: MemorySessionManager,
    tools: ToolRegistry,
    /// `None` until the session history has been restored.
    history: Mutex<Option<Vec<Message>>>,
}

impl Agent {
    pub fn new(
        config: AgentConfig,
        provider: BoxLlmProvider,
        session: MemorySessionManager,
        tools: ToolRegistry,
    ) -> Self {
        Self {
            config,
            provider,
            session,
            tools,
            history: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn session(&self) -> &MemorySessionManager {
        &self.session
    }

    /// Answer `prompt`, continuing the session's conversation.
    pub async fn invoke(&self, prompt: &str) -> Result<AgentResult, AgentError> {
        let memory = self.session.config();
        let span = info_span!(
            "invoke_agent",
            gen_ai.operation.name = OP_INVOKE_AGENT,
            gen_ai.request.model = %self.config.model,
            gen_ai.usage.input_tokens = Empty,
            gen_ai.usage.output_tokens = Empty,
            actor_id = %memory.actor_id,
            session_id = %memory.session_id,
        );

        async {
            let mut guard = self.history.lock().await;
            if guard.is_none() {
                let restored = self.session.load_history().await?;
                *guard = Some(restored);
            }
            let history = guard.get_or_insert_with(Vec::new);

            let checkpoint = Checkpoint::of(history);
            let outcome = self.run_turn(history, prompt).await;
            match &outcome {
                Ok(result) => record_usage(&tracing::Span::current(), &result.usage),
                // Keep the in-process conversation well-formed for the next turn.
                Err(_) => checkpoint.restore(history),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run_turn(
        &self,
        history: &mut Vec<Message>,
        prompt: &str,
    ) -> Result<AgentResult, AgentError> {
        self.session.append(MessageRole::User, prompt).await?;
        // Roles must alternate. A restored session can end on a user turn
        // whose reply was never recorded.
        match history.last_mut() {
            Some(last) if last.role == MessageRole::User => {
                last.content.push(ContentBlock::text(prompt));
            }
            _ => history.push(Message::user(prompt)),
        }

        let recalled = self.session.recall(prompt).await;
        let system = SystemPromptBuilder::build(&self.config.system_prompt, &recalled);
        let tools = self.tools.specs();
        let mut usage = Usage::default();

        for round in 0..self.config.max_tool_rounds {
            let request = ConverseRequest {
                model: self.config.model.clone(),
                messages: history.clone(),
                system: Some(system.clone()),
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
                tools: tools.clone(),
            };

            let span = info_span!(
                "chat",
                gen_ai.operation.name = OP_CHAT,
                gen_ai.provider.name = self.provider.name(),
                gen_ai.request.model = %request.model,
                gen_ai.request.max_tokens = request.max_tokens,
                gen_ai.response.finish_reasons = Empty,
                gen_ai.usage.input_tokens = Empty,
                gen_ai.usage.output_tokens = Empty,
                round,
            );
            let response = self
                .provider
                .converse(&request)
                .instrument(span.clone())
                .await?;
            span.record(
                GEN_AI_RESPONSE_FINISH_REASONS,
                tracing::field::display(response.stop_reason),
            );
            record_usage(&span, &response.usage);
            usage.add(response.usage);
            history.push(response.message.clone());

            let tool_results = if response.stop_reason == StopReason::ToolUse {
                self.run_tools(&response.message)
            } else {
                Vec::new()
            };

            if tool_results.is_empty() {
                let text = response.message.text();
                if !text.is_empty() {
                    self.session.append(MessageRole::Assistant, &text).await?;
                }
                debug!(
                    stop_reason = %response.stop_reason,
                    input_tokens = usage.input_tokens,
                    output_tokens = usage.output_tokens,
                    recalled = recalled.len(),
                    "Agent turn complete"
                );
                return Ok(AgentResult {
                    message: response.message,
                    stop_reason: response.stop_reason,
                    usage,
                });
            }

            history.push(Message {
                role: MessageRole::User,
                content: tool_results,
            });
        }

        Err(AgentError::ToolLoopExhausted(self.config.max_tool_rounds))
    }

    /// Execute every tool use in `message`. Tool failures are reported to the
    /// model as error results rather than failing the turn.
    fn run_tools(&self, message: &Message) -> Vec<ContentBlock> {
        message
            .tool_uses()
            .map(|(id, name, input)| {
                let _span = info_span!(
                    "execute_tool",
                    gen_ai.operation.name = OP_EXECUTE_TOOL,
                    gen_ai.tool.name = %name,
                    gen_ai.tool.call.id = %id,
                )
                .entered();
                let (content, status) = match self.tools.call(name, input) {
                    Ok(output) => (output, ToolResultStatus::Success),
                    Err(e) => {
                        warn!(tool = %name, error = %e, "Tool call failed");
                        (e.to_string(), ToolResultStatus::Error)
                    }
                };
                debug!(tool = %name, tool_use_id = %id, ?status, "Tool call finished");
                ContentBlock::ToolResult {
                    tool_use_id: id.to_string(),
                    content,
                    status,
                }
            })
            .collect()
    }
}

/// Conversation shape before a turn: message count and the content length
/// of the last message, which a turn may extend in place.
struct Checkpoint {
    messages: usize,
    last_content: Option<usize>,
}

impl Checkpoint {
    fn of(history: &[Message]) -> Self {
        Self {
            messages: history.len(),
            last_content: history.last().map(|message| message.content.len()),
        }
    }

    fn restore(&self, history: &mut Vec<Message>) {
        history.truncate(self.messages);
        if let (Some(last), Some(len)) = (history.last_mut(), self.last_content) {
            last.content.truncate(len);
        }
    }
}

fn record_usage(span: &tracing::Span, usage: &Usage) {
    span.record(GEN_AI_USAGE_INPUT_TOKENS, usage.input_tokens);
    span.record(GEN_AI_USAGE_OUTPUT_TOKENS, usage.output_tokens);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::box_client::BoxMemoryClient;
    use crate::testing::{InMemoryMemoryClient, ScriptedProvider, event};
    use agentmem_types::memory::ConversationRole;
    use agentmem_types::memory::MemoryConfig;
    use serde_json::json;

    fn agent(provider: ScriptedProvider, memory: InMemoryMemoryClient) -> Agent {
        Agent::new(
            AgentConfig::default(),
            BoxLlmProvider::new(provider),
            MemorySessionManager::new(
                MemoryConfig::for_actor("mem-1", "alice", "sess-1"),
                BoxMemoryClient::new(memory),
            ),
            ToolRegistry::with_defaults(),
        )
    }

    #[tokio::test]
    async fn test_invoke_records_both_turns() {
        let provider = ScriptedProvider::default().reply("Nice to meet you, Alice!");
        let memory = InMemoryMemoryClient::default();
        let agent = agent(provider.clone(), memory.clone());

        let result = agent.invoke("My name is Alice").await.unwrap();
        assert_eq!(result.first_text(), Some("Nice to meet you, Alice!"));

        let events = memory.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].role, ConversationRole::User);
        assert_eq!(events[1].role, ConversationRole::Assistant);
        assert_eq!(events[1].text, "Nice to meet you, Alice!");

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "us.anthropic.claude-3-7-sonnet-20250219-v1:0");
        assert_eq!(requests[0].tools.len(), 1);
    }

    #[tokio::test]
    async fn test_history_restored_once_and_carried_forward() {
        let memory = InMemoryMemoryClient::default();
        memory.seed_event("mem-1", "alice", "sess-1", event("e1", 60, ConversationRole::User, "I like chocolate"));
        memory.seed_event("mem-1", "alice", "sess-1", event("e2", 50, ConversationRole::Assistant, "Noted!"));
        let provider = ScriptedProvider::default().reply("first").reply("second");
        let agent = agent(provider.clone(), memory);

        agent.invoke("What do I like?").await.unwrap();
        agent.invoke("Thanks").await.unwrap();

        let requests = provider.requests();
        // restored pair + new prompt
        assert_eq!(requests[0].messages.len(), 3);
        assert_eq!(requests[0].messages[0].text(), "I like chocolate");
        // + assistant reply + second prompt; nothing restored twice
        assert_eq!(requests[1].messages.len(), 5);
        assert_eq!(requests[1].messages[4].text(), "Thanks");
    }

    #[tokio::test]
    async fn test_prompt_merges_into_unanswered_restored_user_turn() {
        let memory = InMemoryMemoryClient::default();
        memory.seed_event("mem-1", "alice", "sess-1", event("e1", 60, ConversationRole::User, "My name is Alice"));
        memory.seed_event("mem-1", "alice", "sess-1", event("e2", 50, ConversationRole::Assistant, "Hi Alice"));
        memory.seed_event("mem-1", "alice", "sess-1", event("e3", 40, ConversationRole::User, "I like chocolate"));
        let provider = ScriptedProvider::default().fail("throttled").reply("You like chocolate.");
        let agent = agent(provider.clone(), memory);

        assert!(agent.invoke("What do I like?").await.is_err());
        agent.invoke("What do I like?").await.unwrap();

        let requests = provider.requests();
        for request in &requests {
            let roles: Vec<MessageRole> = request.messages.iter().map(|m| m.role).collect();
            assert_eq!(roles, vec![MessageRole::User, MessageRole::Assistant, MessageRole::User]);
        }
        // the failed turn's prompt was rolled back out of the merged message
        assert_eq!(requests[1].messages[2].content.len(), 2);
        assert_eq!(requests[1].messages[2].text(), "I like chocolateWhat do I like?");
    }

    #[tokio::test]
    async fn test_recalled_records_reach_system_prompt() {
        let memory = InMemoryMemoryClient::default()
            .with_record("/users/alice/preferences", "Likes chocolate ice cream", Some(0.8));
        let provider = ScriptedProvider::default().reply("You like chocolate ice cream.");
        let agent = agent(provider.clone(), memory);

        agent.invoke("What do I like?").await.unwrap();

        let system = provider.requests()[0].system.clone().unwrap();
        assert!(system.contains("<user_context>"));
        assert!(system.contains("- Likes chocolate ice cream"));
    }

    #[tokio::test]
    async fn test_tool_use_loop_feeds_results_back() {
        let provider = ScriptedProvider::default()
            .tool_call("t1", "calculator", json!({"expression": "6 * 7"}))
            .reply("The answer is 42.");
        let agent = agent(provider.clone(), InMemoryMemoryClient::default());

        let result = agent.invoke("What is 6 times 7?").await.unwrap();
        assert_eq!(result.first_text(), Some("The answer is 42."));
        assert_eq!(result.usage.input_tokens, 22);

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        let tool_turn = requests[1].messages.last().unwrap();
        assert_eq!(tool_turn.role, MessageRole::User);
        assert_eq!(
            tool_turn.content[0],
            ContentBlock::ToolResult {
                tool_use_id: "t1".into(),
                content: "42".into(),
                status: ToolResultStatus::Success,
            }
        );
    }

    #[tokio::test]
    async fn test_tool_failure_reported_to_model() {
        let provider = ScriptedProvider::default()
            .tool_call("t1", "calculator", json!({"expression": "2 +"}))
            .reply("Sorry, that expression is invalid.");
        let agent = agent(provider.clone(), InMemoryMemoryClient::default());

        agent.invoke("What is 2 +?").await.unwrap();

        let requests = provider.requests();
        match &requests[1].messages.last().unwrap().content[0] {
            ContentBlock::ToolResult { status, .. } => assert_eq!(*status, ToolResultStatus::Error),
            other => panic!("expected tool result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tool_loop_is_bounded() {
        let mut provider = ScriptedProvider::default();
        for i in 0..10 {
            provider = provider.tool_call(&format!("t{i}"), "calculator", json!({"expression": "1"}));
        }
        let agent = agent(provider, InMemoryMemoryClient::default());
        let err = agent.invoke("loop").await.unwrap_err();
        assert!(matches!(err, AgentError::ToolLoopExhausted(8)));
    }

    #[tokio::test]
    async fn test_model_failure_rolls_back_history() {
        let provider = ScriptedProvider::default().fail("throttled").reply("recovered");
        let agent = agent(provider.clone(), InMemoryMemoryClient::default());

        assert!(matches!(agent.invoke("first").await, Err(AgentError::Llm(_))));
        agent.invoke("second").await.unwrap();

        let requests = provider.requests();
        assert_eq!(requests[1].messages.len(), 1);
        assert_eq!(requests[1].messages[0].text(), "second");
    }
}
