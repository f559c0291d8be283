//! Two-turn short-term memory check against a deployed runtime.
//!
//! Turn one states two facts on a fresh session, the driver waits for the
//! memory service to persist them, and turn two asks for them back on the
//! same session. The replies are returned in a [`SmokeTestReport`] together
//! with a [`RecallCheck`] of whether the second reply mentions both facts.

use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use agentmem_types::error::RuntimeError;
use agentmem_types::runtime::{AgentRuntimeArn, RuntimeInvocation, reply_text};

use super::invoker::AgentRuntimeInvoker;
use super::wait::{PropagationWait, WaitOutcome};

pub const FIRST_PROMPT: &str = "My name is Alice and I like chocolate ice cream";
pub const SECOND_PROMPT: &str = "What is my name and what do I like?";

/// Facts the second reply should mention, matched case-insensitively.
pub const EXPECTED_FACTS: [&str; 2] = ["alice", "chocolate"];

#[derive(Debug, thiserror::Error)]
pub enum SmokeTestError {
    #[error("{0}")]
    InvalidArn(String),

    #[error("could not create the runtime client")]
    Client(#[source] RuntimeError),

    #[error("turn {turn} failed")]
    Turn {
        turn: u8,
        #[source]
        source: RuntimeError,
    },

    #[error("cancelled while waiting for memory propagation")]
    Cancelled,
}

/// Runtime ARN plus the region its data plane is called in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeTarget {
    pub arn: AgentRuntimeArn,
    pub region: String,
}

impl SmokeTarget {
    /// Parse `agent_arn`; the region is `region` when given, else the one
    /// embedded in the ARN.
    pub fn resolve(agent_arn: &str, region: Option<&str>) -> Result<Self, SmokeTestError> {
        let arn: AgentRuntimeArn = agent_arn.parse().map_err(SmokeTestError::InvalidArn)?;
        let region = match region.map(str::trim).filter(|r| !r.is_empty()) {
            Some(region) => region.to_string(),
            None => arn.region().to_string(),
        };
        Ok(Self { arn, region })
    }
}

/// Progress notifications emitted while the test runs.
#[derive(Debug, Clone, PartialEq)]
pub enum SmokeEvent<'a> {
    Started { session_id: &'a str, region: &'a str },
    TurnStarted { turn: u8, session_id: &'a str, prompt: &'a str },
    TurnReplied { turn: u8, reply: &'a str },
    WaitStarted { ceiling: Duration },
    WaitTick { ceiling: Duration, remaining: Duration },
    WaitFinished { outcome: WaitOutcome },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnReport {
    pub prompt: String,
    pub reply: String,
    pub body: serde_json::Value,
}

/// Which expected facts the recall reply mentioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecallCheck {
    pub expected: Vec<String>,
    pub missing: Vec<String>,
}

impl RecallCheck {
    pub fn evaluate(reply: &str, expected: &[&str]) -> Self {
        let haystack = reply.to_lowercase();
        Self {
            expected: expected.iter().map(|f| f.to_string()).collect(),
            missing: expected
                .iter()
                .filter(|fact| !haystack.contains(&fact.to_lowercase()))
                .map(|f| f.to_string())
                .collect(),
        }
    }

    pub fn passed(&self) -> bool {
        self.missing.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmokeTestReport {
    pub session_id: String,
    pub region: String,
    pub agent_arn: String,
    pub first: TurnReport,
    pub second: TurnReport,
    pub waited_ms: u64,
    pub recall: RecallCheck,
}

/// Short-term memory smoke test over any [`AgentRuntimeInvoker`].
pub struct ShortTermMemoryTest<R> {
    invoker: R,
    target: SmokeTarget,
    wait: PropagationWait,
    actor_id: Option<String>,
}

impl<R: AgentRuntimeInvoker> ShortTermMemoryTest<R> {
    pub fn new(invoker: R, target: SmokeTarget) -> Self {
        Self {
            invoker,
            target,
            wait: PropagationWait::default(),
            actor_id: None,
        }
    }

    pub fn with_wait(mut self, wait: PropagationWait) -> Self {
        self.wait = wait;
        self
    }

    /// Send `actor_id` as the custom actor header on both turns.
    pub fn with_actor_id(mut self, actor_id: Option<String>) -> Self {
        self.actor_id = actor_id;
        self
    }

    pub fn target(&self) -> &SmokeTarget {
        &self.target
    }

    /// Run both turns on a fresh session, reporting progress to `observer`.
    pub async fn run(
        &self,
        mut observer: impl FnMut(SmokeEvent<'_>),
    ) -> Result<SmokeTestReport, SmokeTestError> {
        let session_id = Uuid::new_v4().to_string();
        info!(
            session_id = %session_id,
            region = %self.target.region,
            agent_arn = %self.target.arn,
            "Starting short-term memory test"
        );
        observer(SmokeEvent::Started {
            session_id: &session_id,
            region: &self.target.region,
        });

        let first = self.turn(1, &session_id, FIRST_PROMPT, &mut observer).await?;

        let ceiling = self.wait.ceiling();
        observer(SmokeEvent::WaitStarted { ceiling });
        let started = Instant::now();
        let outcome = self
            .wait
            .wait(|remaining| observer(SmokeEvent::WaitTick { ceiling, remaining }))
            .await;
        let waited = started.elapsed();
        observer(SmokeEvent::WaitFinished { outcome });
        if outcome == WaitOutcome::Cancelled {
            return Err(SmokeTestError::Cancelled);
        }

        let second = self.turn(2, &session_id, SECOND_PROMPT, &mut observer).await?;
        let recall = RecallCheck::evaluate(&second.reply, &EXPECTED_FACTS);
        info!(
            session_id = %session_id,
            passed = recall.passed(),
            missing = ?recall.missing,
            "Short-term memory test completed"
        );

        Ok(SmokeTestReport {
            session_id,
            region: self.target.region.clone(),
            agent_arn: self.target.arn.to_string(),
            first,
            second,
            waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
            recall,
        })
    }

    async fn turn(
        &self,
        turn: u8,
        session_id: &str,
        prompt: &str,
        observer: &mut impl FnMut(SmokeEvent<'_>),
    ) -> Result<TurnReport, SmokeTestError> {
        observer(SmokeEvent::TurnStarted {
            turn,
            session_id,
            prompt,
        });

        let mut invocation = RuntimeInvocation::new(session_id, json!({ "prompt": prompt }));
        invocation.actor_id = self.actor_id.clone();

        let body = self
            .invoker
            .invoke(&self.target.arn, &invocation)
            .await
            .map_err(|source| SmokeTestError::Turn { turn, source })?;
        let reply = reply_text(&body);
        debug!(turn, reply_len = reply.len(), "Runtime replied");

        observer(SmokeEvent::TurnReplied {
            turn,
            reply: &reply,
        });
        Ok(TurnReport {
            prompt: prompt.to_string(),
            reply,
            body,
        })
    }
}
