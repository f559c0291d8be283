//! Cancellable wait for eventually-consistent memory writes.
//!
//! The memory service persists events asynchronously, so a reader may need
//! to give it time before asking for what was just written. `PropagationWait`
//! sleeps in `granularity` steps up to a fixed ceiling, reporting the time
//! remaining before each step, and stops early when its cancellation token
//! fires.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Ceiling used by the smoke test when none is given.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(10);

const MIN_GRANULARITY: Duration = Duration::from_millis(1);

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitOutcome {
    /// The full ceiling elapsed.
    Elapsed,
    /// The cancellation token fired first.
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct PropagationWait {
    ceiling: Duration,
    granularity: Duration,
    cancellation: CancellationToken,
}

impl PropagationWait {
    pub fn new(ceiling: Duration) -> Self {
        Self {
            ceiling,
            granularity: Duration::from_secs(1),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_granularity(mut self, granularity: Duration) -> Self {
        self.granularity = granularity.max(MIN_GRANULARITY);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Wait until the ceiling has passed or the token is cancelled.
    /// `on_tick` receives the time remaining before each sleep step.
    pub async fn wait(&self, mut on_tick: impl FnMut(Duration)) -> WaitOutcome {
        let deadline = Instant::now() + self.ceiling;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return WaitOutcome::Elapsed;
            }
            let remaining = deadline - now;
            on_tick(remaining);

            tokio::select! {
                _ = self.cancellation.cancelled() => return WaitOutcome::Cancelled,
                _ = tokio::time::sleep(remaining.min(self.granularity)) => {}
            }
        }
    }
}

impl Default for PropagationWait {
    fn default() -> Self {
        Self::new(DEFAULT_WAIT)
    }
}

/// Progress line for long waits: every 5 whole seconds remaining, once the
/// ceiling is at least 10 seconds, never at the very start.
pub fn progress_note(ceiling: Duration, remaining: Duration) -> Option<String> {
    let ceiling_secs = ceiling.as_secs();
    let secs = remaining.as_secs_f64().round() as u64;
    (ceiling_secs >= 10 && secs > 0 && secs < ceiling_secs && secs % 5 == 0)
        .then(|| format!("   ... {secs} seconds remaining"))
}
