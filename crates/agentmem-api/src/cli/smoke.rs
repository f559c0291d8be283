//! `agentmem smoke-test`: run the short-term memory check against a deployed
//! runtime and print the conversation as it happens.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use agentmem_core::runtime::smoke::{
    ShortTermMemoryTest, SmokeEvent, SmokeTarget, SmokeTestError, SmokeTestReport,
};
use agentmem_core::runtime::wait::{PropagationWait, WaitOutcome, progress_note};
use agentmem_infra::agentcore::AgentCoreRuntimeClient;
use agentmem_infra::aws::CredentialsProvider;
use agentmem_types::config::ENDPOINT_URL_VAR;

use super::SmokeTestArgs;

const RULE_WIDTH: usize = 50;

/// Run the smoke test and pick the process exit code.
///
/// Without an ARN the usage text is printed and the exit code is 1. Any
/// failure after that is printed and exits 0 unless `--strict` is set.
pub async fn run_smoke_test(args: SmokeTestArgs, json: bool) -> anyhow::Result<ExitCode> {
    let Some(agent_arn) = args
        .agent_arn
        .as_deref()
        .map(str::trim)
        .filter(|arn| !arn.is_empty())
    else {
        println!("Usage: agentmem smoke-test <AGENT_ARN> [REGION]");
        println!("Or set AGENT_ARN environment variable");
        return Ok(ExitCode::FAILURE);
    };

    let result = execute(&args, agent_arn, json).await;

    match &result {
        Ok(report) if json => println!("{}", serde_json::to_string_pretty(report)?),
        Ok(report) => print_summary(report),
        Err(e) if json => println!("{}", serde_json::json!({ "error": error_chain(e) })),
        Err(e) => eprintln!("{} {}", style("Error:").red().bold(), error_chain(e)),
    }

    Ok(if is_failure(&result, args.strict) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn execute(
    args: &SmokeTestArgs,
    agent_arn: &str,
    json: bool,
) -> Result<SmokeTestReport, SmokeTestError> {
    let target = SmokeTarget::resolve(agent_arn, args.region.as_deref())?;
    let endpoint = std::env::var(ENDPOINT_URL_VAR)
        .ok()
        .filter(|value| !value.trim().is_empty());
    let client = AgentCoreRuntimeClient::new(
        Arc::new(CredentialsProvider::from_env()),
        &target.region,
        endpoint.as_deref(),
    )
    .map_err(SmokeTestError::Client)?;

    let cancel = CancellationToken::new();
    let signal = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let test = ShortTermMemoryTest::new(client, target)
        .with_wait(
            PropagationWait::new(Duration::from_secs(args.wait)).with_cancellation(cancel.clone()),
        )
        .with_actor_id(args.actor_id.clone());

    let mut printer = ProgressPrinter::new(json);
    // The run future is polled first so a cancelled wait reports through it.
    let result = tokio::select! {
        biased;
        result = test.run(|event| printer.handle(event)) => result,
        () = cancel.cancelled() => Err(SmokeTestError::Cancelled),
    };
    printer.clear_spinner();
    signal.abort();
    result
}

/// Whether the run should exit non-zero.
fn is_failure(result: &Result<SmokeTestReport, SmokeTestError>, strict: bool) -> bool {
    strict
        && match result {
            Ok(report) => !report.recall.passed(),
            Err(_) => true,
        }
}

/// `error` followed by each of its sources, joined with `": "`.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn print_summary(report: &SmokeTestReport) {
    println!();
    println!("{} Short-term memory test completed", style("✓").green());
    if report.recall.passed() {
        println!(
            "  {} Recall mentioned {}",
            style("✓").green(),
            report.recall.expected.join(", ")
        );
    } else {
        println!(
            "  {} Recall did not mention {}",
            style("!").yellow(),
            report.recall.missing.join(", ")
        );
    }
}

/// Renders [`SmokeEvent`]s as styled text, with a spinner while the agent
/// is thinking and during the wait. Silent in JSON mode.
struct ProgressPrinter {
    json: bool,
    spinner: Option<ProgressBar>,
}

impl ProgressPrinter {
    fn new(json: bool) -> Self {
        Self {
            json,
            spinner: None,
        }
    }

    fn handle(&mut self, event: SmokeEvent<'_>) {
        if self.json {
            return;
        }
        match event {
            SmokeEvent::Started { session_id, region } => {
                println!(
                    "Testing short-term memory in session: {}",
                    style(session_id).cyan()
                );
                println!("Region: {region}");
                println!("{}", "-".repeat(RULE_WIDTH));
            }
            SmokeEvent::TurnStarted {
                turn,
                session_id,
                prompt,
            } => {
                println!();
                if turn == 1 {
                    println!("Message 1: Setting context...");
                } else {
                    println!("Message {turn}: Testing memory recall...");
                }
                println!("Session: {}", style(session_id).dim());
                println!("😊 Prompt {turn}: {prompt}");
                self.start_spinner("Waiting for the agent...".to_string());
            }
            SmokeEvent::TurnReplied { reply, .. } => {
                self.clear_spinner();
                println!("🤖 Agent: {reply}");
            }
            SmokeEvent::WaitStarted { ceiling } => {
                println!();
                println!(
                    "⏳ Waiting up to {} seconds for short-term memory to be stored...",
                    ceiling.as_secs()
                );
                self.start_spinner(remaining_message(ceiling));
            }
            SmokeEvent::WaitTick { ceiling, remaining } => {
                if let Some(spinner) = &self.spinner {
                    spinner.set_message(remaining_message(remaining));
                    if let Some(note) = progress_note(ceiling, remaining) {
                        spinner.println(note);
                    }
                }
            }
            SmokeEvent::WaitFinished { outcome } => {
                self.clear_spinner();
                match outcome {
                    WaitOutcome::Elapsed => println!("{} Wait completed", style("✓").green()),
                    WaitOutcome::Cancelled => println!("{} Wait cancelled", style("✗").red()),
                }
            }
        }
    }

    fn start_spinner(&mut self, message: String) {
        self.clear_spinner();
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    fn clear_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

fn remaining_message(remaining: Duration) -> String {
    format!("{}s remaining", remaining.as_secs_f64().ceil() as u64)
}
