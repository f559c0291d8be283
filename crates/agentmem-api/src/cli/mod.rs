//! CLI command definitions for the `agentmem` binary.
//!
//! `agentmem serve` hosts the runtime HTTP contract; `agentmem smoke-test`
//! drives a deployed runtime through the two-turn memory check.

pub mod smoke;

use clap::{Args, Parser, Subcommand};

/// AgentCore memory agent: runtime server and smoke-test driver.
#[derive(Parser)]
#[command(name = "agentmem", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all log output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "AGENTMEM_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the agent runtime contract (POST /invocations, GET /ping).
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },

    /// Check short-term memory against a deployed agent runtime.
    SmokeTest(SmokeTestArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SmokeTestArgs {
    /// ARN of the deployed agent runtime.
    #[arg(env = "AGENT_ARN")]
    pub agent_arn: Option<String>,

    /// Region to call; defaults to the region in the ARN.
    #[arg(env = "AWS_REGION")]
    pub region: Option<String>,

    /// Seconds to wait between the two turns.
    #[arg(long, default_value_t = 10)]
    pub wait: u64,

    /// Actor id sent as the custom actor header on both turns.
    #[arg(long)]
    pub actor_id: Option<String>,

    /// Exit non-zero when the recall reply misses an expected fact.
    #[arg(long)]
    pub strict: bool,
}
