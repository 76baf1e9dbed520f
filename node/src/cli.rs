//! # CLI Interface
//!
//! Command-line argument structure for `meridian-node`, built with `clap`
//! derive. Three subcommands: `run`, `status`, and `version`.

use clap::{Parser, Subcommand};

/// Meridian devnet node.
///
/// Runs the staking diamond as a single-node development chain: facets are
/// installed and cut in at startup, the chain clock follows wall-clock
/// time, and the platform is exposed over a REST/WebSocket API with
/// Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "meridian-node",
    about = "Meridian staking devnet node",
    version,
    propagate_version = true
)]
pub struct MeridianNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the devnet node.
    Run(RunArgs),
    /// Query the status of a running node via its RPC endpoint.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the REST/WebSocket API.
    #[arg(long, env = "MERIDIAN_RPC_PORT", default_value_t = 9650)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "MERIDIAN_METRICS_PORT", default_value_t = 9651)]
    pub metrics_port: u16,

    /// Network label reported by `/status`.
    #[arg(long, default_value = "devnet")]
    pub network: String,

    /// Address holding diamond admin rights (cut authority and engine
    /// initializer).
    #[arg(long, env = "MERIDIAN_ADMIN", default_value = "admin")]
    pub admin: String,

    /// Address receiving instant-withdrawal fees.
    #[arg(long, default_value = "fee_recipient")]
    pub fee_recipient: String,

    /// Address allowed to notify vault reward amounts.
    #[arg(long, default_value = "distributor")]
    pub reward_distributor: String,

    /// Minimum masternode deposit, in whole MRD.
    #[arg(long, default_value_t = 1_000)]
    pub min_deposit: u64,

    /// Log output format: pretty or json.
    #[arg(long, env = "MERIDIAN_LOG_FORMAT", default_value = "pretty")]
    pub log_format: crate::logging::LogFormat,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// RPC endpoint of the running node.
    #[arg(long, default_value = "http://127.0.0.1:9650")]
    pub rpc_url: String,
}
