// Copyright (c) 2026 Meridian Labs. MIT License.
// See LICENSE for details.

//! # Meridian Devnet Node
//!
//! Entry point for the `meridian-node` binary. Boots the staking diamond
//! as a single-node development chain: installs and cuts in the
//! masternode, vault, and getter facets, initializes both engines, then
//! serves the REST/WebSocket API and Prometheus metrics while a clock loop
//! keeps the diamond's chain time tracking wall-clock time.
//!
//! Subcommands:
//!
//! - `run`     — start the devnet node
//! - `status`  — query a running node's status endpoint
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{broadcast, RwLock};

use meridian_contracts::{
    Call, Diamond, Facet, FacetCut, GetterFacet, MasternodeFacet, TokenBalance, VaultFacet,
    VaultInit, MRD,
};

use cli::{Commands, MeridianNodeCli};
use metrics::NodeMetrics;

/// Genesis allocation for the admin and distributor accounts.
const GENESIS_ALLOCATION: u128 = 1_000_000 * MRD;

/// Eligibility-token balance every devnet account is assumed to hold, so
/// `safe_mint` works out of the box. A real deployment queries the actual
/// token contract instead.
struct DevnetEligibility;

impl TokenBalance for DevnetEligibility {
    fn balance_of(&self, _account: &str) -> u128 {
        200 * MRD
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = MeridianNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Status(args) => query_status(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Builds the diamond: install facets, cut them in, initialize engines,
/// wire the devnet collaborators, seed genesis balances.
fn build_diamond(args: &cli::RunArgs) -> Result<Diamond> {
    let mut diamond = Diamond::new(&args.admin);

    let masternode = diamond.install(Box::new(MasternodeFacet));
    let vault = diamond.install(Box::new(VaultFacet));
    let getters = diamond.install(Box::new(GetterFacet));
    diamond
        .cut(
            &args.admin,
            &[
                FacetCut::add(&masternode, MasternodeFacet.selectors()),
                FacetCut::add(&vault, VaultFacet.selectors()),
                FacetCut::add(&getters, GetterFacet.selectors()),
            ],
        )
        .context("failed to cut facets into the diamond")?;

    diamond
        .execute(
            &args.admin,
            0,
            Call::InitializeMasternode {
                min_deposit: args.min_deposit as u128 * MRD,
                fee_recipient: args.fee_recipient.clone(),
                metadata_uri: "https://meta.meridianlabs.network/masternode/".into(),
            },
        )
        .context("failed to initialize the masternode engine")?;

    diamond
        .execute(
            &args.admin,
            0,
            Call::InitializeVault(VaultInit {
                price_oracle: "oracle:devnet".into(),
                reward_token: "token:mpass".into(),
                reward_distributor: args.reward_distributor.clone(),
                min_eligibility: 100 * MRD,
                initial_reward_rate: 500,
                metadata_uri: "https://meta.meridianlabs.network/vault/".into(),
                token_name: "Meridian Vault Position".into(),
                token_symbol: "mVAULT".into(),
            }),
        )
        .context("failed to initialize the vault engine")?;

    diamond.set_eligibility(Box::new(DevnetEligibility));
    diamond.fund(&args.admin, GENESIS_ALLOCATION);
    diamond.fund(&args.reward_distributor, GENESIS_ALLOCATION);

    Ok(diamond)
}

/// Starts the full devnet node: API server, metrics endpoint, clock loop.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init(
        "meridian_node=info,meridian_contracts=info,tower_http=debug",
        args.log_format,
    );

    tracing::info!(
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        network = %args.network,
        admin = %args.admin,
        "starting meridian-node"
    );

    let diamond = build_diamond(&args)?;
    tracing::info!(
        address = diamond.address(),
        routes = diamond.table().len(),
        "diamond deployed"
    );
    let diamond = Arc::new(RwLock::new(diamond));

    let node_metrics = Arc::new(NodeMetrics::new());
    let (event_tx, _) = broadcast::channel(api::EVENT_CHANNEL_CAPACITY);

    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        network: args.network.clone(),
        diamond: Arc::clone(&diamond),
        event_tx: event_tx.clone(),
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Clock loop ---
    // The diamond's chain time follows wall-clock time, one tick per
    // second, and the platform gauges refresh on the same cadence.
    let diamond_ref = Arc::clone(&diamond);
    let metrics_ref = Arc::clone(&node_metrics);
    let clock_loop = tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
        loop {
            interval.tick().await;
            let mut diamond = diamond_ref.write().await;
            diamond.set_time(chrono::Utc::now().timestamp() as u64);

            let state = diamond.state();
            metrics_ref
                .masternodes_active
                .set(state.nodes.positions.len() as i64);
            metrics_ref
                .vault_staked_mrd
                .set((state.vault.total_staked / MRD) as i64);
            metrics_ref
                .rewards_distributed_mrd
                .set((state.nodes.total_rewards_paid / MRD) as i64);
            metrics_ref.chain_timestamp.set(diamond.now() as i64);
        }
    });

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    clock_loop.abort();
    tracing::info!("meridian-node stopped");
    Ok(())
}

/// Queries a running node's status endpoint and prints the body.
async fn query_status(args: cli::StatusArgs) -> Result<()> {
    let url = format!("{}/status", args.rpc_url.trim_end_matches('/'));
    let body = http_get(&url).await?;
    println!("{}", body);
    Ok(())
}

/// Minimal HTTP/1.1 GET over a raw TCP stream — enough for `status`
/// without pulling in an HTTP client dependency.
async fn http_get(url: &str) -> Result<String> {
    let rest = url
        .strip_prefix("http://")
        .ok_or_else(|| anyhow::anyhow!("only http:// URLs are supported: {url}"))?;
    let (authority, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, "/"),
    };
    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) => (host, port.parse::<u16>().context("bad port in URL")?),
        None => (authority, 80),
    };

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    let addr = format!("{}:{}", host, port);
    let mut stream = tokio::net::TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {}", addr))?;

    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, host,
    );
    stream.write_all(request.as_bytes()).await?;
    stream.shutdown().await?;

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    let response = String::from_utf8_lossy(&buf);

    // Everything after the first blank line is the body.
    Ok(response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_else(|| response.to_string()))
}

/// Prints version information to stdout.
fn print_version() {
    println!("meridian-node {}", env!("CARGO_PKG_VERSION"));
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
