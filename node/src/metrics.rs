//! # Prometheus Metrics
//!
//! Operational metrics for the devnet node, scraped from `/metrics` on the
//! dedicated metrics port. All metrics live in a custom
//! [`prometheus::Registry`] under the `meridian` namespace so they never
//! collide with a default global registry.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (prometheus handles are internally ref-counted) so it can
/// be shared across request handlers and the clock loop.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Registry that owns everything below.
    registry: Registry,
    /// Calls executed through the diamond, success or failure.
    pub calls_total: IntCounter,
    /// Calls that reverted.
    pub calls_reverted_total: IntCounter,
    /// Events committed to the diamond's log.
    pub events_emitted_total: IntCounter,
    /// Currently active masternode positions.
    pub masternodes_active: IntGauge,
    /// Native currency staked in the vault, in whole MRD.
    pub vault_staked_mrd: IntGauge,
    /// Rewards distributed to masternodes so far, in whole MRD.
    pub rewards_distributed_mrd: IntGauge,
    /// The diamond's chain clock.
    pub chain_timestamp: IntGauge,
    /// Wall-clock latency of diamond calls, in seconds.
    pub call_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("meridian".into()), None)
            .expect("failed to create prometheus registry");

        fn counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
            let c = IntCounter::new(name, help).expect("metric creation");
            registry.register(Box::new(c.clone())).expect("metric registration");
            c
        }

        fn gauge(registry: &Registry, name: &str, help: &str) -> IntGauge {
            let g = IntGauge::new(name, help).expect("metric creation");
            registry.register(Box::new(g.clone())).expect("metric registration");
            g
        }

        let calls_total = counter(
            &registry,
            "calls_total",
            "Calls executed through the diamond, success or failure",
        );
        let calls_reverted_total = counter(
            &registry,
            "calls_reverted_total",
            "Calls that reverted and rolled back",
        );
        let events_emitted_total = counter(
            &registry,
            "events_emitted_total",
            "Events committed to the diamond log",
        );
        let masternodes_active = gauge(
            &registry,
            "masternodes_active",
            "Currently active masternode positions",
        );
        let vault_staked_mrd = gauge(
            &registry,
            "vault_staked_mrd",
            "Native currency staked in the vault, whole MRD",
        );
        let rewards_distributed_mrd = gauge(
            &registry,
            "rewards_distributed_mrd",
            "Total rewards distributed to masternodes, whole MRD",
        );
        let chain_timestamp = gauge(
            &registry,
            "chain_timestamp",
            "Current chain clock of the diamond (unix seconds)",
        );

        let call_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "call_latency_seconds",
                "Wall-clock latency of diamond calls in seconds",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(call_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            calls_total,
            calls_reverted_total,
            events_emitted_total,
            masternodes_active,
            vault_staked_mrd,
            rewards_distributed_mrd,
            chain_timestamp,
            call_latency_seconds,
        }
    }

    /// Encodes all registered metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics handle passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler rendering `/metrics`.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
