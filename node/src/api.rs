//! # REST + WebSocket API
//!
//! Axum router exposing the staking diamond over HTTP. All handlers share
//! one [`AppState`]; the diamond itself sits behind a `tokio::sync::RwLock`
//! — the devnet analogue of the chain serializing transactions.
//!
//! ## Endpoints
//!
//! | Method | Path                  | Description                            |
//! |--------|-----------------------|----------------------------------------|
//! | GET    | `/health`             | Liveness probe                         |
//! | GET    | `/status`             | Node and platform summary              |
//! | GET    | `/config`             | Current engine configuration           |
//! | GET    | `/masternodes/:id`    | Masternode position snapshot           |
//! | GET    | `/vault/:id`          | Vault position snapshot                |
//! | GET    | `/balances/:account`  | Native balance in the simulated ledger |
//! | POST   | `/call`               | Execute a call through the diamond     |
//! | POST   | `/faucet`             | Devnet faucet: credit native currency  |
//! | GET    | `/ws`                 | WebSocket stream of committed events   |

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use meridian_contracts::{getters, Call, CallOutput, Diamond, Event};

use crate::metrics::SharedMetrics;

/// Broadcast capacity for the live event stream. Large enough to absorb a
/// burst of calls without disconnecting slow WebSocket clients.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// Network label (e.g., "devnet").
    pub network: String,
    /// The staking diamond. Writers serialize like on-chain transactions.
    pub diamond: Arc<RwLock<Diamond>>,
    /// Broadcast channel feeding `/ws` subscribers.
    pub event_tx: broadcast::Sender<Event>,
    /// Prometheus metric handles.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Request body for `POST /call`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallRequest {
    /// The calling address.
    pub caller: String,
    /// Native currency attached to the call, in base units.
    #[serde(default)]
    pub value: u128,
    /// The call payload.
    pub call: Call,
}

/// Response body for a successful `POST /call`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallResponse {
    /// Transaction id assigned by the proxy.
    pub tx_id: String,
    /// The call's typed return value.
    pub output: CallOutput,
    /// Events emitted by this call.
    pub events: Vec<Event>,
}

/// Request body for `POST /faucet`.
#[derive(Debug, Serialize, Deserialize)]
pub struct FaucetRequest {
    /// Account to credit.
    pub account: String,
    /// Amount in base units.
    pub amount: u128,
}

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Network label.
    pub network: String,
    /// Current chain timestamp of the diamond.
    pub chain_time: u64,
    /// Selectors currently routed by the dispatch table.
    pub routed_selectors: usize,
    /// Active masternode positions.
    pub masternodes_active: u64,
    /// Total native currency staked in the vault, base units.
    pub total_staked: u128,
    /// Total rewards distributed to masternodes, base units.
    pub total_rewards_paid: u128,
    /// Events committed to the diamond log.
    pub events_committed: usize,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Response payload for `GET /balances/:account`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// The queried account.
    pub account: String,
    /// Native balance in base units.
    pub balance: u128,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/config", get(config_handler))
        .route("/masternodes/:id", get(masternode_handler))
        .route("/vault/:id", get(vault_handler))
        .route("/balances/:account", get(balance_handler))
        .route("/call", post(call_handler))
        .route("/faucet", post(faucet_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — liveness probe for orchestrators. Intentionally does
/// not inspect platform state; that belongs in `/status`.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// `GET /status` — summary of the node and the platform state.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let diamond = state.diamond.read().await;
    let chain = diamond.state();
    Json(StatusResponse {
        version: state.version.clone(),
        network: state.network.clone(),
        chain_time: diamond.now(),
        routed_selectors: diamond.table().len(),
        masternodes_active: chain.nodes.positions.len() as u64,
        total_staked: getters::total_staked(chain),
        total_rewards_paid: getters::total_rewards_paid(chain),
        events_committed: diamond.log().len(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `GET /config` — the configuration sub-region, verbatim.
async fn config_handler(State(state): State<AppState>) -> impl IntoResponse {
    let diamond = state.diamond.read().await;
    Json(diamond.state().config.clone())
}

/// `GET /masternodes/:id` — snapshot of one masternode position.
async fn masternode_handler(
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let diamond = state.diamond.read().await;
    match getters::node_data(diamond.state(), id) {
        Ok(position) => Json(position).into_response(),
        Err(err) => error_response(StatusCode::NOT_FOUND, err.to_string()),
    }
}

/// `GET /vault/:id` — snapshot of one vault position, with live `earned`.
async fn vault_handler(Path(id): Path<u64>, State(state): State<AppState>) -> impl IntoResponse {
    let diamond = state.diamond.read().await;
    match getters::vault_data(diamond.state(), id, diamond.now()) {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(err) => error_response(StatusCode::NOT_FOUND, err.to_string()),
    }
}

/// `GET /balances/:account` — native balance in the simulated ledger.
async fn balance_handler(
    Path(account): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let diamond = state.diamond.read().await;
    Json(BalanceResponse {
        balance: diamond.native_balance_of(&account),
        account,
    })
}

/// `POST /call` — executes a call through the diamond, exactly as a chain
/// transaction would: serialized, atomic, all-or-nothing.
async fn call_handler(
    State(state): State<AppState>,
    Json(request): Json<CallRequest>,
) -> impl IntoResponse {
    let started = std::time::Instant::now();
    let mut diamond = state.diamond.write().await;
    let result = diamond.execute(&request.caller, request.value, request.call);
    drop(diamond);

    state.metrics.calls_total.inc();
    state
        .metrics
        .call_latency_seconds
        .observe(started.elapsed().as_secs_f64());

    match result {
        Ok(receipt) => {
            state
                .metrics
                .events_emitted_total
                .inc_by(receipt.events.len() as u64);
            for event in &receipt.events {
                // Nobody listening is fine.
                let _ = state.event_tx.send(event.clone());
            }
            Json(CallResponse {
                tx_id: receipt.tx_id.to_string(),
                output: receipt.output,
                events: receipt.events,
            })
            .into_response()
        }
        Err(err) => {
            state.metrics.calls_reverted_total.inc();
            error_response(StatusCode::BAD_REQUEST, err.to_string())
        }
    }
}

/// `POST /faucet` — devnet-only genesis funding.
async fn faucet_handler(
    State(state): State<AppState>,
    Json(request): Json<FaucetRequest>,
) -> impl IntoResponse {
    let mut diamond = state.diamond.write().await;
    diamond.fund(&request.account, request.amount);
    let balance = diamond.native_balance_of(&request.account);
    drop(diamond);

    tracing::info!(account = %request.account, amount = request.amount, "faucet credit");
    Json(BalanceResponse {
        account: request.account,
        balance,
    })
}

/// `GET /ws` — WebSocket upgrade for live event streaming.
///
/// Clients receive each committed [`Event`] as a JSON text message. The
/// channel is push-only; client messages are ignored.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Drives a single WebSocket connection until the client disconnects or
/// the broadcast channel closes.
async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
    let mut rx = state.event_tx.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        let payload = match serde_json::to_string(&event) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!("failed to serialize ws event: {}", e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload.into())).await.is_err() {
                            // Client disconnected.
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("ws subscriber lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {
                        // Push-only channel; inbound messages are ignored.
                    }
                    _ => break,
                }
            }
        }
    }
}
