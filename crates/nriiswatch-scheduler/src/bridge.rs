//! Message bridge for the popup/status UI.
//!
//! Speaks the same request/response shapes the extension popup used:
//! `{"method":"getListAgree"}` answers with the cached count and kicks
//! off a fresh cycle (return now, refresh async, never a blocking
//! RPC); `{"method":"nriiscookies"}` just returns the last session
//! token. Served as one POST route on localhost.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use nriiswatch_core::error::{Result, WatchError};
use nriiswatch_core::state::RunState;

use crate::alarms::Trigger;

#[derive(Debug, Deserialize)]
pub struct BridgeRequest {
    pub method: String,
}

#[derive(Clone)]
pub struct Bridge {
    state: Arc<RunState>,
    triggers: mpsc::Sender<Trigger>,
}

impl Bridge {
    pub fn new(state: Arc<RunState>, triggers: mpsc::Sender<Trigger>) -> Self {
        Self { state, triggers }
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/", post(handle_query))
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::new(self))
    }
}

async fn handle_query(State(bridge): State<Arc<Bridge>>, Json(req): Json<BridgeRequest>) -> Json<Value> {
    match req.method.as_str() {
        "getListAgree" => {
            let count = bridge.state.latest_count();
            // Stale-tolerant by contract: hand back the cache and let a
            // fresh cycle race in behind it. A full channel means a run
            // is already queued, which is just as good.
            if bridge.triggers.try_send(Trigger::Query).is_err() {
                tracing::debug!("trigger queue full or closed, returning cached count only");
            }
            Json(json!({ "val1": count }))
        }
        "nriiscookies" => {
            let cookie = bridge.state.latest_cookie().await;
            Json(json!({ "val1c": cookie }))
        }
        other => {
            tracing::warn!(method = other, "unknown bridge method");
            Json(json!({ "error": "unknown method" }))
        }
    }
}

/// Bind and serve the bridge until the process exits.
pub async fn serve(addr: &str, bridge: Bridge) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| WatchError::Bridge(format!("Cannot bind {addr}: {e}")))?;
    tracing::info!("🌐 bridge listening on {addr}");
    axum::serve(listener, bridge.router())
        .await
        .map_err(|e| WatchError::Bridge(e.to_string()))?;
    Ok(())
}
