//! HTTP ingress for transition reports from the health-check engine

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio_util::task::TaskTracker;
use tower_http::trace::TraceLayer;

use crate::dispatcher::NotificationDispatcher;
use crate::ledger::NotificationRecord;
use crate::report::HealthReport;

const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Server application state
#[derive(Clone)]
pub struct ServerState {
    pub dispatcher: Arc<NotificationDispatcher>,
    /// Dispatches still running; drained on shutdown
    pub dispatches: TaskTracker,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    limit: Option<usize>,
}

/// Build the ingress axum router. Dispatches are spawned on `dispatches`.
pub fn build_router(dispatcher: Arc<NotificationDispatcher>, dispatches: TaskTracker) -> Router {
    let state = ServerState {
        dispatcher,
        dispatches,
    };

    Router::new()
        .route("/api/targets/{name}/down", post(down_handler))
        .route("/api/targets/{name}/up", post(up_handler))
        .route("/api/notifications", get(notifications_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Dispatch runs detached; the caller only gets the acceptance.
async fn down_handler(
    State(server): State<ServerState>,
    Path(name): Path<String>,
    Json(report): Json<HealthReport>,
) -> impl IntoResponse {
    tracing::debug!(
        "Received down transition for '{}' ({} failing checks)",
        name,
        report.failing_count()
    );
    let dispatcher = Arc::clone(&server.dispatcher);
    let target = name.clone();
    server.dispatches.spawn(async move {
        dispatcher.notify_down(&target, &report).await;
    });

    accepted(&name, false)
}

async fn up_handler(
    State(server): State<ServerState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    tracing::debug!("Received up transition for '{}'", name);
    let dispatcher = Arc::clone(&server.dispatcher);
    let target = name.clone();
    server.dispatches.spawn(async move {
        dispatcher.notify_up(&target).await;
    });

    accepted(&name, true)
}

fn accepted(name: &str, is_healthy: bool) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "target_name": name,
            "is_healthy": is_healthy,
        })),
    )
}

async fn notifications_handler(
    State(server): State<ServerState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<NotificationRecord>>, (StatusCode, String)> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    server
        .dispatcher
        .ledger()
        .recent(limit)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Failed to read notification ledger: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

/// Stop accepting dispatches and wait up to `grace` for running ones.
/// Returns false if some were still running when the grace period ended.
pub async fn drain_dispatches(dispatches: &TaskTracker, grace: Duration) -> bool {
    dispatches.close();
    if dispatches.is_empty() {
        return true;
    }

    tracing::info!(
        "Waiting up to {:?} for {} running dispatches",
        grace,
        dispatches.len()
    );
    match tokio::time::timeout(grace, dispatches.wait()).await {
        Ok(()) => true,
        Err(_) => {
            tracing::warn!(
                "Abandoning {} dispatches still running after {:?}",
                dispatches.len(),
                grace
            );
            false
        }
    }
}
