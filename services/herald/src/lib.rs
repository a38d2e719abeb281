//! Herald - health transition webhook notification service
//!
//! Receives target up/down transitions, suppresses repeats inside a cooldown
//! window, and posts rendered payloads to every configured webhook.

pub mod config;
pub mod cooldown;
pub mod delivery;
pub mod dispatcher;
pub mod error;
pub mod io;
pub mod ledger;
pub mod render;
pub mod report;
pub mod server;

pub use config::{load_config, Config};
pub use dispatcher::{NotificationDispatcher, NotificationOutcome, WebhookOutcome};
pub use error::{HeraldError, Result};
pub use report::{HealthReport, HealthStatus};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::io::ReqwestHttpClient;

/// Build the dispatcher described by the configuration
pub async fn build_dispatcher(config: &Config) -> Result<NotificationDispatcher> {
    config.validate()?;
    let timeout = Duration::from_secs(config.notifications.request_timeout_seconds);
    let http: Arc<dyn io::HttpClient> = Arc::new(ReqwestHttpClient::with_timeout(timeout)?);
    let ledger = ledger::open_ledger(&config.ledger).await?;

    for webhook in &config.webhooks {
        if let Err(reason) = delivery::parse_endpoint(webhook.endpoint_uri.as_deref()) {
            tracing::warn!(
                "Webhook '{}' will be skipped until fixed: {}",
                webhook.name,
                reason
            );
        }
    }

    Ok(NotificationDispatcher::new(
        config.webhooks.clone(),
        &config.notifications,
        ledger,
        http,
    ))
}

/// How long shutdown waits for running dispatches: one request timeout per webhook
pub fn shutdown_grace(config: &Config) -> Duration {
    let webhooks = u32::try_from(config.webhooks.len().max(1)).unwrap_or(u32::MAX);
    Duration::from_secs(config.notifications.request_timeout_seconds).saturating_mul(webhooks)
}

/// Run the herald service with the given configuration
pub async fn run(config: Config) -> Result<()> {
    let dispatcher = Arc::new(build_dispatcher(&config).await?);
    let cancel = CancellationToken::new();

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                cancel_for_signal.cancel();
            }
            Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
        }
    });

    if !config.server.enabled {
        tracing::info!("Ingress server disabled; waiting for shutdown");
        cancel.cancelled().await;
        return Ok(());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| HeraldError::Server(format!("Failed to bind port {}: {}", addr.port(), e)))?;
    tracing::info!("Herald listening on http://{}", addr);

    let dispatches = TaskTracker::new();
    let router = server::build_router(dispatcher, dispatches.clone());
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
        })
        .await
        .map_err(|e| HeraldError::Server(e.to_string()));

    // A dispatch may already hold its ledger record; let its deliveries finish
    server::drain_dispatches(&dispatches, shutdown_grace(&config)).await;
    served?;

    tracing::info!("Herald stopped");
    Ok(())
}
