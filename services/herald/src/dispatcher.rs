//! Dispatcher: turns target transitions into webhook notifications

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::{NotificationSettings, WebhookConfig};
use crate::cooldown::CooldownEvaluator;
use crate::delivery::{DeliveryClient, DeliveryOutcome};
use crate::io::HttpClient;
use crate::ledger::{NotificationLedger, NotificationRecord};
use crate::render;
use crate::report::HealthReport;

/// Result of handling one webhook for one transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// Same state already notified inside the cooldown window
    Suppressed,
    /// Recorded in the ledger and handed to the delivery client
    Sent(DeliveryOutcome),
    /// The ledger could not be read or written; nothing was delivered
    LedgerFailed(String),
}

impl fmt::Display for NotificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationOutcome::Suppressed => write!(f, "suppressed"),
            NotificationOutcome::Sent(delivery) => write!(f, "sent, {}", delivery),
            NotificationOutcome::LedgerFailed(e) => write!(f, "ledger failure: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookOutcome {
    pub webhook: String,
    pub outcome: NotificationOutcome,
}

/// Sends notifications for target transitions to every configured webhook
#[derive(Clone)]
pub struct NotificationDispatcher {
    webhooks: Arc<[WebhookConfig]>,
    ledger: Arc<dyn NotificationLedger>,
    cooldown: CooldownEvaluator,
    delivery: DeliveryClient,
}

impl fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("webhooks", &self.webhooks.len())
            .field("cooldown", &self.cooldown)
            .field("delivery", &self.delivery)
            .finish()
    }
}

impl NotificationDispatcher {
    pub fn new(
        webhooks: Vec<WebhookConfig>,
        settings: &NotificationSettings,
        ledger: Arc<dyn NotificationLedger>,
        http: Arc<dyn HttpClient>,
    ) -> Self {
        let timeout = Duration::from_secs(settings.request_timeout_seconds);
        tracing::debug!(
            "Created dispatcher with {} webhooks, cooldown {}s, timeout {:?}",
            webhooks.len(),
            settings.min_seconds_between_repeat_notifications,
            timeout
        );

        Self {
            webhooks: webhooks.into(),
            cooldown: CooldownEvaluator::new(
                Arc::clone(&ledger),
                settings.min_seconds_between_repeat_notifications,
            ),
            ledger,
            delivery: DeliveryClient::new(http, timeout),
        }
    }

    pub fn webhooks(&self) -> &[WebhookConfig] {
        &self.webhooks
    }

    pub fn ledger(&self) -> &Arc<dyn NotificationLedger> {
        &self.ledger
    }

    /// A target went unhealthy
    pub async fn notify_down(&self, target_name: &str, report: &HealthReport) -> Vec<WebhookOutcome> {
        self.notify_down_at(target_name, report, Utc::now()).await
    }

    pub async fn notify_down_at(
        &self,
        target_name: &str,
        report: &HealthReport,
        now: DateTime<Utc>,
    ) -> Vec<WebhookOutcome> {
        let summary = render::failure_summary(report);
        self.handle_transition(target_name, false, &summary, now)
            .await
    }

    /// A target recovered
    pub async fn notify_up(&self, target_name: &str) -> Vec<WebhookOutcome> {
        self.notify_up_at(target_name, Utc::now()).await
    }

    pub async fn notify_up_at(&self, target_name: &str, now: DateTime<Utc>) -> Vec<WebhookOutcome> {
        self.handle_transition(target_name, true, "", now).await
    }

    async fn handle_transition(
        &self,
        target_name: &str,
        is_healthy: bool,
        failure_summary: &str,
        now: DateTime<Utc>,
    ) -> Vec<WebhookOutcome> {
        tracing::debug!(
            "Transition for '{}' (healthy={}), {} webhooks",
            target_name,
            is_healthy,
            self.webhooks.len()
        );

        // Sequential: each webhook sees the ledger writes of the previous ones
        let mut outcomes = Vec::with_capacity(self.webhooks.len());
        for webhook in self.webhooks.iter() {
            let outcome = self
                .notify_webhook(webhook, target_name, is_healthy, failure_summary, now)
                .await;
            let outcome = WebhookOutcome {
                webhook: webhook.name.clone(),
                outcome,
            };
            log_outcome(target_name, is_healthy, &outcome);
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn notify_webhook(
        &self,
        webhook: &WebhookConfig,
        target_name: &str,
        is_healthy: bool,
        failure_summary: &str,
        now: DateTime<Utc>,
    ) -> NotificationOutcome {
        let payload = render::render_name(webhook.template_for(is_healthy), target_name);

        match self
            .cooldown
            .should_suppress(target_name, is_healthy, now)
            .await
        {
            Ok(true) => return NotificationOutcome::Suppressed,
            Ok(false) => {}
            Err(e) => return NotificationOutcome::LedgerFailed(e.to_string()),
        }

        let payload = render::render_failure(&payload, failure_summary);

        if let Err(e) = self
            .ledger
            .append(NotificationRecord::new(target_name, now, is_healthy))
            .await
        {
            return NotificationOutcome::LedgerFailed(e.to_string());
        }

        let delivery = self
            .delivery
            .send(webhook.endpoint_uri.as_deref(), &webhook.name, &payload)
            .await;
        NotificationOutcome::Sent(delivery)
    }
}

/// Log a webhook outcome at the level its kind calls for
pub fn log_outcome(target_name: &str, is_healthy: bool, outcome: &WebhookOutcome) {
    let state = if is_healthy { "recovery" } else { "failure" };
    match &outcome.outcome {
        NotificationOutcome::Suppressed => tracing::info!(
            "Suppressed {} notification for '{}' via '{}': already notified within cooldown window",
            state,
            target_name,
            outcome.webhook
        ),
        NotificationOutcome::Sent(delivery) => {
            if delivery.is_delivered() {
                tracing::info!(
                    "Sent {} notification for '{}' via '{}'",
                    state,
                    target_name,
                    outcome.webhook
                );
            }
            delivery.log(&outcome.webhook);
        }
        NotificationOutcome::LedgerFailed(e) => tracing::error!(
            "Dropped {} notification for '{}' via '{}', ledger unavailable: {}",
            state,
            target_name,
            outcome.webhook,
            e
        ),
    }
}
