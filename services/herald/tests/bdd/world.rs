//! BDD test world for herald service

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use cucumber::World;
use herald::config::{NotificationSettings, WebhookConfig};
use herald::io::{HttpClient, HttpResponse};
use herald::ledger::MemoryLedger;
use herald::{NotificationDispatcher, WebhookOutcome};

/// HTTP client that records every POST and answers per URL
#[derive(Debug, Default)]
pub struct RecordingHttpClient {
    requests: Mutex<Vec<(String, String)>>,
    hanging: Mutex<Vec<String>>,
    statuses: Mutex<HashMap<String, u16>>,
}

impl RecordingHttpClient {
    pub fn hang_on(&self, url: &str) {
        self.hanging.lock().unwrap().push(url.to_string());
    }

    pub fn respond_with(&self, url: &str, status: u16) {
        self.statuses.lock().unwrap().insert(url.to_string(), status);
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl HttpClient for RecordingHttpClient {
    async fn post_json(&self, url: &str, body: &str) -> herald::Result<HttpResponse> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), body.to_string()));

        let hangs = self.hanging.lock().unwrap().iter().any(|u| u == url);
        if hangs {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }

        let status = self.statuses.lock().unwrap().get(url).copied().unwrap_or(200);
        Ok(HttpResponse {
            status,
            body: String::new(),
        })
    }
}

#[derive(Debug, Default, World)]
pub struct HeraldWorld {
    pub window_seconds: i64,
    pub webhooks: Vec<WebhookConfig>,
    pub ledger: Arc<MemoryLedger>,
    pub http: Arc<RecordingHttpClient>,
    pub last_outcomes: Vec<WebhookOutcome>,

    // Rendering
    pub template: Option<String>,
    pub rendered: Option<String>,
}

impl HeraldWorld {
    pub fn dispatcher(&self) -> NotificationDispatcher {
        NotificationDispatcher::new(
            self.webhooks.clone(),
            &NotificationSettings {
                min_seconds_between_repeat_notifications: self.window_seconds,
                request_timeout_seconds: 1,
            },
            self.ledger.clone(),
            self.http.clone(),
        )
    }
}

/// Scenario clock: seconds after a fixed epoch
pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
}
