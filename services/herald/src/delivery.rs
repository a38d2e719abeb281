//! Outbound webhook delivery
//!
//! `DeliveryClient::send` never fails: every problem is folded into a
//! `DeliveryOutcome` so one bad endpoint cannot interrupt the others.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;

use crate::io::HttpClient;

/// Longest response body excerpt written to the log, in characters
const MAX_LOGGED_BODY_CHARS: usize = 256;

/// What happened to a single delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The endpoint answered with a 2xx status
    Delivered { status: u16 },
    /// The endpoint URI is missing or unusable; no request was made
    InvalidEndpoint { reason: String },
    /// The endpoint answered with a non-success status
    Rejected { status: u16, body: String },
    /// Connection, transport, or timeout failure
    TransportFailed { reason: String },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    /// Log the outcome for the webhook named `label`
    pub fn log(&self, label: &str) {
        match self {
            DeliveryOutcome::Delivered { status } => {
                tracing::debug!("Webhook '{}' delivered (status {})", label, status)
            }
            DeliveryOutcome::InvalidEndpoint { reason } => tracing::warn!(
                "Webhook '{}' is misconfigured, skipping delivery: {}",
                label,
                reason
            ),
            DeliveryOutcome::Rejected { status, body } => tracing::error!(
                "Webhook '{}' responded with status {}: {}",
                label,
                status,
                body_excerpt(body)
            ),
            DeliveryOutcome::TransportFailed { reason } => {
                tracing::error!("Webhook '{}' could not be reached: {}", label, reason)
            }
        }
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryOutcome::Delivered { status } => write!(f, "delivered ({})", status),
            DeliveryOutcome::InvalidEndpoint { reason } => {
                write!(f, "invalid endpoint: {}", reason)
            }
            DeliveryOutcome::Rejected { status, .. } => write!(f, "rejected ({})", status),
            DeliveryOutcome::TransportFailed { reason } => {
                write!(f, "transport failed: {}", reason)
            }
        }
    }
}

/// First `MAX_LOGGED_BODY_CHARS` characters of a response body
pub fn body_excerpt(body: &str) -> std::borrow::Cow<'_, str> {
    match body.char_indices().nth(MAX_LOGGED_BODY_CHARS) {
        Some((cut, _)) => format!("{}... ({} bytes)", &body[..cut], body.len()).into(),
        None => body.into(),
    }
}

/// Parse a webhook endpoint, accepting only absolute http(s) URIs
pub fn parse_endpoint(endpoint_uri: Option<&str>) -> Result<Url, String> {
    let raw = endpoint_uri
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "no endpoint URI configured".to_string())?;

    let url = Url::parse(raw).map_err(|e| format!("'{}' is not an absolute URI: {}", raw, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{}' in '{}'", other, raw)),
    }
}

/// Posts rendered payloads to webhook endpoints
#[derive(Clone)]
pub struct DeliveryClient {
    http: Arc<dyn HttpClient>,
    timeout: Duration,
}

impl fmt::Debug for DeliveryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryClient")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DeliveryClient {
    pub fn new(http: Arc<dyn HttpClient>, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    /// POST `payload` to `endpoint_uri`. `label` only identifies the webhook in outcomes.
    pub async fn send(
        &self,
        endpoint_uri: Option<&str>,
        label: &str,
        payload: &str,
    ) -> DeliveryOutcome {
        let url = match parse_endpoint(endpoint_uri) {
            Ok(url) => url,
            Err(reason) => return DeliveryOutcome::InvalidEndpoint { reason },
        };

        tracing::debug!("Delivering to webhook '{}' at {}", label, url);

        let request = self.http.post_json(url.as_str(), payload);
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) if response.is_success() => DeliveryOutcome::Delivered {
                status: response.status,
            },
            Ok(Ok(response)) => DeliveryOutcome::Rejected {
                status: response.status,
                body: response.body,
            },
            Ok(Err(e)) => DeliveryOutcome::TransportFailed {
                reason: e.to_string(),
            },
            Err(_) => DeliveryOutcome::TransportFailed {
                reason: format!("timed out after {:?}", self.timeout),
            },
        }
    }
}
