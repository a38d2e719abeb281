//! Repeat-notification suppression

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::ledger::{NotificationLedger, NotificationRecord};

/// Decide whether a notification for `desired_healthy` should be suppressed,
/// given the most recent record for the same target.
///
/// Only a repeat of the same state inside the window is suppressed. A state
/// flip, a first notification, or a window of zero or less always fires.
pub fn is_suppressed(
    last: Option<&NotificationRecord>,
    desired_healthy: bool,
    now: DateTime<Utc>,
    window_seconds: i64,
) -> bool {
    if window_seconds <= 0 {
        return false;
    }
    match last {
        Some(record) if record.is_healthy == desired_healthy => {
            let elapsed = now.signed_duration_since(record.recorded_at);
            // Windows too large to represent never expire
            Duration::try_seconds(window_seconds).is_none_or(|window| elapsed < window)
        }
        _ => false,
    }
}

/// Answers cooldown questions against the shared ledger
#[derive(Clone)]
pub struct CooldownEvaluator {
    ledger: Arc<dyn NotificationLedger>,
    window_seconds: i64,
}

impl std::fmt::Debug for CooldownEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CooldownEvaluator")
            .field("window_seconds", &self.window_seconds)
            .finish()
    }
}

impl CooldownEvaluator {
    pub fn new(ledger: Arc<dyn NotificationLedger>, window_seconds: i64) -> Self {
        Self {
            ledger,
            window_seconds,
        }
    }

    pub fn window_seconds(&self) -> i64 {
        self.window_seconds
    }

    pub async fn should_suppress(
        &self,
        target_name: &str,
        desired_healthy: bool,
        now: DateTime<Utc>,
    ) -> crate::Result<bool> {
        let last = self.ledger.latest(target_name).await?;
        Ok(is_suppressed(
            last.as_ref(),
            desired_healthy,
            now,
            self.window_seconds,
        ))
    }
}
