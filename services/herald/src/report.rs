//! Health report types consumed from the health-check engine

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Status of a single health check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    #[serde(alias = "Healthy")]
    Healthy,
    #[serde(alias = "Degraded")]
    Degraded,
    #[serde(alias = "Unhealthy")]
    Unhealthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "Healthy"),
            HealthStatus::Degraded => write!(f, "Degraded"),
            HealthStatus::Unhealthy => write!(f, "Unhealthy"),
        }
    }
}

/// Result of one named check within a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReportEntry {
    pub status: HealthStatus,
    #[serde(default)]
    pub description: Option<String>,
}

/// Aggregated check results for a target at the moment it went down
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub entries: BTreeMap<String, HealthReportEntry>,
}

impl HealthReport {
    /// Number of entries whose status is anything other than healthy
    pub fn failing_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.status != HealthStatus::Healthy)
            .count()
    }
}

impl FromIterator<(String, HealthStatus)> for HealthReport {
    fn from_iter<I: IntoIterator<Item = (String, HealthStatus)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(name, status)| {
                (
                    name,
                    HealthReportEntry {
                        status,
                        description: None,
                    },
                )
            })
            .collect();
        Self { entries }
    }
}
