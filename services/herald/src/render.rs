//! Webhook payload rendering
//!
//! Templates are plain strings with literal bookmark tokens. Substitution is a
//! straight replace of every occurrence: no escaping and no template engine,
//! so a template author writing JSON is responsible for quoting.

use crate::report::HealthReport;

/// Replaced with the target name
pub const LIVENESS_BOOKMARK: &str = "[[LIVENESS]]";

/// Replaced with the failure summary
pub const FAILURE_BOOKMARK: &str = "[[FAILURE]]";

/// Substitute the target name bookmark
pub fn render_name(template: &str, target_name: &str) -> String {
    template.replace(LIVENESS_BOOKMARK, target_name)
}

/// Substitute the failure summary bookmark
pub fn render_failure(template: &str, failure_summary: &str) -> String {
    template.replace(FAILURE_BOOKMARK, failure_summary)
}

/// Substitute both bookmarks
pub fn render(template: &str, target_name: &str, failure_summary: &str) -> String {
    render_failure(&render_name(template, target_name), failure_summary)
}

/// Human-readable summary of the failing entries in a report
pub fn failure_summary(report: &HealthReport) -> String {
    format!(
        "There is at least {} HealthChecks failing.",
        report.failing_count()
    )
}
