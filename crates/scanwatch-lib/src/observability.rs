//! Observability for scan runs
//!
//! Structured logging with tracing: every event carries an `event` name and
//! the Secure authority the run targets.

use tracing::{debug, info, warn};

use crate::anomaly::DropOffAnomaly;
use crate::api::ApiError;
use crate::models::TimeRange;

/// Structured logger for scan events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    authority: String,
}

impl StructuredLogger {
    pub fn new(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
        }
    }

    /// Log scan start with the query windows
    pub fn log_scan_started(&self, cluster_range: TimeRange, usage_range: TimeRange) {
        info!(
            event = "scan_started",
            authority = %self.authority,
            cluster_from = cluster_range.from,
            cluster_to = cluster_range.to,
            usage_from = usage_range.from,
            usage_to = usage_range.to,
            "Drop-off scan started"
        );
    }

    pub fn log_clusters_listed(&self, count: usize) {
        info!(
            event = "clusters_listed",
            authority = %self.authority,
            clusters = count,
            "Listed clusters with runtime findings"
        );
    }

    /// Log the outcome of evaluating one usage series
    pub fn log_series_evaluated(&self, cluster: &str, points: usize, anomalous: bool) {
        debug!(
            event = "series_evaluated",
            authority = %self.authority,
            cluster = %cluster,
            points = points,
            anomalous = anomalous,
            "Evaluated usage series"
        );
    }

    /// Log a scanning drop-off
    pub fn log_drop_off(&self, cluster: &str, anomaly: &DropOffAnomaly) {
        warn!(
            event = "drop_off_detected",
            authority = %self.authority,
            cluster = %cluster,
            max_value = anomaly.max_value,
            threshold = anomaly.threshold,
            recent_values = ?anomaly.recent_values,
            flatline = anomaly.is_flatline(),
            "Scanning drop-off detected"
        );
    }

    pub fn log_agents_fetched(&self, cluster: &str, agents: usize) {
        info!(
            event = "agents_fetched",
            authority = %self.authority,
            cluster = %cluster,
            agents = agents,
            "Fetched agent status"
        );
    }

    /// Log scan completion
    pub fn log_scan_completed(&self, clusters: usize, flagged: usize) {
        info!(
            event = "scan_completed",
            authority = %self.authority,
            clusters = clusters,
            flagged = flagged,
            "Drop-off scan completed"
        );
    }

    /// Log a failed API call; the run aborts after this
    pub fn log_request_failed(&self, cluster: Option<&str>, error: &ApiError) {
        warn!(
            event = "request_failed",
            authority = %self.authority,
            cluster = ?cluster,
            status = ?error.status(),
            transport = error.is_transport(),
            error = %error,
            "Secure API request failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("secure.example.com");
        assert_eq!(logger.authority, "secure.example.com");
    }

    #[test]
    fn test_logging_without_subscriber() {
        let logger = StructuredLogger::new("secure.example.com");
        let anomaly = DropOffAnomaly {
            max_value: 10.0,
            threshold: 1.0,
            recent_values: vec![0.0; 5],
        };

        logger.log_scan_started(TimeRange { from: 0, to: 1 }, TimeRange { from: 0, to: 1 });
        logger.log_clusters_listed(2);
        logger.log_series_evaluated("prod-eu", 30, true);
        logger.log_drop_off("prod-eu", &anomaly);
        logger.log_agents_fetched("prod-eu", 3);
        logger.log_scan_completed(2, 1);
    }
}
