//! Drop-off scan over every cluster with runtime findings
//!
//! Lists clusters, evaluates each cluster's daily usage series with a
//! [`TrendDetector`] and fetches agent status for flagged series. Clusters
//! are processed one at a time and the first failed call aborts the scan.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::anomaly::{DropOffAnomaly, TrendDetector};
use crate::api::{ApiError, SecureClient};
use crate::models::{AgentDetail, ClusterList, Lookback, TimeRange, UsagePoint, UsageSeries};
use crate::observability::StructuredLogger;

/// Query windows for a scan
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ScanWindow {
    /// Window for the cluster listing call
    pub cluster_lookback: Lookback,
    /// Window for each cluster's usage series
    pub usage_lookback: Lookback,
}

impl ScanWindow {
    pub fn new(cluster_lookback: Lookback, usage_lookback: Lookback) -> Self {
        Self {
            cluster_lookback,
            usage_lookback,
        }
    }
}

/// One evaluated usage series and, when flagged, the cluster's agents
#[derive(Debug, Clone, Serialize)]
pub struct SeriesEvaluation {
    pub points: Vec<UsagePoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<DropOffAnomaly>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<AgentDetail>,
}

/// Result of scanning a single cluster
#[derive(Debug, Clone, Serialize)]
pub struct ClusterFinding {
    pub cluster: String,
    pub series: Vec<SeriesEvaluation>,
}

impl ClusterFinding {
    /// Whether any of the cluster's series was flagged
    pub fn is_drop_off(&self) -> bool {
        self.series.iter().any(|s| s.anomaly.is_some())
    }

    /// Flagged series, in response order
    pub fn drop_offs(&self) -> impl Iterator<Item = &SeriesEvaluation> {
        self.series.iter().filter(|s| s.anomaly.is_some())
    }
}

/// Full scan result
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub rule: String,
    pub cluster_range: TimeRange,
    pub usage_range: TimeRange,
    pub clusters: Vec<ClusterFinding>,
}

impl ScanReport {
    pub fn flagged(&self) -> impl Iterator<Item = &ClusterFinding> {
        self.clusters.iter().filter(|c| c.is_drop_off())
    }
}

/// Sequential drop-off scanner
pub struct DropOffScanner {
    client: SecureClient,
    detector: TrendDetector,
    logger: StructuredLogger,
    now: DateTime<Utc>,
    cluster_range: TimeRange,
    usage_range: TimeRange,
}

impl DropOffScanner {
    /// Create a scanner whose windows end at `now`
    pub fn new(
        client: SecureClient,
        detector: TrendDetector,
        window: ScanWindow,
        now: DateTime<Utc>,
    ) -> Self {
        let logger = StructuredLogger::new(client.config().base_url.authority());
        Self {
            client,
            detector,
            logger,
            now,
            cluster_range: TimeRange::ending_at(now, window.cluster_lookback),
            usage_range: TimeRange::ending_at(now, window.usage_lookback),
        }
    }

    pub fn detector(&self) -> &TrendDetector {
        &self.detector
    }

    pub fn cluster_range(&self) -> TimeRange {
        self.cluster_range
    }

    pub fn usage_range(&self) -> TimeRange {
        self.usage_range
    }

    /// Fetch cluster names with runtime findings in the cluster window
    pub async fn list_clusters(&self) -> Result<ClusterList, ApiError> {
        self.logger
            .log_scan_started(self.cluster_range, self.usage_range);

        let clusters = self
            .client
            .list_clusters(self.cluster_range)
            .await
            .inspect_err(|e| self.logger.log_request_failed(None, e))?;

        self.logger.log_clusters_listed(clusters.values.len());
        Ok(clusters)
    }

    /// Evaluate every usage series of one cluster and fetch agents for the
    /// flagged ones
    pub async fn scan_cluster(&self, cluster: &str) -> Result<ClusterFinding, ApiError> {
        let mut finding = self.evaluate_cluster(cluster).await?;
        for series in &mut finding.series {
            self.fetch_agents(cluster, series).await?;
        }
        Ok(finding)
    }

    /// Fetch one cluster's usage series and run the detector on each
    ///
    /// Agents are left empty; see [`Self::fetch_agents`].
    pub async fn evaluate_cluster(&self, cluster: &str) -> Result<ClusterFinding, ApiError> {
        let usage = self
            .client
            .usage_timeseries(cluster, self.usage_range)
            .await
            .inspect_err(|e| self.logger.log_request_failed(Some(cluster), e))?;

        let series = usage
            .results
            .into_iter()
            .map(|result| self.evaluate(cluster, result))
            .collect();

        Ok(ClusterFinding {
            cluster: cluster.to_string(),
            series,
        })
    }

    fn evaluate(&self, cluster: &str, usage: UsageSeries) -> SeriesEvaluation {
        let anomaly = self.detector.detect(&usage.values());
        self.logger
            .log_series_evaluated(cluster, usage.len(), anomaly.is_some());
        if let Some(found) = &anomaly {
            self.logger.log_drop_off(cluster, found);
        }

        SeriesEvaluation {
            points: usage.points,
            anomaly,
            agents: Vec::new(),
        }
    }

    /// Fetch agent status for a flagged series; unflagged series are left as is
    pub async fn fetch_agents(
        &self,
        cluster: &str,
        series: &mut SeriesEvaluation,
    ) -> Result<(), ApiError> {
        if series.anomaly.is_none() {
            return Ok(());
        }

        let agents = self
            .client
            .agents(cluster)
            .await
            .inspect_err(|e| self.logger.log_request_failed(Some(cluster), e))?;
        self.logger.log_agents_fetched(cluster, agents.details.len());
        series.agents = agents.details;
        Ok(())
    }

    /// Scan every listed cluster and collect the findings
    pub async fn run(&self) -> Result<ScanReport, ApiError> {
        let clusters = self.list_clusters().await?;

        let mut findings = Vec::with_capacity(clusters.values.len());
        for cluster in &clusters.values {
            findings.push(self.scan_cluster(cluster).await?);
        }

        Ok(self.report(findings))
    }

    /// Assemble a report from findings produced by [`Self::scan_cluster`]
    pub fn report(&self, clusters: Vec<ClusterFinding>) -> ScanReport {
        let flagged = clusters.iter().filter(|c| c.is_drop_off()).count();
        self.logger.log_scan_completed(clusters.len(), flagged);

        ScanReport {
            generated_at: self.now,
            rule: self.detector.describe(),
            cluster_range: self.cluster_range,
            usage_range: self.usage_range,
            clusters,
        }
    }
}
