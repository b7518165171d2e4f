//! HTTP access to the Secure API
//!
//! This module provides:
//! - Explicit per-run client configuration (authority, token, timeouts, limits)
//! - The three GET calls used by a drop-off scan
//! - A typed error separating transport failures from unexpected statuses

mod client;
mod error;

#[cfg(test)]
mod tests;

pub use client::{ClientConfig, SecureClient};
pub use error::ApiError;

use serde::Serialize;

/// Secure API endpoints queried during a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// Cluster names from runtime vulnerability findings
    ClusterFilter,
    /// Daily scan-volume timeseries
    UsageTimeseries,
    /// Agent listing for a cluster
    Agents,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::ClusterFilter => "/api/secure-metrics/v1/vm-cve/filter/cluster",
            Endpoint::UsageTimeseries => "/api/secure-metrics/v1/vm-data-usage/timeseries",
            Endpoint::Agents => "/api/cloud/v2/dataSources/agents",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::ClusterFilter => write!(f, "cluster filter"),
            Endpoint::UsageTimeseries => write!(f, "usage timeseries"),
            Endpoint::Agents => write!(f, "agents"),
        }
    }
}
