//! Core data models for the Secure metrics and agent endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Cluster names seen in runtime vulnerability findings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterList {
    #[serde(default)]
    pub values: Vec<String>,
    /// Remaining response fields, kept for verbose output
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

/// Daily usage timeseries for one cluster
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageTimeseries {
    #[serde(default)]
    pub results: Vec<UsageSeries>,
}

/// Ordered daily scan-volume samples, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageSeries {
    #[serde(rename = "series")]
    pub points: Vec<UsagePoint>,
}

impl UsageSeries {
    /// Sample values in chronological order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsagePoint {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_in_time: Option<String>,
}

impl UsagePoint {
    /// Parse `pointInTime` as RFC 3339, if present and one
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = self.point_in_time.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Agent listing for a data source filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentList {
    pub details: Vec<AgentDetail>,
}

/// A monitoring agent reporting for a cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDetail {
    pub cluster_name: String,
    pub labels: AgentLabels,
    pub agent_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentLabels {
    pub hostname: String,
}

/// Query window in epoch seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub from: i64,
    pub to: i64,
}

impl TimeRange {
    /// Window of `lookback` length ending at `now`
    pub fn ending_at(now: DateTime<Utc>, lookback: Lookback) -> Self {
        let to = now.timestamp();
        Self {
            from: to - lookback.as_secs(),
            to,
        }
    }
}

/// How far back a query reaches, written as `<n>h` or `<n>d`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookback {
    secs: i64,
}

impl Lookback {
    pub const fn hours(hours: i64) -> Self {
        Self { secs: hours * 3600 }
    }

    pub const fn days(days: i64) -> Self {
        Self { secs: days * 86400 }
    }

    pub fn as_secs(&self) -> i64 {
        self.secs
    }
}

impl Default for Lookback {
    fn default() -> Self {
        Self::days(30)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid lookback '{0}': expected a positive number followed by 'h' or 'd' (e.g. 24h, 30d)")]
pub struct ParseLookbackError(String);

impl FromStr for Lookback {
    type Err = ParseLookbackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseLookbackError(s.to_string());

        let unit = s.chars().last().ok_or_else(err)?;
        let n: i64 = s[..s.len() - unit.len_utf8()]
            .parse()
            .map_err(|_| err())?;
        if n <= 0 {
            return Err(err());
        }

        let unit_secs = match unit {
            'h' | 'H' => 3600,
            'd' | 'D' => 86400,
            _ => return Err(err()),
        };
        let secs = n.checked_mul(unit_secs).ok_or_else(err)?;

        Ok(Self { secs })
    }
}

impl std::fmt::Display for Lookback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.secs % 86400 == 0 {
            write!(f, "{}d", self.secs / 86400)
        } else {
            write!(f, "{}h", self.secs / 3600)
        }
    }
}

impl Serialize for Lookback {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Lookback {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
