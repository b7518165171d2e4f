//! Output formatting utilities

use std::fmt::Write;

use clap::ValueEnum;
use colored::Colorize;
use scanwatch_lib::{ClusterList, ScanReport, SeriesEvaluation, TrendDetector};
use serde::Deserialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for scan results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text lines (default)
    #[default]
    Text,
    /// Agent tables per flagged cluster
    Table,
    /// JSON report
    Json,
}

/// How much of the scan to show
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// Only flagged clusters and their agents
    #[default]
    Summary,
    /// Also the cluster list and every evaluated series
    Verbose,
}

/// Row for the agent status table
#[derive(Tabled)]
struct AgentRow {
    #[tabled(rename = "Cluster")]
    cluster: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Row for the cluster list table
#[derive(Tabled)]
struct ClusterRow {
    #[tabled(rename = "Cluster")]
    cluster: String,
}

/// Renders scan progress in the selected format
pub struct Reporter {
    format: OutputFormat,
    detail: DetailLevel,
    rule: String,
    recent_window: usize,
}

impl Reporter {
    pub fn new(format: OutputFormat, detail: DetailLevel, detector: &TrendDetector) -> Self {
        Self {
            format,
            detail,
            rule: detector.describe(),
            recent_window: detector.recent_window,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn verbose(&self) -> bool {
        self.detail == DetailLevel::Verbose
    }

    /// Cluster list, shown only in verbose mode
    pub fn render_clusters(&self, clusters: &ClusterList) -> serde_json::Result<Option<String>> {
        if !self.verbose() {
            return Ok(None);
        }

        match self.format {
            OutputFormat::Text => {
                let json = serde_json::to_string(clusters)?;
                Ok(Some(format!("clusters: {}\n\n", json)))
            }
            OutputFormat::Table => {
                if clusters.values.is_empty() {
                    return Ok(Some(format!("{}\n", "No clusters found".yellow())));
                }
                let rows = clusters.values.iter().map(|c| ClusterRow { cluster: c.clone() });
                let table = Table::new(rows).with(Style::rounded()).to_string();
                Ok(Some(format!("{}\n", table)))
            }
            OutputFormat::Json => Ok(None),
        }
    }

    /// Output for one evaluated series, shown before its agents are fetched
    pub fn render_series(&self, cluster: &str, series: &SeriesEvaluation) -> Option<String> {
        let mut out = String::new();

        if self.verbose() {
            self.write_series_summary(&mut out, cluster, series);
        }
        if series.anomaly.is_some() {
            match self.format {
                OutputFormat::Text => {
                    let _ = writeln!(out, "Cluster {}: {}", cluster, self.rule);
                }
                OutputFormat::Table => {
                    let _ = writeln!(out, "{} {}", format!("Cluster {}:", cluster).bold(), self.rule);
                }
                OutputFormat::Json => {}
            }
        }

        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }

    /// Agent status of a flagged series
    pub fn render_agents(&self, series: &SeriesEvaluation) -> Option<String> {
        match self.format {
            OutputFormat::Text => {
                if series.agents.is_empty() {
                    return None;
                }
                let mut out = String::new();
                for agent in &series.agents {
                    let _ = writeln!(
                        out,
                        "\tAgent Status: {} {} {}",
                        agent.cluster_name, agent.labels.hostname, agent.agent_status
                    );
                }
                Some(out)
            }
            OutputFormat::Table => {
                if series.agents.is_empty() {
                    return Some(format!("{}\n", "No agents found".yellow()));
                }
                let rows = series.agents.iter().map(|a| AgentRow {
                    cluster: a.cluster_name.clone(),
                    hostname: a.labels.hostname.clone(),
                    status: color_status(&a.agent_status),
                });
                let table = Table::new(rows).with(Style::rounded()).to_string();
                Some(format!("{}\n", table))
            }
            OutputFormat::Json => None,
        }
    }

    fn write_series_summary(&self, out: &mut String, cluster: &str, series: &SeriesEvaluation) {
        let values: Vec<f64> = series.points.iter().map(|p| p.value).collect();
        let recent = &values[values.len().saturating_sub(self.recent_window)..];
        let max = values.iter().copied().fold(0.0_f64, f64::max);

        let _ = writeln!(
            out,
            "Cluster {}: {} daily values, max {}, last {}: {}",
            cluster,
            values.len(),
            max,
            recent.len(),
            format_values(recent)
        );
    }

    /// Closing line for the table format
    pub fn render_summary(&self, report: &ScanReport) -> Option<String> {
        if self.format != OutputFormat::Table {
            return None;
        }

        let flagged = report.flagged().count();
        let line = format!(
            "{} of {} clusters show a scanning drop-off",
            flagged,
            report.clusters.len()
        );
        if flagged == 0 {
            Some(format!("{}\n", line.green()))
        } else {
            Some(format!("{}\n", line.red().bold()))
        }
    }

    /// JSON report; summary detail keeps only flagged clusters
    pub fn render_report(&self, report: &ScanReport) -> serde_json::Result<String> {
        if self.verbose() {
            return serde_json::to_string_pretty(report);
        }

        let mut flagged = report.clone();
        flagged.clusters.retain(|c| c.is_drop_off());
        serde_json::to_string_pretty(&flagged)
    }
}

fn format_values(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

/// Color agent status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" | "running" | "connected" => status.green().to_string(),
        "degraded" | "warning" | "outofdate" => status.yellow().to_string(),
        "unhealthy" | "error" | "disconnected" | "failed" => status.red().to_string(),
        _ => status.to_string(),
    }
}
