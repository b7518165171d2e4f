//! Scanning drop-off detection for Secure clusters
//!
//! This crate provides the core functionality for:
//! - Trend analysis of daily runtime scan volume
//! - Access to the Secure metrics and data source APIs
//! - Sequential per-cluster scans with agent status lookups
//! - Structured logging of scan runs

pub mod anomaly;
pub mod api;
pub mod models;
pub mod observability;
pub mod scanner;

pub use anomaly::{DropOffAnomaly, TrendDetector};
pub use api::{ApiError, ClientConfig, Endpoint, SecureClient};
pub use models::*;
pub use observability::StructuredLogger;
pub use scanner::{ClusterFinding, DropOffScanner, ScanReport, ScanWindow, SeriesEvaluation};
