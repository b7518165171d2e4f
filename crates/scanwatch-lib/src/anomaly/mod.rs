//! Anomaly detection for scan-volume trends
//!
//! This module provides detection for:
//! - Scanning drop-off (recent daily volume collapsed against the series maximum)

mod trend_detector;

pub use trend_detector::{DropOffAnomaly, TrendDetector};
