//! Scanning drop-off detection
//!
//! Flags a cluster when its most recent daily scan volumes have collapsed
//! relative to the largest value seen over the whole series.

use serde::Serialize;

/// Default number of most recent daily values that must all be low
const DEFAULT_RECENT_WINDOW: usize = 5;

/// Default fraction of the series maximum below which a value counts as low
const DEFAULT_DROP_RATIO: f64 = 0.1;

/// Detects a drop-off in daily scan volume
#[derive(Debug, Clone)]
pub struct TrendDetector {
    /// Number of trailing values inspected (also the minimum series length)
    pub recent_window: usize,
    /// Fraction of the series maximum a recent value must stay below
    pub drop_ratio: f64,
}

impl TrendDetector {
    /// Create a detector with the default 5-day window and 10% ratio
    pub fn new() -> Self {
        Self {
            recent_window: DEFAULT_RECENT_WINDOW,
            drop_ratio: DEFAULT_DROP_RATIO,
        }
    }

    /// Set a custom trailing window
    pub fn with_recent_window(mut self, recent_window: usize) -> Self {
        self.recent_window = recent_window;
        self
    }

    /// Set a custom drop ratio
    pub fn with_drop_ratio(mut self, drop_ratio: f64) -> Self {
        self.drop_ratio = drop_ratio;
        self
    }

    /// Whether the series shows a scanning drop-off
    pub fn is_anomalous(&self, values: &[f64]) -> bool {
        self.detect(values).is_some()
    }

    /// Detect a drop-off in a chronologically ordered series
    ///
    /// # Arguments
    /// * `values` - Daily scan volumes, oldest first
    ///
    /// # Returns
    /// * `Some(DropOffAnomaly)` if every recent value is zero or below
    ///   `drop_ratio * max`
    /// * `None` if the series is too short or any recent value is healthy
    pub fn detect(&self, values: &[f64]) -> Option<DropOffAnomaly> {
        // Not enough history to judge a trend
        if values.len() < self.recent_window {
            return None;
        }

        let max_value = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let threshold = self.drop_ratio * max_value;
        let recent = &values[values.len() - self.recent_window..];

        // An all-zero history yields threshold 0, so only zeros pass
        if recent.iter().all(|&v| v == 0.0 || v < threshold) {
            Some(DropOffAnomaly {
                max_value,
                threshold,
                recent_values: recent.to_vec(),
            })
        } else {
            None
        }
    }

    /// Human-readable statement of the rule this detector applies
    pub fn describe(&self) -> String {
        format!(
            "Last {} daily scanning trend values are 0 or less than {}% of the maximum value.",
            self.recent_window,
            format_percent(self.drop_ratio)
        )
    }
}

impl Default for TrendDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn format_percent(ratio: f64) -> String {
    let percent = ratio * 100.0;
    if (percent - percent.round()).abs() < 1e-9 {
        format!("{}", percent.round() as i64)
    } else {
        format!("{:.1}", percent)
    }
}

/// Scanning drop-off details
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropOffAnomaly {
    /// Largest value over the whole series
    pub max_value: f64,
    /// `drop_ratio * max_value`
    pub threshold: f64,
    /// The trailing values that were inspected, oldest first
    pub recent_values: Vec<f64>,
}

impl DropOffAnomaly {
    /// True when every recent value is exactly zero
    pub fn is_flatline(&self) -> bool {
        self.recent_values.iter().all(|&v| v == 0.0)
    }
}
