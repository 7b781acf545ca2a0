use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analytics::risk::HeuristicScorer;

/// Allowed number of rows in the top at-risk list.
pub const TOP_N_RANGE: RangeInclusive<usize> = 5..=20;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Knobs of the recomputation pass itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Tenure strictly above this counts as long-term.
    pub long_term_months: u32,
    pub histogram_bins: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            long_term_months: 60,
            histogram_bins: 30,
        }
    }
}

/// Dashboard configuration.  Every field is optional in the JSON file.
///
/// ```json
/// {
///   "data_path": "ChurnSpreadsheet.csv",
///   "top_n": 10,
///   "analysis": { "long_term_months": 60, "histogram_bins": 30 },
///   "heuristic": { "month_to_month": 0.4, "new_customer": 0.3,
///                  "new_customer_months": 12, "per_addon": 0.05 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub top_n: usize,
    pub analysis: AnalysisConfig,
    pub heuristic: HeuristicScorer,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("ChurnSpreadsheet.csv"),
            top_n: 10,
            analysis: AnalysisConfig::default(),
            heuristic: HeuristicScorer::default(),
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config file and normalise it.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: DashboardConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config.normalized())
    }

    /// Clamp out-of-range values instead of rejecting them.
    pub fn normalized(mut self) -> Self {
        let clamped = clamp_top_n(self.top_n);
        if clamped != self.top_n {
            log::warn!(
                "top_n {} outside {}..={}, using {clamped}",
                self.top_n,
                TOP_N_RANGE.start(),
                TOP_N_RANGE.end()
            );
            self.top_n = clamped;
        }
        if self.analysis.histogram_bins == 0 {
            log::warn!("histogram_bins must be positive, using 30");
            self.analysis.histogram_bins = 30;
        }
        self
    }
}

pub fn clamp_top_n(n: usize) -> usize {
    n.clamp(*TOP_N_RANGE.start(), *TOP_N_RANGE.end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "top_n": 15, "heuristic": {{ "per_addon": 0.1 }} }}"#).unwrap();

        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.top_n, 15);
        assert_eq!(config.heuristic.per_addon, 0.1);
        assert_eq!(config.heuristic.month_to_month, 0.4);
        assert_eq!(config.analysis, AnalysisConfig::default());
        assert_eq!(config.data_path, PathBuf::from("ChurnSpreadsheet.csv"));
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let config = DashboardConfig {
            top_n: 50,
            analysis: AnalysisConfig {
                histogram_bins: 0,
                ..AnalysisConfig::default()
            },
            ..DashboardConfig::default()
        }
        .normalized();
        assert_eq!(config.top_n, 20);
        assert_eq!(config.analysis.histogram_bins, 30);
        assert_eq!(clamp_top_n(1), 5);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        assert!(DashboardConfig::from_file(file.path()).is_err());
    }
}
