//! Dashboard settings loaded from YAML
//!
//! ```yaml
//! resolve_strategy: word-boundary
//! histogram_bins: 20
//! scatter_matrix_dims: 4
//! fill_value: 0
//! preview_rows: 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::core::charts::MAX_BINS;
use crate::core::formula::ResolveStrategy;
use crate::error::{AutolensError, AutolensResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// How column names in formulas become references
    pub resolve_strategy: ResolveStrategy,
    pub histogram_bins: usize,
    /// Numeric columns shown in the scatterplot matrix
    pub scatter_matrix_dims: usize,
    /// Default replacement for missing values
    pub fill_value: f64,
    pub preview_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            resolve_strategy: ResolveStrategy::default(),
            histogram_bins: 20,
            scatter_matrix_dims: 4,
            fill_value: 0.0,
            preview_rows: 5,
        }
    }
}

impl DashboardConfig {
    pub fn from_yaml(content: &str) -> AutolensResult<Self> {
        let config: DashboardConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> AutolensResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        debug!(path = %path.display(), ?config, "loaded dashboard config");
        Ok(config)
    }

    /// Load `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> AutolensResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> AutolensResult<()> {
        if self.histogram_bins == 0 || self.histogram_bins > MAX_BINS {
            return Err(AutolensError::Validation(format!(
                "histogram_bins must be between 1 and {}",
                MAX_BINS
            )));
        }
        if self.scatter_matrix_dims < 2 {
            return Err(AutolensError::Validation(
                "scatter_matrix_dims must be at least 2".to_string(),
            ));
        }
        if !self.fill_value.is_finite() {
            return Err(AutolensError::Validation(
                "fill_value must be a finite number".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = DashboardConfig::from_yaml("histogram_bins: 10\nresolve_strategy: substring\n").unwrap();
        assert_eq!(config.histogram_bins, 10);
        assert_eq!(config.resolve_strategy, ResolveStrategy::Substring);
        assert_eq!(config.scatter_matrix_dims, 4);
        assert_eq!(config.preview_rows, 5);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(DashboardConfig::from_yaml("histogram_bins: 0\n").is_err());
        assert!(DashboardConfig::from_yaml("histogram_bins: 10001\n").is_err());
        assert!(DashboardConfig::from_yaml("histogram_bins: 10000\n").is_ok());
        assert!(DashboardConfig::from_yaml("scatter_matrix_dims: 1\n").is_err());
        assert!(DashboardConfig::from_yaml("colour: red\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autolens.yaml");
        std::fs::write(&path, "fill_value: -1\n").unwrap();

        let config = DashboardConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.fill_value, -1.0);
        assert_eq!(DashboardConfig::load_or_default(None).unwrap(), DashboardConfig::default());
    }
}
