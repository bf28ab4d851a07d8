//! Analysis configuration, loadable from JSON

use crate::{PipelineError, Result};
use insight_scheduler::SchedulerConfig;
use insight_validate::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default dimensions broken down in the summary
pub const DEFAULT_SEGMENTS: [&str; 3] = ["creative_type", "platform", "audience_type"];

/// Settings for one pipeline run
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```rust
/// use insight_pipeline::AnalysisConfig;
///
/// let config = AnalysisConfig::from_json_str(r#"{"lookback_days": 14, "scheduler": {"max_workers": 2}}"#)?;
/// assert_eq!(config.lookback_days, 14);
/// assert_eq!(config.scheduler.max_workers, 2);
/// assert_eq!(config.validation.retry_threshold, 0.6);
/// # Ok::<(), insight_pipeline::PipelineError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Window length used when the query names no period
    pub lookback_days: u32,
    /// Dimensions broken down in the summary
    pub segments: Vec<String>,
    /// Upper bound on generated hypotheses
    pub max_hypotheses: usize,
    pub scheduler: SchedulerConfig,
    pub validation: ValidationConfig,
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lookback_days == 0 {
            return Err(PipelineError::InvalidConfig(
                "lookback_days must be at least 1".to_string(),
            ));
        }
        if self.max_hypotheses == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_hypotheses must be at least 1".to_string(),
            ));
        }
        self.scheduler
            .validate()
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
        self.validation
            .validate()
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            lookback_days: 7,
            segments: DEFAULT_SEGMENTS.iter().map(|s| s.to_string()).collect(),
            max_hypotheses: 5,
            scheduler: SchedulerConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.lookback_days, 7);
        assert_eq!(config.segments, ["creative_type", "platform", "audience_type"]);
        assert_eq!(config.scheduler.max_workers, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_nested_values_rejected() {
        let err = AnalysisConfig::from_json_str(r#"{"scheduler": {"max_workers": 0}}"#).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));

        let err =
            AnalysisConfig::from_json_str(r#"{"validation": {"significance_level": 1.5}}"#).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));

        assert!(matches!(
            AnalysisConfig::from_json_str("{not json"),
            Err(PipelineError::Json(_))
        ));
    }

    #[test]
    fn test_from_json_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"segments": ["platform"], "validation": {{"test_kind": "welch"}}}}"#).unwrap();
        let config = AnalysisConfig::from_json_path(file.path()).unwrap();
        assert_eq!(config.segments, ["platform"]);
        assert_eq!(config.validation.test_kind, insight_validate::TestKind::Welch);
    }
}
