use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

use meeting_extraction::{DedupStrategy, ExtractionConfig, ScoringThresholds};

/// CLI settings loaded from environment variables.
///
/// Every variable is optional; unset values keep the library defaults.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub token_budget: Option<usize>,
    pub min_confidence: Option<f32>,
    pub pattern_confidence: Option<f32>,
    pub dedup: Option<DedupStrategy>,
    pub pass_threshold: Option<f64>,
    pub warning_threshold: Option<f64>,
}

fn parsed<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} must be a valid value, got {:?}", name, raw)),
        Err(_) => Ok(None),
    }
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            token_budget: parsed("MEETING_TOKEN_BUDGET")?,
            min_confidence: parsed("MEETING_MIN_CONFIDENCE")?,
            pattern_confidence: parsed("MEETING_PATTERN_CONFIDENCE")?,
            dedup: parsed("MEETING_DEDUP")?,
            pass_threshold: parsed("MEETING_PASS_THRESHOLD")?,
            warning_threshold: parsed("MEETING_WARNING_THRESHOLD")?,
        })
    }

    pub fn extraction_config(&self, drop_invalid: bool) -> ExtractionConfig {
        let mut config = ExtractionConfig::default();
        if let Some(budget) = self.token_budget {
            config = config.with_token_budget(budget);
        }
        if let Some(confidence) = self.min_confidence {
            config = config.with_min_confidence(confidence);
        }
        if let Some(confidence) = self.pattern_confidence {
            config = config.with_pattern_confidence(confidence);
        }
        if let Some(strategy) = self.dedup {
            config = config.with_dedup(strategy);
        }
        if drop_invalid {
            config = config.dropping_invalid();
        }
        config
    }

    /// Scoring thresholds, with overrides applied to `base`.
    pub fn thresholds(&self, base: ScoringThresholds) -> ScoringThresholds {
        ScoringThresholds {
            pass: self.pass_threshold.unwrap_or(base.pass),
            warning: self.warning_threshold.unwrap_or(base.warning),
            ..base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_keep_library_config() {
        let settings = Settings::default();
        let config = settings.extraction_config(false);
        assert_eq!(config.min_confidence, ExtractionConfig::default().min_confidence);
        assert!(!config.drop_invalid);
        assert_eq!(settings.thresholds(ScoringThresholds::default()).pass, 7.0);
    }

    #[test]
    fn test_overrides_apply() {
        let settings = Settings {
            min_confidence: Some(0.6),
            dedup: Some(DedupStrategy::similarity_merge()),
            warning_threshold: Some(4.5),
            ..Default::default()
        };
        let config = settings.extraction_config(true);
        assert_eq!(config.min_confidence, 0.6);
        assert_eq!(config.dedup_strategy, DedupStrategy::similarity_merge());
        assert!(config.drop_invalid);

        let thresholds = settings.thresholds(ScoringThresholds::default());
        assert_eq!(thresholds.warning, 4.5);
        assert_eq!(thresholds.pass, 7.0);
    }
}
