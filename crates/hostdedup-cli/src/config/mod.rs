//! Configuration management.
//!
//! Settings live in a TOML file under the platform config directory unless
//! `--config` points elsewhere. A missing file means all defaults.

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use hostdedup_core::{DedupConfig, HostnameMetric, SignalWeights};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Default output format.
    pub output_format: Option<OutputFormat>,

    /// Similarity threshold for merging two records.
    pub threshold: Option<f64>,

    /// Metric for the hostname signal.
    pub hostname_metric: Option<HostnameMetric>,

    /// Always show explanations (as if --explain was passed).
    #[serde(default)]
    pub explain_by_default: bool,

    /// Per-signal weights for the similarity score.
    pub weights: Option<SignalWeights>,
}

impl Config {
    /// Default config file path.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("io", "hostdedup", "hostdedup")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Engine settings with `threshold` (flag or env) taking precedence over the file.
    pub fn dedup_config(&self, threshold: Option<f64>) -> Result<DedupConfig> {
        let mut config = DedupConfig::default();
        if let Some(threshold) = threshold.or(self.threshold) {
            config = config.threshold(threshold);
        }
        if let Some(weights) = self.weights {
            config = config.weights(weights);
        }
        if let Some(metric) = self.hostname_metric {
            config = config.hostname_metric(metric);
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config {
            output_format: Some(OutputFormat::Json),
            threshold: Some(0.8),
            hostname_metric: Some(HostnameMetric::Levenshtein),
            explain_by_default: true,
            weights: Some(SignalWeights {
                ip: 0.4,
                mac: 0.4,
                hostname: 0.1,
                os: 0.1,
            }),
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn flag_threshold_beats_file() {
        let config = Config {
            threshold: Some(0.9),
            ..Config::default()
        };

        assert!((config.dedup_config(None).unwrap().threshold - 0.9).abs() < f64::EPSILON);
        assert!((config.dedup_config(Some(0.5)).unwrap().threshold - 0.5).abs() < f64::EPSILON);
        assert!(
            (Config::default().dedup_config(None).unwrap().threshold
                - DedupConfig::DEFAULT_THRESHOLD)
                .abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        assert!(Config::default().dedup_config(Some(0.0)).is_err());
        assert!(Config::default().dedup_config(Some(1.5)).is_err());
    }

    #[test]
    fn partial_weights_table_keeps_other_defaults() {
        let config: Config = toml::from_str("[weights]\nmac = 0.5\n").unwrap();

        let weights = config.weights.unwrap();
        assert!((weights.mac - 0.5).abs() < f64::EPSILON);
        assert!((weights.ip - SignalWeights::default().ip).abs() < f64::EPSILON);
        assert!(config.dedup_config(None).is_ok());
    }

    #[test]
    fn overflowing_weights_rejected() {
        let config = Config {
            weights: Some(SignalWeights {
                ip: 1e308,
                mac: 1e308,
                hostname: 1e308,
                os: 1e308,
            }),
            ..Config::default()
        };
        assert!(config.dedup_config(None).is_err());
    }

    #[test]
    fn reads_hand_written_file() {
        let toml = r#"
            output_format = "csv"
            threshold = 0.75
            hostname_metric = "sorensen-dice"

            [weights]
            ip = 0.3
            mac = 0.3
            hostname = 0.2
            os = 0.2
        "#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.output_format, Some(OutputFormat::Csv));
        assert_eq!(config.hostname_metric, Some(HostnameMetric::SorensenDice));
        assert!(!config.explain_by_default);
        assert!(config.dedup_config(None).is_ok());
    }
}
