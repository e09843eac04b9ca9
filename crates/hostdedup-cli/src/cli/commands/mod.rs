//! Command implementations.

pub mod config;
pub mod dedup;
pub mod normalize;
pub mod score;

use anyhow::Result;
use hostdedup_core::{DedupConfig, HostnameMetric};
use std::path::PathBuf;

use crate::config::Config;
use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output format
    pub output_format: OutputFormat,

    /// Whether to show educational explanations
    pub explain: bool,

    /// Verbose output
    pub verbose: bool,

    /// Disable colors
    pub no_color: bool,

    /// Loaded configuration
    pub config: Config,

    /// Where `config` was loaded from
    pub config_path: PathBuf,
}

impl Context {
    /// Engine settings from command flags layered over the config file.
    pub fn dedup_config(
        &self,
        threshold: Option<f64>,
        metric: Option<HostnameMetric>,
    ) -> Result<DedupConfig> {
        let config = self.config.dedup_config(threshold)?;
        Ok(match metric {
            Some(metric) => config.hostname_metric(metric),
            None => config,
        })
    }
}
