//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use hostdedup_core::HostnameMetric;
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Merge host inventories from several security scanners.
///
/// Reads raw Qualys and Crowdstrike host exports, normalizes them, and
/// collapses records describing the same machine into one host.
/// Use --explain on any command to learn what it does.
#[derive(Parser, Debug)]
#[command(name = "hostdedup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Explain what this command does (educational mode)
    #[arg(long, global = true)]
    pub explain: bool,

    /// Increase verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "HOSTDEDUP_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Normalize and deduplicate raw source exports
    Dedup(DedupArgs),

    /// Show pairwise similarity scores for host records
    Score(ScoreArgs),

    /// Normalize a single hostname, IP address, or MAC address
    Normalize(NormalizeArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),
}

// ============================================================================
// Dedup command
// ============================================================================

#[derive(Args, Debug)]
pub struct DedupArgs {
    /// Raw Qualys export (JSON array or object with `hosts`)
    #[arg(long, value_name = "FILE")]
    pub qualys: Vec<PathBuf>,

    /// Raw Crowdstrike export (JSON array or object with `hosts`)
    #[arg(long, value_name = "FILE")]
    pub crowdstrike: Vec<PathBuf>,

    /// Similarity threshold in (0, 1]
    #[arg(short, long, env = "HOSTDEDUP_THRESHOLD")]
    pub threshold: Option<f64>,

    /// Hostname metric (jaro-winkler, levenshtein, sorensen-dice)
    #[arg(long)]
    pub metric: Option<HostnameMetric>,

    /// Only compare records sharing an IP or MAC address
    #[arg(long)]
    pub blocking: bool,
}

// ============================================================================
// Score command
// ============================================================================

#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// JSON array of host records in the unified model
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Similarity threshold in (0, 1]
    #[arg(short, long, env = "HOSTDEDUP_THRESHOLD")]
    pub threshold: Option<f64>,

    /// Hostname metric (jaro-winkler, levenshtein, sorensen-dice)
    #[arg(long)]
    pub metric: Option<HostnameMetric>,

    /// Only show pairs at or above the threshold
    #[arg(long)]
    pub matches_only: bool,
}

// ============================================================================
// Normalize command
// ============================================================================

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    #[command(subcommand)]
    pub command: NormalizeCommands,
}

#[derive(Subcommand, Debug)]
pub enum NormalizeCommands {
    /// Lowercase and strip the domain suffix
    Hostname {
        /// Raw hostname
        value: String,
    },

    /// Check IPv4 dotted-quad shape
    Ip {
        /// Raw IP address
        value: String,
    },

    /// Canonicalize to colon-separated lowercase hex
    Mac {
        /// Raw MAC address
        value: String,
    },
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Value to set
        value: String,
    },

    /// Show configuration file path
    Path,
}
