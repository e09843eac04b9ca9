//! `hostdedup config` - CLI configuration management.

use anyhow::Result;
use colored::Colorize;
use hostdedup_core::DedupConfig;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::output::{self, OutputFormat};

pub fn execute(ctx: &Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(ctx),
        ConfigCommands::Set { key, value } => set_config(ctx, &key, &value),
        ConfigCommands::Path => {
            println!("{}", ctx.config_path.display());
            Ok(())
        }
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    let config = &ctx.config;

    match ctx.output_format {
        OutputFormat::Json => output::print_json(config)?,
        OutputFormat::Yaml => output::print_yaml(config)?,
        _ => {
            let not_set = "(default)".dimmed().to_string();
            let weights = config.weights.unwrap_or_default();

            println!("{}", "Current Configuration:".bold());
            println!();
            println!(
                "  {} {}",
                "output_format:".bold(),
                config
                    .output_format
                    .map_or_else(|| not_set.clone(), |f| f.to_string())
            );
            println!(
                "  {} {}",
                "threshold:".bold(),
                config.threshold.map_or_else(
                    || format!("{} {}", DedupConfig::DEFAULT_THRESHOLD, not_set),
                    |t| t.to_string()
                )
            );
            println!(
                "  {} {}",
                "hostname_metric:".bold(),
                config
                    .hostname_metric
                    .map_or_else(|| not_set.clone(), |m| m.to_string())
            );
            println!(
                "  {} ip={} mac={} hostname={} os={}",
                "weights:".bold(),
                weights.ip,
                weights.mac,
                weights.hostname,
                weights.os
            );
            println!("  {} {}", "explain_by_default:".bold(), config.explain_by_default);
        }
    }

    Ok(())
}

fn set_config(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let mut config = ctx.config.clone();

    match key {
        "output_format" | "output" => {
            config.output_format = Some(value.parse()?);
        }
        "threshold" => {
            config.threshold = Some(value.parse()?);
        }
        "hostname_metric" | "metric" => {
            config.hostname_metric = Some(value.parse()?);
        }
        "explain_by_default" | "explain" => {
            config.explain_by_default = value.parse()?;
        }
        "weights.ip" | "weights.mac" | "weights.hostname" | "weights.os" => {
            let weight: f64 = value.parse()?;
            let mut weights = config.weights.unwrap_or_default();
            match key {
                "weights.ip" => weights.ip = weight,
                "weights.mac" => weights.mac = weight,
                "weights.hostname" => weights.hostname = weight,
                _ => weights.os = weight,
            }
            config.weights = Some(weights);
        }
        _ => {
            anyhow::bail!(
                "Unknown config key: {key}\n\n\
                 Available keys:\n  \
                 output_format      - Default output format (pretty/json/csv/yaml)\n  \
                 threshold          - Similarity threshold in (0, 1]\n  \
                 hostname_metric    - jaro-winkler, levenshtein or sorensen-dice\n  \
                 explain_by_default - Always explain commands (true/false)\n  \
                 weights.<signal>   - Weight of ip, mac, hostname or os"
            );
        }
    }

    // Refuse to persist settings the engine would reject.
    config.dedup_config(None)?;
    config.save_to(&ctx.config_path)?;

    println!("{} {} set to {}.", "Success:".green().bold(), key, value.cyan());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use hostdedup_core::SignalWeights;
    use std::path::Path;

    fn context(path: &Path) -> Context {
        Context {
            output_format: OutputFormat::Pretty,
            explain: false,
            verbose: false,
            no_color: true,
            config: Config::default(),
            config_path: path.to_path_buf(),
        }
    }

    #[test]
    fn set_persists_weight() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        set_config(&context(&path), "weights.mac", "0.5").unwrap();

        let saved = Config::load_from(&path).unwrap();
        let expected = SignalWeights {
            mac: 0.5,
            ..SignalWeights::default()
        };
        assert_eq!(saved.weights, Some(expected));
    }

    #[test]
    fn invalid_threshold_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert!(set_config(&context(&path), "threshold", "2").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn overflowing_weights_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        set_config(&context(&path), "weights.ip", "1e308").unwrap();
        let ctx = Context {
            config: Config::load_from(&path).unwrap(),
            ..context(&path)
        };
        assert!(set_config(&ctx, "weights.mac", "1e308").is_err());

        let saved = Config::load_from(&path).unwrap();
        assert!((saved.weights.unwrap().mac - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(set_config(&context(&dir.path().join("c.toml")), "api_key", "x").is_err());
    }
}
