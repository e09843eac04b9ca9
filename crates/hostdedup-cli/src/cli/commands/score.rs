//! `hostdedup score` - Pairwise similarity breakdown.

use anyhow::{Context as _, Result};
use colored::Colorize;
use hostdedup_core::normalize::normalize_host;
use hostdedup_core::{Host, SimilarityScorer};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use super::Context;
use crate::cli::args::ScoreArgs;
use crate::education::Explain;
use crate::output::{self, OutputFormat};

/// Similarity of one record pair.
#[derive(Debug, Serialize, Tabled)]
pub struct PairScore {
    #[tabled(rename = "A")]
    pub a: String,
    #[tabled(rename = "B")]
    pub b: String,
    #[tabled(rename = "IP", display_with = "fmt_score")]
    pub ip: f64,
    #[tabled(rename = "MAC", display_with = "fmt_score")]
    pub mac: f64,
    #[tabled(rename = "Hostname", display_with = "fmt_score")]
    pub hostname: f64,
    #[tabled(rename = "OS", display_with = "fmt_score")]
    pub os: f64,
    #[tabled(rename = "Score", display_with = "fmt_score")]
    pub score: f64,
    #[tabled(rename = "Match")]
    pub is_match: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn fmt_score(value: &f64) -> String {
    format!("{value:.3}")
}

pub fn execute(ctx: &Context, args: ScoreArgs) -> Result<()> {
    let config = ctx.dedup_config(args.threshold, args.metric)?;

    if ctx.explain {
        Explain::score(config.threshold).print();
    }

    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let hosts: Vec<Host> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of host records", args.file.display()))?;
    let hosts: Vec<Host> = hosts.into_iter().map(normalize_host).collect();

    let scorer = SimilarityScorer::new(config.weights, config.hostname_metric)?;
    let pairs: Vec<PairScore> = score_pairs(&scorer, &hosts, config.threshold)
        .into_iter()
        .filter(|pair| !args.matches_only || pair.is_match)
        .collect();

    match ctx.output_format {
        OutputFormat::Json => output::print_json(&pairs)?,
        OutputFormat::Yaml => output::print_yaml(&pairs)?,
        OutputFormat::Csv => output::write_csv(&pairs)?,
        OutputFormat::Pretty => {
            if pairs.is_empty() {
                println!("{}", "No pairs to show.".yellow());
                return Ok(());
            }

            let matches = pairs.iter().filter(|p| p.is_match).count();
            let mut table = Table::new(&pairs);
            table.with(Style::rounded());
            println!("{table}");
            println!();
            println!(
                "{} {} of {} pair(s) at or above {}",
                "Matches:".bold(),
                matches.to_string().green().bold(),
                pairs.len(),
                config.threshold.to_string().cyan()
            );
        }
    }

    Ok(())
}

/// Every unordered pair `(i, j)` with `i < j`, in input order.
pub fn score_pairs(scorer: &SimilarityScorer, hosts: &[Host], threshold: f64) -> Vec<PairScore> {
    hosts
        .iter()
        .enumerate()
        .flat_map(|(i, a)| hosts[i + 1..].iter().map(move |b| (a, b)))
        .map(|(a, b)| {
            let signals = scorer.breakdown(a, b);
            let score = scorer.weights().combine(&signals);
            PairScore {
                a: label(a),
                b: label(b),
                ip: signals.ip,
                mac: signals.mac,
                hostname: signals.hostname,
                os: signals.os,
                score,
                is_match: score >= threshold,
            }
        })
        .collect()
}

fn label(host: &Host) -> String {
    if host.hostname.is_empty() {
        host.source_ref().to_string()
    } else {
        format!("{} ({})", host.hostname, host.source_ref())
    }
}
