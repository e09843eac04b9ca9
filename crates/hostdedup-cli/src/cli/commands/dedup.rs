//! `hostdedup dedup` - Normalize and deduplicate raw source exports.

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use hostdedup_core::sources::{self, Crowdstrike, Qualys, SourceAdapter};
use hostdedup_core::{
    ClusterSummary, DedupOutcome, Deduplicator, Host, SharedAddressBlocking, SourceRef,
    UpsertDocument,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

use super::Context;
use crate::cli::args::DedupArgs;
use crate::education::Explain;
use crate::output::{self, OutputFormat};

/// Upsert document plus the source records folded into it.
#[derive(Debug, Serialize)]
pub struct MergedRecord {
    #[serde(flatten)]
    pub document: UpsertDocument,
    pub merged_from: Vec<SourceRef>,
}

/// Flat CSV row; address sets and members are `;`-joined.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    source_system: &'a str,
    source_id: &'a str,
    hostname: &'a str,
    ip_addresses: String,
    mac_addresses: String,
    operating_system: &'a str,
    os_version: &'a str,
    first_seen: &'a str,
    last_seen: &'a str,
    is_active: bool,
    vulnerability_count: u32,
    merged_from: String,
}

#[derive(Tabled)]
struct HostRow {
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "IPs")]
    ips: String,
    #[tabled(rename = "MACs")]
    macs: String,
    #[tabled(rename = "OS")]
    os: String,
    #[tabled(rename = "Vulns")]
    vulns: u32,
    #[tabled(rename = "Sources")]
    sources: String,
}

pub fn execute(ctx: &Context, args: DedupArgs) -> Result<()> {
    if args.qualys.is_empty() && args.crowdstrike.is_empty() {
        anyhow::bail!(
            "No input files.\n\n\
             Pass at least one of:\n  \
             --qualys <FILE>\n  \
             --crowdstrike <FILE>"
        );
    }

    let config = ctx.dedup_config(args.threshold, args.metric)?;

    if ctx.explain {
        Explain::dedup(config.threshold, config.hostname_metric, args.blocking).print();
    }

    let now = Utc::now();
    let hosts = load_sources(&args.qualys, &args.crowdstrike, now)?;

    let engine = Deduplicator::new(config)?;
    let outcome = if args.blocking {
        engine.with_filter(SharedAddressBlocking).run(hosts)
    } else {
        engine.run(hosts)
    };

    let records = merged_records(&outcome, now);
    info!(documents = records.len(), "prepared upsert documents");

    match ctx.output_format {
        OutputFormat::Json => output::print_json(&records)?,
        OutputFormat::Yaml => output::print_yaml(&records)?,
        OutputFormat::Csv => {
            let rows: Vec<CsvRow<'_>> = records.iter().map(csv_row).collect();
            output::write_csv(&rows)?;
        }
        OutputFormat::Pretty => print_pretty(&outcome, ctx.verbose),
    }

    Ok(())
}

/// Qualys exports first, then Crowdstrike, each in file order.
///
/// Arrival order decides which record survives a merge.
fn load_sources(qualys: &[PathBuf], crowdstrike: &[PathBuf], now: DateTime<Utc>) -> Result<Vec<Host>> {
    let mut hosts = Vec::new();
    for path in qualys {
        hosts.extend(load_source(&Qualys, path, now)?);
    }
    for path in crowdstrike {
        hosts.extend(load_source(&Crowdstrike, path, now)?);
    }
    Ok(hosts)
}

fn load_source(adapter: &dyn SourceAdapter, path: &Path, now: DateTime<Utc>) -> Result<Vec<Host>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let payload: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let records = sources::extract_records(payload)
        .with_context(|| format!("Unexpected payload shape in {}", path.display()))?;

    let hosts = sources::normalize_batch(adapter, &records, now);
    info!(
        source = %adapter.source_system(),
        file = %path.display(),
        received = records.len(),
        kept = hosts.len(),
        "loaded source export"
    );
    Ok(hosts)
}

fn merged_records(outcome: &DedupOutcome, processed_at: DateTime<Utc>) -> Vec<MergedRecord> {
    outcome
        .hosts
        .iter()
        .zip(&outcome.clusters)
        .map(|(host, cluster)| MergedRecord {
            document: host.to_document(processed_at),
            merged_from: cluster.members.clone(),
        })
        .collect()
}

fn csv_row(record: &MergedRecord) -> CsvRow<'_> {
    let doc = &record.document;
    CsvRow {
        source_system: &doc.source_system,
        source_id: &doc.source_id,
        hostname: &doc.hostname,
        ip_addresses: doc.ip_addresses.join(";"),
        mac_addresses: doc.mac_addresses.join(";"),
        operating_system: &doc.operating_system,
        os_version: &doc.os_version,
        first_seen: doc.first_seen.as_deref().unwrap_or_default(),
        last_seen: doc.last_seen.as_deref().unwrap_or_default(),
        is_active: doc.is_active,
        vulnerability_count: doc.vulnerability_count,
        merged_from: join_members(&record.merged_from),
    }
}

fn join_members(members: &[SourceRef]) -> String {
    members
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

fn print_pretty(outcome: &DedupOutcome, verbose: bool) {
    if outcome.hosts.is_empty() {
        println!("{}", "No hosts to deduplicate.".yellow());
        return;
    }

    let rows: Vec<HostRow> = outcome
        .hosts
        .iter()
        .zip(&outcome.clusters)
        .map(|(host, cluster)| host_row(host, cluster))
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!();

    println!(
        "{} {} → {} ({} merged)",
        "Hosts:".bold(),
        outcome.input_count.to_string().cyan(),
        outcome.hosts.len().to_string().cyan().bold(),
        outcome.merged_count().to_string().green()
    );

    if verbose {
        println!("{} {}", "Comparisons:".bold(), outcome.comparisons);
    }

    if outcome.inverted_windows > 0 {
        println!(
            "{} {} host(s) have first_seen after last_seen",
            "Warning:".yellow().bold(),
            outcome.inverted_windows
        );
    }
}

fn host_row(host: &Host, cluster: &ClusterSummary) -> HostRow {
    let os = format!("{} {}", host.operating_system, host.os_version)
        .trim()
        .to_string();

    HostRow {
        hostname: if host.hostname.is_empty() {
            "-".to_string()
        } else {
            host.hostname.clone()
        },
        ips: host.ip_addresses.iter().cloned().collect::<Vec<_>>().join("\n"),
        macs: host.mac_addresses.iter().cloned().collect::<Vec<_>>().join("\n"),
        os,
        vulns: host.vulnerability_count,
        sources: cluster
            .members
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostdedup_core::SourceSystem;

    #[test]
    fn csv_row_joins_sets() {
        let host = Host::builder(SourceSystem::Qualys, "1")
            .hostname("web01")
            .ip_addresses(["10.0.0.2", "10.0.0.1"])
            .build();
        let record = MergedRecord {
            document: host.to_document(Utc::now()),
            merged_from: vec![host.source_ref()],
        };

        let row = csv_row(&record);

        assert_eq!(row.ip_addresses, "10.0.0.1;10.0.0.2");
        assert_eq!(row.mac_addresses, "");
        assert_eq!(row.merged_from, "Qualys:1");
    }

    #[test]
    fn missing_inputs_rejected() {
        let ctx = Context {
            output_format: OutputFormat::Json,
            explain: false,
            verbose: false,
            no_color: true,
            config: crate::config::Config::default(),
            config_path: PathBuf::from("unused.toml"),
        };
        let args = DedupArgs {
            qualys: Vec::new(),
            crowdstrike: Vec::new(),
            threshold: None,
            metric: None,
            blocking: false,
        };

        assert!(execute(&ctx, args).is_err());
    }
}
