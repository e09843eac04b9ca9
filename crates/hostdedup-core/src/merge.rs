//! Field reconciliation for two records describing the same host.
//!
//! The rules are asymmetric: `existing` (the cluster built so far) wins every
//! scalar conflict, so merging is neither commutative nor associative and the
//! order records are folded in shows up in the result.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::types::Host;

/// Combine `incoming` into `existing`, returning a new record.
///
/// | field | rule |
/// |---|---|
/// | `ip_addresses`, `mac_addresses` | union |
/// | `hostname`, `operating_system`, `os_version`, `architecture` | `existing` unless empty |
/// | `first_seen` | earliest present value; absent if absent on both |
/// | `last_seen` | latest present value; absent if absent on both |
/// | `vulnerability_count` | maximum |
/// | `raw_data` | shallow merge, `incoming` keys overwrite |
/// | `source_system` | `existing` unless empty |
/// | `last_vulnerability_scan` | `existing` unless absent |
/// | `id`, `source_id`, `is_active` | `existing` |
///
/// Neither input is modified. A timestamp missing on both sides stays `None`
/// rather than becoming a far-past or far-future sentinel; source adapters
/// fill missing timestamps before records get here.
#[must_use]
pub fn merge(existing: &Host, incoming: &Host) -> Host {
    let mut raw_data = existing.raw_data.clone();
    raw_data.extend(incoming.raw_data.clone());

    let merged = Host {
        id: existing.id,
        source_system: if existing.source_system.is_empty() {
            incoming.source_system.clone()
        } else {
            existing.source_system.clone()
        },
        source_id: existing.source_id.clone(),
        hostname: prefer(&existing.hostname, &incoming.hostname),
        ip_addresses: existing
            .ip_addresses
            .union(&incoming.ip_addresses)
            .cloned()
            .collect(),
        mac_addresses: existing
            .mac_addresses
            .union(&incoming.mac_addresses)
            .cloned()
            .collect(),
        operating_system: prefer(&existing.operating_system, &incoming.operating_system),
        os_version: prefer(&existing.os_version, &incoming.os_version),
        architecture: existing
            .architecture
            .clone()
            .filter(|arch| !arch.is_empty())
            .or_else(|| incoming.architecture.clone()),
        first_seen: earliest(existing.first_seen, incoming.first_seen),
        last_seen: latest(existing.last_seen, incoming.last_seen),
        is_active: existing.is_active,
        last_vulnerability_scan: existing
            .last_vulnerability_scan
            .or(incoming.last_vulnerability_scan),
        vulnerability_count: existing.vulnerability_count.max(incoming.vulnerability_count),
        raw_data,
    };

    if merged.seen_window_inverted() {
        warn!(
            host = %merged.id,
            first_seen = ?merged.first_seen,
            last_seen = ?merged.last_seen,
            "merged host has first_seen after last_seen"
        );
    }

    merged
}

fn prefer(existing: &str, incoming: &str) -> String {
    if existing.is_empty() {
        incoming.to_string()
    } else {
        existing.to_string()
    }
}

/// Earliest present timestamp; an absent one never wins
fn earliest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    a.into_iter().chain(b).min()
}

/// Latest present timestamp; an absent one never wins
fn latest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    a.into_iter().chain(b).max()
}
