use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{Host, HostId};

/// Document handed to the persistence layer for one deduplicated host.
///
/// Stores upsert it keyed by `(source_system, source_id)`; re-running the
/// pipeline over unchanged source data yields the same key and field values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertDocument {
    /// Process-local id of the record (not part of the key)
    pub id: HostId,
    /// Display source of the record
    pub source_system: String,
    /// Identifier within `source_system`
    pub source_id: String,
    /// Short hostname
    pub hostname: String,
    /// Sorted IPv4 addresses
    pub ip_addresses: Vec<String>,
    /// Sorted MAC addresses
    pub mac_addresses: Vec<String>,
    /// Operating system name
    pub operating_system: String,
    /// Operating system version
    pub os_version: String,
    /// CPU architecture
    pub architecture: Option<String>,
    /// RFC 3339 first observation
    pub first_seen: Option<String>,
    /// RFC 3339 last observation
    pub last_seen: Option<String>,
    /// Whether the host is live
    pub is_active: bool,
    /// RFC 3339 time of the last vulnerability scan
    pub last_vulnerability_scan: Option<String>,
    /// Open vulnerability count
    pub vulnerability_count: u32,
    /// RFC 3339 time the pipeline produced this document
    pub processed_at: String,
}

impl UpsertDocument {
    /// Upsert key: `(source_system, source_id)`
    #[must_use]
    pub fn key(&self) -> (&str, &str) {
        (&self.source_system, &self.source_id)
    }
}

impl Host {
    /// Serialize for upsert into the document store
    #[must_use]
    pub fn to_document(&self, processed_at: DateTime<Utc>) -> UpsertDocument {
        UpsertDocument {
            id: self.id,
            source_system: self.source_system.to_string(),
            source_id: self.source_id.clone(),
            hostname: self.hostname.clone(),
            ip_addresses: self.ip_addresses.iter().cloned().collect(),
            mac_addresses: self.mac_addresses.iter().cloned().collect(),
            operating_system: self.operating_system.clone(),
            os_version: self.os_version.clone(),
            architecture: self.architecture.clone(),
            first_seen: self.first_seen.map(rfc3339),
            last_seen: self.last_seen.map(rfc3339),
            is_active: self.is_active,
            last_vulnerability_scan: self.last_vulnerability_scan.map(rfc3339),
            vulnerability_count: self.vulnerability_count,
            processed_at: rfc3339(processed_at),
        }
    }
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
