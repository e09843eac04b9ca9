use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{SourceRef, SourceSystem};

static NEXT_HOST_ID: AtomicU64 = AtomicU64::new(1);

/// Process-local host record identifier.
///
/// Assigned once when a record is created and never handed out again within
/// the same process. Merged records keep the id of the cluster they were
/// folded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostId(u64);

impl HostId {
    /// Allocate a fresh id
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_HOST_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for HostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unified host record observed by one (or, after merging, several) sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    /// Process-local identifier (never read from input)
    #[serde(skip_deserializing, default = "HostId::next")]
    pub id: HostId,

    /// Source that first reported this host
    #[serde(default)]
    pub source_system: SourceSystem,

    /// Identifier of the host within `source_system`
    #[serde(default)]
    pub source_id: String,

    /// Short hostname, possibly empty
    #[serde(default)]
    pub hostname: String,

    /// IPv4 addresses
    #[serde(default)]
    pub ip_addresses: BTreeSet<String>,

    /// MAC addresses
    #[serde(default)]
    pub mac_addresses: BTreeSet<String>,

    /// Operating system name, possibly empty
    #[serde(default)]
    pub operating_system: String,

    /// Operating system version, possibly empty
    #[serde(default)]
    pub os_version: String,

    /// CPU architecture
    #[serde(default)]
    pub architecture: Option<String>,

    /// Earliest observation
    #[serde(default)]
    pub first_seen: Option<DateTime<Utc>>,

    /// Latest observation
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,

    /// Whether the source considers the host live
    #[serde(default = "default_true")]
    pub is_active: bool,

    /// When the host was last scanned for vulnerabilities
    #[serde(default)]
    pub last_vulnerability_scan: Option<DateTime<Utc>>,

    /// Number of open vulnerabilities
    #[serde(default)]
    pub vulnerability_count: u32,

    /// Original source payload, kept for audit
    #[serde(default)]
    pub raw_data: Map<String, Value>,
}

const fn default_true() -> bool {
    true
}

impl Host {
    /// Start building a host observed by `source_system` under `source_id`
    #[must_use]
    pub fn builder(source_system: SourceSystem, source_id: impl Into<String>) -> HostBuilder {
        HostBuilder::new(source_system, source_id)
    }

    /// The `(source_system, source_id)` pair this record came from
    #[must_use]
    pub fn source_ref(&self) -> SourceRef {
        SourceRef {
            source_system: self.source_system.clone(),
            source_id: self.source_id.clone(),
        }
    }

    /// Fill absent `first_seen` / `last_seen` with `now`.
    pub fn fill_missing_timestamps(&mut self, now: DateTime<Utc>) {
        self.first_seen.get_or_insert(now);
        self.last_seen.get_or_insert(now);
    }

    /// Returns true if `first_seen` is later than `last_seen`.
    ///
    /// The min/max merge rule can produce this when one side of a merge lacks
    /// a timestamp; the record is reported, not repaired.
    #[must_use]
    pub fn seen_window_inverted(&self) -> bool {
        matches!((self.first_seen, self.last_seen), (Some(first), Some(last)) if first > last)
    }

    /// Drop empty address strings left behind by direct field edits
    pub(crate) fn prune_empty_addresses(&mut self) {
        self.ip_addresses.retain(|ip| !ip.is_empty());
        self.mac_addresses.retain(|mac| !mac.is_empty());
    }
}

/// Builder for [`Host`].
///
/// Values are stored as given; run them through [`crate::normalize`] (or use
/// the source adapters) to canonicalize them.
#[derive(Debug, Clone)]
pub struct HostBuilder {
    host: Host,
}

impl HostBuilder {
    fn new(source_system: SourceSystem, source_id: impl Into<String>) -> Self {
        Self {
            host: Host {
                id: HostId::next(),
                source_system,
                source_id: source_id.into(),
                hostname: String::new(),
                ip_addresses: BTreeSet::new(),
                mac_addresses: BTreeSet::new(),
                operating_system: String::new(),
                os_version: String::new(),
                architecture: None,
                first_seen: None,
                last_seen: None,
                is_active: true,
                last_vulnerability_scan: None,
                vulnerability_count: 0,
                raw_data: Map::new(),
            },
        }
    }

    /// Set the hostname
    #[must_use]
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.host.hostname = hostname.into();
        self
    }

    /// Add one IP address
    #[must_use]
    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.host.ip_addresses.insert(ip.into());
        self
    }

    /// Add several IP addresses
    #[must_use]
    pub fn ip_addresses<I, S>(mut self, ips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.host.ip_addresses.extend(ips.into_iter().map(Into::into));
        self
    }

    /// Add one MAC address
    #[must_use]
    pub fn mac(mut self, mac: impl Into<String>) -> Self {
        self.host.mac_addresses.insert(mac.into());
        self
    }

    /// Add several MAC addresses
    #[must_use]
    pub fn mac_addresses<I, S>(mut self, macs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.host.mac_addresses.extend(macs.into_iter().map(Into::into));
        self
    }

    /// Set operating system name and version
    #[must_use]
    pub fn os(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.host.operating_system = name.into();
        self.host.os_version = version.into();
        self
    }

    /// Set the CPU architecture; an empty string clears it
    #[must_use]
    pub fn architecture(mut self, architecture: impl Into<String>) -> Self {
        let architecture = architecture.into();
        self.host.architecture = (!architecture.is_empty()).then_some(architecture);
        self
    }

    /// Set the first observation time
    #[must_use]
    pub fn first_seen(mut self, at: DateTime<Utc>) -> Self {
        self.host.first_seen = Some(at);
        self
    }

    /// Set the last observation time
    #[must_use]
    pub fn last_seen(mut self, at: DateTime<Utc>) -> Self {
        self.host.last_seen = Some(at);
        self
    }

    /// Set whether the host is live
    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.host.is_active = active;
        self
    }

    /// Set the last vulnerability scan time
    #[must_use]
    pub fn last_vulnerability_scan(mut self, at: DateTime<Utc>) -> Self {
        self.host.last_vulnerability_scan = Some(at);
        self
    }

    /// Set the open vulnerability count
    #[must_use]
    pub fn vulnerability_count(mut self, count: u32) -> Self {
        self.host.vulnerability_count = count;
        self
    }

    /// Attach the original source payload
    #[must_use]
    pub fn raw_data(mut self, raw: Map<String, Value>) -> Self {
        self.host.raw_data = raw;
        self
    }

    /// Finish the record, dropping empty address strings
    #[must_use]
    pub fn build(mut self) -> Host {
        self.host.prune_empty_addresses();
        self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ids_are_never_reused() {
        let a = Host::builder(SourceSystem::Qualys, "1").build();
        let b = Host::builder(SourceSystem::Qualys, "1").build();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn build_drops_empty_and_duplicate_addresses() {
        let host = Host::builder(SourceSystem::Crowdstrike, "x")
            .ip_addresses(["10.0.0.1", "", "10.0.0.1"])
            .mac_addresses(["", "00:11:22:33:44:55"])
            .build();

        assert_eq!(host.ip_addresses.len(), 1);
        assert!(host.ip_addresses.contains("10.0.0.1"));
        assert_eq!(host.mac_addresses.len(), 1);
    }

    #[test]
    fn missing_timestamps_default_to_now() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut host = Host::builder(SourceSystem::Qualys, "1")
            .first_seen(earlier)
            .build();

        host.fill_missing_timestamps(now);

        assert_eq!(host.first_seen, Some(earlier));
        assert_eq!(host.last_seen, Some(now));
        assert!(!host.seen_window_inverted());
    }

    #[test]
    fn inverted_window_is_detected() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let host = Host::builder(SourceSystem::Qualys, "1")
            .first_seen(late)
            .last_seen(early)
            .build();
        assert!(host.seen_window_inverted());
    }

    #[test]
    fn deserialized_hosts_get_fresh_ids() {
        let json = r#"{"id": 7, "source_system": "Qualys", "hostname": "web01",
                       "ip_addresses": ["10.0.0.5"]}"#;
        let a: Host = serde_json::from_str(json).unwrap();
        let b: Host = serde_json::from_str(json).unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.source_system, SourceSystem::Qualys);
        assert!(a.is_active);
        assert!(a.first_seen.is_none());
    }
}
