use chrono::{DateTime, Utc};
use serde_json::Value;

use super::fields::{as_record, count, flag, optional_timestamp, text, text_list, timestamp};
use super::SourceAdapter;
use crate::error::Result;
use crate::types::{Host, SourceSystem};

const SOURCE: &str = "Qualys";

/// Qualys host detection payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Qualys;

impl SourceAdapter for Qualys {
    fn source_system(&self) -> SourceSystem {
        SourceSystem::Qualys
    }

    fn to_host(&self, raw: &Value, now: DateTime<Utc>) -> Result<Host> {
        let record = as_record(raw, SOURCE)?;

        let mut builder = Host::builder(SourceSystem::Qualys, text(record, &["id"]))
            .hostname(text(record, &["hostname"]))
            .ip_addresses(text_list(record, &["ip_addresses"]))
            .mac_addresses(text_list(record, &["mac_addresses"]))
            .os(text(record, &["os"]), text(record, &["os_version"]))
            .architecture(text(record, &["architecture"]))
            .first_seen(timestamp(record, &["first_seen"], now)?)
            .last_seen(timestamp(record, &["last_seen"], now)?)
            .active(flag(record, &["is_active"], true))
            .vulnerability_count(count(record, &["vulnerability_count"], SOURCE)?)
            .raw_data(record.clone());

        if let Some(scanned) = optional_timestamp(record, &["last_vulnerability_scan"])? {
            builder = builder.last_vulnerability_scan(scanned);
        }

        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_normalize_host() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let raw = json!({
            "id": 1,
            "hostname": "test-host",
            "ip_addresses": ["192.168.1.1"],
            "os": "Windows",
            "os_version": "10",
            "first_seen": "2024-01-01T00:00:00",
            "last_seen": "2024-01-02T00:00:00",
            "vulnerability_count": 4
        });

        let host = Qualys.to_host(&raw, now).unwrap();

        assert_eq!(host.source_system, SourceSystem::Qualys);
        assert_eq!(host.source_id, "1");
        assert_eq!(host.hostname, "test-host");
        assert_eq!(host.operating_system, "Windows");
        assert_eq!(host.os_version, "10");
        assert_eq!(host.vulnerability_count, 4);
        assert_eq!(host.first_seen, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(host.raw_data["hostname"], "test-host");
        assert!(host.is_active);
    }

    #[test]
    fn missing_timestamps_default_to_now() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let host = Qualys.to_host(&json!({"id": "q-9"}), now).unwrap();
        assert_eq!(host.first_seen, Some(now));
        assert_eq!(host.last_seen, Some(now));
        assert!(host.last_vulnerability_scan.is_none());
    }

    #[test]
    fn malformed_count_is_an_error() {
        let now = Utc::now();
        let err = Qualys
            .to_host(&json!({"id": "q-9", "vulnerability_count": "many"}), now)
            .unwrap_err();
        assert!(err.is_record_error());
    }
}
