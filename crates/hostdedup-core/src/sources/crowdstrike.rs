use chrono::{DateTime, Utc};
use serde_json::Value;

use super::fields::{as_record, count, flag, optional_timestamp, text, text_list, timestamp};
use super::SourceAdapter;
use crate::error::Result;
use crate::types::{Host, SourceSystem};

const SOURCE: &str = "Crowdstrike";

/// Crowdstrike Falcon device payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crowdstrike;

impl SourceAdapter for Crowdstrike {
    fn source_system(&self) -> SourceSystem {
        SourceSystem::Crowdstrike
    }

    fn to_host(&self, raw: &Value, now: DateTime<Utc>) -> Result<Host> {
        let record = as_record(raw, SOURCE)?;

        let mut builder = Host::builder(SourceSystem::Crowdstrike, text(record, &["cid", "device_id"]))
            .hostname(text(record, &["hostname"]))
            .ip_addresses(text_list(record, &["local_ip", "external_ip"]))
            .mac_addresses(text_list(record, &["mac_addresses", "mac_address"]))
            .os(
                text(record, &["platform_name"]),
                text(record, &["platform_version", "os_version"]),
            )
            .architecture(text(record, &["architecture"]))
            .first_seen(timestamp(record, &["first_seen"], now)?)
            .last_seen(timestamp(record, &["last_seen"], now)?)
            .active(flag(record, &["is_active"], true))
            .vulnerability_count(count(
                record,
                &["active_vulnerabilities", "vulnerability_count"],
                SOURCE,
            )?)
            .raw_data(record.clone());

        if let Some(scanned) = optional_timestamp(record, &["last_vulnerability_scan"])? {
            builder = builder.last_vulnerability_scan(scanned);
        }

        Ok(builder.build())
    }
}
