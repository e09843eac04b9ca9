//! Adapters from raw scanner payloads to [`Host`] records.
//!
//! Fetching the payloads is the caller's job. Each adapter maps one source's
//! JSON schema onto the unified model; [`normalize_batch`] then canonicalizes
//! the comparison fields and drops records that cannot be built.

mod crowdstrike;
mod fields;
mod qualys;

pub use crowdstrike::Crowdstrike;
pub use qualys::Qualys;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{DedupError, Result};
use crate::normalize::normalize_host;
use crate::types::{Host, SourceSystem};

/// Maps one scanner's payload schema onto [`Host`].
pub trait SourceAdapter {
    /// Source this adapter reads
    fn source_system(&self) -> SourceSystem;

    /// Build a host from one raw record.
    ///
    /// Absent timestamps default to `now`. The payload is kept as `raw_data`.
    fn to_host(&self, raw: &Value, now: DateTime<Utc>) -> Result<Host>;
}

/// Adapt and normalize a batch of raw records.
///
/// Records that fail to build are logged and skipped; they never reach the
/// deduplication engine.
pub fn normalize_batch<A>(adapter: &A, raw: &[Value], now: DateTime<Utc>) -> Vec<Host>
where
    A: SourceAdapter + ?Sized,
{
    let source = adapter.source_system();
    let hosts: Vec<Host> = raw
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match adapter.to_host(record, now) {
            Ok(host) => Some(normalize_host(host)),
            Err(e) => {
                warn!(source = %source, index, error = %e, "skipping host record");
                None
            }
        })
        .collect();

    debug!(
        source = %source,
        received = raw.len(),
        normalized = hosts.len(),
        "normalized source batch"
    );
    hosts
}

/// Pull the record list out of a source response.
///
/// Accepts a bare JSON array or an object wrapping it under `hosts`.
pub fn extract_records(payload: Value) -> Result<Vec<Value>> {
    match payload {
        Value::Array(records) => Ok(records),
        Value::Object(mut map) => match map.remove("hosts") {
            Some(Value::Array(records)) => Ok(records),
            Some(_) => Err(DedupError::Payload("`hosts` is not an array".into())),
            None => Err(DedupError::Payload("payload has no `hosts` array".into())),
        },
        _ => Err(DedupError::Payload(
            "payload must be an array of host records or an object with `hosts`".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn batch_skips_unbuildable_records() {
        let raw = vec![
            json!({"id": "1", "hostname": "WEB01.corp", "ip_addresses": ["10.0.0.1", "bogus"]}),
            json!("not an object"),
            json!({"id": "3", "first_seen": "last tuesday"}),
        ];

        let hosts = normalize_batch(&Qualys, &raw, now());

        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].hostname, "web01");
        assert_eq!(hosts[0].ip_addresses.len(), 1);
        assert_eq!(hosts[0].first_seen, Some(now()));
    }

    #[test]
    fn batch_works_through_trait_objects() {
        let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(Qualys), Box::new(Crowdstrike)];
        let raw = vec![json!({"id": "1", "cid": "1", "hostname": "a"})];

        for adapter in &adapters {
            let hosts = normalize_batch(adapter.as_ref(), &raw, now());
            assert_eq!(hosts.len(), 1);
            assert_eq!(hosts[0].source_system, adapter.source_system());
        }
    }

    #[test]
    fn records_extracted_from_wrapper() {
        let wrapped = json!({"hosts": [{"id": "1"}, {"id": "2"}]});
        assert_eq!(extract_records(wrapped).unwrap().len(), 2);

        let bare = json!([{"id": "1"}]);
        assert_eq!(extract_records(bare).unwrap().len(), 1);

        assert!(extract_records(json!({"items": []})).is_err());
        assert!(extract_records(json!(42)).is_err());
    }
}
