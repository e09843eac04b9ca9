//! Canonical forms for the fields used in host comparison.
//!
//! Every function here is pure. Malformed addresses normalize to an empty
//! string, which callers treat as "discard this value" rather than as an error.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::types::Host;

/// Four dot-separated groups of one to three digits. Octet range is not checked.
fn ipv4_shape() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([0-9]{1,3}\.){3}[0-9]{1,3}$").expect("valid IPv4 pattern"))
}

fn mac_digits() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9a-f]{12}$").expect("valid MAC pattern"))
}

/// Strip the domain suffix, lowercase and trim.
///
/// `"DESKTOP-ABC123.local"` becomes `"desktop-abc123"`.
#[must_use]
pub fn normalize_hostname(hostname: &str) -> String {
    hostname
        .split('.')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Return the trimmed address if it looks like dotted-quad IPv4, else `""`.
///
/// The check is syntactic only: `"256.1.2.3"` passes.
#[must_use]
pub fn normalize_ip(ip: &str) -> String {
    let ip = ip.trim();
    if ipv4_shape().is_match(ip) {
        ip.to_string()
    } else {
        String::new()
    }
}

/// Canonical colon-separated lowercase MAC, or `""` if not 12 hex digits.
///
/// Accepts `:`, `-` and `.` separators in any position.
#[must_use]
pub fn normalize_mac(mac: &str) -> String {
    let digits: String = mac
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '.' | ':' | '-'))
        .collect();

    if !mac_digits().is_match(&digits) {
        return String::new();
    }

    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair))
        .collect::<Vec<_>>()
        .join(":")
}

/// Normalize a collection of IPs, dropping the ones that fail
pub fn normalize_ips<I, S>(ips: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ips.into_iter()
        .map(|ip| normalize_ip(ip.as_ref()))
        .filter(|ip| !ip.is_empty())
}

/// Normalize a collection of MACs, dropping the ones that fail
pub fn normalize_macs<I, S>(macs: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    macs.into_iter()
        .map(|mac| normalize_mac(mac.as_ref()))
        .filter(|mac| !mac.is_empty())
}

/// Normalize `hostname`, `ip_addresses` and `mac_addresses` of a raw record map.
///
/// Keys that are absent stay absent. Address entries that are not strings or
/// that fail normalization are dropped; a bare string is treated as a
/// one-element list. Everything else is copied unchanged.
#[must_use]
pub fn normalize_host_data(raw: &Map<String, Value>) -> Map<String, Value> {
    let mut normalized = raw.clone();

    if let Some(Value::String(hostname)) = normalized.get_mut("hostname") {
        *hostname = normalize_hostname(hostname);
    }

    if let Some(value) = normalized.get_mut("ip_addresses") {
        let ips: Vec<Value> = normalize_ips(string_entries(value)).map(Value::String).collect();
        *value = Value::Array(ips);
    }

    if let Some(value) = normalized.get_mut("mac_addresses") {
        let macs: Vec<Value> = normalize_macs(string_entries(value)).map(Value::String).collect();
        *value = Value::Array(macs);
    }

    normalized
}

fn string_entries(value: &Value) -> Vec<&str> {
    match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Apply the field normalizers to an already-built host.
#[must_use]
pub fn normalize_host(mut host: Host) -> Host {
    host.hostname = normalize_hostname(&host.hostname);
    host.ip_addresses = normalize_ips(&host.ip_addresses).collect();
    host.mac_addresses = normalize_macs(&host.mac_addresses).collect();
    host
}
