//! Multi-signal similarity between two host records.
//!
//! Four independent signals, each in `[0, 1]`, are combined by a weighted
//! mean. With the default weights (0.25 each) this is the plain average. A
//! signal is never skipped: empty inputs push it toward its floor instead.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::{DedupError, Result};
use crate::types::Host;

/// String metric used for the hostname signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostnameMetric {
    /// Jaro-Winkler; rewards shared prefixes such as `server1` / `server1-prod`
    #[default]
    JaroWinkler,
    /// One minus Levenshtein distance over the longer length
    Levenshtein,
    /// Sørensen-Dice coefficient over character bigrams
    SorensenDice,
}

impl HostnameMetric {
    /// Similarity of two already-normalized hostnames.
    ///
    /// Two empty hostnames score 0.0: a missing name is never evidence of
    /// identity.
    #[must_use]
    pub fn similarity(self, a: &str, b: &str) -> f64 {
        if a.is_empty() && b.is_empty() {
            return 0.0;
        }

        // Fixed argument order keeps the signal symmetric.
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        let similarity = match self {
            Self::JaroWinkler => strsim::jaro_winkler(a, b),
            Self::Levenshtein => strsim::normalized_levenshtein(a, b),
            Self::SorensenDice => strsim::sorensen_dice(a, b),
        };
        similarity.clamp(0.0, 1.0)
    }
}

impl FromStr for HostnameMetric {
    type Err = DedupError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "jaro-winkler" | "jarowinkler" => Ok(Self::JaroWinkler),
            "levenshtein" => Ok(Self::Levenshtein),
            "sorensen-dice" | "dice" => Ok(Self::SorensenDice),
            _ => Err(DedupError::Config(format!(
                "unknown hostname metric: {s} (valid: jaro-winkler, levenshtein, sorensen-dice)"
            ))),
        }
    }
}

impl std::fmt::Display for HostnameMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JaroWinkler => write!(f, "jaro-winkler"),
            Self::Levenshtein => write!(f, "levenshtein"),
            Self::SorensenDice => write!(f, "sorensen-dice"),
        }
    }
}

/// Per-signal similarity between two hosts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalScores {
    /// Shared IPs over the larger IP set
    pub ip: f64,
    /// Shared MACs over the larger MAC set
    pub mac: f64,
    /// Hostname string similarity
    pub hostname: f64,
    /// 1.0 when OS name and version match case-insensitively
    pub os: f64,
}

/// Relative weight of each signal in the combined score.
///
/// Weights need not sum to 1.0; the combined score divides by their sum.
/// Fields left out when deserializing keep their default of 0.25.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    /// IP overlap weight
    pub ip: f64,
    /// MAC overlap weight
    pub mac: f64,
    /// Hostname similarity weight
    pub hostname: f64,
    /// OS match weight
    pub os: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            ip: 0.25,
            mac: 0.25,
            hostname: 0.25,
            os: 0.25,
        }
    }
}

impl SignalWeights {
    fn values(&self) -> [f64; 4] {
        [self.ip, self.mac, self.hostname, self.os]
    }

    /// Reject negative or non-finite weights, and sums that are zero or overflow
    pub fn validate(&self) -> Result<()> {
        if self.values().iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(DedupError::Config(format!(
                "signal weights must be finite and non-negative: {self:?}"
            )));
        }
        let total = self.total();
        if total <= 0.0 {
            return Err(DedupError::Config("signal weights sum to zero".into()));
        }
        if !total.is_finite() {
            return Err(DedupError::Config(format!(
                "signal weights overflow when summed: {self:?}"
            )));
        }
        Ok(())
    }

    fn total(&self) -> f64 {
        self.values().iter().sum()
    }

    /// Weighted mean of `scores`, clamped to `[0, 1]`
    #[must_use]
    #[allow(clippy::suboptimal_flops)]
    pub fn combine(&self, scores: &SignalScores) -> f64 {
        let weighted = scores.ip * self.ip
            + scores.mac * self.mac
            + scores.hostname * self.hostname
            + scores.os * self.os;
        (weighted / self.total()).clamp(0.0, 1.0)
    }
}

/// Scores pairs of hosts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimilarityScorer {
    weights: SignalWeights,
    hostname_metric: HostnameMetric,
}

impl SimilarityScorer {
    /// Scorer with custom weights and hostname metric
    pub fn new(weights: SignalWeights, hostname_metric: HostnameMetric) -> Result<Self> {
        weights.validate()?;
        Ok(Self {
            weights,
            hostname_metric,
        })
    }

    /// Active weights
    #[must_use]
    pub const fn weights(&self) -> &SignalWeights {
        &self.weights
    }

    /// Per-signal similarity
    #[must_use]
    pub fn breakdown(&self, a: &Host, b: &Host) -> SignalScores {
        SignalScores {
            ip: set_overlap(&a.ip_addresses, &b.ip_addresses),
            mac: set_overlap(&a.mac_addresses, &b.mac_addresses),
            hostname: self.hostname_metric.similarity(&a.hostname, &b.hostname),
            os: os_match(a, b),
        }
    }

    /// Combined similarity in `[0, 1]`; symmetric in its arguments
    #[must_use]
    pub fn score(&self, a: &Host, b: &Host) -> f64 {
        self.weights.combine(&self.breakdown(a, b))
    }
}

/// Combined similarity with default weights and metric
#[must_use]
pub fn score(a: &Host, b: &Host) -> f64 {
    SimilarityScorer::default().score(a, b)
}

/// |a ∩ b| / max(|a|, |b|, 1)
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn set_overlap(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let common = a.intersection(b).count();
    common as f64 / a.len().max(b.len()).max(1) as f64
}

/// 1.0 when OS name and version are equal ignoring case, else 0.0
#[must_use]
pub fn os_match(a: &Host, b: &Host) -> f64 {
    let same = a.operating_system.to_lowercase() == b.operating_system.to_lowercase()
        && a.os_version.to_lowercase() == b.os_version.to_lowercase();
    if same {
        1.0
    } else {
        0.0
    }
}
