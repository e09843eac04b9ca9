//! Record-linkage and merge engine for multi-source host inventories.
//!
//! Security scanners each report the hosts they see under their own schema and
//! identifier space. This crate turns those reports into one deduplicated host
//! population:
//!
//! - **Normalization**: canonical hostnames, IPv4 and MAC addresses ([`normalize`])
//! - **Source adapters**: raw Qualys / Crowdstrike payloads into [`Host`] records ([`sources`])
//! - **Similarity**: a bounded multi-signal score between two records ([`similarity`])
//! - **Reconciliation**: deterministic merge of two records for the same host ([`merge`])
//! - **Deduplication**: first-match clustering over a batch ([`dedup`])
//!
//! # Example
//!
//! ```rust
//! use hostdedup_core::{DedupConfig, Deduplicator, Host, SourceSystem};
//!
//! let hosts = vec![
//!     Host::builder(SourceSystem::Qualys, "q-1")
//!         .hostname("server1")
//!         .ip("192.168.1.1")
//!         .build(),
//!     Host::builder(SourceSystem::Crowdstrike, "cs-9")
//!         .hostname("server1-prod")
//!         .ip("192.168.1.1")
//!         .build(),
//! ];
//!
//! let engine = Deduplicator::new(DedupConfig::default()).unwrap();
//! let merged = engine.deduplicate(hosts);
//! assert_eq!(merged.len(), 1);
//! assert_eq!(merged[0].hostname, "server1");
//! ```

pub mod dedup;
mod error;
pub mod merge;
pub mod normalize;
pub mod similarity;
pub mod sources;
pub mod types;

pub use dedup::{
    AllCandidates, CandidateFilter, ClusterSet, ClusterSummary, DedupConfig, DedupOutcome,
    Deduplicator, SharedAddressBlocking,
};
pub use error::{DedupError, Result};
pub use merge::merge;
pub use similarity::{score, HostnameMetric, SignalScores, SignalWeights, SimilarityScorer};
pub use types::*;
