//! First-match clustering of a host batch.
//!
//! Records are folded into an ordered [`ClusterSet`] one at a time. Each
//! incoming record is compared against the current cluster representatives in
//! creation order; the first one scoring at or above the threshold absorbs it
//! through [`merge`]. Otherwise the record starts a new cluster.
//!
//! Later comparisons see the result of earlier merges, so the fold is strictly
//! sequential. The `parallel` feature only parallelizes scoring one incoming
//! record against the existing representatives.
//!
//! Cost is O(n·k) scorer calls for n records and k clusters. A
//! [`CandidateFilter`] can prune representatives before scoring.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DedupError, Result};
use crate::merge::merge;
use crate::similarity::{HostnameMetric, SignalWeights, SimilarityScorer};
use crate::types::{Host, HostId, SourceRef};

/// Deduplication settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Minimum combined similarity for two records to merge, in (0, 1]
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Signal weights for the similarity score
    #[serde(default)]
    pub weights: SignalWeights,

    /// Metric for the hostname signal
    #[serde(default)]
    pub hostname_metric: HostnameMetric,
}

const fn default_threshold() -> f64 {
    DedupConfig::DEFAULT_THRESHOLD
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            weights: SignalWeights::default(),
            hostname_metric: HostnameMetric::default(),
        }
    }
}

impl DedupConfig {
    /// Default similarity threshold
    pub const DEFAULT_THRESHOLD: f64 = 0.7;

    /// Set the similarity threshold
    #[must_use]
    pub const fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the signal weights
    #[must_use]
    pub const fn weights(mut self, weights: SignalWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set the hostname metric
    #[must_use]
    pub const fn hostname_metric(mut self, metric: HostnameMetric) -> Self {
        self.hostname_metric = metric;
        self
    }

    /// Check threshold range and weights
    pub fn validate(&self) -> Result<()> {
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(DedupError::Config(format!(
                "similarity threshold must be in (0, 1], got {}",
                self.threshold
            )));
        }
        self.weights.validate()
    }
}

/// Candidate generation ahead of the similarity scorer.
///
/// Representatives a filter rejects are never scored against the incoming
/// record. Admitted candidates are still visited in cluster-creation order.
pub trait CandidateFilter: Send + Sync {
    /// Whether `representative` should be scored against `incoming`
    fn admits(&self, incoming: &Host, representative: &Host) -> bool;
}

/// Scores every representative.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllCandidates;

impl CandidateFilter for AllCandidates {
    fn admits(&self, _incoming: &Host, _representative: &Host) -> bool {
        true
    }
}

/// Only scores representatives sharing at least one IP or MAC address.
///
/// Records that match on hostname and OS alone are no longer linked, so this
/// changes results for address-less input.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedAddressBlocking;

impl CandidateFilter for SharedAddressBlocking {
    fn admits(&self, incoming: &Host, representative: &Host) -> bool {
        !incoming.ip_addresses.is_disjoint(&representative.ip_addresses)
            || !incoming.mac_addresses.is_disjoint(&representative.mac_addresses)
    }
}

/// Source records folded into one output host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// Id of the output host
    pub id: HostId,
    /// Every `(source_system, source_id)` folded in, in fold order
    pub members: Vec<SourceRef>,
}

/// Accumulator threaded through the deduplication fold.
#[derive(Debug, Clone, Default)]
pub struct ClusterSet {
    representatives: Vec<Host>,
    members: Vec<Vec<SourceRef>>,
    comparisons: usize,
}

impl ClusterSet {
    /// Current representatives in cluster-creation order
    #[must_use]
    pub fn representatives(&self) -> &[Host] {
        &self.representatives
    }

    /// Number of clusters
    #[must_use]
    pub fn len(&self) -> usize {
        self.representatives.len()
    }

    /// Returns true before the first record is inserted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.representatives.is_empty()
    }

    /// Scorer invocations so far
    #[must_use]
    pub const fn comparisons(&self) -> usize {
        self.comparisons
    }

    fn seed(&mut self, host: Host) {
        self.members.push(vec![host.source_ref()]);
        self.representatives.push(host);
    }

    fn absorb(&mut self, index: usize, host: &Host) {
        let merged = merge(&self.representatives[index], host);
        debug!(
            cluster = %merged.id,
            source = %host.source_ref(),
            "merged host into existing cluster"
        );
        self.members[index].push(host.source_ref());
        self.representatives[index] = merged;
    }
}

/// Result of one deduplication run.
#[derive(Debug, Clone)]
pub struct DedupOutcome {
    /// Deduplicated hosts in cluster-creation order
    pub hosts: Vec<Host>,
    /// Membership of each output host, parallel to `hosts`
    pub clusters: Vec<ClusterSummary>,
    /// Number of input records
    pub input_count: usize,
    /// Scorer invocations
    pub comparisons: usize,
    /// Output hosts whose `first_seen` is after `last_seen`
    pub inverted_windows: usize,
}

impl DedupOutcome {
    /// Input records absorbed into another cluster
    #[must_use]
    pub fn merged_count(&self) -> usize {
        self.input_count - self.hosts.len()
    }
}

/// The deduplication engine.
#[derive(Debug, Clone)]
pub struct Deduplicator<F = AllCandidates> {
    threshold: f64,
    scorer: SimilarityScorer,
    filter: F,
}

impl Deduplicator {
    /// Engine with a validated configuration, scoring every representative
    pub fn new(config: DedupConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            threshold: config.threshold,
            scorer: SimilarityScorer::new(config.weights, config.hostname_metric)?,
            filter: AllCandidates,
        })
    }
}

impl<F: CandidateFilter> Deduplicator<F> {
    /// Replace the candidate filter
    #[must_use]
    pub fn with_filter<G: CandidateFilter>(self, filter: G) -> Deduplicator<G> {
        Deduplicator {
            threshold: self.threshold,
            scorer: self.scorer,
            filter,
        }
    }

    /// Active threshold
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Scorer used for comparisons
    #[must_use]
    pub const fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }

    /// Index of the first representative scoring at or above the threshold,
    /// plus the number of scorer calls a sequential scan needs to find it.
    pub fn find_match(&self, incoming: &Host, representatives: &[Host]) -> (Option<usize>, usize) {
        let candidates: Vec<usize> = representatives
            .iter()
            .enumerate()
            .filter(|(_, rep)| self.filter.admits(incoming, rep))
            .map(|(index, _)| index)
            .collect();

        let position = self.first_above_threshold(incoming, representatives, &candidates);
        let comparisons = position.map_or(candidates.len(), |p| p + 1);
        (position.map(|p| candidates[p]), comparisons)
    }

    #[cfg(not(feature = "parallel"))]
    fn first_above_threshold(
        &self,
        incoming: &Host,
        representatives: &[Host],
        candidates: &[usize],
    ) -> Option<usize> {
        candidates
            .iter()
            .position(|&i| self.scorer.score(incoming, &representatives[i]) >= self.threshold)
    }

    #[cfg(feature = "parallel")]
    fn first_above_threshold(
        &self,
        incoming: &Host,
        representatives: &[Host],
        candidates: &[usize],
    ) -> Option<usize> {
        use rayon::prelude::*;

        candidates
            .par_iter()
            .position_first(|&i| self.scorer.score(incoming, &representatives[i]) >= self.threshold)
    }

    /// One fold step: merge `host` into its first matching cluster or seed a new one
    #[must_use]
    pub fn insert(&self, mut clusters: ClusterSet, host: Host) -> ClusterSet {
        let (matched, comparisons) = self.find_match(&host, &clusters.representatives);
        clusters.comparisons += comparisons;

        match matched {
            Some(index) => clusters.absorb(index, &host),
            None => clusters.seed(host),
        }
        clusters
    }

    /// Deduplicate a batch, keeping membership and run statistics
    pub fn run<I>(&self, hosts: I) -> DedupOutcome
    where
        I: IntoIterator<Item = Host>,
    {
        let mut input_count = 0usize;
        let clusters = hosts.into_iter().fold(ClusterSet::default(), |acc, host| {
            input_count += 1;
            self.insert(acc, host)
        });

        let ClusterSet {
            representatives,
            members,
            comparisons,
        } = clusters;

        let summaries = representatives
            .iter()
            .zip(members)
            .map(|(host, members)| ClusterSummary {
                id: host.id,
                members,
            })
            .collect();
        let inverted_windows = representatives
            .iter()
            .filter(|h| h.seen_window_inverted())
            .count();

        info!(
            input = input_count,
            output = representatives.len(),
            comparisons,
            "deduplication reduced host count from {} to {}",
            input_count,
            representatives.len()
        );

        DedupOutcome {
            hosts: representatives,
            clusters: summaries,
            input_count,
            comparisons,
            inverted_windows,
        }
    }

    /// Deduplicate a batch, returning only the merged hosts
    pub fn deduplicate<I>(&self, hosts: I) -> Vec<Host>
    where
        I: IntoIterator<Item = Host>,
    {
        self.run(hosts).hosts
    }
}

/// Deduplicate `hosts` with default weights at `threshold`
pub fn deduplicate_hosts(hosts: Vec<Host>, threshold: f64) -> Result<Vec<Host>> {
    let engine = Deduplicator::new(DedupConfig::default().threshold(threshold))?;
    Ok(engine.deduplicate(hosts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceSystem;
    use chrono::{TimeZone, Utc};

    fn host(source: SourceSystem, id: &str, hostname: &str, ips: &[&str]) -> Host {
        Host::builder(source, id)
            .hostname(hostname)
            .ip_addresses(ips.iter().copied())
            .os("Windows", "10")
            .build()
    }

    fn engine() -> Deduplicator {
        Deduplicator::new(DedupConfig::default()).unwrap()
    }

    #[test]
    fn test_deduplicate_hosts() {
        let hosts = vec![
            host(SourceSystem::Qualys, "1", "server1", &["192.168.1.1"]),
            host(SourceSystem::Crowdstrike, "2", "server1-prod", &["192.168.1.1"]),
            host(SourceSystem::Qualys, "3", "completely-different", &["10.0.0.1"]),
        ];

        let deduplicated = deduplicate_hosts(hosts, 0.7).unwrap();

        assert_eq!(deduplicated.len(), 2);
        assert_eq!(deduplicated[0].hostname, "server1");
        assert_eq!(deduplicated[1].hostname, "completely-different");
    }

    #[test]
    fn first_match_wins_over_best_match() {
        // Both clusters clear the threshold for the third record; the older one takes it.
        let first = host(SourceSystem::Qualys, "1", "web01", &["10.0.0.1"]);
        let second = Host::builder(SourceSystem::Qualys, "2")
            .hostname("web02")
            .ip("10.0.0.2")
            .mac("00:11:22:33:44:55")
            .os("Windows", "10")
            .build();
        let incoming = Host::builder(SourceSystem::Crowdstrike, "3")
            .hostname("web02")
            .ip_addresses(["10.0.0.1", "10.0.0.2"])
            .mac("00:11:22:33:44:55")
            .os("Windows", "10")
            .build();

        let scorer = SimilarityScorer::default();
        assert!(scorer.score(&incoming, &second) > scorer.score(&incoming, &first));

        let engine = Deduplicator::new(DedupConfig::default().threshold(0.55)).unwrap();
        let outcome = engine.run(vec![first.clone(), second.clone(), incoming]);

        assert_eq!(outcome.hosts.len(), 2);
        assert_eq!(outcome.hosts[0].id, first.id);
        assert_eq!(outcome.hosts[0].ip_addresses.len(), 2);
        assert_eq!(outcome.hosts[1].ip_addresses, second.ip_addresses);
    }

    #[test]
    fn clusters_record_members_in_fold_order() {
        let hosts = vec![
            host(SourceSystem::Qualys, "q-1", "server1", &["192.168.1.1"]),
            host(SourceSystem::Crowdstrike, "cs-1", "server1", &["192.168.1.1"]),
            host(SourceSystem::Qualys, "q-2", "mailgw", &["10.9.9.9"]),
        ];

        let outcome = engine().run(hosts);

        assert_eq!(outcome.input_count, 3);
        assert_eq!(outcome.merged_count(), 1);
        let members: Vec<String> = outcome.clusters[0]
            .members
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(members, vec!["Qualys:q-1", "Crowdstrike:cs-1"]);
        assert_eq!(outcome.clusters[1].members.len(), 1);
        assert_eq!(outcome.clusters[0].id, outcome.hosts[0].id);
    }

    #[test]
    fn comparisons_stop_at_first_match() {
        let hosts = vec![
            host(SourceSystem::Qualys, "1", "alpha", &["10.0.0.1"]),
            host(SourceSystem::Qualys, "2", "bravo", &["10.0.0.2"]),
            host(SourceSystem::Qualys, "3", "alpha", &["10.0.0.1"]),
        ];

        let outcome = engine().run(hosts);

        // record 2: one comparison, record 3: matches the first cluster immediately
        assert_eq!(outcome.comparisons, 2);
        assert_eq!(outcome.hosts.len(), 2);
    }

    #[test]
    fn blocking_skips_address_disjoint_candidates() {
        let a = Host::builder(SourceSystem::Qualys, "1")
            .hostname("kiosk")
            .os("Linux", "6.1")
            .build();
        let b = Host::builder(SourceSystem::Crowdstrike, "2")
            .hostname("kiosk")
            .os("Linux", "6.1")
            .build();

        // hostname + os alone reach 0.5
        let engine = Deduplicator::new(DedupConfig::default().threshold(0.5)).unwrap();
        assert_eq!(engine.deduplicate(vec![a.clone(), b.clone()]).len(), 1);

        let blocked = engine.with_filter(SharedAddressBlocking);
        let outcome = blocked.run(vec![a, b]);
        assert_eq!(outcome.hosts.len(), 2);
        assert_eq!(outcome.comparisons, 0);
    }

    #[test]
    fn one_sided_windows_are_counted_when_inverted() {
        let day = |d| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap();
        let mut early = host(SourceSystem::Qualys, "1", "kiosk", &["10.0.0.5"]);
        early.first_seen = Some(day(20));
        let mut late = host(SourceSystem::Crowdstrike, "2", "kiosk", &["10.0.0.5"]);
        late.last_seen = Some(day(10));

        let outcome = engine().run(vec![early, late]);

        assert_eq!(outcome.hosts.len(), 1);
        assert_eq!(outcome.inverted_windows, 1);
        assert_eq!(outcome.hosts[0].first_seen, Some(day(20)));
        assert_eq!(outcome.hosts[0].last_seen, Some(day(10)));
    }

    #[test]
    fn scan_returns_first_qualifying_representative() {
        // Holds for the sequential scan and for `parallel`'s position_first.
        let engine = engine();
        let mut representatives: Vec<Host> = (0..10)
            .map(|i| {
                let ip = format!("10.1.0.{i}");
                host(SourceSystem::Qualys, &format!("n-{i}"), &format!("node{i}"), &[ip.as_str()])
            })
            .collect();
        representatives.extend((0..54).map(|i| {
            host(SourceSystem::Qualys, &format!("s-{i}"), "server1", &["192.168.1.1"])
        }));
        let incoming = host(SourceSystem::Crowdstrike, "cs-1", "server1", &["192.168.1.1"]);

        let sequential = representatives
            .iter()
            .position(|rep| engine.scorer().score(&incoming, rep) >= engine.threshold());
        let (matched, comparisons) = engine.find_match(&incoming, &representatives);

        assert_eq!(sequential, Some(10));
        assert_eq!(matched, sequential);
        assert_eq!(comparisons, 11);
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        assert!(Deduplicator::new(DedupConfig::default().threshold(0.0)).is_err());
        assert!(Deduplicator::new(DedupConfig::default().threshold(1.5)).is_err());
        assert!(Deduplicator::new(DedupConfig::default().threshold(f64::NAN)).is_err());
        assert!(Deduplicator::new(DedupConfig::default().threshold(1.0)).is_ok());
    }

    #[test]
    fn empty_batch_yields_empty_output() {
        let outcome = engine().run(Vec::new());
        assert!(outcome.hosts.is_empty());
        assert_eq!(outcome.comparisons, 0);
    }

    #[test]
    fn insert_threads_the_accumulator() {
        let engine = engine();
        let first = Host::builder(SourceSystem::Qualys, "1")
            .hostname("web01")
            .ip("10.0.0.1")
            .mac("00:11:22:33:44:55")
            .build();
        let second = Host::builder(SourceSystem::Crowdstrike, "2")
            .hostname("web01")
            .ip_addresses(["10.0.0.1", "10.0.0.9"])
            .mac("00:11:22:33:44:55")
            .build();

        let clusters = engine.insert(ClusterSet::default(), first);
        let clusters = engine.insert(clusters, second);

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters.representatives()[0].ip_addresses.len(), 2);
        assert_eq!(clusters.comparisons(), 1);
    }
}
