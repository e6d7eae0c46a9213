// scorer/src/report/mod.rs
//
// Result aggregation and clustering detection.
//
// Clustering ("suspiciously repeated results") is checked over the most
// recent `window` results: the population variance of success_rate must fall
// below `variance_threshold` AND fewer than `uniqueness_ratio * window` of the
// (scenario, tier, sorted tags) combinations may be distinct.  A hit usually
// means a broken or reused random stream.  It is advisory: logged, never
// fatal, but a flagged result does not count as a successful validation.
//
// A pair validates when its success rate clears `MIN_VALIDATED_RATE`, its Las
// Vegas check passed and the window was clean right after it.  The run is
// proven when more than `PROVEN_RATIO` of attempted pairs validate.

pub mod output;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analysis::IndependenceReport;
use crate::config::ClusteringConfig;
use crate::error::ErrorKind;
use crate::model::ScenarioResult;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    CompletedWithSkips,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed          => write!(f, "COMPLETED"),
            Self::CompletedWithSkips => write!(f, "COMPLETED_WITH_SKIPS"),
        }
    }
}

/// A (scenario, tier) pair abandoned because of an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkippedPair {
    pub scenario: String,
    pub tier:     String,
    pub kind:     ErrorKind,
    pub message:  String,
}

pub const MIN_VALIDATED_RATE: f64 = 0.1;
pub const PROVEN_RATIO:       f64 = 0.75;

/// Facts about the run itself rather than any single result.
#[derive(Debug, Clone, Default)]
pub struct RunMeta {
    pub seed:        u64,
    pub elapsed_ms:  u64,
    /// Batch stopped early on request; remaining pairs were never started.
    pub cancelled:   bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub status:              RunStatus,
    pub results:             Vec<ScenarioResult>,
    pub skipped:             Vec<SkippedPair>,
    /// Any result in the run was flagged.
    pub clustering_detected: bool,
    /// Results flagged by the rolling window.
    pub clustering_detections: usize,
    /// Scored plus skipped pairs.
    pub total_validations:   usize,
    pub successful_validations: usize,
    /// `successful_validations / total_validations`, 0 for an empty run.
    pub validation_rate:     f64,
    pub framework_proven:    bool,
    pub independence:        Option<IndependenceReport>,
    pub total_iterations:    u64,
    pub seed:                u64,
    pub cancelled:           bool,
    pub generated_at:        DateTime<Utc>,
    pub elapsed_ms:          u64,
}

impl ValidationSummary {
    pub fn n_skipped(&self) -> usize {
        self.skipped.len()
    }

    pub fn mean_success_rate(&self) -> f64 {
        if self.results.is_empty() { return 0.0; }
        self.results.iter().map(|r| r.success_rate).sum::<f64>() / self.results.len() as f64
    }
}

// ── Clustering ────────────────────────────────────────────────────────────────

pub struct ClusteringDetector {
    cfg: ClusteringConfig,
}

impl ClusteringDetector {
    pub fn new(cfg: ClusteringConfig) -> Self {
        Self { cfg }
    }

    /// Append `result`, then flag it if the window ending at it is clustered.
    pub fn record(&self, results: &mut Vec<ScenarioResult>, result: ScenarioResult) -> bool {
        results.push(result);
        let flagged = self.detect(results);
        if let Some(last) = results.last_mut() {
            last.clustering_detected = flagged;
        }
        flagged
    }

    /// Inspect the trailing window of `results`.
    pub fn detect(&self, results: &[ScenarioResult]) -> bool {
        let w = self.cfg.window;
        if w == 0 || results.len() < w {
            return false;
        }
        let window = &results[results.len() - w..];

        let variance = population_variance(window.iter().map(|r| r.success_rate));
        let unique: HashSet<_> = window.iter().map(|r| r.combination_key()).collect();
        let repeated = (unique.len() as f64) < w as f64 * self.cfg.uniqueness_ratio;

        let clustered = variance < self.cfg.variance_threshold && repeated;
        if clustered {
            warn!(
                "Clustering detected over last {} results: variance={:.6} unique={}/{}",
                w, variance, unique.len(), w
            );
        }
        clustered
    }
}

fn population_variance(xs: impl Iterator<Item = f64> + Clone) -> f64 {
    let n = xs.clone().count();
    if n == 0 { return 0.0; }
    let mean = xs.clone().sum::<f64>() / n as f64;
    xs.map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64
}

// ── Aggregation ───────────────────────────────────────────────────────────────

impl ScenarioResult {
    pub fn validated(&self) -> bool {
        self.success_rate > MIN_VALIDATED_RATE && self.las_vegas_verified && !self.clustering_detected
    }
}

/// Fold recorded results into the run summary.  Clustering flags are read
/// off the results as `ClusteringDetector::record` left them.
pub fn aggregate(
    results:      Vec<ScenarioResult>,
    skipped:      Vec<SkippedPair>,
    independence: Option<IndependenceReport>,
    meta:         RunMeta,
) -> ValidationSummary {
    let clustering_detections  = results.iter().filter(|r| r.clustering_detected).count();
    let total_iterations       = results.iter().map(|r| r.trial_count).sum();
    let total_validations      = results.len() + skipped.len();
    let successful_validations = results.iter().filter(|r| r.validated()).count();
    let validation_rate = if total_validations == 0 {
        0.0
    } else {
        successful_validations as f64 / total_validations as f64
    };
    let status = if skipped.is_empty() {
        RunStatus::Completed
    } else {
        RunStatus::CompletedWithSkips
    };

    ValidationSummary {
        status,
        results,
        skipped,
        clustering_detected: clustering_detections > 0,
        clustering_detections,
        total_validations,
        successful_validations,
        validation_rate,
        framework_proven: successful_validations as f64 > total_validations as f64 * PROVEN_RATIO,
        independence,
        total_iterations,
        seed:         meta.seed,
        cancelled:    meta.cancelled,
        generated_at: Utc::now(),
        elapsed_ms:   meta.elapsed_ms,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{CoverageReport, EntropySummary};
    use std::collections::BTreeSet;

    pub(crate) fn result(scenario: &str, tier: &str, rate: f64) -> ScenarioResult {
        ScenarioResult {
            scenario_name:      scenario.into(),
            tier:               tier.into(),
            success_rate:       rate,
            successful_trials:  (rate * 1000.0) as u64,
            trial_count:        1000,
            entropy_summary:    EntropySummary::default(),
            phase_path:         vec![],
            independence_sets:  vec![],
            las_vegas_verified: true,
            clustering_detected: false,
            coverage:           CoverageReport::default(),
            tags:               BTreeSet::new(),
            elapsed_ms:         1,
        }
    }

    fn detector() -> ClusteringDetector {
        ClusteringDetector::new(ClusteringConfig::default())
    }

    #[test]
    fn identical_repeated_results_cluster() {
        // 10 identical rates over only 3 distinct combinations
        let results: Vec<_> = (0..10)
            .map(|i| result(&format!("s{}", i % 3), "advanced", 0.42))
            .collect();
        assert!(detector().detect(&results));
    }

    #[test]
    fn spread_unique_results_do_not_cluster() {
        let results: Vec<_> = (0..10)
            .map(|i| result(&format!("s{i}"), "advanced", i as f64 / 10.0))
            .collect();
        assert!(!detector().detect(&results));
    }

    #[test]
    fn low_variance_alone_is_not_enough() {
        let results: Vec<_> = (0..10).map(|i| result(&format!("s{i}"), "t", 0.5)).collect();
        assert!(!detector().detect(&results));
    }

    #[test]
    fn short_history_never_clusters() {
        let results: Vec<_> = (0..9).map(|_| result("s", "t", 0.5)).collect();
        assert!(!detector().detect(&results));
    }

    #[test]
    fn only_trailing_window_counts() {
        let mut results: Vec<_> = (0..10).map(|i| result(&format!("s{i}"), "t", i as f64 / 10.0)).collect();
        results.extend((0..10).map(|_| result("dup", "t", 0.3)));
        assert!(detector().detect(&results));
    }

    #[test]
    fn status_reflects_skips() {
        let ok = aggregate(vec![result("a", "t", 0.5)], vec![], None, RunMeta::default());
        assert_eq!(ok.status, RunStatus::Completed);
        assert_eq!(ok.total_iterations, 1000);
        assert!(!ok.clustering_detected);

        let skip = SkippedPair {
            scenario: "b".into(),
            tier:     "wizard".into(),
            kind:     ErrorKind::UnknownTier,
            message:  "unknown tier: wizard".into(),
        };
        let s = aggregate(vec![], vec![skip], None, RunMeta::default());
        assert_eq!(s.status, RunStatus::CompletedWithSkips);
        assert_eq!(s.n_skipped(), 1);
        assert_eq!(s.mean_success_rate(), 0.0);
        assert_eq!(s.total_validations, 1);
        assert_eq!(s.successful_validations, 0);
        assert!(!s.framework_proven);
    }

    #[test]
    fn clustering_mid_run_survives_a_clean_tail() {
        let d = detector();
        let mut results = Vec::new();
        for _ in 0..10 {
            d.record(&mut results, result("dup", "t", 0.3));
        }
        for i in 0..10 {
            d.record(&mut results, result(&format!("s{i}"), "t", i as f64 / 10.0));
        }
        // clean trailing window
        assert!(!d.detect(&results));
        assert!(!results.last().unwrap().clustering_detected);

        let s = aggregate(results, vec![], None, RunMeta::default());
        // tenth dup, then the first spread result still inside a tight window
        assert_eq!(s.clustering_detections, 2);
        assert!(s.clustering_detected);
        assert!(s.results[9].clustering_detected);
        assert!(s.results[10].clustering_detected);
    }

    #[test]
    fn record_flags_only_the_clustered_result() {
        let d = detector();
        let mut results = Vec::new();
        for _ in 0..9 {
            assert!(!d.record(&mut results, result("dup", "t", 0.3)));
        }
        assert!(d.record(&mut results, result("dup", "t", 0.3)));
        assert_eq!(results.iter().filter(|r| r.clustering_detected).count(), 1);
    }

    #[test]
    fn suite_verdict_counts_validated_pairs() {
        let mut low = result("low", "t", 0.05);
        low.las_vegas_verified = true;
        let mut unverified = result("unverified", "t", 0.9);
        unverified.las_vegas_verified = false;
        let mut flagged = result("flagged", "t", 0.9);
        flagged.clustering_detected = true;
        let good: Vec<_> = (0..3).map(|i| result(&format!("g{i}"), "t", 0.5)).collect();

        let mut results = vec![low, unverified, flagged];
        results.extend(good.clone());
        let s = aggregate(results, vec![], None, RunMeta::default());
        assert_eq!(s.total_validations, 6);
        assert_eq!(s.successful_validations, 3);
        assert!((s.validation_rate - 0.5).abs() < 1e-12);
        assert!(!s.framework_proven);

        // 3 of 4 is exactly 75%, which is not enough
        let mut results = good.clone();
        results.push(result("low", "t", 0.1));
        let s = aggregate(results, vec![], None, RunMeta::default());
        assert_eq!(s.successful_validations, 3);
        assert!(!s.framework_proven);

        let mut results = good;
        results.push(result("g3", "t", 0.5));
        let s = aggregate(results, vec![], None, RunMeta::default());
        assert!(s.framework_proven);
        assert_eq!(s.validation_rate, 1.0);
    }

    #[test]
    fn variance_is_population_variance() {
        let v = population_variance([1.0, 3.0].into_iter());
        assert!((v - 1.0).abs() < 1e-12);
    }
}
