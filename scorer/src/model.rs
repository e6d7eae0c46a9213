// scorer/src/model.rs
//
// Shared domain types flowing through the scorer.
//
// Scenarios and steps are built once by the catalog and only ever read
// afterwards; trial outcomes are throwaway; results are frozen once the
// simulator and analyzers have filled them in.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ── Catalog records ───────────────────────────────────────────────────────────

/// One stage of a scenario.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Step {
    pub label:            String,
    /// Base success probability (0.0–1.0).
    pub base_probability: f64,
    /// Heuristic difficulty cost (0.0–1.0).
    pub entropy_score:    f64,
}

impl Step {
    pub fn new(label: impl Into<String>, base_probability: f64, entropy_score: f64) -> Self {
        Self { label: label.into(), base_probability, entropy_score }
    }
}

/// A named, ordered chain of steps. Success requires every step to succeed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub name:             String,
    pub steps:            Vec<Step>,
    /// Tier names this scenario is scored against.
    pub applicable_tiers: BTreeSet<String>,
    /// Primitive tags (e.g. "coordinate", "encrypt").
    pub tags:             BTreeSet<String>,
    #[serde(default)]
    pub severity:         u8,
    #[serde(default)]
    pub modernization_factors: Vec<String>,
}

impl Scenario {
    pub fn labels(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.label.as_str()).collect()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Capability level scaling every step probability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tier {
    pub name:              String,
    /// Multiplier in (0.0, 1.0].
    pub capability_factor: f64,
}

impl Tier {
    pub fn new(name: impl Into<String>, capability_factor: f64) -> Self {
        Self { name: name.into(), capability_factor }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:.2})", self.name, self.capability_factor)
    }
}

// ── Simulation ────────────────────────────────────────────────────────────────

/// One simulated pass through a scenario. Only the success count survives.
#[derive(Debug, Clone)]
pub struct TrialOutcome<'a> {
    pub scenario_name: &'a str,
    pub tier:          &'a str,
    pub step_successes: Vec<bool>,
}

impl TrialOutcome<'_> {
    /// Conjunctive chain: every recorded step must have succeeded, and a
    /// trial that short-circuited records fewer steps than the scenario has.
    pub fn succeeded(&self, n_steps: usize) -> bool {
        self.step_successes.len() == n_steps && self.step_successes.iter().all(|&s| s)
    }
}

// ── Analysis outputs ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ComplexityLevel {
    pub fn from_entropy(h: f64) -> Self {
        if h >= 3.0      { Self::Critical }
        else if h >= 2.0 { Self::High }
        else if h >= 1.0 { Self::Medium }
        else             { Self::Low }
    }
}

impl std::fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low      => write!(f, "LOW"),
            Self::Medium   => write!(f, "MEDIUM"),
            Self::High     => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntropySummary {
    pub average_entropy:  f64,
    pub total_entropy:    f64,
    pub complexity_level: ComplexityLevel,
}

impl Default for EntropySummary {
    fn default() -> Self {
        Self { average_entropy: 0.0, total_entropy: 0.0, complexity_level: ComplexityLevel::Low }
    }
}

/// Operational phase label assigned by the phase classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Hunt,
    Detect,
    Disrupt,
    Destroy,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Hunt, Phase::Detect, Phase::Disrupt, Phase::Destroy];

    pub fn index(self) -> usize {
        match self {
            Self::Hunt    => 0,
            Self::Detect  => 1,
            Self::Disrupt => 2,
            Self::Destroy => 3,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hunt    => write!(f, "hunt"),
            Self::Detect  => write!(f, "detect"),
            Self::Disrupt => write!(f, "disrupt"),
            Self::Destroy => write!(f, "destroy"),
        }
    }
}

/// Per-domain primitive coverage of a scenario's tags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CoverageReport {
    pub domain_coverage:      BTreeMap<String, f64>,
    pub average_coverage:     f64,
    pub primitives_validated: usize,
    pub total_primitives:     usize,
    /// `primitives_validated / total_primitives * 100`.
    pub coverage_percentage:  f64,
    /// Keyword-weighted bump from the scenario's modernization factors.
    pub modernization_boost:  f64,
    /// `min(1, average_coverage + modernization_boost)`.
    pub universality_score:   f64,
}

// ── Results ───────────────────────────────────────────────────────────────────

/// Aggregate for one (scenario, tier) pair. Frozen after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name:      String,
    pub tier:               String,
    pub success_rate:       f64,
    pub successful_trials:  u64,
    pub trial_count:        u64,
    pub entropy_summary:    EntropySummary,
    pub phase_path:         Vec<Phase>,
    pub independence_sets:  Vec<BTreeSet<String>>,
    pub las_vegas_verified: bool,
    /// The rolling clustering window looked clustered right after this result.
    pub clustering_detected: bool,
    pub coverage:           CoverageReport,
    pub tags:               BTreeSet<String>,
    pub elapsed_ms:         u64,
}

impl ScenarioResult {
    /// Clustering key: (scenario, tier, sorted tags).
    pub fn combination_key(&self) -> (String, String, Vec<String>) {
        (self.scenario_name.clone(), self.tier.clone(), self.tags.iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complexity_thresholds_are_half_open() {
        assert_eq!(ComplexityLevel::from_entropy(0.0),    ComplexityLevel::Low);
        assert_eq!(ComplexityLevel::from_entropy(0.999),  ComplexityLevel::Low);
        assert_eq!(ComplexityLevel::from_entropy(1.0),    ComplexityLevel::Medium);
        assert_eq!(ComplexityLevel::from_entropy(2.0),    ComplexityLevel::High);
        assert_eq!(ComplexityLevel::from_entropy(2.999),  ComplexityLevel::High);
        assert_eq!(ComplexityLevel::from_entropy(3.0),    ComplexityLevel::Critical);
    }

    #[test]
    fn trial_outcome_short_circuit_is_failure() {
        let t = TrialOutcome { scenario_name: "s", tier: "t", step_successes: vec![true, true] };
        assert!(t.succeeded(2));
        assert!(!t.succeeded(3));
        let f = TrialOutcome { scenario_name: "s", tier: "t", step_successes: vec![true, false] };
        assert!(!f.succeeded(2));
    }

    #[test]
    fn phase_and_complexity_serialize_like_report() {
        assert_eq!(serde_json::to_string(&Phase::Disrupt).unwrap(), "\"disrupt\"");
        assert_eq!(serde_json::to_string(&ComplexityLevel::Critical).unwrap(), "\"CRITICAL\"");
    }

    #[test]
    fn scenario_json_defaults_optional_fields() {
        let s: Scenario = serde_json::from_str(r#"{
            "name": "x",
            "steps": [{"label": "a", "base_probability": 0.5, "entropy_score": 0.1}],
            "applicable_tiers": ["advanced"],
            "tags": ["read", "connect"]
        }"#).unwrap();
        assert_eq!(s.severity, 0);
        assert!(s.modernization_factors.is_empty());
        assert!(s.has_tag("read"));
        assert_eq!(s.labels(), vec!["a"]);
    }
}
