// scorer/src/config.rs
//
// Engine configuration.
//
// Every component takes its own config struct at construction; nothing is
// read from process-wide state.  The whole tree deserializes from one JSON
// document (every field defaulted) and the CLI overrides individual knobs.
//
// Example (all fields optional):
//   {
//     "simulator":  { "iterations": 250000, "seed": 7, "parallel": true },
//     "tiers":      [ { "name": "advanced", "capability_factor": 0.8 } ],
//     "clustering": { "window": 10, "variance_threshold": 0.01 }
//   }

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScorerError};
use crate::external::RetryPolicy;
use crate::model::Tier;

// ── Simulator ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Trials per (scenario, tier) pair. Must be > 0.
    pub iterations:          i64,
    /// Global seed; None = drawn once at startup and echoed in the summary.
    pub seed:                Option<u64>,
    /// Trials per independently seeded RNG stream.
    pub chunk_size:          u64,
    /// Standard deviation of the per-step Gaussian noise.
    pub noise_sd:            f64,
    /// Scale of the entropy penalty: p *= 1 - entropy_score * entropy_weight.
    pub entropy_weight:      f64,
    /// Added to base * capability once per modernization factor. 0 = off.
    pub modernization_bonus: f64,
    /// Run chunks on the rayon pool.
    pub parallel:            bool,
    /// Trials between progress log lines.
    pub progress_interval:   u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            iterations:          1_000_000,
            seed:                None,
            chunk_size:          65_536,
            noise_sd:            0.05,
            entropy_weight:      0.3,
            modernization_bonus: 0.0,
            parallel:            true,
            progress_interval:   100_000,
        }
    }
}

// ── Analyzers ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Most recent results inspected.
    pub window:             usize,
    pub variance_threshold: f64,
    /// Unique (scenario, tier, tags) fraction below which the window is suspicious.
    pub uniqueness_ratio:   f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self { window: 10, variance_threshold: 0.01, uniqueness_ratio: 0.70 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndependenceConfig {
    pub top_k:               usize,
    pub component_threshold: f64,
    /// Eigenvalues above this count towards the reported rank.
    pub rank_threshold:      f64,
    pub min_set_size:        usize,
}

impl Default for IndependenceConfig {
    fn default() -> Self {
        Self { top_k: 5, component_threshold: 0.5, rank_threshold: 0.1, min_set_size: 2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    pub attempts:   u32,
    pub acceptance: f64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self { attempts: 100, acceptance: 0.95 }
    }
}

// ── Tiers ─────────────────────────────────────────────────────────────────────

/// Fixed set of capability tiers, built once at startup.
#[derive(Debug, Clone)]
pub struct TierTable {
    tiers: Vec<Tier>,
}

impl TierTable {
    pub fn new(tiers: Vec<Tier>) -> Result<Self> {
        for (i, t) in tiers.iter().enumerate() {
            if !(t.capability_factor > 0.0 && t.capability_factor <= 1.0) {
                return Err(ScorerError::InvalidParameter(format!(
                    "tier {} capability_factor {} outside (0, 1]", t.name, t.capability_factor
                )));
            }
            if tiers[..i].iter().any(|o| o.name == t.name) {
                return Err(ScorerError::InvalidParameter(format!("duplicate tier {}", t.name)));
            }
        }
        Ok(Self { tiers })
    }

    pub fn get(&self, name: &str) -> Result<&Tier> {
        self.tiers.iter()
            .find(|t| t.name == name)
            .ok_or_else(|| ScorerError::UnknownTier(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tier> {
        self.tiers.iter()
    }

    pub fn len(&self) -> usize { self.tiers.len() }
    pub fn is_empty(&self) -> bool { self.tiers.is_empty() }
}

pub fn default_tiers() -> Vec<Tier> {
    vec![
        Tier::new("script_kiddie", 0.30),
        Tier::new("intermediate",  0.60),
        Tier::new("advanced",      0.80),
        Tier::new("nation_state",  0.95),
    ]
}

// ── Root ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub simulator:    SimulatorConfig,
    pub tiers:        Vec<Tier>,
    pub clustering:   ClusteringConfig,
    pub independence: IndependenceConfig,
    pub verify:       VerifyConfig,
    pub retry:        RetryPolicy,
    /// rayon worker threads; None = one per core.
    pub threads:      Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            simulator:    SimulatorConfig::default(),
            tiers:        default_tiers(),
            clustering:   ClusteringConfig::default(),
            independence: IndependenceConfig::default(),
            verify:       VerifyConfig::default(),
            retry:        RetryPolicy::default(),
            threads:      None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Checks knobs that would otherwise fail deep inside a run.
    /// `iterations` is checked per pair by the simulator.
    pub fn validate(&self) -> Result<()> {
        let s = &self.simulator;
        if s.chunk_size == 0 {
            return Err(ScorerError::InvalidParameter("chunk_size must be > 0".into()));
        }
        if !(s.noise_sd >= 0.0) {
            return Err(ScorerError::InvalidParameter(format!("noise_sd {} < 0", s.noise_sd)));
        }
        if !(0.0..=1.0).contains(&s.entropy_weight) {
            return Err(ScorerError::InvalidParameter(format!(
                "entropy_weight {} outside [0, 1]", s.entropy_weight
            )));
        }
        if self.clustering.window == 0 {
            return Err(ScorerError::InvalidParameter("clustering window must be > 0".into()));
        }
        if self.independence.top_k == 0 {
            return Err(ScorerError::InvalidParameter("independence top_k must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.verify.acceptance) {
            return Err(ScorerError::InvalidParameter(format!(
                "verify acceptance {} outside [0, 1]", self.verify.acceptance
            )));
        }
        if self.threads == Some(0) {
            return Err(ScorerError::InvalidParameter("threads must be > 0".into()));
        }
        TierTable::new(self.tiers.clone()).map(|_| ())
    }

    pub fn tier_table(&self) -> Result<TierTable> {
        TierTable::new(self.tiers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let c = EngineConfig::default();
        assert_eq!(c.simulator.iterations, 1_000_000);
        assert_eq!(c.simulator.noise_sd, 0.05);
        assert_eq!(c.simulator.entropy_weight, 0.3);
        assert_eq!(c.simulator.modernization_bonus, 0.0);
        assert_eq!(c.clustering.window, 10);
        assert_eq!(c.independence.top_k, 5);
        assert_eq!(c.tiers.len(), 4);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = EngineConfig::from_json(r#"{"simulator": {"iterations": 500, "seed": 9}}"#).unwrap();
        assert_eq!(c.simulator.iterations, 500);
        assert_eq!(c.simulator.seed, Some(9));
        assert_eq!(c.simulator.chunk_size, 65_536);
        assert_eq!(c.verify.attempts, 100);
    }

    #[test]
    fn rejects_bad_tiers() {
        let bad = EngineConfig::from_json(r#"{"tiers": [{"name": "x", "capability_factor": 0.0}]}"#);
        assert!(matches!(bad, Err(ScorerError::InvalidParameter(_))));

        let dup = TierTable::new(vec![Tier::new("a", 0.5), Tier::new("a", 0.6)]);
        assert!(matches!(dup, Err(ScorerError::InvalidParameter(_))));
    }

    #[test]
    fn tier_lookup() {
        let t = TierTable::new(default_tiers()).unwrap();
        assert_eq!(t.get("advanced").unwrap().capability_factor, 0.80);
        assert!(matches!(t.get("wizard"), Err(ScorerError::UnknownTier(n)) if n == "wizard"));
    }

    #[test]
    fn malformed_json_is_json_error() {
        assert!(matches!(EngineConfig::from_json("{"), Err(ScorerError::Json(_))));
    }
}
