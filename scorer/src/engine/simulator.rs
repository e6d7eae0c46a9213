// scorer/src/engine/simulator.rs
//
// Trial simulator.
//
// Each trial walks a scenario's steps in order.  Per step:
//
//   adjusted = clamp((base * capability + bonus) * (1 - entropy * entropy_weight)
//                    + N(0, noise_sd), 0, 1)
//
// where bonus = modernization_bonus * |modernization_factors|.  The step
// succeeds when a uniform draw falls below `adjusted`; the trial succeeds only
// if every step does, and the walk stops at the first failure.
//
// Trials are cut into fixed chunks of `chunk_size`.  Chunk k draws from its
// own StdRng seeded with mix(seed, k), so the success count for a given seed
// is identical whether chunks run on one thread or on the whole rayon pool.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{SimulatorConfig, TierTable};
use crate::error::{Result, ScorerError};
use crate::model::{Scenario, TrialOutcome};

/// Raw counts for one (scenario, tier) pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialStats {
    pub scenario_name:     String,
    pub tier:              String,
    pub successful_trials: u64,
    pub trial_count:       u64,
    pub success_rate:      f64,
    pub elapsed_ms:        u64,
}

pub struct TrialSimulator {
    config: SimulatorConfig,
    tiers:  TierTable,
}

impl TrialSimulator {
    pub fn new(config: SimulatorConfig, tiers: TierTable) -> Self {
        Self { config, tiers }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    pub fn run_trials(
        &self,
        scenario:        &Scenario,
        tier:            &str,
        iteration_count: i64,
        seed:            u64,
    ) -> Result<TrialStats> {
        if iteration_count <= 0 {
            return Err(ScorerError::InvalidParameter(format!(
                "iteration_count must be > 0, got {iteration_count}"
            )));
        }
        let tier_rec = self.tiers.get(tier)?;
        let n = iteration_count as u64;
        let start = Instant::now();

        let successes = if scenario.steps.is_empty() {
            n
        } else {
            let probs = self.step_probabilities(scenario, tier_rec.capability_factor);
            self.count_successes(scenario, tier, &probs, n, seed)
        };

        let stats = TrialStats {
            scenario_name:     scenario.name.clone(),
            tier:              tier.to_string(),
            successful_trials: successes,
            trial_count:       n,
            success_rate:      successes as f64 / n as f64,
            elapsed_ms:        start.elapsed().as_millis() as u64,
        };
        info!(
            "{} @ {}: {}/{} ({:.4}) in {}ms",
            stats.scenario_name, stats.tier, successes, n, stats.success_rate, stats.elapsed_ms
        );
        Ok(stats)
    }

    /// Noise-free adjusted probability per step.
    fn step_probabilities(&self, scenario: &Scenario, capability: f64) -> Vec<f64> {
        let bonus = self.config.modernization_bonus * scenario.modernization_factors.len() as f64;
        scenario.steps.iter()
            .map(|s| (s.base_probability * capability + bonus) * (1.0 - s.entropy_score * self.config.entropy_weight))
            .collect()
    }

    fn count_successes(&self, scenario: &Scenario, tier: &str, probs: &[f64], n: u64, seed: u64) -> u64 {
        let chunk_size = self.config.chunk_size.max(1);
        let n_chunks   = n.div_ceil(chunk_size);
        let done       = AtomicU64::new(0);
        let interval   = self.config.progress_interval;

        let run_chunk = |k: u64| -> u64 {
            let lo  = k * chunk_size;
            let len = chunk_size.min(n - lo);
            let mut rng = StdRng::seed_from_u64(mix(seed, k));
            let mut outcome = TrialOutcome {
                scenario_name:  &scenario.name,
                tier,
                step_successes: Vec::with_capacity(probs.len()),
            };
            let mut hits = 0u64;
            for _ in 0..len {
                self.simulate_trial(probs, &mut rng, &mut outcome);
                if outcome.succeeded(probs.len()) {
                    hits += 1;
                }
            }

            let before = done.fetch_add(len, Ordering::Relaxed);
            if interval > 0 && (before + len) / interval > before / interval {
                debug!("{} @ {}: {}/{} trials", scenario.name, tier, before + len, n);
            }
            hits
        };

        if self.config.parallel {
            (0..n_chunks).into_par_iter().map(run_chunk).sum()
        } else {
            (0..n_chunks).map(run_chunk).sum()
        }
    }

    fn simulate_trial(&self, probs: &[f64], rng: &mut StdRng, outcome: &mut TrialOutcome<'_>) {
        outcome.step_successes.clear();
        for &p in probs {
            let noise = if self.config.noise_sd > 0.0 {
                gaussian(rng) * self.config.noise_sd
            } else {
                0.0
            };
            let adjusted = (p + noise).clamp(0.0, 1.0);
            let ok = rng.gen::<f64>() < adjusted;
            outcome.step_successes.push(ok);
            if !ok {
                break;
            }
        }
    }
}

/// Standard normal draw (Box-Muller, cosine branch).
fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>(); // (0, 1]
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// SplitMix64 finalizer over (seed, stream).
pub(crate) fn mix(seed: u64, stream: u64) -> u64 {
    let mut z = seed ^ stream.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
