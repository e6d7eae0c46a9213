// scorer/src/analysis/verify.rs
//
// Las Vegas style acceptance check of a tag set against an independence
// report.  Each attempt samples a random non-empty subset; a subset counts as
// independent when it sits inside a discovered set or is no larger than the
// report's rank.  An independent sample is accepted with probability
// `acceptance`.  Randomized by construction: callers pass a seeded RNG.

use std::collections::BTreeSet;

use rand::seq::IteratorRandom;
use rand::Rng;

use crate::analysis::independence::IndependenceReport;
use crate::config::VerifyConfig;

pub fn las_vegas_verify<R: Rng + ?Sized>(
    tags:   &BTreeSet<String>,
    report: &IndependenceReport,
    cfg:    &VerifyConfig,
    rng:    &mut R,
) -> bool {
    if tags.is_empty() {
        return false;
    }
    for _ in 0..cfg.attempts {
        let size = rng.gen_range(1..=tags.len());
        let sample: BTreeSet<&String> = tags.iter().choose_multiple(rng, size).into_iter().collect();
        if is_independent(&sample, report) && rng.gen::<f64>() < cfg.acceptance {
            return true;
        }
    }
    false
}

fn is_independent(sample: &BTreeSet<&String>, report: &IndependenceReport) -> bool {
    if report.independent_sets.iter().any(|set| sample.iter().all(|t| set.contains(*t))) {
        return true;
    }
    sample.len() <= report.rank
}
