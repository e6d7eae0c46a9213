// scorer/src/analysis/entropy.rs
//
// Transition entropy over a step sequence.
//
// Adjacent pairs (a -> b) are counted per source node; each node with at
// least one outgoing transition contributes H = -Σ p log2 p over its
// outgoing distribution.  The average over those nodes picks the complexity
// label.  A single fixed sequence with distinct labels therefore scores 0.

use std::collections::BTreeMap;

use crate::model::{ComplexityLevel, EntropySummary};

pub fn summarize<S: AsRef<str>>(sequence: &[S]) -> EntropySummary {
    if sequence.len() <= 1 {
        return EntropySummary::default();
    }

    let mut transitions: BTreeMap<&str, BTreeMap<&str, u32>> = BTreeMap::new();
    for pair in sequence.windows(2) {
        *transitions
            .entry(pair[0].as_ref())
            .or_default()
            .entry(pair[1].as_ref())
            .or_insert(0) += 1;
    }

    let total_entropy: f64 = transitions.values().map(|next| node_entropy(next)).sum();
    let average_entropy = total_entropy / transitions.len() as f64;

    EntropySummary {
        average_entropy,
        total_entropy,
        complexity_level: ComplexityLevel::from_entropy(average_entropy),
    }
}

fn node_entropy(next: &BTreeMap<&str, u32>) -> f64 {
    let total: u32 = next.values().sum();
    next.values()
        .map(|&c| c as f64 / total as f64)
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.log2())
        .sum()
}
