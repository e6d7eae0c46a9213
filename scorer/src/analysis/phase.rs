// scorer/src/analysis/phase.rs
//
// Fixed-table phase classifier (hunt / detect / disrupt / destroy).
//
// Labels are reduced to one observation each through a keyword table.  The
// starting phase is the one whose emission weights best explain the whole
// observation sequence; from there the path follows the most probable
// transition at every position.  No backtracking: the path is a greedy walk
// over the transition table, not a Viterbi decode.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Observation {
    Reconnaissance,
    Scanning,
    Enumeration,
    Analysis,
    Correlation,
    Attribution,
    Mitigation,
    Containment,
    Isolation,
    Elimination,
    Eradication,
    Recovery,
    Unknown,
}

/// Rows: from-phase, columns: to-phase, both in `Phase::ALL` order.
const TRANSITIONS: [[f64; 4]; 4] = [
    [0.3, 0.4, 0.2, 0.1], // hunt
    [0.2, 0.3, 0.3, 0.2], // detect
    [0.1, 0.2, 0.4, 0.3], // disrupt
    [0.3, 0.2, 0.2, 0.3], // destroy
];

/// Weight for any observation a phase does not list.
const UNLISTED_EMISSION: f64 = 0.1;

fn emission(phase: Phase, obs: Observation) -> f64 {
    use Observation::*;
    match (phase, obs) {
        (Phase::Hunt, Reconnaissance) => 0.6,
        (Phase::Hunt, Scanning)       => 0.3,
        (Phase::Hunt, Enumeration)    => 0.1,
        (Phase::Detect, Analysis)     => 0.5,
        (Phase::Detect, Correlation)  => 0.3,
        (Phase::Detect, Attribution)  => 0.2,
        (Phase::Disrupt, Mitigation)  => 0.4,
        (Phase::Disrupt, Containment) => 0.4,
        (Phase::Disrupt, Isolation)   => 0.2,
        (Phase::Destroy, Elimination) => 0.5,
        (Phase::Destroy, Eradication) => 0.3,
        (Phase::Destroy, Recovery)    => 0.2,
        _ => UNLISTED_EMISSION,
    }
}

/// Word prefixes per observation, scanned in order; first hit wins.
/// Primitive verbs come first so a bare primitive name maps directly.
const KEYWORDS: &[(Observation, &[&str])] = &[
    (Observation::Reconnaissance, &["read", "reconnaissance", "plans", "dark", "identif", "models"]),
    (Observation::Scanning,       &["connect", "scan", "hack", "spoof", "test"]),
    (Observation::Enumeration,    &["authenticat", "enumerat", "vulnerab", "access"]),
    (Observation::Analysis,       &["transform", "analy", "optimiz", "learned"]),
    (Observation::Correlation,    &["coordinat", "correlat", "synchron", "botnet"]),
    (Observation::Attribution,    &["encrypt", "attribut", "deepfake", "social"]),
    (Observation::Mitigation,     &["filter", "mitigat", "disrupt", "corrupt"]),
    (Observation::Containment,    &["lock", "contain", "secure", "acquired", "prep", "equipped",
                                    "armed", "positioned", "loaded", "integrat"]),
    (Observation::Isolation,      &["disconnect", "isolat", "smuggl", "launder"]),
    (Observation::Elimination,    &["delete", "eliminat", "detonat", "explosion", "release",
                                    "assault", "collapse", "pulse"]),
    (Observation::Eradication,    &["rollback", "eradicat", "cascade"]),
    (Observation::Recovery,       &["restore", "recover"]),
];

pub fn observe(label: &str) -> Observation {
    let lower = label.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    KEYWORDS.iter()
        .find(|(_, keys)| keys.iter().any(|k| words.iter().any(|w| w.starts_with(k))))
        .map(|(obs, _)| *obs)
        .unwrap_or(Observation::Unknown)
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseClassification {
    pub observations:        Vec<Observation>,
    pub state_probabilities: BTreeMap<Phase, f64>,
    pub path:                Vec<Phase>,
    /// Normalized weight of the starting phase.
    pub confidence:          f64,
}

pub fn classify<S: AsRef<str>>(labels: &[S]) -> Vec<Phase> {
    analyze(labels).path
}

pub fn analyze<S: AsRef<str>>(labels: &[S]) -> PhaseClassification {
    let observations: Vec<Observation> = labels.iter().map(|l| observe(l.as_ref())).collect();

    // log-space product of emissions, normalized by the max before exp
    let log_w: Vec<f64> = Phase::ALL.iter()
        .map(|&p| observations.iter().map(|&o| emission(p, o).ln()).sum::<f64>())
        .collect();
    let max = log_w.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let w: Vec<f64> = log_w.iter().map(|l| (l - max).exp()).collect();
    let total: f64 = w.iter().sum();
    let probs: Vec<f64> = w.iter().map(|x| x / total).collect();

    let start = first_argmax(&probs);
    let mut path = Vec::with_capacity(observations.len());
    let mut current = start;
    for _ in &observations {
        path.push(Phase::ALL[current]);
        current = first_argmax(&TRANSITIONS[current]);
    }

    PhaseClassification {
        state_probabilities: Phase::ALL.iter().copied().zip(probs.iter().copied()).collect(),
        confidence: probs[start],
        observations,
        path,
    }
}

/// Index of the largest value; ties go to the lowest index.
fn first_argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}
