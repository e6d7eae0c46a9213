// scorer/src/analysis/coverage.rs
//
// Primitive coverage of a scenario's tags over five fixed domains, bumped by
// keyword weights on its modernization factors.

use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::PRIMITIVES;
use crate::model::CoverageReport;

pub const DOMAINS: [(&str, [&str; 4]); 5] = [
    ("cyber",     ["connect", "authenticate", "encrypt", "decrypt"]),
    ("kinetic",   ["create", "coordinate", "signal", "delete"]),
    ("cognitive", ["transform", "validate", "branch", "loop"]),
    ("temporal",  ["save", "restore", "checkpoint", "rollback"]),
    ("resource",  ["allocate", "deallocate", "lock", "unlock"]),
];

/// Sum of keyword weights over the modernization factors.  "AI" and "UAV"
/// match case-sensitively so they do not fire inside ordinary words.
pub fn modernization_boost<S: AsRef<str>>(factors: &[S]) -> f64 {
    factors.iter()
        .map(|f| {
            let f     = f.as_ref();
            let lower = f.to_lowercase();
            let mut boost = 0.0;
            if f.contains("AI")                             { boost += 0.10; }
            if lower.contains("cyber")                      { boost += 0.05; }
            if f.contains("UAV") || lower.contains("drone") { boost += 0.08; }
            boost
        })
        .sum()
}

pub fn coverage<S: AsRef<str>>(tags: &BTreeSet<String>, modernization_factors: &[S]) -> CoverageReport {
    let domain_coverage: BTreeMap<String, f64> = DOMAINS.iter()
        .map(|(domain, prims)| {
            let hit = prims.iter().filter(|p| tags.contains(**p)).count();
            (domain.to_string(), hit as f64 / prims.len() as f64)
        })
        .collect();
    let average_coverage     = domain_coverage.values().sum::<f64>() / DOMAINS.len() as f64;
    let primitives_validated = tags.iter().filter(|t| PRIMITIVES.contains(&t.as_str())).count();
    let boost                = modernization_boost(modernization_factors);

    CoverageReport {
        domain_coverage,
        average_coverage,
        primitives_validated,
        total_primitives:     PRIMITIVES.len(),
        coverage_percentage:  primitives_validated as f64 / PRIMITIVES.len() as f64 * 100.0,
        modernization_boost:  boost,
        universality_score:   (average_coverage + boost).min(1.0),
    }
}
