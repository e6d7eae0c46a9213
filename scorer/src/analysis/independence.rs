// scorer/src/analysis/independence.rs
//
// Co-occurrence spectral clustering of scenario tags.
//
// M[i][j] counts the scenarios carrying both tag i and tag j, divided by the
// scenario count.  The top-k eigenvectors of this symmetric matrix (by
// eigenvalue, descending) each pick out the tags whose component magnitude
// clears the threshold; those picks are the "independent sets".  This is a
// descriptive clustering heuristic, not a matroid independence oracle.

use std::collections::BTreeSet;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::IndependenceConfig;
use crate::error::{Result, ScorerError};
use crate::model::Scenario;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Constraint {
    pub id:               String,
    pub tags:             BTreeSet<String>,
    /// At most |set| - 1 members may be exercised together.
    pub max_simultaneous: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct IndependenceReport {
    /// Matrix index order.
    pub tags:             Vec<String>,
    /// Top-k eigenvalues, descending.
    pub eigenvalues:      Vec<f64>,
    pub independent_sets: Vec<BTreeSet<String>>,
    /// Count of all eigenvalues above `rank_threshold`.
    pub rank:             usize,
    pub constraints:      Vec<Constraint>,
}

impl IndependenceReport {
    /// Sets sharing at least one tag with `tags`.
    pub fn sets_touching(&self, tags: &BTreeSet<String>) -> Vec<BTreeSet<String>> {
        self.independent_sets.iter()
            .filter(|s| !s.is_disjoint(tags))
            .cloned()
            .collect()
    }
}

pub fn discover_independent_sets(
    scenarios: &[Scenario],
    cfg:       &IndependenceConfig,
) -> Result<IndependenceReport> {
    if scenarios.is_empty() {
        return Err(ScorerError::NumericalDegeneracy("no scenarios to analyze".into()));
    }
    let tags: Vec<String> = scenarios.iter()
        .flat_map(|s| s.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if tags.is_empty() {
        return Err(ScorerError::NumericalDegeneracy("scenarios carry no tags".into()));
    }

    let n = tags.len();
    let mut m = DMatrix::<f64>::zeros(n, n);
    for s in scenarios {
        let present: Vec<usize> = tags.iter()
            .enumerate()
            .filter(|(_, t)| s.has_tag(t))
            .map(|(i, _)| i)
            .collect();
        for &i in &present {
            for &j in &present {
                m[(i, j)] += 1.0;
            }
        }
    }
    m /= scenarios.len() as f64;

    if m.iter().all(|&v| v == 0.0) {
        return Err(ScorerError::NumericalDegeneracy("co-occurrence matrix is all zero".into()));
    }

    let eig = m.symmetric_eigen();
    if eig.eigenvalues.iter().any(|v| !v.is_finite()) {
        return Err(ScorerError::NumericalDegeneracy("non-finite eigenvalue".into()));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));

    let rank = eig.eigenvalues.iter().filter(|&&v| v > cfg.rank_threshold).count();
    let top: Vec<usize> = order.iter().copied().take(cfg.top_k.min(n)).collect();

    let mut independent_sets: Vec<BTreeSet<String>> = Vec::new();
    for &col in &top {
        let v = eig.eigenvectors.column(col);
        let set: BTreeSet<String> = v.iter()
            .enumerate()
            .filter(|(_, c)| c.abs() > cfg.component_threshold)
            .map(|(i, _)| tags[i].clone())
            .collect();
        if set.len() >= cfg.min_set_size && !independent_sets.contains(&set) {
            independent_sets.push(set);
        }
    }

    let constraints = independent_sets.iter()
        .enumerate()
        .map(|(i, s)| Constraint {
            id:               format!("constraint_{i}"),
            tags:             s.clone(),
            max_simultaneous: s.len().saturating_sub(1),
        })
        .collect();

    debug!(
        "independence: {} tags, rank {}, {} sets from top {}",
        n, rank, independent_sets.len(), top.len()
    );

    Ok(IndependenceReport {
        eigenvalues: top.iter().map(|&c| eig.eigenvalues[c]).collect(),
        tags,
        independent_sets,
        rank,
        constraints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(name: &str, tags: &[&str]) -> Scenario {
        Scenario {
            name:  name.into(),
            steps: vec![],
            applicable_tiers: BTreeSet::new(),
            tags:  tags.iter().map(|t| t.to_string()).collect(),
            severity: 1,
            modernization_factors: vec![],
        }
    }

    fn set(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn two_blocks_give_two_sets() {
        let scenarios = vec![
            tagged("a", &["x", "y"]),
            tagged("b", &["x", "y"]),
            tagged("c", &["p", "q"]),
        ];
        let r = discover_independent_sets(&scenarios, &IndependenceConfig::default()).unwrap();

        assert_eq!(r.tags, vec!["p", "q", "x", "y"]);
        assert_eq!(r.eigenvalues.len(), 4);
        assert!((r.eigenvalues[0] - 4.0 / 3.0).abs() < 1e-9);
        assert!((r.eigenvalues[1] - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(r.rank, 2);

        assert_eq!(r.independent_sets[0], set(&["x", "y"]));
        assert!(r.independent_sets.contains(&set(&["p", "q"])));
        for s in &r.independent_sets {
            assert!(s.is_subset(&set(&["x", "y"])) || s.is_subset(&set(&["p", "q"])));
        }
        assert_eq!(r.constraints.len(), r.independent_sets.len());
        assert_eq!(r.constraints[0].max_simultaneous, 1);
    }

    #[test]
    fn sets_touching_filters_by_overlap() {
        let scenarios = vec![tagged("a", &["x", "y"]), tagged("b", &["p", "q"]), tagged("c", &["x", "y"])];
        let r = discover_independent_sets(&scenarios, &IndependenceConfig::default()).unwrap();
        let touching = r.sets_touching(&set(&["y", "z"]));
        assert!(!touching.is_empty());
        assert!(touching.iter().all(|s| s.contains("y")));
        assert!(r.sets_touching(&set(&["z"])).is_empty());
    }

    #[test]
    fn degenerate_inputs_are_reported() {
        let cfg = IndependenceConfig::default();
        assert!(matches!(discover_independent_sets(&[], &cfg), Err(ScorerError::NumericalDegeneracy(_))));
        let bare = vec![tagged("a", &[]), tagged("b", &[])];
        assert!(matches!(discover_independent_sets(&bare, &cfg), Err(ScorerError::NumericalDegeneracy(_))));
    }

    #[test]
    fn single_tag_yields_no_sets() {
        let r = discover_independent_sets(&[tagged("a", &["solo"])], &IndependenceConfig::default()).unwrap();
        assert_eq!(r.eigenvalues.len(), 1);
        assert!((r.eigenvalues[0] - 1.0).abs() < 1e-12);
        assert_eq!(r.rank, 1);
        assert!(r.independent_sets.is_empty());
    }

    #[test]
    fn builtin_catalog_is_analyzable() {
        let c = crate::catalog::Catalog::builtin();
        let r = discover_independent_sets(c.list_scenarios(), &IndependenceConfig::default()).unwrap();
        assert_eq!(r.tags.len(), 32);
        assert!(r.eigenvalues.len() <= 5);
        assert!(r.eigenvalues.windows(2).all(|w| w[0] >= w[1]));
        assert!(r.rank >= 1);
    }
}
