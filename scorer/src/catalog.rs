// scorer/src/catalog.rs
//
// Scenario catalog.
//
// The builtin table holds eleven multi-step scenarios: six classic DHS
// planning scenarios updated for current tradecraft, two newer
// maritime / air-cargo scenarios and three validation scenarios (Blue Dusk
// Black Sky, Cartel University, Chimera APT).  Each step carries the base
// probability and entropy cost used by the trial simulator.
//
// A catalog can also be loaded from a JSON array with the same shape as
// `Scenario`.  Either way it is validated once and never mutated, so it can
// be shared by reference across worker threads without synchronization.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use tracing::info;

use crate::error::{Result, ScorerError};
use crate::model::{Scenario, Step};

pub const SCRIPT_KIDDIE: &str = "script_kiddie";
pub const INTERMEDIATE:  &str = "intermediate";
pub const ADVANCED:      &str = "advanced";
pub const NATION_STATE:  &str = "nation_state";

/// The 32 primitive tags, grouped by family.
pub const PRIMITIVES: [&str; 32] = [
    // CRUD
    "create", "read", "update", "delete",
    // communication + data processing
    "send", "receive", "transform", "validate",
    // control flow
    "branch", "loop", "return", "call",
    // network
    "connect", "disconnect", "route", "filter",
    // security
    "authenticate", "authorize", "encrypt", "decrypt",
    // resources
    "allocate", "deallocate", "lock", "unlock",
    // state
    "save", "restore", "checkpoint", "rollback",
    // coordination
    "coordinate", "synchronize", "signal", "wait",
];

#[derive(Debug, Clone)]
pub struct Catalog {
    scenarios: Vec<Scenario>,
}

impl Catalog {
    pub fn builtin() -> Self {
        let scenarios = vec![
            nuclear_detonation(),
            biological_attack(),
            chemical_attack(),
            radiological_dispersal(),
            cyber_infrastructure(),
            explosives_attack(),
            maritime_attack(),
            air_cargo_attack(),
            blue_dusk_black_sky(),
            cartel_university(),
            chimera_apt(),
        ];
        Self { scenarios }
    }

    pub fn from_scenarios(scenarios: Vec<Scenario>) -> Result<Self> {
        let mut seen = HashSet::new();
        for s in &scenarios {
            validate_scenario(s)?;
            if !seen.insert(s.name.as_str()) {
                return Err(ScorerError::InvalidParameter(format!("duplicate scenario {}", s.name)));
            }
        }
        Ok(Self { scenarios })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let scenarios: Vec<Scenario> = serde_json::from_str(json)?;
        Self::from_scenarios(scenarios)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&content)?;
        info!("Loaded {} scenarios from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn list_scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn get_scenario(&self, name: &str) -> Result<&Scenario> {
        self.scenarios.iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ScorerError::NotFound(name.to_string()))
    }

    /// Narrow the catalog to the named scenarios, in the order given.
    pub fn select(&self, names: &[String]) -> Result<Self> {
        let scenarios = names.iter()
            .map(|n| self.get_scenario(n).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { scenarios })
    }

    pub fn len(&self) -> usize { self.scenarios.len() }
    pub fn is_empty(&self) -> bool { self.scenarios.is_empty() }
}

fn validate_scenario(s: &Scenario) -> Result<()> {
    if s.name.trim().is_empty() {
        return Err(ScorerError::InvalidParameter("scenario with empty name".into()));
    }
    for step in &s.steps {
        if !(0.0..=1.0).contains(&step.base_probability) {
            return Err(ScorerError::InvalidParameter(format!(
                "{} / {}: base_probability {} outside [0, 1]",
                s.name, step.label, step.base_probability
            )));
        }
        if !(0.0..=1.0).contains(&step.entropy_score) {
            return Err(ScorerError::InvalidParameter(format!(
                "{} / {}: entropy_score {} outside [0, 1]",
                s.name, step.label, step.entropy_score
            )));
        }
    }
    Ok(())
}

// ── Builtin table ─────────────────────────────────────────────────────────────

fn build(
    name:     &str,
    steps:    &[(&str, f64, f64)],
    tags:     &[&str],
    tiers:    &[&str],
    severity: u8,
    factors:  &[&str],
) -> Scenario {
    Scenario {
        name:  name.into(),
        steps: steps.iter().map(|&(l, p, e)| Step::new(l, p, e)).collect(),
        applicable_tiers: tiers.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
        tags:  tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
        severity,
        modernization_factors: factors.iter().map(|f| f.to_string()).collect(),
    }
}

fn nuclear_detonation() -> Scenario {
    build(
        "Nuclear Detonation – 10-kiloton",
        &[
            ("D-730: UA plans via dark web",        0.90, 0.20),
            ("D-540: AI optimizes target (LA)",     0.95, 0.15),
            ("D-365: Deepfake campaign disrupts",   0.90, 0.25),
            ("D-180: UAVs smuggle HEU via ports",   0.85, 0.30),
            ("D-60: Botnet tests coordination",     0.90, 0.20),
            ("D-0: IND detonates in downtown",      0.95, 0.15),
        ],
        &["coordinate", "encrypt", "authenticate", "connect", "transform", "create"],
        &[NATION_STATE],
        10,
        &["AI targeting optimization", "Deepfake disruption", "UAV smuggling", "Botnet coordination"],
    )
}

fn biological_attack() -> Scenario {
    build(
        "Biological Attack – Aerosol Anthrax",
        &[
            ("D-730: SFB plans via dark web",              0.90, 0.20),
            ("D-540: AI optimizes pathogen weaponization", 0.88, 0.25),
            ("D-365: Deepfake scientists recruit",         0.85, 0.30),
            ("D-180: UAV aerosol delivery systems",        0.80, 0.35),
            ("D-60: Botnet disrupts health surveillance",  0.90, 0.25),
            ("D-0: Anthrax aerosol release in metro",      0.85, 0.40),
        ],
        &["create", "transform", "coordinate", "send", "encrypt", "validate"],
        &[ADVANCED, NATION_STATE],
        9,
        &["AI pathogen optimization", "Deepfake recruitment", "UAV aerosol delivery",
          "Health surveillance disruption"],
    )
}

fn chemical_attack() -> Scenario {
    build(
        "Chemical Attack",
        &[
            ("D-730: SFB plans via dark web",   0.90, 0.20),
            ("D-540: Sarin production begins",  0.85, 0.25),
            ("D-365: SCADA systems hacked",     0.95, 0.20),
            ("D-180: AI optimizes dispersal",   0.90, 0.25),
            ("D-60: UAVs equipped with sarin",  0.80, 0.35),
            ("D-0: Sarin released in Miami",    0.85, 0.40),
        ],
        &["create", "transform", "coordinate", "send", "encrypt", "connect"],
        &[INTERMEDIATE, ADVANCED, NATION_STATE],
        9,
        &["SCADA system hacking", "AI dispersal optimization", "UAV delivery", "Chemical weaponization"],
    )
}

fn radiological_dispersal() -> Scenario {
    build(
        "Radiological Dispersal Device",
        &[
            ("D-730: UA plans via dark web",                0.90, 0.20),
            ("D-540: AI identifies radiological sources",   0.88, 0.22),
            ("D-365: Deepfake disrupts nuclear security",   0.85, 0.28),
            ("D-180: UAV delivery mechanism tested",        0.82, 0.32),
            ("D-60: Botnet coordinates timing",             0.88, 0.25),
            ("D-0: Dirty bomb detonated in urban area",     0.85, 0.35),
        ],
        &["create", "coordinate", "encrypt", "transform", "signal", "authenticate"],
        &[INTERMEDIATE, ADVANCED, NATION_STATE],
        7,
        &["AI source identification", "Deepfake security disruption", "UAV delivery", "Botnet coordination"],
    )
}

fn cyber_infrastructure() -> Scenario {
    build(
        "Cyber Attack on Critical Infrastructure",
        &[
            ("D-730: UA plans via dark web",                  0.90, 0.20),
            ("D-540: AI identifies critical vulnerabilities", 0.95, 0.18),
            ("D-365: Deepfake social engineering campaign",   0.92, 0.22),
            ("D-180: UAV-assisted physical access",           0.78, 0.35),
            ("D-60: Botnet activates for coordination",       0.95, 0.15),
            ("D-0: Multi-sector infrastructure collapse",     0.88, 0.40),
        ],
        &["connect", "authenticate", "transform", "coordinate", "decrypt", "allocate"],
        &[SCRIPT_KIDDIE, INTERMEDIATE, ADVANCED, NATION_STATE],
        8,
        &["AI vulnerability identification", "Deepfake social engineering", "UAV physical access",
          "Multi-sector coordination"],
    )
}

fn explosives_attack() -> Scenario {
    build(
        "Explosives Attack – IEDs",
        &[
            ("D-730: UA plans via dark web",       0.90, 0.20),
            ("D-365: Botnet controls IED swarms",  0.85, 0.30),
            ("D-180: AI optimizes blast zones",    0.90, 0.25),
            ("D-90: Drone VBIEDs prepared",        0.80, 0.35),
            ("D-30: Cyber triggers tested",        0.85, 0.30),
            ("D-0: Multi-vector detonation",       0.85, 0.40),
        ],
        &["create", "coordinate", "signal", "authenticate", "send", "synchronize"],
        &[SCRIPT_KIDDIE, INTERMEDIATE, ADVANCED, NATION_STATE],
        6,
        &["Botnet IED control", "AI blast optimization", "Drone VBIEDs", "Cyber triggers"],
    )
}

fn maritime_attack() -> Scenario {
    build(
        "Maritime Attack – Port and Vessel Assault",
        &[
            ("D-730: UA plans via dark web",     0.90, 0.20),
            ("D-540: Cartel secures small boats", 0.85, 0.25),
            ("D-365: Hack maritime AIS/GPS",     0.95, 0.20),
            ("D-180: Drones armed with IEDs",    0.80, 0.30),
            ("D-60: Test vessel grounding",      0.85, 0.25),
            ("D-0: Assault on Houston port",     0.85, 0.35),
        ],
        &["connect", "authenticate", "coordinate", "decrypt", "signal", "route"],
        &[INTERMEDIATE, ADVANCED, NATION_STATE],
        7,
        &["AIS/GPS hacking", "Drone IED delivery", "Cartel logistics", "Port cyber vulnerabilities"],
    )
}

fn air_cargo_attack() -> Scenario {
    build(
        "Air Cargo Attack – Explosive Contamination",
        &[
            ("D-730: UA plans via dark web",        0.90, 0.20),
            ("D-540: Radiological material prep",   0.85, 0.25),
            ("D-365: AI spoofs cargo tracking",     0.95, 0.20),
            ("D-180: Cyber devices integrated",     0.90, 0.25),
            ("D-60: Cargo loaded at JFK",           0.80, 0.30),
            ("D-0: Mid-flight explosions",          0.85, 0.35),
        ],
        &["create", "transform", "encrypt", "coordinate", "signal", "authenticate"],
        &[ADVANCED, NATION_STATE],
        8,
        &["AI cargo tracking spoofing", "Cyber-linked devices", "Radiological contamination",
          "IoT attack vectors"],
    )
}

fn blue_dusk_black_sky() -> Scenario {
    build(
        "Blue Dusk Black Sky",
        &[
            ("D-730: UA plans via dark web",                  0.90, 0.20),
            ("D-540: AI models EMP cascade effects",          0.92, 0.18),
            ("D-365: Deepfake disrupts power grid security",  0.88, 0.25),
            ("D-180: UAV-deployed EMP devices positioned",    0.85, 0.30),
            ("D-60: Botnet coordinates synchronized EMP",     0.95, 0.15),
            ("D-0: Electromagnetic pulse cascade",            0.90, 0.35),
        ],
        &["coordinate", "synchronize", "signal", "transform", "allocate", "encrypt"],
        &[NATION_STATE],
        9,
        &["AI cascade modeling", "Deepfake grid disruption", "UAV EMP deployment",
          "Synchronized coordination"],
    )
}

fn cartel_university() -> Scenario {
    build(
        "Cartel University",
        &[
            ("D-730: Cartel plans via dark web",          0.90, 0.20),
            ("D-540: AI optimizes smuggling routes",      0.88, 0.22),
            ("D-365: Deepfake corrupts border security",  0.85, 0.28),
            ("D-180: UAV swarms deliver contraband",      0.82, 0.32),
            ("D-60: Botnet launders crypto payments",     0.90, 0.25),
            ("D-0: Multi-vector criminal operations",     0.85, 0.35),
        ],
        &["coordinate", "encrypt", "authenticate", "send", "receive", "transform"],
        &[INTERMEDIATE, ADVANCED, NATION_STATE],
        7,
        &["AI route optimization", "Deepfake border corruption", "UAV contraband delivery",
          "Crypto laundering"],
    )
}

fn chimera_apt() -> Scenario {
    build(
        "Chimera APT",
        &[
            ("D-730: Script kiddie begins reconnaissance",   0.95, 0.15),
            ("D-540: Intermediate tools acquired",           0.90, 0.20),
            ("D-365: Advanced persistent techniques learned", 0.85, 0.25),
            ("D-180: AI-enhanced attack capabilities",       0.80, 0.30),
            ("D-90: Deepfake social engineering mastered",   0.78, 0.32),
            ("D-30: UAV-cyber integration achieved",         0.75, 0.35),
            ("D-0: Full APT nation-state capabilities",      0.70, 0.40),
        ],
        &PRIMITIVES,
        &[SCRIPT_KIDDIE, INTERMEDIATE, ADVANCED, NATION_STATE],
        6,
        &["AI enhancement", "Deepfake mastery", "UAV-cyber integration",
          "Progressive capability acquisition"],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_tiers;

    #[test]
    fn builtin_is_valid_and_complete() {
        let c = Catalog::builtin();
        assert_eq!(c.len(), 11);
        assert!(Catalog::from_scenarios(c.list_scenarios().to_vec()).is_ok());

        let tier_names: Vec<String> = default_tiers().into_iter().map(|t| t.name).collect();
        for s in c.list_scenarios() {
            assert!(!s.steps.is_empty(), "{} has no steps", s.name);
            assert!(!s.applicable_tiers.is_empty());
            for t in &s.applicable_tiers {
                assert!(tier_names.contains(t), "{} lists unknown tier {}", s.name, t);
            }
            for tag in &s.tags {
                assert!(PRIMITIVES.contains(&tag.as_str()), "{} has stray tag {}", s.name, tag);
            }
        }
    }

    #[test]
    fn chimera_spans_everything() {
        let c = Catalog::builtin();
        let s = c.get_scenario("Chimera APT").unwrap();
        assert_eq!(s.steps.len(), 7);
        assert_eq!(s.tags.len(), 32);
        assert_eq!(s.applicable_tiers.len(), 4);
    }

    #[test]
    fn missing_scenario_is_not_found() {
        let c = Catalog::builtin();
        assert!(matches!(c.get_scenario("Alien Invasion"), Err(ScorerError::NotFound(_))));
        assert!(matches!(
            c.select(&["Chemical Attack".into(), "nope".into()]),
            Err(ScorerError::NotFound(n)) if n == "nope"
        ));
    }

    #[test]
    fn select_keeps_requested_order() {
        let c = Catalog::builtin();
        let s = c.select(&["Chimera APT".into(), "Chemical Attack".into()]).unwrap();
        let names: Vec<&str> = s.list_scenarios().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Chimera APT", "Chemical Attack"]);
    }

    #[test]
    fn json_catalog_is_validated() {
        let ok = r#"[{"name": "a", "steps": [], "applicable_tiers": ["advanced"], "tags": []}]"#;
        assert_eq!(Catalog::from_json(ok).unwrap().len(), 1);

        let bad_prob = r#"[{"name": "a",
            "steps": [{"label": "x", "base_probability": 1.5, "entropy_score": 0.1}],
            "applicable_tiers": [], "tags": []}]"#;
        assert!(matches!(Catalog::from_json(bad_prob), Err(ScorerError::InvalidParameter(_))));

        let dup = r#"[{"name": "a", "steps": [], "applicable_tiers": [], "tags": []},
                      {"name": "a", "steps": [], "applicable_tiers": [], "tags": []}]"#;
        assert!(matches!(Catalog::from_json(dup), Err(ScorerError::InvalidParameter(_))));

        let blank = r#"[{"name": " ", "steps": [], "applicable_tiers": [], "tags": []}]"#;
        assert!(matches!(Catalog::from_json(blank), Err(ScorerError::InvalidParameter(_))));
    }
}
