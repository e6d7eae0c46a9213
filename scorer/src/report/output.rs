// scorer/src/report/output.rs
//
// JSON and markdown renderings of a ValidationSummary.

use crate::error::Result;
use crate::model::Phase;

use super::ValidationSummary;

/// Pretty JSON for the report file.
pub fn to_json(summary: &ValidationSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

fn phase_string(path: &[Phase]) -> String {
    if path.is_empty() {
        return "-".to_string();
    }
    path.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(" > ")
}

pub fn render_markdown(summary: &ValidationSummary) -> String {
    let mut out = String::new();
    out.push_str("# Scenario Scoring Report\n\n");
    out.push_str(&format!(
        "**Status**: {}  **Pairs**: {}  **Skipped**: {}  **Iterations**: {}  **Seed**: {}\n\n",
        summary.status,
        summary.results.len(),
        summary.n_skipped(),
        summary.total_iterations,
        summary.seed,
    ));
    if summary.cancelled {
        out.push_str("_Run cancelled before every pair was scored._\n\n");
    }

    out.push_str("| Scenario | Tier | Success | Trials | Entropy | Phases | LV |\n");
    out.push_str("|----------|------|---------|--------|---------|--------|----|\n");
    for r in &summary.results {
        out.push_str(&format!(
            "| {} | {} | {:.4} | {} | {:.3} {} | {} | {} |\n",
            r.scenario_name,
            r.tier,
            r.success_rate,
            r.trial_count,
            r.entropy_summary.average_entropy,
            r.entropy_summary.complexity_level,
            phase_string(&r.phase_path),
            if r.las_vegas_verified { "yes" } else { "no" },
        ));
    }
    out.push('\n');

    if !summary.skipped.is_empty() {
        out.push_str("## Skipped\n\n");
        for s in &summary.skipped {
            out.push_str(&format!("- {} @ {}: {} ({})\n", s.scenario, s.tier, s.kind, s.message));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "**Mean success**: {:.4}  **Clustering**: {}  **Elapsed**: {}ms\n",
        summary.mean_success_rate(),
        if summary.clustering_detected {
            format!("DETECTED ({})", summary.clustering_detections)
        } else {
            "none".to_string()
        },
        summary.elapsed_ms,
    ));
    out.push_str(&format!(
        "**Validated**: {}/{} ({:.1}%)  **Verdict**: {}\n",
        summary.successful_validations,
        summary.total_validations,
        summary.validation_rate * 100.0,
        if summary.framework_proven { "PROVEN" } else { "NEEDS REFINEMENT" },
    ));
    out
}

/// Print the markdown report to stdout.
pub fn print_markdown(summary: &ValidationSummary) {
    print!("{}", render_markdown(summary));
}
