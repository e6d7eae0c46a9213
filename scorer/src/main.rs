// scorer/src/main.rs
//
// scenario-scorer: score every (scenario, tier) pair and emit a JSON summary.
//
// Usage:
//   scenario-scorer                                   # builtin catalog, JSON to stdout
//   scenario-scorer --iterations 100000 --seed 7 --output out/summary.json
//   scenario-scorer --catalog my_scenarios.json --config engine.json
//   scenario-scorer --scenario "Chimera APT" --sequential
//   scenario-scorer --list

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use scenario_scorer::external::{call_with_retry, FileSink};
use scenario_scorer::report::output;
use scenario_scorer::{BatchRunner, Catalog, EngineConfig};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name    = "scenario-scorer",
    about   = "Monte Carlo scoring of multi-step scenarios across capability tiers",
    version = env!("CARGO_PKG_VERSION"),
)]
struct Cli {
    #[arg(long, help = "Engine config JSON (all fields optional)")]
    config: Option<PathBuf>,

    #[arg(long, help = "Scenario catalog JSON array; builtin table when omitted")]
    catalog: Option<PathBuf>,

    #[arg(long, allow_negative_numbers = true, help = "Trials per (scenario, tier) pair")]
    iterations: Option<i64>,

    #[arg(long, help = "Global seed; random when omitted (echoed in the summary)")]
    seed: Option<u64>,

    #[arg(long, help = "rayon worker threads (default: one per core)")]
    threads: Option<usize>,

    #[arg(long, help = "Run trial chunks on the calling thread only")]
    sequential: bool,

    #[arg(long = "scenario", help = "Only score this scenario (repeatable)")]
    scenarios: Vec<String>,

    #[arg(long, help = "Write the JSON summary here and print a markdown table")]
    output: Option<PathBuf>,

    #[arg(long, help = "List catalog scenarios and exit")]
    list: bool,
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env()
            .add_directive("scenario_scorer=info".parse()?))
        .with_writer(std::io::stderr)
        .compact().init();

    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(n) = cli.iterations { cfg.simulator.iterations = n; }
    if let Some(s) = cli.seed       { cfg.simulator.seed = Some(s); }
    if let Some(t) = cli.threads    { cfg.threads = Some(t); }
    if cli.sequential               { cfg.simulator.parallel = false; }
    cfg.validate()?;

    let mut catalog = match &cli.catalog {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => Catalog::builtin(),
    };
    if !cli.scenarios.is_empty() {
        catalog = catalog.select(&cli.scenarios)?;
    }

    if cli.list {
        for s in catalog.list_scenarios() {
            let tiers: Vec<&str> = s.applicable_tiers.iter().map(String::as_str).collect();
            println!("{:<45} steps={} severity={} tiers={}", s.name, s.steps.len(), s.severity, tiers.join(","));
        }
        return Ok(());
    }

    if let Some(n) = cfg.threads {
        rayon::ThreadPoolBuilder::new().num_threads(n).build_global()?;
    }

    let seed = cfg.simulator.seed.unwrap_or_else(rand::random);
    info!(
        "scenario-scorer {} | {} scenarios | {} iterations/pair | seed {} | {}",
        env!("CARGO_PKG_VERSION"),
        catalog.len(),
        cfg.simulator.iterations,
        seed,
        if cfg.simulator.parallel { "parallel" } else { "sequential" },
    );

    // Ctrl-C stops the batch at the next pair boundary.
    let cancel = Arc::new(AtomicBool::new(false));
    let flag   = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing current pair");
            flag.store(true, Ordering::Relaxed);
        }
    });

    let runner  = BatchRunner::new(&cfg)?.with_cancel(cancel);
    let summary = tokio::task::spawn_blocking(move || runner.run(&catalog, seed)).await?;
    let json    = output::to_json(&summary)?;

    match &cli.output {
        Some(path) => {
            let sink  = FileSink::new(path);
            let bytes = call_with_retry(&sink, &json, &cfg.retry).await?;
            info!("Summary written to {} ({} bytes)", sink.path().display(), bytes);
            output::print_markdown(&summary);
        }
        None => println!("{json}"),
    }

    if summary.n_skipped() > 0 {
        warn!("{} pairs skipped", summary.n_skipped());
    }
    Ok(())
}
