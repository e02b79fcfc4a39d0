//! Inspect an experiment run
//!
//! Opens a run by id or path, prints where it was found, its artifacts and
//! record fields, and optionally one scalar series from its event log.
//!
//! Run with: cargo run --example inspect_run -- <run id | path> [tag]
//!
//! Numeric ids are looked up in `$EXPERIMENT_STORAGE_FOLDER`. Set `RUST_LOG=debug`
//! to see resolution and extraction steps.

use std::str::FromStr;

use anyhow::{bail, Context};
use labbook::resolver::Identifier;
use labbook::{ExperimentRecord, Resolver, StoreConfig};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let Some(raw) = args.next() else {
        bail!("usage: inspect_run <run id | path> [tag]");
    };
    let identifier = Identifier::from_str(&raw)?;
    let tag = args.next();

    let mut config = StoreConfig::from_env();
    if config.database.is_some() {
        // no driver is bundled; only the folder and path branches are usable here
        eprintln!("ignoring database settings, no connector is configured");
        config.database = None;
    }
    let resolver = Resolver::new(config);

    let run = ExperimentRecord::open(&resolver, identifier.clone())
        .with_context(|| format!("opening {identifier}"))?;

    println!("=== {identifier} ===\n");
    println!("Backend: {:?}", run.backend_kind());

    println!("\nArtifacts ({}):", run.artifacts().len());
    for name in run.artifacts() {
        println!("   {name}");
    }

    let record = run.get_record();
    println!("\nRecord fields ({}):", record.len());
    for (key, value) in &record {
        let rendered = serde_json::to_string(&labbook::codec::encode(value))?;
        let preview: String = rendered.chars().take(72).collect();
        println!("   {key:<16} {preview}");
    }

    if let Some(tag) = tag {
        let series = run
            .get_summary(&tag)
            .with_context(|| format!("reading summary {tag:?}"))?;
        println!("\nSummary {tag:?} ({} points):", series.len());
        for point in &series {
            println!("   step {:>8}  {}", point.step, point.value);
        }
    }

    Ok(())
}
