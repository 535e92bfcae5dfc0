//! Replay a trace on a virtual clock

use crate::trace::{self, Trace};
use anyhow::{Context, Result};
use clickgate_core::ActivationKind;
use owo_colors::OwoColorize;
use std::path::Path;
use tracing::info;

pub fn run(trace_path: &Path, ambient_path: Option<&Path>, json: bool) -> Result<()> {
    // 1. Load the trace, letting --ambient replace its [ambient] layer
    let mut trace = Trace::load(trace_path)?;
    if let Some(path) = ambient_path {
        trace.ambient = super::load_layer(path)?;
    }
    info!("Replaying {} events from {}", trace.events.len(), trace_path.display());

    // 2. Run it
    let replay = trace::replay(&trace);

    // 3. Display output
    if json {
        for fire in &replay.fires {
            let line = serde_json::to_string(fire).context("Failed to encode fire")?;
            println!("{}", line);
        }
        return Ok(());
    }

    let config = &replay.resolution.config;
    println!("{}", "Replay".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Policy:        {}", config.rate_policy().to_string().cyan());
    if trace.double_listener {
        println!(
            "Double delay:  {}",
            format!("{}ms", config.effective_dbl_delay().as_millis()).cyan()
        );
    } else {
        println!("Double delay:  {}", "(no double listener)".dimmed());
    }
    for anomaly in &replay.resolution.anomalies {
        println!("{} {}", "warning:".yellow(), anomaly);
    }
    println!();

    if replay.fires.is_empty() {
        println!("{}", "No activations fired".dimmed());
    }
    for fire in &replay.fires {
        let kind = match fire.kind {
            ActivationKind::Single => "single".green().to_string(),
            ActivationKind::Double => "double".magenta().to_string(),
        };
        println!("{:>8}  {}  {}", format!("{}ms", fire.at), kind, fire.label);
    }

    let stats = replay.stats;
    println!();
    println!(
        "{}",
        format!(
            "{} raw singles, {} raw doubles, {} suppressed, {} superseded, {} dropped",
            stats.raw_singles, stats.raw_doubles, stats.suppressed, stats.superseded, stats.dropped
        )
        .dimmed()
    );

    Ok(())
}
