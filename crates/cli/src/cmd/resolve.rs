//! Show how a set of layers resolves

use anyhow::Result;
use clickgate_core::{config, ConfigLayer};
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run(overrides: ConfigLayer, ambient_path: Option<&Path>) -> Result<()> {
    // 1. Load ambient defaults (empty when not given)
    let ambient = match ambient_path {
        Some(path) => super::load_layer(path)?,
        None => ConfigLayer::new(),
    };

    // 2. Resolve
    let resolution = config::resolve(&overrides, &ambient);
    let config = &resolution.config;

    // 3. Display output
    println!("{}", "Resolved Configuration".bold());
    if let Some(path) = ambient_path {
        println!("{}: {}", "Ambient".dimmed(), path.display().dimmed());
    }
    println!();

    let model = match config.model {
        Some(model) => model.to_string(),
        None => "none".to_string(),
    };
    println!("  {} = {}", "model".cyan(), model);
    println!("  {} = {}ms", "delay".cyan(), config.delay.as_millis());
    match config.max_wait {
        Some(max_wait) => println!("  {} = {}ms", "max_wait".cyan(), max_wait.as_millis()),
        None => println!("  {} = {}", "max_wait".cyan(), "(unbounded)".dimmed()),
    }
    println!(
        "  {} = {}ms {}",
        "dbl_delay".cyan(),
        config.dbl_delay.as_millis(),
        format!("(effective {}ms)", config.effective_dbl_delay().as_millis()).dimmed()
    );
    println!("\n{}: {}", "Policy".bold(), config.rate_policy());

    if resolution.is_clean() {
        println!("\n{}", "No anomalies".green());
    } else {
        println!("\n{}", "Anomalies:".yellow().bold());
        for anomaly in &resolution.anomalies {
            println!("  - {}", anomaly);
        }
    }

    Ok(())
}
