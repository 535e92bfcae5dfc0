//! Clickgate CLI - clickgate command

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use clickgate_core::ConfigLayer;
use std::path::PathBuf;
use tracing::Level;

mod cmd;
mod trace;

/// Clickgate - debounce, throttle and double-click disambiguation
#[derive(Parser)]
#[command(name = "clickgate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a TOML event trace on a virtual clock
    Replay {
        /// Trace file
        trace: PathBuf,
        /// Ambient layer file (replaces the trace's [ambient] table)
        #[arg(long)]
        ambient: Option<PathBuf>,
        /// Print one JSON object per fire
        #[arg(long)]
        json: bool,
    },
    /// Resolve override flags against an ambient layer
    Resolve {
        /// Ambient layer file
        #[arg(long)]
        ambient: Option<PathBuf>,
        /// Rate limiting model (debounce or throttle)
        #[arg(long)]
        model: Option<String>,
        /// Debounce quiet period / throttle window in ms
        #[arg(long, allow_negative_numbers = true)]
        delay: Option<i64>,
        /// Debounce max-wait bound in ms
        #[arg(long, allow_negative_numbers = true)]
        max_wait: Option<i64>,
        /// Single/double settle period in ms
        #[arg(long, allow_negative_numbers = true)]
        dbl_delay: Option<i64>,
    },
    /// Print an example trace
    Example,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing on stderr so stdout stays machine readable
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay { trace, ambient, json } => {
            cmd::replay::run(&trace, ambient.as_deref(), json)
        }
        Commands::Resolve { ambient, model, delay, max_wait, dbl_delay } => {
            let overrides = ConfigLayer {
                model,
                delay,
                max_wait,
                dbl_delay,
            };
            cmd::resolve::run(overrides, ambient.as_deref())
        }
        Commands::Example => cmd::example::run(),
    }
}
