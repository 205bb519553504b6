//! Bull/bear market state CLI
//!
//! Usage:
//! # Evaluate one input document
//! bullbear-state evaluate --input data/today.json
//!
//! # Evaluate and persist the state snapshot
//! bullbear-state evaluate --input data/today.json --output state/current.json
//!
//! # Replay a day-by-day JSONL file through one engine
//! bullbear-state --config config/engine.json replay --input data/2025.jsonl

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use bullbear_state::{load_config, Engine, EngineConfig, EngineError, EvaluationInput, StateResult};

#[derive(Parser)]
#[command(name = "bullbear-state")]
#[command(about = "Four-quadrant bull/bear market state evaluator")]
#[command(version)]
struct Cli {
    /// Path to engine configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a single input document
    Evaluate {
        /// Path to evaluation input (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Write the state snapshot here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Feed successive inputs into one engine, one result per line
    Replay {
        /// Path to evaluation inputs, one JSON document per line
        #[arg(short, long)]
        input: PathBuf,
    },
}

/// Successful evaluation as written to stdout or the snapshot file.
#[derive(Serialize)]
struct Report<'a> {
    ok: bool,
    #[serde(flatten)]
    result: &'a StateResult,
}

/// Failed evaluation; no state is fabricated.
#[derive(Serialize)]
struct FailureReport {
    ok: bool,
    error: String,
}

impl FailureReport {
    fn new(err: &EngineError) -> Self {
        Self {
            ok: false,
            error: err.to_string(),
        }
    }
}

fn build_engine(config: Option<&Path>) -> Result<Engine> {
    let config = match config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    Engine::new(config).context("Failed to build engine")
}

fn read_input(path: &Path) -> Result<EvaluationInput> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid input: {}", path.display()))
}

/// Returns whether the evaluation succeeded.
fn cmd_evaluate(engine: &Engine, input: PathBuf, output: Option<PathBuf>) -> Result<bool> {
    let input = read_input(&input)?;

    let (json, ok) = match engine.evaluate(&input) {
        Ok(result) => {
            info!(summary = %result.summary(), "evaluation complete");
            let report = Report {
                ok: true,
                result: &result,
            };
            (serde_json::to_string_pretty(&report)?, true)
        }
        Err(err) => {
            warn!(error = %err, "evaluation failed");
            (serde_json::to_string_pretty(&FailureReport::new(&err))?, false)
        }
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, json)
                .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;
            info!(path = %path.display(), "state snapshot written");
        }
        None => println!("{}", json),
    }

    Ok(ok)
}

/// Returns whether every line evaluated successfully.
fn cmd_replay(engine: &Engine, input: PathBuf) -> Result<bool> {
    let file = fs::File::open(&input)
        .with_context(|| format!("Failed to open replay file: {}", input.display()))?;

    let mut evaluated = 0usize;
    let mut failed = 0usize;

    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: EvaluationInput = serde_json::from_str(&line)
            .with_context(|| format!("Invalid input on line {}", idx + 1))?;

        let json = match engine.evaluate(&doc) {
            Ok(result) => serde_json::to_string(&Report {
                ok: true,
                result: &result,
            })?,
            Err(err) => {
                warn!(line = idx + 1, error = %err, "evaluation failed");
                failed += 1;
                serde_json::to_string(&FailureReport::new(&err))?
            }
        };
        evaluated += 1;
        println!("{}", json);
    }

    info!(evaluated, failed, "replay complete");
    Ok(failed == 0)
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only JSON
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bullbear_state=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let engine = build_engine(cli.config.as_deref())?;

    let ok = match cli.command {
        Commands::Evaluate { input, output } => cmd_evaluate(&engine, input, output)?,
        Commands::Replay { input } => cmd_replay(&engine, input)?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
