//! Headless Batch Simulator
//!
//! Runs conflicts back to back without wall-clock delays and prints a JSON
//! report. Optionally bets on the militarily stronger side of every matchup
//! to measure how predictable the model is.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use conflict_oracle::conflict::ConflictSummary;
use conflict_oracle::core::error::Result;
use conflict_oracle::country::{default_roster, load_roster};
use conflict_oracle::engine::{RotatingMatchup, SimulationEngine};
use conflict_oracle::prediction::PredictionStatistics;
use conflict_oracle::EngineConfig;

/// Headless Batch Simulator - deterministic conflict runs
#[derive(Parser, Debug)]
#[command(name = "batch_sim")]
#[command(about = "Run many conflicts headless and output a JSON report")]
struct Args {
    /// Number of conflicts to run
    #[arg(long, default_value_t = 20)]
    conflicts: u32,

    /// Ticks before a conflict is abandoned as a stalemate
    #[arg(long, default_value_t = 2000)]
    max_ticks: u64,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Chance per tick of a random event
    #[arg(long, default_value_t = 0.3)]
    event_probability: f64,

    /// Country roster TOML (built-in roster when omitted)
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Cycle through every pairing instead of drawing at random
    #[arg(long)]
    rotate: bool,

    /// Predict the stronger military each conflict
    #[arg(long)]
    predict_favorite: bool,

    /// Emit compact instead of pretty JSON
    #[arg(long)]
    compact: bool,
}

#[derive(Serialize)]
struct BatchReport {
    seed: u64,
    conflicts_run: u32,
    stalemates: u32,
    average_duration: f64,
    victory_conditions: BTreeMap<String, u32>,
    predictions: PredictionStatistics,
    conflicts: Vec<ConflictSummary>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    let countries = match &args.roster {
        Some(path) => load_roster(path)?,
        None => default_roster(),
    };
    let config = EngineConfig {
        seed: Some(seed),
        event_probability: args.event_probability,
        auto_advance: false,
        max_conflict_history: args.conflicts as usize,
        ..EngineConfig::default()
    };

    let mut sim = SimulationEngine::new(countries, config)?;
    if args.rotate {
        sim = sim.with_matchup(Box::new(RotatingMatchup::new()));
    }

    let mut stalemates = 0;
    sim.start()?;
    for round in 0..args.conflicts {
        if round > 0 {
            sim.next_conflict()?;
        }

        if args.predict_favorite {
            if let Some(conflict) = sim.current_conflict() {
                let favorite = if conflict.countries[1].military_strength() > conflict.countries[0].military_strength() {
                    1
                } else {
                    0
                };
                if let Err(e) = sim.submit_prediction(favorite, 5) {
                    tracing::warn!("Prediction skipped: {}", e);
                }
            }
        }

        let mut ticks = 0;
        while ticks < args.max_ticks && sim.current_conflict().is_some_and(|c| c.is_ongoing()) {
            sim.process_update();
            ticks += 1;
        }
        if sim.current_conflict().is_some_and(|c| c.is_ongoing()) {
            tracing::warn!("Round {} reached {} ticks without a winner", round + 1, args.max_ticks);
            stalemates += 1;
        }
    }
    sim.stop();

    let conflicts: Vec<ConflictSummary> = sim.completed_conflicts().cloned().collect();
    let mut victory_conditions = BTreeMap::new();
    for summary in &conflicts {
        if let Some(condition) = summary.condition {
            *victory_conditions.entry(condition.to_string()).or_insert(0) += 1;
        }
    }
    let average_duration = if conflicts.is_empty() {
        0.0
    } else {
        conflicts.iter().map(|c| c.duration as f64).sum::<f64>() / conflicts.len() as f64
    };

    let report = BatchReport {
        seed,
        conflicts_run: args.conflicts,
        stalemates,
        average_duration,
        victory_conditions,
        predictions: sim.prediction_system().get_statistics(),
        conflicts,
    };

    let json = if args.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{json}");
    Ok(())
}
