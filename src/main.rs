//! Conflict Oracle - live runner
//!
//! Runs the simulation in real time, printing each tick, and stops after a
//! number of finished conflicts or on Ctrl-C.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use clap::Parser;
use tokio::sync::Notify;

use conflict_oracle::core::error::Result;
use conflict_oracle::country::{default_roster, load_roster};
use conflict_oracle::engine::{EngineEvent, EventKind, SimulationEngine};
use conflict_oracle::prediction::FileStore;
use conflict_oracle::EngineConfig;

#[derive(Parser, Debug)]
#[command(name = "conflict-oracle")]
#[command(about = "Watch simulated wars unfold and predict who wins")]
struct Args {
    /// Country roster TOML (built-in roster when omitted)
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Engine config TOML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base tick interval in milliseconds, overrides the config file
    #[arg(long)]
    interval_ms: Option<f64>,

    /// Speed multiplier (0, 8]
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Random seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many conflicts have ended
    #[arg(long, default_value_t = 1)]
    conflicts: u32,

    /// Predict this side (0 or 1) in every conflict
    #[arg(long)]
    predict: Option<usize>,

    /// Confidence for --predict (1-10)
    #[arg(long, default_value_t = 5)]
    confidence: u32,

    /// Directory for the persistent prediction ledger
    #[arg(long)]
    store_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_toml_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(interval) = args.interval_ms {
        config.update_interval_ms = interval;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let countries = match &args.roster {
        Some(path) => load_roster(path)?,
        None => default_roster(),
    };
    tracing::info!("Loaded {} countries", countries.len());

    let mut sim = SimulationEngine::new(countries, config)?;
    if let Some(dir) = &args.store_dir {
        sim = sim.with_store(Box::new(FileStore::new(dir)));
    }
    sim.set_speed(args.speed)?;

    let finished = Arc::new(AtomicU32::new(0));
    let done = Arc::new(Notify::new());
    register_printers(&mut sim, args.conflicts, Arc::clone(&finished), Arc::clone(&done));

    if let Some(winner) = args.predict {
        let commands = sim.commands();
        let confidence = args.confidence;
        sim.on(EventKind::ConflictCreated, move |event| {
            if let EngineEvent::ConflictCreated { countries, .. } = event {
                if let Some(pick) = countries.get(winner) {
                    println!("Predicting {} (confidence {})", pick.name, confidence);
                }
                commands.submit_prediction(winner, confidence);
            }
        });
    }

    sim.start()?;

    let shutdown = async move {
        tokio::select! {
            _ = done.notified() => {}
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::warn!("Ctrl-C handler failed: {}", e);
                }
            }
        }
    };
    sim.run(shutdown).await;

    let stats = sim.prediction_statistics();
    println!();
    println!("=== SESSION ===");
    println!("Conflicts finished: {}", finished.load(Ordering::SeqCst));
    println!(
        "Predictions: {} total, {} resolved, accuracy {:.2}%, best streak {}",
        stats.total_predictions, stats.resolved_predictions, stats.accuracy, stats.best_streak
    );
    Ok(())
}

fn register_printers(sim: &mut SimulationEngine, target: u32, finished: Arc<AtomicU32>, done: Arc<Notify>) {
    sim.on(EventKind::ConflictCreated, |event| {
        if let EngineEvent::ConflictCreated { countries, .. } = event {
            println!("\n=== {} vs {} ===", countries[0].name, countries[1].name);
        }
    });

    sim.on(EventKind::Update, |event| {
        if let EngineEvent::Update { duration, stats, .. } = event {
            println!(
                "[{:>4}] territory {:>6.2} / {:<6.2} casualties {:>9}",
                duration, stats.territory_control[0], stats.territory_control[1], stats.casualties
            );
        }
    });

    sim.on(EventKind::RandomEvent, |event| {
        if let EngineEvent::RandomEvent { event, .. } = event {
            println!("       * {}: {}", event.name, event.description);
        }
    });

    sim.on(EventKind::ConflictEnded, move |event| {
        if let EngineEvent::ConflictEnded { conflict, victory } = event {
            println!(
                ">>> {} wins by {} after {} ticks: {}",
                conflict.countries[victory.winner].name(),
                victory.condition,
                conflict.duration,
                victory.description
            );
            if finished.fetch_add(1, Ordering::SeqCst) + 1 >= target {
                done.notify_one();
            }
        }
    });

    sim.on(EventKind::PredictionResolved, |event| {
        if let EngineEvent::PredictionResolved { prediction_result, .. } = event {
            println!(
                ">>> Prediction {} (streak {}, best {})",
                if prediction_result.correct { "correct" } else { "wrong" },
                prediction_result.current_streak,
                prediction_result.best_streak
            );
        }
    });

    sim.on(EventKind::Error, |event| {
        if let EngineEvent::Error { error, context } = event {
            eprintln!("error in {context}: {error}");
        }
    });
}
