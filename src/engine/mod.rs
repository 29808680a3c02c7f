//! Simulation orchestration
//!
//! [`SimulationEngine`] owns the live conflict, the event generator and the
//! prediction ledger. It advances on deadlines polled by [`runner::run`] or
//! by the caller, and reports progress through a synchronous [`EventBus`].
//! Listeners act back on the engine by queueing an [`EngineCommand`].

pub mod bus;
pub mod command;
pub mod matchup;
pub mod runner;
pub mod schedule;
pub mod simulation;
pub mod stats;

pub use bus::{EngineEvent, EventBus, EventKind, ListenerId};
pub use command::{CommandSender, EngineCommand};
pub use matchup::{MatchupProvider, RandomMatchup, RotatingMatchup};
pub use runner::run;
pub use simulation::SimulationEngine;
pub use stats::{MemoryUsage, PerformanceStats, SimulationStats};
