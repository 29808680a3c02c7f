//! Conflict Oracle - real-time two-nation conflict simulator
//!
//! Pairs countries from a roster, advances territory, casualties and
//! economy on a timer, injects random world events, detects victory and
//! scores user predictions about who will win.

pub mod conflict;
pub mod core;
pub mod country;
pub mod engine;
pub mod events;
pub mod prediction;

pub use crate::conflict::{Conflict, ConflictStats, ConflictSummary, Victory, VictoryCondition};
pub use crate::core::{EngineConfig, Result, SimError};
pub use crate::country::{Country, CountryRef};
pub use crate::engine::{EngineCommand, EngineEvent, EventKind, SimulationEngine};
pub use crate::events::{Event, EventCategory, EventGenerator};
pub use crate::prediction::{FileStore, KeyValueStore, MemoryStore, PredictionSystem};
