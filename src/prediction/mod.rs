//! Prediction ledger and its durable storage

pub mod ledger;
pub mod store;

pub use ledger::{
    ConfidenceAnalysis, ConfidenceBucket, Prediction, PredictionStatistics, PredictionSystem, Resolution,
    SubmitReceipt, LEDGER_KEY,
};
pub use store::{FileStore, KeyValueStore, MemoryStore};
