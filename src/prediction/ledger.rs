//! User prediction ledger with streak and accuracy bookkeeping
//!
//! Every mutating call writes the full ledger snapshot to the backing
//! store before returning. Store failures are logged and never surface
//! to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::VictoryCondition;
use crate::core::error::PredictionError;
use crate::core::types::{round2, PredictionId, Side};
use crate::country::CountryRef;
use crate::prediction::store::{KeyValueStore, MemoryStore};

/// Key of the single durable record holding the ledger
pub const LEDGER_KEY: &str = "conflict_oracle.predictions";

pub const MIN_CONFIDENCE: u32 = 1;
pub const MAX_CONFIDENCE: u32 = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub id: PredictionId,
    pub country_a: CountryRef,
    pub country_b: CountryRef,
    /// Predicted winner: 0 for country A, 1 for country B
    pub winner: Side,
    pub confidence: u32,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
    pub correct: Option<bool>,
    pub actual_winner: Option<Side>,
    pub victory_condition: Option<VictoryCondition>,
}

impl Prediction {
    /// Same unordered pair, matched by code
    pub fn matches_pair(&self, a: &CountryRef, b: &CountryRef) -> bool {
        let (x, y) = (&self.country_a.code, &self.country_b.code);
        (x == &a.code && y == &b.code) || (x == &b.code && y == &a.code)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub prediction_id: PredictionId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub prediction_id: PredictionId,
    pub correct: bool,
    pub current_streak: u32,
    pub best_streak: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PredictionStatistics {
    pub total_predictions: usize,
    pub resolved_predictions: usize,
    pub correct_predictions: usize,
    pub accuracy: f64,
    pub current_streak: u32,
    pub best_streak: u32,
    pub average_confidence: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConfidenceBucket {
    pub count: usize,
    /// Integer percent correct, 0 for an empty bucket
    pub accuracy: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConfidenceAnalysis {
    /// Confidence 1-3
    pub low: ConfidenceBucket,
    /// Confidence 4-7
    pub medium: ConfidenceBucket,
    /// Confidence 8-10
    pub high: ConfidenceBucket,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerSnapshot {
    predictions: Vec<Prediction>,
    #[serde(default)]
    current_streak: u32,
    #[serde(default)]
    best_streak: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LedgerSnapshotRef<'a> {
    predictions: &'a [Prediction],
    current_streak: u32,
    best_streak: u32,
    last_updated: DateTime<Utc>,
}

pub struct PredictionSystem {
    store: Box<dyn KeyValueStore>,
    predictions: Vec<Prediction>,
    current_streak: u32,
    best_streak: u32,
}

impl std::fmt::Debug for PredictionSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionSystem")
            .field("predictions", &self.predictions.len())
            .field("current_streak", &self.current_streak)
            .field("best_streak", &self.best_streak)
            .finish()
    }
}

impl PredictionSystem {
    /// Open the ledger on a store, starting empty if nothing usable is there
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        let mut system = Self {
            store,
            predictions: Vec::new(),
            current_streak: 0,
            best_streak: 0,
        };
        system.load();
        system
    }

    /// Ledger backed by a private in-memory store
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    fn load(&mut self) {
        let raw = match self.store.get(LEDGER_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!("Prediction store unavailable, starting empty: {}", e);
                return;
            }
        };

        match serde_json::from_str::<LedgerSnapshot>(&raw) {
            Ok(snapshot) => {
                tracing::debug!(count = snapshot.predictions.len(), "Loaded prediction ledger");
                self.predictions = snapshot.predictions;
                self.current_streak = snapshot.current_streak;
                self.best_streak = snapshot.best_streak.max(snapshot.current_streak);
            }
            Err(e) => {
                tracing::warn!("Prediction ledger is malformed, starting empty: {}", e);
            }
        }
    }

    fn persist(&mut self) {
        let snapshot = LedgerSnapshotRef {
            predictions: &self.predictions,
            current_streak: self.current_streak,
            best_streak: self.best_streak,
            last_updated: Utc::now(),
        };
        let serialized = match serde_json::to_string(&snapshot) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Failed to serialize prediction ledger: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(LEDGER_KEY, &serialized) {
            tracing::warn!("Failed to persist prediction ledger: {}", e);
        }
    }

    /// Record a prediction for an unordered country pair
    pub fn submit_prediction(
        &mut self,
        country_a: &CountryRef,
        country_b: &CountryRef,
        winner: Side,
        confidence: u32,
    ) -> Result<SubmitReceipt, PredictionError> {
        if !country_a.is_valid() || !country_b.is_valid() {
            return Err(PredictionError::InvalidCountries);
        }
        if winner > 1 {
            return Err(PredictionError::InvalidWinner);
        }
        if !(MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&confidence) {
            return Err(PredictionError::InvalidConfidence);
        }
        if self.get_current_prediction(country_a, country_b).is_some() {
            return Err(PredictionError::AlreadyExists(
                country_a.name.clone(),
                country_b.name.clone(),
            ));
        }

        let prediction = Prediction {
            id: PredictionId::new(),
            country_a: country_a.clone(),
            country_b: country_b.clone(),
            winner,
            confidence,
            timestamp: Utc::now(),
            resolved: false,
            correct: None,
            actual_winner: None,
            victory_condition: None,
        };
        let prediction_id = prediction.id;
        tracing::info!(
            "Prediction {} submitted: {} beats {} (confidence {})",
            prediction_id,
            if winner == 0 { &country_a.name } else { &country_b.name },
            if winner == 0 { &country_b.name } else { &country_a.name },
            confidence
        );

        self.predictions.push(prediction);
        self.persist();
        Ok(SubmitReceipt { prediction_id })
    }

    /// Settle a prediction against the actual outcome
    pub fn resolve_prediction(
        &mut self,
        id: PredictionId,
        actual_winner: Side,
        victory_condition: VictoryCondition,
    ) -> Result<Resolution, PredictionError> {
        let prediction = self
            .predictions
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PredictionError::NotFound(id.to_string()))?;
        if prediction.resolved {
            return Err(PredictionError::AlreadyResolved(id.to_string()));
        }

        let correct = prediction.winner == actual_winner;
        prediction.resolved = true;
        prediction.actual_winner = Some(actual_winner);
        prediction.victory_condition = Some(victory_condition);
        prediction.correct = Some(correct);

        if correct {
            self.current_streak += 1;
            self.best_streak = self.best_streak.max(self.current_streak);
        } else {
            self.current_streak = 0;
        }

        tracing::info!(
            "Prediction {} resolved: {} (streak {}, best {})",
            id,
            if correct { "correct" } else { "incorrect" },
            self.current_streak,
            self.best_streak
        );

        self.persist();
        Ok(Resolution {
            prediction_id: id,
            correct,
            current_streak: self.current_streak,
            best_streak: self.best_streak,
        })
    }

    /// Percent of resolved predictions that were correct, 2 decimals
    pub fn calculate_accuracy(&self) -> f64 {
        let (resolved, correct) = self.resolved_counts();
        if resolved == 0 {
            return 0.0;
        }
        round2(correct as f64 / resolved as f64 * 100.0)
    }

    pub fn get_statistics(&self) -> PredictionStatistics {
        let (resolved, correct) = self.resolved_counts();
        let average_confidence = if self.predictions.is_empty() {
            0.0
        } else {
            let total: u32 = self.predictions.iter().map(|p| p.confidence).sum();
            round2(total as f64 / self.predictions.len() as f64)
        };

        PredictionStatistics {
            total_predictions: self.predictions.len(),
            resolved_predictions: resolved,
            correct_predictions: correct,
            accuracy: self.calculate_accuracy(),
            current_streak: self.current_streak,
            best_streak: self.best_streak,
            average_confidence,
        }
    }

    /// Accuracy of resolved predictions by confidence band
    pub fn get_confidence_analysis(&self) -> ConfidenceAnalysis {
        let mut tallies = [(0usize, 0usize); 3];
        for p in self.predictions.iter().filter(|p| p.resolved) {
            let bucket = match p.confidence {
                0..=3 => 0,
                4..=7 => 1,
                _ => 2,
            };
            tallies[bucket].0 += 1;
            if p.correct == Some(true) {
                tallies[bucket].1 += 1;
            }
        }

        let to_bucket = |(count, correct): (usize, usize)| ConfidenceBucket {
            count,
            accuracy: if count == 0 {
                0
            } else {
                (correct as f64 / count as f64 * 100.0).round() as u32
            },
        };

        ConfidenceAnalysis {
            low: to_bucket(tallies[0]),
            medium: to_bucket(tallies[1]),
            high: to_bucket(tallies[2]),
        }
    }

    /// Newest first, optionally truncated
    pub fn get_prediction_history(&self, limit: Option<usize>) -> Vec<&Prediction> {
        let mut history: Vec<&Prediction> = self.predictions.iter().collect();
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = limit {
            history.truncate(limit);
        }
        history
    }

    /// The unresolved prediction for this pair, in either order
    pub fn get_current_prediction(&self, country_a: &CountryRef, country_b: &CountryRef) -> Option<&Prediction> {
        self.predictions
            .iter()
            .find(|p| !p.resolved && p.matches_pair(country_a, country_b))
    }

    pub fn get_prediction(&self, id: PredictionId) -> Option<&Prediction> {
        self.predictions.iter().find(|p| p.id == id)
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    pub fn clear_history(&mut self) {
        self.predictions.clear();
        self.current_streak = 0;
        self.best_streak = 0;
        self.persist();
        tracing::info!("Prediction history cleared");
    }

    fn resolved_counts(&self) -> (usize, usize) {
        self.predictions
            .iter()
            .filter(|p| p.resolved)
            .fold((0, 0), |(resolved, correct), p| {
                (resolved + 1, correct + usize::from(p.correct == Some(true)))
            })
    }
}
