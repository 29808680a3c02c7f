//! Engine introspection snapshots

use std::time::Duration;

use serde::Serialize;

use crate::conflict::{ConflictStats, TimelineEvent};
use crate::events::ActiveEvent;
use crate::prediction::Prediction;

#[derive(Clone, Debug, Serialize)]
pub struct SimulationStats {
    pub running: bool,
    pub paused: bool,
    pub speed: f64,
    pub current_interval_ms: f64,
    pub uptime: Duration,
    pub ticks_processed: u64,
    pub conflicts_completed: u64,
    pub active_events: usize,
    pub current_conflict: Option<ConflictStats>,
}

/// Rough footprint of engine-held history
#[derive(Clone, Debug, Default, Serialize)]
pub struct MemoryUsage {
    pub timeline_events: usize,
    pub completed_conflicts: usize,
    pub active_events: usize,
    pub predictions: usize,
    pub estimated_bytes: usize,
}

impl MemoryUsage {
    pub(crate) fn estimate(
        timeline: &[TimelineEvent],
        completed_conflicts: usize,
        active_events: &[ActiveEvent],
        predictions: &[Prediction],
    ) -> Self {
        let timeline_bytes: usize = timeline
            .iter()
            .map(|e| std::mem::size_of::<TimelineEvent>() + e.description.len())
            .sum();
        let event_bytes: usize = active_events
            .iter()
            .map(|a| std::mem::size_of::<ActiveEvent>() + a.event.name.len() + a.event.description.len())
            .sum();
        let summary_bytes = completed_conflicts * std::mem::size_of::<crate::conflict::ConflictSummary>();
        let prediction_bytes = predictions.len() * std::mem::size_of::<Prediction>();

        Self {
            timeline_events: timeline.len(),
            completed_conflicts,
            active_events: active_events.len(),
            predictions: predictions.len(),
            estimated_bytes: timeline_bytes + event_bytes + summary_bytes + prediction_bytes,
        }
    }
}

/// Tick timing, measured around the whole processing step
#[derive(Clone, Debug, Default, Serialize)]
pub struct PerformanceStats {
    pub ticks_processed: u64,
    pub average_tick: Duration,
    pub max_tick: Duration,
    pub last_tick: Duration,
    pub housekeeping_runs: u64,
    pub timeline_events_trimmed: usize,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct TickMetrics {
    pub ticks_processed: u64,
    pub total_tick_time: Duration,
    pub max_tick: Duration,
    pub last_tick: Duration,
    pub housekeeping_runs: u64,
    pub timeline_events_trimmed: usize,
    pub conflicts_completed: u64,
}

impl TickMetrics {
    pub fn record(&mut self, elapsed: Duration) {
        self.ticks_processed += 1;
        self.total_tick_time += elapsed;
        self.last_tick = elapsed;
        self.max_tick = self.max_tick.max(elapsed);
    }

    pub fn snapshot(&self) -> PerformanceStats {
        let average_tick = if self.ticks_processed == 0 {
            Duration::ZERO
        } else {
            self.total_tick_time / self.ticks_processed.min(u32::MAX as u64) as u32
        };
        PerformanceStats {
            ticks_processed: self.ticks_processed,
            average_tick,
            max_tick: self.max_tick,
            last_tick: self.last_tick,
            housekeeping_runs: self.housekeeping_runs,
            timeline_events_trimmed: self.timeline_events_trimmed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_metrics_average() {
        let mut metrics = TickMetrics::default();
        assert_eq!(metrics.snapshot().average_tick, Duration::ZERO);

        metrics.record(Duration::from_millis(2));
        metrics.record(Duration::from_millis(4));
        let stats = metrics.snapshot();
        assert_eq!(stats.ticks_processed, 2);
        assert_eq!(stats.average_tick, Duration::from_millis(3));
        assert_eq!(stats.max_tick, Duration::from_millis(4));
        assert_eq!(stats.last_tick, Duration::from_millis(4));
    }

    #[test]
    fn test_memory_estimate_empty() {
        let usage = MemoryUsage::estimate(&[], 0, &[], &[]);
        assert_eq!(usage.estimated_bytes, 0);
        assert_eq!(usage.timeline_events, 0);
    }
}
