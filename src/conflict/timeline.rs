//! Append-only conflict timeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::victory::VictoryCondition;
use crate::core::types::{EventId, Side, Tick};
use crate::country::CountryRef;
use crate::events::EventCategory;

/// What happened, with the data specific to each kind of entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimelineEntry {
    ConflictStart {
        countries: [CountryRef; 2],
    },
    TerritoryUpdate {
        /// Applied change per side, in percentage points
        territory_change: [f64; 2],
        /// Probability that side 0 prevailed this tick
        probability: f64,
        casualties: u64,
    },
    RandomEvent {
        event_id: EventId,
        category: EventCategory,
        name: String,
        target: Option<Side>,
    },
    ConflictEnd {
        winner: Side,
        condition: VictoryCondition,
    },
}

impl TimelineEntry {
    /// Stable snake_case name of the entry kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConflictStart { .. } => "conflict_start",
            Self::TerritoryUpdate { .. } => "territory_update",
            Self::RandomEvent { .. } => "random_event",
            Self::ConflictEnd { .. } => "conflict_end",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Conflict duration when the entry was recorded
    pub tick: Tick,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    #[serde(flatten)]
    pub entry: TimelineEntry,
}

impl TimelineEvent {
    pub fn kind(&self) -> &'static str {
        self.entry.kind()
    }
}

/// Timestamps never go backwards, even if the wall clock does
pub(crate) fn next_timestamp(events: &[TimelineEvent]) -> DateTime<Utc> {
    let now = Utc::now();
    match events.last() {
        Some(last) if last.timestamp > now => last.timestamp,
        _ => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serializes_with_type_tag() {
        let event = TimelineEvent {
            tick: 3,
            timestamp: Utc::now(),
            description: "Front shifts".into(),
            entry: TimelineEntry::TerritoryUpdate {
                territory_change: [1.5, -1.5],
                probability: 0.6,
                casualties: 10,
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "territory_update");
        assert_eq!(json["casualties"], 10);
        assert_eq!(event.kind(), "territory_update");
    }

    #[test]
    fn test_next_timestamp_is_monotonic() {
        let future = Utc::now() + chrono::Duration::hours(1);
        let events = vec![TimelineEvent {
            tick: 0,
            timestamp: future,
            description: String::new(),
            entry: TimelineEntry::ConflictStart {
                countries: [
                    CountryRef { name: "A".into(), code: "A".into() },
                    CountryRef { name: "B".into(), code: "B".into() },
                ],
            },
        }];
        assert_eq!(next_timestamp(&events), future);
    }
}
