//! Synchronous multi-listener event bus
//!
//! Listeners run on the caller's stack in registration order. There is no
//! lock, so a listener that records state for later use never deadlocks.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::conflict::{Conflict, ConflictStats, Victory};
use crate::core::error::SimError;
use crate::core::types::Tick;
use crate::country::CountryRef;
use crate::events::Event;
use crate::prediction::Resolution;

/// Name of an engine event, used as the registration key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Started,
    Stopped,
    Paused,
    Resumed,
    ConflictCreated,
    Update,
    RandomEvent,
    ConflictEnded,
    PredictionResolved,
    SpeedChanged,
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::Paused => "paused",
            Self::Resumed => "resumed",
            Self::ConflictCreated => "conflict_created",
            Self::Update => "update",
            Self::RandomEvent => "random_event",
            Self::ConflictEnded => "conflict_ended",
            Self::PredictionResolved => "prediction_resolved",
            Self::SpeedChanged => "speed_changed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event payloads, borrowed from the engine for the duration of dispatch
#[derive(Debug)]
pub enum EngineEvent<'a> {
    Started {
        conflict: &'a Conflict,
        timestamp: DateTime<Utc>,
    },
    Stopped {
        timestamp: DateTime<Utc>,
    },
    Paused,
    Resumed,
    ConflictCreated {
        conflict: &'a Conflict,
        countries: [CountryRef; 2],
    },
    Update {
        conflict: &'a Conflict,
        duration: Tick,
        stats: ConflictStats,
    },
    RandomEvent {
        event: &'a Event,
        conflict: &'a Conflict,
    },
    ConflictEnded {
        conflict: &'a Conflict,
        victory: &'a Victory,
    },
    PredictionResolved {
        prediction_result: &'a Resolution,
        conflict: &'a Conflict,
    },
    SpeedChanged {
        old_speed: f64,
        new_speed: f64,
        current_interval: Duration,
    },
    Error {
        error: &'a SimError,
        context: &'static str,
    },
}

impl EngineEvent<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Started { .. } => EventKind::Started,
            Self::Stopped { .. } => EventKind::Stopped,
            Self::Paused => EventKind::Paused,
            Self::Resumed => EventKind::Resumed,
            Self::ConflictCreated { .. } => EventKind::ConflictCreated,
            Self::Update { .. } => EventKind::Update,
            Self::RandomEvent { .. } => EventKind::RandomEvent,
            Self::ConflictEnded { .. } => EventKind::ConflictEnded,
            Self::PredictionResolved { .. } => EventKind::PredictionResolved,
            Self::SpeedChanged { .. } => EventKind::SpeedChanged,
            Self::Error { .. } => EventKind::Error,
        }
    }
}

/// Handle returned by [`EventBus::on`] for targeted removal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn FnMut(&EngineEvent<'_>) + Send>;

#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<EventKind, Vec<(ListenerId, Listener)>>,
    next_id: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<EventKind, usize> = self.listeners.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&EngineEvent<'_>) + Send + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.entry(kind).or_default().push((id, Box::new(listener)));
        id
    }

    /// Remove one listener, or every listener for `kind` when `id` is `None`.
    /// Returns how many were removed.
    pub fn off(&mut self, kind: EventKind, id: Option<ListenerId>) -> usize {
        match id {
            None => self.listeners.remove(&kind).map_or(0, |list| list.len()),
            Some(id) => {
                let Some(list) = self.listeners.get_mut(&kind) else {
                    return 0;
                };
                let before = list.len();
                list.retain(|(listener_id, _)| *listener_id != id);
                before - list.len()
            }
        }
    }

    pub fn emit(&mut self, event: &EngineEvent<'_>) {
        if let Some(list) = self.listeners.get_mut(&event.kind()) {
            for (_, listener) in list.iter_mut() {
                listener(event);
            }
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_dispatch_in_registration_order() {
        let mut bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            bus.on(EventKind::Paused, move |_| log.lock().unwrap().push(tag));
        }
        bus.emit(&EngineEvent::Paused);
        bus.emit(&EngineEvent::Resumed);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_off_single_listener() {
        let mut bus = EventBus::new();
        let hits = Arc::new(Mutex::new(0));
        let h = Arc::clone(&hits);
        let id = bus.on(EventKind::Paused, move |_| *h.lock().unwrap() += 1);
        let h = Arc::clone(&hits);
        bus.on(EventKind::Paused, move |_| *h.lock().unwrap() += 10);

        assert_eq!(bus.off(EventKind::Paused, Some(id)), 1);
        bus.emit(&EngineEvent::Paused);
        assert_eq!(*hits.lock().unwrap(), 10);
    }

    #[test]
    fn test_off_without_id_clears_all() {
        let mut bus = EventBus::new();
        bus.on(EventKind::Resumed, |_| {});
        bus.on(EventKind::Resumed, |_| {});
        bus.on(EventKind::Paused, |_| {});
        assert_eq!(bus.off(EventKind::Resumed, None), 2);
        assert_eq!(bus.listener_count(EventKind::Resumed), 0);
        assert_eq!(bus.listener_count(EventKind::Paused), 1);
        assert_eq!(bus.off(EventKind::Resumed, None), 0);
    }
}
