//! Random event injection and multi-tick effect tracking

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::conflict::{Conflict, TimelineEntry};
use crate::core::error::EventError;
use crate::core::types::{opponent, ConflictId, EventId, Side, Tick};
use crate::events::catalog::{EventCategory, EventTemplate, ALL_CATEGORIES};

/// Recurring GDP effects apply at this fraction of the initial hit
pub const RECURRING_DAMPING: f64 = 0.3;

/// Effects resolved to concrete per-side values
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EventEffects {
    pub military_efficiency: Option<[f64; 2]>,
    pub gdp_change: Option<[f64; 2]>,
    pub territory_change: Option<[f64; 2]>,
    pub diplomacy_bonus: Option<f64>,
    pub duration: u32,
}

/// A generated random event
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Event {
    pub id: EventId,
    pub category: EventCategory,
    pub name: String,
    pub description: String,
    pub target: Option<Side>,
    pub effects: EventEffects,
    /// Conflict duration when the event was generated
    pub tick: Tick,
}

/// An event still exerting recurring effects
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActiveEvent {
    pub event: Event,
    pub conflict_id: ConflictId,
    pub remaining_duration: u32,
    pub start_time: Tick,
}

#[derive(Clone, Debug)]
pub struct EventGenerator {
    event_probability: f64,
    active_events: Vec<ActiveEvent>,
}

impl EventGenerator {
    pub fn new(event_probability: f64) -> Result<Self, EventError> {
        if !(0.0..=1.0).contains(&event_probability) {
            return Err(EventError::InvalidProbability(event_probability));
        }
        Ok(Self {
            event_probability,
            active_events: Vec::new(),
        })
    }

    pub fn event_probability(&self) -> f64 {
        self.event_probability
    }

    /// Maybe produce an event for this tick; `None` most of the time
    pub fn generate_random_event<R: Rng + ?Sized>(&self, conflict: &Conflict, rng: &mut R) -> Option<Event> {
        if !rng.gen_bool(self.event_probability) {
            return None;
        }

        let category = *ALL_CATEGORIES.choose(rng)?;
        let template = category.templates().choose(rng)?;
        let target = template.targeted.then(|| rng.gen_range(0..2usize));

        Some(instantiate(category, template, target, conflict))
    }

    /// Apply an event's immediate effects and register any lasting ones
    pub fn apply_event_effects(&mut self, conflict: &mut Conflict, event: &Event) {
        let effects = &event.effects;

        if let Some(gdp) = effects.gdp_change {
            for side in 0..2 {
                conflict.apply_gdp_change(side, gdp[side]);
            }
        }
        if let Some(territory) = effects.territory_change {
            conflict.apply_territory_change(territory);
        }
        if let Some(efficiency) = effects.military_efficiency {
            for side in 0..2 {
                conflict.modifiers.scale_efficiency(side, efficiency[side]);
            }
        }
        if let Some(bonus) = effects.diplomacy_bonus {
            conflict.modifiers.diplomacy_bonus += bonus;
        }

        if effects.duration > 0 {
            self.active_events.push(ActiveEvent {
                event: event.clone(),
                conflict_id: conflict.id,
                remaining_duration: effects.duration,
                start_time: conflict.duration,
            });
        }

        tracing::debug!(category = %event.category, "Random event: {}", event.name);
        conflict.add_event(
            TimelineEntry::RandomEvent {
                event_id: event.id,
                category: event.category,
                name: event.name.clone(),
                target: event.target,
            },
            normalize_description(&event.description),
        );
    }

    /// Tick down active events, applying their dampened recurring effects
    pub fn update_active_events(&mut self, conflict: &mut Conflict) {
        let conflict_id = conflict.id;
        self.active_events.retain_mut(|active| {
            if active.conflict_id != conflict_id {
                return false;
            }

            active.remaining_duration = active.remaining_duration.saturating_sub(1);

            if let Some(gdp) = active.event.effects.gdp_change {
                for side in 0..2 {
                    conflict.apply_gdp_change(side, gdp[side] * RECURRING_DAMPING);
                }
            }

            if active.remaining_duration == 0 {
                // Lasting efficiency changes end with the event
                if let Some(efficiency) = active.event.effects.military_efficiency {
                    for side in 0..2 {
                        conflict.modifiers.unscale_efficiency(side, efficiency[side]);
                    }
                }
                return false;
            }
            true
        });
    }

    pub fn event_types(&self) -> &'static [EventCategory] {
        &ALL_CATEGORIES
    }

    pub fn active_events(&self) -> &[ActiveEvent] {
        &self.active_events
    }

    pub fn active_events_description(&self) -> Vec<String> {
        self.active_events
            .iter()
            .map(|active| {
                let unit = if active.remaining_duration == 1 { "tick" } else { "ticks" };
                format!("{} ({} {} remaining)", active.event.name, active.remaining_duration, unit)
            })
            .collect()
    }

    /// Forget all active events
    pub fn reset(&mut self) {
        self.active_events.clear();
    }
}

fn instantiate(category: EventCategory, template: &EventTemplate, target: Option<Side>, conflict: &Conflict) -> Event {
    let spec = &template.effects;

    // Map (target, opponent) pairs onto (side 0, side 1)
    let per_side = |(on_target, on_opponent): (f64, f64)| -> [f64; 2] {
        match target {
            Some(side) => {
                let mut values = [0.0; 2];
                values[side] = on_target;
                values[opponent(side)] = on_opponent;
                values
            }
            None => [on_target, on_target],
        }
    };

    let effects = EventEffects {
        military_efficiency: spec.military.map(per_side),
        gdp_change: spec.gdp.map(per_side),
        territory_change: spec.territory.map(|points| per_side((points, -points))),
        diplomacy_bonus: spec.diplomacy,
        duration: spec.duration,
    };

    let description = match target {
        Some(side) => template
            .description
            .replace("{country}", conflict.countries[side].name())
            .replace("{opponent}", conflict.countries[opponent(side)].name()),
        None => template.description.to_string(),
    };

    Event {
        id: EventId::new(),
        category,
        name: template.name.to_string(),
        description,
        target,
        effects,
        tick: conflict.duration,
    }
}

/// Collapse whitespace, capitalise the first letter, end with a full stop
pub fn normalize_description(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let mut text = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => return String::new(),
    };
    if !text.ends_with(|c: char| matches!(c, '.' | '!' | '?')) {
        text.push('.');
    }
    text
}
