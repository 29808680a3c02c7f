//! Conflict state machine: territory, economy and casualties for one war

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

use crate::conflict::timeline::{next_timestamp, TimelineEntry, TimelineEvent};
use crate::conflict::victory::{self, Victory, VictoryCondition};
use crate::core::error::ConflictError;
use crate::core::types::{round2, ConflictId, Side, Tick};
use crate::country::{Country, CountryRef};

/// Weight of the military balance in the battle probability
pub const MILITARY_WEIGHT: f64 = 0.8;
/// Weight of the economic balance in the battle probability
pub const ECONOMIC_WEIGHT: f64 = 0.2;
/// Flat edge for a nuclear power facing a non-nuclear one
pub const NUCLEAR_EDGE: f64 = 0.05;
/// Edge for holding all territory (scaled linearly from 50/50)
pub const MOMENTUM_WEIGHT: f64 = 0.1;
/// Half-width of the uniform noise added to each battle roll
pub const BATTLE_NOISE: f64 = 0.1;

/// Largest territory swing in a single tick (percentage points)
pub const MAX_TERRITORY_SHIFT: f64 = 5.0;

/// Fraction of GDP each side loses per tick to the cost of war
pub const WAR_COST_RATE: f64 = 0.002;

/// GDP never falls below this fraction of its pre-war value
pub const GDP_FLOOR_RATIO: f64 = 0.1;

/// Share of combined personnel lost per tick at baseline intensity
pub const CASUALTY_RATE: f64 = 0.0002;

/// Event-driven military efficiency is kept within these bounds
pub const MIN_MILITARY_EFFICIENCY: f64 = 0.25;
pub const MAX_MILITARY_EFFICIENCY: f64 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStatus {
    Ongoing,
    Ended,
}

/// Persistent adjustments applied by random events
#[derive(Clone, Debug, PartialEq)]
pub struct ConflictModifiers {
    /// Sum of ln(factor) over every efficiency change in force, per side.
    /// Bounds apply on read, so lifting a change restores the exact value.
    efficiency_log: [f64; 2],
    /// Accumulated pressure toward a negotiated settlement
    pub diplomacy_bonus: f64,
}

impl Default for ConflictModifiers {
    fn default() -> Self {
        Self {
            efficiency_log: [0.0, 0.0],
            diplomacy_bonus: 0.0,
        }
    }
}

impl ConflictModifiers {
    /// Multiplier on a side's military strength, within the efficiency bounds
    pub fn military_efficiency(&self, side: Side) -> f64 {
        self.efficiency_log[side]
            .exp()
            .clamp(MIN_MILITARY_EFFICIENCY, MAX_MILITARY_EFFICIENCY)
    }

    pub fn scale_efficiency(&mut self, side: Side, factor: f64) {
        self.efficiency_log[side] += efficiency_term(factor);
    }

    /// Lift a factor previously applied with [`Self::scale_efficiency`]
    pub fn unscale_efficiency(&mut self, side: Side, factor: f64) {
        self.efficiency_log[side] -= efficiency_term(factor);
    }
}

// Non-positive factors floor the multiplier instead of poisoning the sum
fn efficiency_term(factor: f64) -> f64 {
    if factor.is_nan() {
        return 0.0;
    }
    factor.clamp(f64::MIN_POSITIVE, f64::MAX).ln()
}

impl Serialize for ConflictModifiers {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("ConflictModifiers", 2)?;
        state.serialize_field(
            "military_efficiency",
            &[self.military_efficiency(0), self.military_efficiency(1)],
        )?;
        state.serialize_field("diplomacy_bonus", &self.diplomacy_bonus)?;
        state.end()
    }
}

/// Result of one territorial update
#[derive(Clone, Debug, PartialEq)]
pub struct TerritoryUpdate {
    pub probability: f64,
    pub territory_change: [f64; 2],
    pub casualties: u64,
}

/// Snapshot returned by [`Conflict::get_stats`]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConflictStats {
    pub duration: Tick,
    pub territory_control: [f64; 2],
    pub casualties: u64,
    /// Percent change of GDP against the pre-war value, per side
    pub economic_impact: [f64; 2],
    pub countries: [CountryRef; 2],
}

/// Compact record of a finished conflict
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConflictSummary {
    pub id: ConflictId,
    pub countries: [CountryRef; 2],
    pub winner: Option<Side>,
    pub condition: Option<VictoryCondition>,
    pub description: Option<String>,
    pub duration: Tick,
    pub casualties: u64,
    pub territory_control: [f64; 2],
    pub started_at: DateTime<Utc>,
}

/// A two-party war
#[derive(Clone, Debug, Serialize)]
pub struct Conflict {
    pub id: ConflictId,
    pub countries: [Country; 2],
    /// Percent of contested ground held by each side; always sums to 100
    pub territory_control: [f64; 2],
    pub duration: Tick,
    pub status: ConflictStatus,
    pub winner: Option<Side>,
    pub victory_condition: Option<VictoryCondition>,
    pub victory_description: Option<String>,
    pub initial_gdp: [f64; 2],
    pub current_gdp: [f64; 2],
    pub total_casualties: u64,
    pub events: Vec<TimelineEvent>,
    pub modifiers: ConflictModifiers,
    pub started_at: DateTime<Utc>,
}

impl Conflict {
    /// Start a new war between two distinct countries
    pub fn new(first: Country, second: Country) -> Result<Self, ConflictError> {
        for country in [&first, &second] {
            if !CountryRef::from(country).is_valid() {
                return Err(ConflictError::InvalidCountry(country.name().to_string()));
            }
            let gdp = country.economy().gdp;
            if !gdp.is_finite() || gdp <= 0.0 {
                return Err(ConflictError::InvalidCountry(format!(
                    "{} has non-positive GDP {}",
                    country.name(),
                    gdp
                )));
            }
        }
        if first.code().eq_ignore_ascii_case(second.code()) {
            return Err(ConflictError::SameCountry(first.code().to_string()));
        }

        let initial_gdp = [first.economy().gdp, second.economy().gdp];
        let countries = [first, second];
        let refs = [CountryRef::from(&countries[0]), CountryRef::from(&countries[1])];
        let started_at = Utc::now();

        let mut conflict = Self {
            id: ConflictId::new(),
            countries,
            territory_control: [50.0, 50.0],
            duration: 0,
            status: ConflictStatus::Ongoing,
            winner: None,
            victory_condition: None,
            victory_description: None,
            initial_gdp,
            current_gdp: initial_gdp,
            total_casualties: 0,
            events: Vec::new(),
            modifiers: ConflictModifiers::default(),
            started_at,
        };

        let description = format!("Conflict begins between {} and {}", refs[0].name, refs[1].name);
        conflict.add_event(TimelineEntry::ConflictStart { countries: refs }, description);
        Ok(conflict)
    }

    pub fn is_ongoing(&self) -> bool {
        self.status == ConflictStatus::Ongoing
    }

    pub fn country_refs(&self) -> [CountryRef; 2] {
        [CountryRef::from(&self.countries[0]), CountryRef::from(&self.countries[1])]
    }

    /// Current GDP as a fraction of pre-war GDP
    pub fn gdp_ratio(&self, side: Side) -> f64 {
        self.current_gdp[side] / self.initial_gdp[side]
    }

    /// Probability that side 0 prevails this tick
    pub fn calculate_battle_outcome<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let strength = [
            self.countries[0].military_strength() * self.modifiers.military_efficiency(0),
            self.countries[1].military_strength() * self.modifiers.military_efficiency(1),
        ];
        let economy = [self.countries[0].economic_power(), self.countries[1].economic_power()];

        let nuclear_edge = match (self.countries[0].is_nuclear(), self.countries[1].is_nuclear()) {
            (true, false) => NUCLEAR_EDGE,
            (false, true) => -NUCLEAR_EDGE,
            _ => 0.0,
        };
        let momentum = (self.territory_control[0] - 50.0) / 50.0 * MOMENTUM_WEIGHT;
        let noise = rng.gen_range(-BATTLE_NOISE..=BATTLE_NOISE);

        let p = 0.5
            + (share(strength[0], strength[1]) - 0.5) * MILITARY_WEIGHT
            + (share(economy[0], economy[1]) - 0.5) * ECONOMIC_WEIGHT
            + nuclear_edge
            + momentum
            + noise;
        p.clamp(0.0, 1.0)
    }

    /// Fight one round: move the front, count the dead, pay for the war
    pub fn update_territory_control<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<TerritoryUpdate, ConflictError> {
        if !self.is_ongoing() {
            return Err(ConflictError::AlreadyEnded(self.matchup_label()));
        }
        self.check_integrity()?;

        let probability = self.calculate_battle_outcome(rng);
        let swing = (probability - 0.5) * 2.0 * MAX_TERRITORY_SHIFT * rng.gen_range(0.5..=1.0);

        let before = self.territory_control;
        self.territory_control = normalize_territory([before[0] + swing, before[1] - swing]);
        let territory_change = [
            self.territory_control[0] - before[0],
            self.territory_control[1] - before[1],
        ];

        let casualties = self.battle_casualties(swing.abs());
        self.total_casualties = self.total_casualties.saturating_add(casualties);
        self.apply_war_cost();

        let description = self.describe_front(territory_change[0]);
        self.add_event(
            TimelineEntry::TerritoryUpdate {
                territory_change,
                probability,
                casualties,
            },
            description,
        );

        Ok(TerritoryUpdate {
            probability,
            territory_change,
            casualties,
        })
    }

    /// Evaluate victory conditions in priority order
    pub fn check_victory_conditions<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Victory> {
        victory::evaluate(self, rng)
    }

    /// Append to the timeline, stamped with the wall clock
    pub fn add_event(&mut self, entry: TimelineEntry, description: impl Into<String>) -> &TimelineEvent {
        let event = TimelineEvent {
            tick: self.duration,
            timestamp: next_timestamp(&self.events),
            description: description.into(),
            entry,
        };
        let index = self.events.len();
        self.events.push(event);
        &self.events[index]
    }

    pub fn get_stats(&self) -> ConflictStats {
        ConflictStats {
            duration: self.duration,
            territory_control: self.territory_control,
            casualties: self.total_casualties,
            economic_impact: [
                round2((self.gdp_ratio(0) - 1.0) * 100.0),
                round2((self.gdp_ratio(1) - 1.0) * 100.0),
            ],
            countries: self.country_refs(),
        }
    }

    /// Terminate the conflict; callers must only do this once
    pub fn end_conflict(&mut self, winner: Side, condition: VictoryCondition, description: impl Into<String>) {
        let description = description.into();
        self.status = ConflictStatus::Ended;
        self.winner = Some(winner);
        self.victory_condition = Some(condition);
        self.victory_description = Some(description.clone());
        self.add_event(TimelineEntry::ConflictEnd { winner, condition }, description);
        tracing::info!(
            "{} ends: {} wins by {} after {} ticks",
            self.matchup_label(),
            self.countries[winner].name(),
            condition,
            self.duration
        );
    }

    /// Advance the tick counter
    pub fn advance_tick(&mut self) {
        self.duration += 1;
    }

    /// Multiply one side's GDP, respecting the floor
    pub fn apply_gdp_change(&mut self, side: Side, fraction: f64) {
        self.current_gdp[side] *= 1.0 + fraction;
        self.clamp_gdp();
    }

    /// Add percentage points to each side, then rebalance to 100
    pub fn apply_territory_change(&mut self, change: [f64; 2]) {
        self.territory_control = normalize_territory([
            self.territory_control[0] + change[0],
            self.territory_control[1] + change[1],
        ]);
    }

    /// Drop old timeline entries, keeping `conflict_start` and the newest ones
    pub fn trim_timeline(&mut self, max_events: usize) -> usize {
        let keep = max_events.max(1);
        if self.events.len() <= keep {
            return 0;
        }
        let removed = self.events.len() - keep;
        self.events.drain(1..1 + removed);
        removed
    }

    pub fn summary(&self) -> ConflictSummary {
        ConflictSummary {
            id: self.id,
            countries: self.country_refs(),
            winner: self.winner,
            condition: self.victory_condition,
            description: self.victory_description.clone(),
            duration: self.duration,
            casualties: self.total_casualties,
            territory_control: self.territory_control,
            started_at: self.started_at,
        }
    }

    pub fn matchup_label(&self) -> String {
        format!("{} vs {}", self.countries[0].name(), self.countries[1].name())
    }

    fn check_integrity(&self) -> Result<(), ConflictError> {
        let territory_ok = self
            .territory_control
            .iter()
            .all(|t| t.is_finite() && (0.0..=100.0).contains(t));
        if !territory_ok {
            return Err(ConflictError::CorruptState(format!(
                "territory control {:?} out of range",
                self.territory_control
            )));
        }
        if !self.current_gdp.iter().all(|g| g.is_finite()) {
            return Err(ConflictError::CorruptState(format!(
                "non-finite GDP {:?}",
                self.current_gdp
            )));
        }
        Ok(())
    }

    fn battle_casualties(&self, swing: f64) -> u64 {
        let personnel = self.countries[0].military().personnel as f64
            + self.countries[1].military().personnel as f64;
        let proximity = self.countries[0].geographic_advantage(&self.countries[1]);
        let intensity = (0.5 + proximity) * (0.5 + swing / MAX_TERRITORY_SHIFT);
        (personnel * CASUALTY_RATE * intensity).round() as u64
    }

    fn apply_war_cost(&mut self) {
        for gdp in &mut self.current_gdp {
            *gdp *= 1.0 - WAR_COST_RATE;
        }
        self.clamp_gdp();
    }

    fn clamp_gdp(&mut self) {
        for side in 0..2 {
            let floor = self.initial_gdp[side] * GDP_FLOOR_RATIO;
            if !(self.current_gdp[side] >= floor) {
                self.current_gdp[side] = floor;
            }
        }
    }

    fn describe_front(&self, change0: f64) -> String {
        if change0.abs() < 0.005 {
            return format!("The front between {} holds", self.matchup_label());
        }
        let (gainer, loser) = if change0 > 0.0 { (0, 1) } else { (1, 0) };
        format!(
            "{} gains {:.2}% territory from {}",
            self.countries[gainer].name(),
            change0.abs(),
            self.countries[loser].name()
        )
    }
}

/// Clamp both sides to [0, 100] and split any residual evenly so the pair
/// sums to exactly 100. Side 1 absorbs floating-point remainder.
pub fn normalize_territory(territory: [f64; 2]) -> [f64; 2] {
    let a = sanitize(territory[0]);
    let b = sanitize(territory[1]);
    let residual = 100.0 - (a + b);
    let a = (a + residual / 2.0).clamp(0.0, 100.0);
    [a, 100.0 - a]
}

fn sanitize(value: f64) -> f64 {
    if value.is_nan() {
        50.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Share of `a` in `a + b`, 0.5 when both are zero
fn share(a: f64, b: f64) -> f64 {
    let total = a + b;
    if total > 0.0 {
        a / total
    } else {
        0.5
    }
}
