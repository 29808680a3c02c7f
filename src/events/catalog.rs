//! Random event templates
//!
//! Five categories, five templates each. Targeted templates name one side
//! (`{country}`) and sometimes its enemy (`{opponent}`); the first value of
//! each effect pair applies to the target, the second to the opponent.
//! Untargeted templates apply the first value to both sides.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    NaturalDisaster,
    PoliticalEvent,
    EconomicEvent,
    InternationalPressure,
    MilitaryDevelopment,
}

pub const ALL_CATEGORIES: [EventCategory; 5] = [
    EventCategory::NaturalDisaster,
    EventCategory::PoliticalEvent,
    EventCategory::EconomicEvent,
    EventCategory::InternationalPressure,
    EventCategory::MilitaryDevelopment,
];

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NaturalDisaster => "natural_disaster",
            Self::PoliticalEvent => "political_event",
            Self::EconomicEvent => "economic_event",
            Self::InternationalPressure => "international_pressure",
            Self::MilitaryDevelopment => "military_development",
        }
    }

    pub fn templates(&self) -> &'static [EventTemplate] {
        match self {
            Self::NaturalDisaster => NATURAL_DISASTERS,
            Self::PoliticalEvent => POLITICAL_EVENTS,
            Self::EconomicEvent => ECONOMIC_EVENTS,
            Self::InternationalPressure => INTERNATIONAL_PRESSURE,
            Self::MilitaryDevelopment => MILITARY_DEVELOPMENTS,
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effects as written in a template, relative to the target
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectSpec {
    /// Military efficiency multipliers (target, opponent)
    pub military: Option<(f64, f64)>,
    /// Fractional GDP change (target, opponent)
    pub gdp: Option<(f64, f64)>,
    /// Territory points gained by the target, taken from the opponent
    pub territory: Option<f64>,
    pub diplomacy: Option<f64>,
    /// Ticks of recurring effect; 0 means the event is instantaneous
    pub duration: u32,
}

const NO_EFFECT: EffectSpec = EffectSpec {
    military: None,
    gdp: None,
    territory: None,
    diplomacy: None,
    duration: 0,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EventTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub targeted: bool,
    pub effects: EffectSpec,
}

pub const NATURAL_DISASTERS: &[EventTemplate] = &[
    EventTemplate {
        name: "Earthquake",
        description: "a devastating earthquake strikes {country}, crippling infrastructure",
        targeted: true,
        effects: EffectSpec { gdp: Some((-0.05, 0.0)), military: Some((0.9, 1.0)), ..NO_EFFECT },
    },
    EventTemplate {
        name: "Flooding",
        description: "severe flooding sweeps across {country}",
        targeted: true,
        effects: EffectSpec { gdp: Some((-0.03, 0.0)), duration: 3, ..NO_EFFECT },
    },
    EventTemplate {
        name: "Wildfires",
        description: "wildfires rage through the supply regions of {country}",
        targeted: true,
        effects: EffectSpec { gdp: Some((-0.02, 0.0)), military: Some((0.9, 1.0)), duration: 2, ..NO_EFFECT },
    },
    EventTemplate {
        name: "Drought",
        description: "a prolonged drought grips {country}",
        targeted: true,
        effects: EffectSpec { gdp: Some((-0.04, 0.0)), duration: 4, ..NO_EFFECT },
    },
    EventTemplate {
        name: "Pandemic",
        description: "a pandemic spreads through both warring nations",
        targeted: false,
        effects: EffectSpec { gdp: Some((-0.03, -0.03)), military: Some((0.9, 0.9)), duration: 5, ..NO_EFFECT },
    },
];

pub const POLITICAL_EVENTS: &[EventTemplate] = &[
    EventTemplate {
        name: "Government collapse",
        description: "the government of {country} collapses amid infighting",
        targeted: true,
        effects: EffectSpec { military: Some((0.8, 1.0)), gdp: Some((-0.02, 0.0)), ..NO_EFFECT },
    },
    EventTemplate {
        name: "Mass protests",
        description: "anti-war protests fill the streets of {country}",
        targeted: true,
        effects: EffectSpec { military: Some((0.9, 1.0)), diplomacy: Some(1.0), duration: 3, ..NO_EFFECT },
    },
    EventTemplate {
        name: "Leadership change",
        description: "new leadership in {country} signals openness to talks",
        targeted: true,
        effects: EffectSpec { diplomacy: Some(2.0), ..NO_EFFECT },
    },
    EventTemplate {
        name: "Election upset",
        description: "a surprise election result shakes the war cabinet of {country}",
        targeted: true,
        effects: EffectSpec { military: Some((0.95, 1.0)), diplomacy: Some(1.5), ..NO_EFFECT },
    },
    EventTemplate {
        name: "Nationalist surge",
        description: "a wave of nationalism boosts recruitment in {country}",
        targeted: true,
        effects: EffectSpec { military: Some((1.15, 1.0)), duration: 3, ..NO_EFFECT },
    },
];

pub const ECONOMIC_EVENTS: &[EventTemplate] = &[
    EventTemplate {
        name: "Trade embargo",
        description: "{opponent} and its partners impose a trade embargo on {country}",
        targeted: true,
        effects: EffectSpec { gdp: Some((-0.04, -0.01)), duration: 4, ..NO_EFFECT },
    },
    EventTemplate {
        name: "Market crash",
        description: "financial markets in {country} crash",
        targeted: true,
        effects: EffectSpec { gdp: Some((-0.08, 0.0)), ..NO_EFFECT },
    },
    EventTemplate {
        name: "Resource discovery",
        description: "{country} discovers vast new resource deposits",
        targeted: true,
        effects: EffectSpec { gdp: Some((0.05, 0.0)), ..NO_EFFECT },
    },
    EventTemplate {
        name: "Currency crisis",
        description: "the currency of {country} goes into free fall",
        targeted: true,
        effects: EffectSpec { gdp: Some((-0.06, 0.0)), duration: 2, ..NO_EFFECT },
    },
    EventTemplate {
        name: "Foreign investment",
        description: "foreign investors pour capital into {country}",
        targeted: true,
        effects: EffectSpec { gdp: Some((0.03, 0.0)), duration: 3, ..NO_EFFECT },
    },
];

pub const INTERNATIONAL_PRESSURE: &[EventTemplate] = &[
    EventTemplate {
        name: "UN resolution",
        description: "the UN Security Council demands an immediate ceasefire",
        targeted: false,
        effects: EffectSpec { diplomacy: Some(3.0), ..NO_EFFECT },
    },
    EventTemplate {
        name: "Sanctions",
        description: "international sanctions target {country}",
        targeted: true,
        effects: EffectSpec { gdp: Some((-0.05, 0.0)), diplomacy: Some(1.0), duration: 5, ..NO_EFFECT },
    },
    EventTemplate {
        name: "Peace summit",
        description: "neutral powers convene a peace summit between {country} and {opponent}",
        targeted: true,
        effects: EffectSpec { diplomacy: Some(2.5), ..NO_EFFECT },
    },
    EventTemplate {
        name: "Arms embargo",
        description: "an international arms embargo is placed on {country}",
        targeted: true,
        effects: EffectSpec { military: Some((0.85, 1.0)), duration: 4, ..NO_EFFECT },
    },
    EventTemplate {
        name: "Foreign aid",
        description: "allies of {country} send military and economic aid",
        targeted: true,
        effects: EffectSpec { gdp: Some((0.04, 0.0)), military: Some((1.05, 1.0)), duration: 2, ..NO_EFFECT },
    },
];

pub const MILITARY_DEVELOPMENTS: &[EventTemplate] = &[
    EventTemplate {
        name: "Breakthrough offensive",
        description: "{country} breaks through the lines of {opponent}",
        targeted: true,
        effects: EffectSpec { territory: Some(4.0), ..NO_EFFECT },
    },
    EventTemplate {
        name: "Supply lines cut",
        description: "the supply lines of {country} are severed",
        targeted: true,
        effects: EffectSpec { military: Some((0.8, 1.0)), territory: Some(-2.0), duration: 2, ..NO_EFFECT },
    },
    EventTemplate {
        name: "New weapons system",
        description: "{country} fields a new weapons system",
        targeted: true,
        effects: EffectSpec { military: Some((1.2, 1.0)), duration: 5, ..NO_EFFECT },
    },
    EventTemplate {
        name: "Mass mobilisation",
        description: "{country} orders a general mobilisation",
        targeted: true,
        effects: EffectSpec { military: Some((1.1, 1.0)), gdp: Some((-0.02, 0.0)), duration: 3, ..NO_EFFECT },
    },
    EventTemplate {
        name: "Strategic retreat",
        description: "{country} pulls back to shorten its defensive lines",
        targeted: true,
        effects: EffectSpec { territory: Some(-3.0), military: Some((1.05, 1.0)), ..NO_EFFECT },
    },
];
