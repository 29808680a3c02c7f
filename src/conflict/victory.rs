//! Victory evaluation
//!
//! Conditions are checked in a fixed priority order. The first two are
//! deterministic thresholds; the last two are rolls whose chance grows
//! with the length and the cost of the war.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::conflict::state::Conflict;
use crate::core::types::{opponent, Side};

/// Territory share that wins outright
pub const TERRITORIAL_VICTORY_THRESHOLD: f64 = 75.0;

/// GDP ratio (current / initial) at or below which an economy collapses
pub const ECONOMIC_COLLAPSE_RATIO: f64 = 0.3;

/// Ticks over which the diplomatic chance ramps up to its maximum
pub const DIPLOMATIC_RAMP_TICKS: f64 = 500.0;
pub const DIPLOMATIC_MAX_CHANCE: f64 = 0.05;
/// Extra diplomatic chance per point of accumulated diplomacy bonus
pub const DIPLOMACY_BONUS_WEIGHT: f64 = 0.01;

/// Casualties at which the intervention chance reaches its maximum
pub const INTERVENTION_CASUALTY_SCALE: f64 = 5_000_000.0;
pub const INTERVENTION_MAX_CHANCE: f64 = 0.05;

/// Per-tick roll chances never exceed this
pub const MAX_ROLL_CHANCE: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VictoryCondition {
    TerritorialControl,
    EconomicCollapse,
    DiplomaticResolution,
    InternationalIntervention,
}

impl VictoryCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TerritorialControl => "territorial_control",
            Self::EconomicCollapse => "economic_collapse",
            Self::DiplomaticResolution => "diplomatic_resolution",
            Self::InternationalIntervention => "international_intervention",
        }
    }
}

impl fmt::Display for VictoryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decided conflict
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Victory {
    pub winner: Side,
    pub condition: VictoryCondition,
    pub description: String,
}

/// Chance of a negotiated end this tick
pub fn diplomatic_chance(conflict: &Conflict) -> f64 {
    let ramp = (conflict.duration as f64 / DIPLOMATIC_RAMP_TICKS).min(1.0);
    let bonus = conflict.modifiers.diplomacy_bonus.max(0.0) * DIPLOMACY_BONUS_WEIGHT;
    (ramp * DIPLOMATIC_MAX_CHANCE + bonus).clamp(0.0, MAX_ROLL_CHANCE)
}

/// Chance that outside powers force an end this tick
pub fn intervention_chance(conflict: &Conflict) -> f64 {
    let scale = (conflict.total_casualties as f64 / INTERVENTION_CASUALTY_SCALE).min(1.0);
    (scale * INTERVENTION_MAX_CHANCE).clamp(0.0, MAX_ROLL_CHANCE)
}

fn roll<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    chance > 0.0 && rng.gen::<f64>() < chance
}

pub(crate) fn evaluate<R: Rng + ?Sized>(conflict: &Conflict, rng: &mut R) -> Option<Victory> {
    let names = [conflict.countries[0].name(), conflict.countries[1].name()];
    let territory = conflict.territory_control;

    // 1. Territorial control
    if let Some(winner) = (0..2).find(|&side| territory[side] >= TERRITORIAL_VICTORY_THRESHOLD) {
        return Some(Victory {
            winner,
            condition: VictoryCondition::TerritorialControl,
            description: format!(
                "{} controls {:.1}% of contested territory and forces {} to capitulate",
                names[winner],
                territory[winner],
                names[opponent(winner)]
            ),
        });
    }

    // 2. Economic collapse; if both collapse, the deeper collapse loses
    let ratios = [conflict.gdp_ratio(0), conflict.gdp_ratio(1)];
    let collapsed = [ratios[0] <= ECONOMIC_COLLAPSE_RATIO, ratios[1] <= ECONOMIC_COLLAPSE_RATIO];
    let loser = match collapsed {
        [true, true] => Some(if ratios[0] <= ratios[1] { 0 } else { 1 }),
        [true, false] => Some(0),
        [false, true] => Some(1),
        [false, false] => None,
    };
    if let Some(loser) = loser {
        let winner = opponent(loser);
        return Some(Victory {
            winner,
            condition: VictoryCondition::EconomicCollapse,
            description: format!(
                "The economy of {} collapses to {:.0}% of its pre-war output; {} prevails",
                names[loser],
                ratios[loser] * 100.0,
                names[winner]
            ),
        });
    }

    // 3. Diplomatic resolution
    if roll(rng, diplomatic_chance(conflict)) {
        let winner = diplomatic_winner(conflict);
        return Some(Victory {
            winner,
            condition: VictoryCondition::DiplomaticResolution,
            description: format!(
                "After {} rounds of fighting, negotiations end the war on terms favouring {}",
                conflict.duration, names[winner]
            ),
        });
    }

    // 4. International intervention
    if roll(rng, intervention_chance(conflict)) {
        let winner = intervention_winner(conflict);
        return Some(Victory {
            winner,
            condition: VictoryCondition::InternationalIntervention,
            description: format!(
                "With {} casualties, the international community intervenes in support of {}",
                conflict.total_casualties, names[winner]
            ),
        });
    }

    None
}

/// More territory wins the negotiation; ties go to the larger economy, then side 0
fn diplomatic_winner(conflict: &Conflict) -> Side {
    let t = conflict.territory_control;
    if t[0] != t[1] {
        return if t[0] > t[1] { 0 } else { 1 };
    }
    let e0 = conflict.countries[0].economic_power();
    let e1 = conflict.countries[1].economic_power();
    if e1 > e0 { 1 } else { 0 }
}

/// Intervening powers back the better-allied side; ties fall back to territory
fn intervention_winner(conflict: &Conflict) -> Side {
    let a0 = conflict.countries[0].alliances().len();
    let a1 = conflict.countries[1].alliances().len();
    if a0 != a1 {
        return if a0 > a1 { 0 } else { 1 };
    }
    if conflict.territory_control[1] > conflict.territory_control[0] { 1 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country::tests::test_country;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const TRIALS: usize = 20_000;

    fn conflict_with(first_gdp: f64, second_gdp: f64) -> Conflict {
        Conflict::new(
            test_country("Left", "LFT", 500_000, 50e9, false, first_gdp),
            test_country("Right", "RGT", 500_000, 50e9, false, second_gdp),
        )
        .unwrap()
    }

    fn count(conflict: &Conflict, seed: u64, condition: VictoryCondition) -> usize {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..TRIALS)
            .filter_map(|_| evaluate(conflict, &mut rng))
            .filter(|victory| victory.condition == condition)
            .count()
    }

    #[test]
    fn test_fresh_war_never_ends() {
        let conflict = conflict_with(2e12, 2e12);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!((0..TRIALS).all(|_| evaluate(&conflict, &mut rng).is_none()));
    }

    #[test]
    fn test_diplomatic_rolls_fire_by_tick_100() {
        let mut conflict = conflict_with(2e12, 2e12);
        conflict.duration = 100;
        assert!((diplomatic_chance(&conflict) - 0.01).abs() < 1e-12);

        // expected ~200 of 20k
        let hits = count(&conflict, 2, VictoryCondition::DiplomaticResolution);
        assert!((120..=300).contains(&hits), "diplomatic hits: {hits}");
    }

    #[test]
    fn test_intervention_rolls_fire_at_a_million_casualties() {
        let mut conflict = conflict_with(2e12, 2e12);
        conflict.total_casualties = 1_000_000;
        assert_eq!(diplomatic_chance(&conflict), 0.0);
        assert!((intervention_chance(&conflict) - 0.01).abs() < 1e-12);

        let hits = count(&conflict, 3, VictoryCondition::InternationalIntervention);
        assert!((120..=300).contains(&hits), "intervention hits: {hits}");
    }

    #[test]
    fn test_chances_grow_with_duration_and_casualties() {
        let mut conflict = conflict_with(2e12, 2e12);

        let mut previous = 0.0;
        for duration in (0..=1_000).step_by(25) {
            conflict.duration = duration;
            let chance = diplomatic_chance(&conflict);
            assert!(chance >= previous);
            previous = chance;
        }
        assert_eq!(previous, DIPLOMATIC_MAX_CHANCE);

        conflict.modifiers.diplomacy_bonus = 2.0;
        assert!(diplomatic_chance(&conflict) > previous);
        conflict.modifiers.diplomacy_bonus = 1_000.0;
        assert_eq!(diplomatic_chance(&conflict), MAX_ROLL_CHANCE);

        let mut previous = 0.0;
        for casualties in (0..=10_000_000u64).step_by(250_000) {
            conflict.total_casualties = casualties;
            let chance = intervention_chance(&conflict);
            assert!(chance >= previous);
            previous = chance;
        }
        assert_eq!(previous, INTERVENTION_MAX_CHANCE);
    }

    #[test]
    fn test_diplomatic_winner_tie_rules() {
        let mut conflict = conflict_with(1e12, 3e12);

        conflict.territory_control = [60.0, 40.0];
        assert_eq!(diplomatic_winner(&conflict), 0);
        conflict.territory_control = [40.0, 60.0];
        assert_eq!(diplomatic_winner(&conflict), 1);

        // level ground: the larger economy negotiates better terms
        conflict.territory_control = [50.0, 50.0];
        assert_eq!(diplomatic_winner(&conflict), 1);

        let even = conflict_with(2e12, 2e12);
        assert_eq!(diplomatic_winner(&even), 0);
    }

    #[test]
    fn test_intervention_winner_tie_rules() {
        let mut conflict = Conflict::new(
            test_country("Left", "LFT", 500_000, 50e9, false, 2e12),
            test_country("Right", "RGT", 500_000, 50e9, false, 2e12).with_alliances(["NATO"]),
        )
        .unwrap();
        conflict.territory_control = [70.0, 30.0];
        assert_eq!(intervention_winner(&conflict), 1);

        let mut even = conflict_with(2e12, 2e12);
        even.territory_control = [45.0, 55.0];
        assert_eq!(intervention_winner(&even), 1);
        even.territory_control = [55.0, 45.0];
        assert_eq!(intervention_winner(&even), 0);
        even.territory_control = [50.0, 50.0];
        assert_eq!(intervention_winner(&even), 0);
    }

    #[test]
    fn test_double_collapse_deeper_collapse_loses() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut conflict = conflict_with(2e12, 2e12);

        conflict.current_gdp = [0.2 * 2e12, 0.1 * 2e12];
        let victory = evaluate(&conflict, &mut rng).unwrap();
        assert_eq!(victory.condition, VictoryCondition::EconomicCollapse);
        assert_eq!(victory.winner, 0);

        conflict.current_gdp = [0.1 * 2e12, 0.2 * 2e12];
        assert_eq!(evaluate(&conflict, &mut rng).unwrap().winner, 1);

        // identical collapse counts against side 0
        conflict.current_gdp = [0.25 * 2e12, 0.25 * 2e12];
        assert_eq!(evaluate(&conflict, &mut rng).unwrap().winner, 1);
    }

    #[test]
    fn test_territory_outranks_collapse() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut conflict = conflict_with(2e12, 2e12);
        conflict.territory_control = [20.0, 80.0];
        conflict.current_gdp[1] = 0.1 * 2e12;

        let victory = evaluate(&conflict, &mut rng).unwrap();
        assert_eq!(victory.condition, VictoryCondition::TerritorialControl);
        assert_eq!(victory.winner, 1);
    }
}
