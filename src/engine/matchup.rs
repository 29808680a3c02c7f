//! Matchup providers: choose which two countries fight next

use rand::{Rng, RngCore};

use crate::core::error::EngineError;
use crate::country::Country;

pub trait MatchupProvider: Send {
    /// Two countries with distinct codes from the roster
    fn next_pair(&mut self, countries: &[Country], rng: &mut dyn RngCore) -> Result<(Country, Country), EngineError>;
}

/// Uniformly random distinct pair
#[derive(Clone, Debug, Default)]
pub struct RandomMatchup;

impl MatchupProvider for RandomMatchup {
    fn next_pair(&mut self, countries: &[Country], rng: &mut dyn RngCore) -> Result<(Country, Country), EngineError> {
        if countries.len() < 2 {
            return Err(EngineError::NotEnoughCountries(countries.len()));
        }

        let first = rng.gen_range(0..countries.len());
        let candidates: Vec<usize> = (0..countries.len())
            .filter(|&i| !countries[i].code().eq_ignore_ascii_case(countries[first].code()))
            .collect();
        if candidates.is_empty() {
            return Err(EngineError::NotEnoughCountries(1));
        }
        let second = candidates[rng.gen_range(0..candidates.len())];

        Ok((countries[first].clone(), countries[second].clone()))
    }
}

/// Cycles through every unordered pair in roster order
#[derive(Clone, Debug, Default)]
pub struct RotatingMatchup {
    cursor: usize,
}

impl RotatingMatchup {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MatchupProvider for RotatingMatchup {
    fn next_pair(&mut self, countries: &[Country], _rng: &mut dyn RngCore) -> Result<(Country, Country), EngineError> {
        let pairs: Vec<(usize, usize)> = (0..countries.len())
            .flat_map(|i| ((i + 1)..countries.len()).map(move |j| (i, j)))
            .filter(|&(i, j)| !countries[i].code().eq_ignore_ascii_case(countries[j].code()))
            .collect();
        if pairs.is_empty() {
            return Err(EngineError::NotEnoughCountries(countries.len().min(1)));
        }

        let (i, j) = pairs[self.cursor % pairs.len()];
        self.cursor = self.cursor.wrapping_add(1);
        Ok((countries[i].clone(), countries[j].clone()))
    }
}
