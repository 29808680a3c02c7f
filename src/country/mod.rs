//! Country reference data and derived combat/economic metrics
//!
//! A [`Country`] is an immutable value object. Construction goes through
//! [`CountryRecord`] so that incomplete reference data is rejected up
//! front instead of producing a half-filled nation.

pub mod roster;

use serde::{Deserialize, Serialize};

use crate::core::error::CountryError;
use crate::core::types::round2;

pub use roster::{default_roster, load_roster, parse_roster};

/// Mean Earth radius used for great-circle distances (km)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance at which geographic advantage bottoms out (km)
pub const MAX_RELEVANT_DISTANCE_KM: f64 = 20_000.0;

/// Nuclear-armed nations get this multiplier on military strength
pub const NUCLEAR_MULTIPLIER: f64 = 1.5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Military {
    pub personnel: u64,
    /// Annual spend in USD
    pub expenditure: f64,
    #[serde(default)]
    pub nuclear: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Economy {
    /// Nominal GDP in USD
    pub gdp: f64,
    #[serde(default)]
    pub gdp_per_capita: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geography {
    /// Capital coordinates as [latitude, longitude] in degrees
    pub capital: [f64; 2],
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub population: u64,
    #[serde(default)]
    pub borders: Vec<String>,
}

/// Raw, possibly incomplete country data as it arrives from a roster file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CountryRecord {
    pub name: Option<String>,
    pub code: Option<String>,
    pub military: Option<Military>,
    pub economy: Option<Economy>,
    pub geography: Option<Geography>,
    #[serde(default)]
    pub alliances: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
}

/// A nation taking part in conflicts
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CountryRecord")]
pub struct Country {
    name: String,
    code: String,
    military: Military,
    economy: Economy,
    geography: Geography,
    alliances: Vec<String>,
    resources: Vec<String>,
}

impl TryFrom<CountryRecord> for Country {
    type Error = CountryError;

    fn try_from(record: CountryRecord) -> Result<Self, Self::Error> {
        let name = record.name.ok_or(CountryError::MissingField("name"))?;
        let code = record.code.ok_or(CountryError::MissingField("code"))?;
        let military = record.military.ok_or(CountryError::MissingField("military"))?;
        let economy = record.economy.ok_or(CountryError::MissingField("economy"))?;
        let geography = record.geography.ok_or(CountryError::MissingField("geography"))?;

        if name.trim().is_empty() || code.trim().is_empty() {
            return Err(CountryError::EmptyIdentity(name));
        }

        // NaN fails this check as well
        if !(military.expenditure >= 0.0) {
            return Err(CountryError::NegativeExpenditure {
                country: name,
                value: military.expenditure,
            });
        }

        Ok(Self {
            name,
            code,
            military,
            economy,
            geography,
            alliances: record.alliances,
            resources: record.resources,
        })
    }
}

/// Name and code of a country, detached from the live roster
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountryRef {
    pub name: String,
    pub code: String,
}

impl CountryRef {
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && !self.code.trim().is_empty()
    }
}

impl From<&Country> for CountryRef {
    fn from(country: &Country) -> Self {
        Self {
            name: country.name.clone(),
            code: country.code.clone(),
        }
    }
}

impl Country {
    /// Build a country from its required parts
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        military: Military,
        economy: Economy,
        geography: Geography,
    ) -> Result<Self, CountryError> {
        Self::try_from(CountryRecord {
            name: Some(name.into()),
            code: Some(code.into()),
            military: Some(military),
            economy: Some(economy),
            geography: Some(geography),
            ..CountryRecord::default()
        })
    }

    pub fn with_alliances<I, S>(mut self, alliances: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alliances = alliances.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = resources.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn military(&self) -> &Military {
        &self.military
    }

    pub fn economy(&self) -> &Economy {
        &self.economy
    }

    pub fn geography(&self) -> &Geography {
        &self.geography
    }

    pub fn alliances(&self) -> &[String] {
        &self.alliances
    }

    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    pub fn is_nuclear(&self) -> bool {
        self.military.nuclear
    }

    /// Military strength score
    ///
    /// 100 points per million personnel plus 50 points per billion USD of
    /// expenditure, times 1.5 for nuclear powers.
    pub fn military_strength(&self) -> f64 {
        let personnel_score = self.military.personnel as f64 / 1_000_000.0 * 100.0;
        let spend_score = self.military.expenditure / 1_000_000_000.0 * 50.0;
        let mut strength = personnel_score + spend_score;
        if self.military.nuclear {
            strength *= NUCLEAR_MULTIPLIER;
        }
        round2(strength)
    }

    /// 100 points per trillion USD of GDP
    pub fn economic_power(&self) -> f64 {
        round2(self.economy.gdp / 1_000_000_000_000.0 * 100.0)
    }

    /// Great-circle distance between the two capitals (km)
    pub fn distance_to(&self, other: &Country) -> f64 {
        haversine_km(self.geography.capital, other.geography.capital)
    }

    /// 1.0 for neighbours, falling linearly to 0.0 at 20,000 km
    pub fn geographic_advantage(&self, other: &Country) -> f64 {
        let normalized = (self.distance_to(other) / MAX_RELEVANT_DISTANCE_KM).min(1.0);
        round2(1.0 - normalized)
    }

    /// Case-insensitive alliance membership
    pub fn has_alliance(&self, name: &str) -> bool {
        self.alliances.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

/// Haversine distance between two [lat, lon] points in degrees
pub fn haversine_km(a: [f64; 2], b: [f64; 2]) -> f64 {
    let (lat1, lon1) = (a[0].to_radians(), a[1].to_radians());
    let (lat2, lon2) = (b[0].to_radians(), b[1].to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_country(name: &str, code: &str, personnel: u64, expenditure: f64, nuclear: bool, gdp: f64) -> Country {
        Country::new(
            name,
            code,
            Military { personnel, expenditure, nuclear },
            Economy { gdp, gdp_per_capita: 10_000.0 },
            Geography { capital: [0.0, 0.0], area: 1.0, population: 1_000_000, borders: vec![] },
        )
        .unwrap()
    }

    #[test]
    fn test_military_strength_formula() {
        let c = test_country("Alpha", "ALP", 2_000_000, 100_000_000_000.0, false, 1e12);
        // 200 + 5000
        assert_eq!(c.military_strength(), 5200.0);

        let nuclear = test_country("Beta", "BET", 2_000_000, 100_000_000_000.0, true, 1e12);
        assert_eq!(nuclear.military_strength(), 7800.0);
    }

    #[test]
    fn test_military_strength_monotonic() {
        let small = test_country("A", "A", 100_000, 1e9, false, 1e12);
        let more_troops = test_country("B", "B", 200_000, 1e9, false, 1e12);
        let more_spend = test_country("C", "C", 100_000, 2e9, false, 1e12);
        assert!(more_troops.military_strength() > small.military_strength());
        assert!(more_spend.military_strength() > small.military_strength());
    }

    #[test]
    fn test_economic_power() {
        let c = test_country("A", "A", 0, 0.0, false, 2.5e12);
        assert_eq!(c.economic_power(), 250.0);
    }

    #[test]
    fn test_geographic_advantage() {
        let mut record = CountryRecord {
            name: Some("Here".into()),
            code: Some("HER".into()),
            military: Some(Military { personnel: 1, expenditure: 1.0, nuclear: false }),
            economy: Some(Economy { gdp: 1.0, gdp_per_capita: 1.0 }),
            geography: Some(Geography { capital: [0.0, 0.0], area: 1.0, population: 1, borders: vec![] }),
            ..CountryRecord::default()
        };
        let here = Country::try_from(record.clone()).unwrap();
        assert_eq!(here.geographic_advantage(&here), 1.0);

        // Antipode is ~20,015 km away, beyond the cap
        record.code = Some("FAR".into());
        record.geography.as_mut().unwrap().capital = [0.0, 180.0];
        let far = Country::try_from(record).unwrap();
        assert_eq!(here.geographic_advantage(&far), 0.0);
        assert_eq!(far.geographic_advantage(&here), here.geographic_advantage(&far));
    }

    #[test]
    fn test_haversine_known_distance() {
        // Washington DC to Beijing is roughly 11,150 km
        let d = haversine_km([38.9072, -77.0369], [39.9042, 116.4074]);
        assert!((d - 11_150.0).abs() < 100.0, "distance was {d}");
    }

    #[test]
    fn test_has_alliance_case_insensitive() {
        let c = test_country("A", "A", 1, 1.0, false, 1.0).with_alliances(["NATO", "G7"]);
        assert!(c.has_alliance("nato"));
        assert!(c.has_alliance("G7"));
        assert!(!c.has_alliance("SCO"));
    }

    #[test]
    fn test_missing_field_rejected() {
        let record = CountryRecord {
            name: Some("Nowhere".into()),
            code: Some("NOW".into()),
            military: None,
            ..CountryRecord::default()
        };
        assert_eq!(Country::try_from(record), Err(CountryError::MissingField("military")));
    }

    #[test]
    fn test_negative_expenditure_rejected() {
        let result = Country::new(
            "Broke",
            "BRK",
            Military { personnel: 1, expenditure: -5.0, nuclear: false },
            Economy { gdp: 1.0, gdp_per_capita: 1.0 },
            Geography { capital: [0.0, 0.0], area: 1.0, population: 1, borders: vec![] },
        );
        assert!(matches!(result, Err(CountryError::NegativeExpenditure { .. })));
    }

    #[test]
    fn test_deserialize_goes_through_validation() {
        let json = r#"{"name":"Partial","code":"PRT","economy":{"gdp":1.0}}"#;
        let result: Result<Country, _> = serde_json::from_str(json);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("military"), "unexpected error: {err}");
    }
}
