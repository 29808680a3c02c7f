//! Country rosters: the built-in default set and TOML roster files

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::core::error::{CountryError, Result};
use crate::country::{Country, Economy, Geography, Military};

#[derive(Deserialize)]
struct RosterFile {
    countries: Vec<Country>,
}

/// Load a roster from a TOML file of `[[countries]]` tables
pub fn load_roster(path: &Path) -> Result<Vec<Country>> {
    let content = fs::read_to_string(path)?;
    parse_roster(&content)
}

pub fn parse_roster(content: &str) -> Result<Vec<Country>> {
    let file: RosterFile = toml::from_str(content)?;
    check_unique_codes(&file.countries)?;
    tracing::debug!(count = file.countries.len(), "Loaded country roster");
    Ok(file.countries)
}

fn check_unique_codes(countries: &[Country]) -> std::result::Result<(), CountryError> {
    let mut seen = HashSet::new();
    for country in countries {
        if !seen.insert(country.code().to_ascii_uppercase()) {
            return Err(CountryError::DuplicateCode(country.code().to_string()));
        }
    }
    Ok(())
}

struct Seed {
    name: &'static str,
    code: &'static str,
    personnel: u64,
    expenditure: f64,
    nuclear: bool,
    gdp: f64,
    gdp_per_capita: f64,
    capital: [f64; 2],
    area: f64,
    population: u64,
    borders: &'static [&'static str],
    alliances: &'static [&'static str],
    resources: &'static [&'static str],
}

const DEFAULT_SEEDS: &[Seed] = &[
    Seed {
        name: "United States",
        code: "USA",
        personnel: 1_390_000,
        expenditure: 877e9,
        nuclear: true,
        gdp: 25.46e12,
        gdp_per_capita: 76_330.0,
        capital: [38.9072, -77.0369],
        area: 9_833_520.0,
        population: 333_287_557,
        borders: &["CAN", "MEX"],
        alliances: &["NATO", "G7", "AUKUS"],
        resources: &["oil", "natural gas", "coal", "grain"],
    },
    Seed {
        name: "China",
        code: "CHN",
        personnel: 2_035_000,
        expenditure: 292e9,
        nuclear: true,
        gdp: 17.96e12,
        gdp_per_capita: 12_720.0,
        capital: [39.9042, 116.4074],
        area: 9_596_961.0,
        population: 1_412_175_000,
        borders: &["IND", "RUS", "PRK", "VNM"],
        alliances: &["SCO", "BRICS"],
        resources: &["rare earths", "coal", "steel"],
    },
    Seed {
        name: "Russia",
        code: "RUS",
        personnel: 1_150_000,
        expenditure: 86e9,
        nuclear: true,
        gdp: 2.24e12,
        gdp_per_capita: 15_270.0,
        capital: [55.7558, 37.6173],
        area: 17_098_246.0,
        population: 143_400_000,
        borders: &["CHN", "UKR", "FIN"],
        alliances: &["CSTO", "SCO", "BRICS"],
        resources: &["oil", "natural gas", "timber"],
    },
    Seed {
        name: "India",
        code: "IND",
        personnel: 1_455_000,
        expenditure: 81e9,
        nuclear: true,
        gdp: 3.39e12,
        gdp_per_capita: 2_390.0,
        capital: [28.6139, 77.2090],
        area: 3_287_263.0,
        population: 1_417_173_000,
        borders: &["CHN", "PAK"],
        alliances: &["SCO", "BRICS", "QUAD"],
        resources: &["coal", "iron ore", "grain"],
    },
    Seed {
        name: "United Kingdom",
        code: "GBR",
        personnel: 150_000,
        expenditure: 68e9,
        nuclear: true,
        gdp: 3.07e12,
        gdp_per_capita: 45_850.0,
        capital: [51.5074, -0.1278],
        area: 243_610.0,
        population: 66_970_000,
        borders: &["IRL"],
        alliances: &["NATO", "G7", "AUKUS"],
        resources: &["oil", "natural gas"],
    },
    Seed {
        name: "France",
        code: "FRA",
        personnel: 203_000,
        expenditure: 53e9,
        nuclear: true,
        gdp: 2.78e12,
        gdp_per_capita: 40_890.0,
        capital: [48.8566, 2.3522],
        area: 551_695.0,
        population: 68_040_000,
        borders: &["DEU", "ESP", "ITA"],
        alliances: &["NATO", "G7", "EU"],
        resources: &["grain", "uranium"],
    },
    Seed {
        name: "Germany",
        code: "DEU",
        personnel: 183_000,
        expenditure: 56e9,
        nuclear: false,
        gdp: 4.07e12,
        gdp_per_capita: 48_720.0,
        capital: [52.5200, 13.4050],
        area: 357_022.0,
        population: 83_800_000,
        borders: &["FRA", "POL", "AUT"],
        alliances: &["NATO", "G7", "EU"],
        resources: &["coal", "timber"],
    },
    Seed {
        name: "Japan",
        code: "JPN",
        personnel: 247_000,
        expenditure: 46e9,
        nuclear: false,
        gdp: 4.23e12,
        gdp_per_capita: 33_820.0,
        capital: [35.6762, 139.6503],
        area: 377_975.0,
        population: 125_100_000,
        borders: &[],
        alliances: &["G7", "QUAD"],
        resources: &["fish", "electronics"],
    },
    Seed {
        name: "Brazil",
        code: "BRA",
        personnel: 366_000,
        expenditure: 20e9,
        nuclear: false,
        gdp: 1.92e12,
        gdp_per_capita: 8_920.0,
        capital: [-15.7939, -47.8828],
        area: 8_515_767.0,
        population: 215_300_000,
        borders: &["ARG", "COL", "PER"],
        alliances: &["BRICS", "MERCOSUR"],
        resources: &["iron ore", "soy", "timber"],
    },
    Seed {
        name: "Turkey",
        code: "TUR",
        personnel: 355_000,
        expenditure: 11e9,
        nuclear: false,
        gdp: 0.91e12,
        gdp_per_capita: 10_670.0,
        capital: [39.9334, 32.8597],
        area: 783_562.0,
        population: 85_280_000,
        borders: &["GRC", "IRN", "SYR"],
        alliances: &["NATO"],
        resources: &["chromium", "boron"],
    },
];

/// Built-in roster of major nations
pub fn default_roster() -> Vec<Country> {
    DEFAULT_SEEDS
        .iter()
        .filter_map(|seed| {
            let country = Country::new(
                seed.name,
                seed.code,
                Military {
                    personnel: seed.personnel,
                    expenditure: seed.expenditure,
                    nuclear: seed.nuclear,
                },
                Economy {
                    gdp: seed.gdp,
                    gdp_per_capita: seed.gdp_per_capita,
                },
                Geography {
                    capital: seed.capital,
                    area: seed.area,
                    population: seed.population,
                    borders: seed.borders.iter().map(|b| b.to_string()).collect(),
                },
            );
            match country {
                Ok(c) => Some(
                    c.with_alliances(seed.alliances.iter().copied())
                        .with_resources(seed.resources.iter().copied()),
                ),
                Err(e) => {
                    tracing::warn!("Skipping built-in country {}: {}", seed.code, e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster_is_complete() {
        let roster = default_roster();
        assert_eq!(roster.len(), DEFAULT_SEEDS.len());
        assert!(check_unique_codes(&roster).is_ok());
        assert!(roster.iter().any(|c| c.code() == "USA" && c.is_nuclear()));
    }

    #[test]
    fn test_parse_roster_toml() {
        let toml = r#"
[[countries]]
name = "Northland"
code = "NTH"
alliances = ["Frost Pact"]
military = { personnel = 50000, expenditure = 1e9, nuclear = false }
economy = { gdp = 1e11, gdpPerCapita = 20000.0 }
geography = { capital = [60.0, 10.0], area = 1000.0, population = 5000000 }

[[countries]]
name = "Southland"
code = "STH"
military = { personnel = 80000, expenditure = 2e9 }
economy = { gdp = 2e11 }
geography = { capital = [-30.0, 20.0] }
"#;
        let roster = parse_roster(toml).unwrap();
        assert_eq!(roster.len(), 2);
        assert!(roster[0].has_alliance("frost pact"));
        assert!(!roster[1].is_nuclear());
    }

    #[test]
    fn test_parse_roster_rejects_duplicates() {
        let toml = r#"
[[countries]]
name = "One"
code = "DUP"
military = { personnel = 1, expenditure = 1.0 }
economy = { gdp = 1.0 }
geography = { capital = [0.0, 0.0] }

[[countries]]
name = "Two"
code = "dup"
military = { personnel = 1, expenditure = 1.0 }
economy = { gdp = 1.0 }
geography = { capital = [1.0, 1.0] }
"#;
        assert!(parse_roster(toml).is_err());
    }

    #[test]
    fn test_parse_roster_rejects_missing_geography() {
        let toml = r#"
[[countries]]
name = "Lost"
code = "LST"
military = { personnel = 1, expenditure = 1.0 }
economy = { gdp = 1.0 }
"#;
        assert!(parse_roster(toml).is_err());
    }
}
