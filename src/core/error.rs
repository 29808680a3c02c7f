use thiserror::Error;

/// Invalid country reference data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CountryError {
    #[error("Country data is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Country '{0}' has an empty name or code")]
    EmptyIdentity(String),

    #[error("Military expenditure for '{country}' must be non-negative, got {value}")]
    NegativeExpenditure { country: String, value: f64 },

    #[error("Duplicate country code in roster: {0}")]
    DuplicateCode(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConflictError {
    #[error("A conflict requires two distinct countries, got '{0}' twice")]
    SameCountry(String),

    #[error("Invalid country in conflict: {0}")]
    InvalidCountry(String),

    #[error("Conflict between {0} has already ended")]
    AlreadyEnded(String),

    #[error("Conflict state is corrupt: {0}")]
    CorruptState(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventError {
    #[error("Event probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),
}

/// Validation failures from the prediction ledger
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("Invalid countries: both countries must have a name and code")]
    InvalidCountries,

    #[error("Winner must be 0 or 1")]
    InvalidWinner,

    #[error("Confidence must be an integer between 1 and 10")]
    InvalidConfidence,

    #[error("A prediction already exists for {0} vs {1}")]
    AlreadyExists(String, String),

    #[error("Prediction not found: {0}")]
    NotFound(String),

    #[error("Prediction {0} has already been resolved")]
    AlreadyResolved(String),

    #[error("No active conflict")]
    NoActiveConflict,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("At least 2 countries are required, got {0}")]
    NotEnoughCountries(usize),

    #[error("Tick interval must be a positive number of milliseconds up to one day, got {0}")]
    InvalidInterval(f64),

    #[error("Speed must be positive")]
    SpeedNotPositive,

    #[error("Maximum speed is 8x")]
    SpeedTooHigh,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),
}

/// Crate-level error
#[derive(Error, Debug)]
pub enum SimError {
    #[error(transparent)]
    Country(#[from] CountryError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
