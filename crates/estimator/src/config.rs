use std::env;
use std::path::PathBuf;

use expense_core::FormBounds;

pub const DEFAULT_FLIGHTS_CSV: &str = "data/flights.csv";
pub const DEFAULT_HOTELS_CSV: &str = "data/hotels.csv";
pub const DEFAULT_PREPROCESSOR_PATH: &str = "data/preprocessor.json";
pub const DEFAULT_MODEL_PATH: &str = "data/model.json";

#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorConfig {
    pub flights_csv: PathBuf,
    pub hotels_csv: PathBuf,
    pub preprocessor_path: PathBuf,
    pub model_path: PathBuf,
    pub enforce_bounds: bool,
    pub bounds: FormBounds,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            flights_csv: PathBuf::from(DEFAULT_FLIGHTS_CSV),
            hotels_csv: PathBuf::from(DEFAULT_HOTELS_CSV),
            preprocessor_path: PathBuf::from(DEFAULT_PREPROCESSOR_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            enforce_bounds: true,
            bounds: FormBounds::default(),
        }
    }
}

impl EstimatorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            flights_csv: env_path("EXPENSE_FLIGHTS_CSV").unwrap_or(defaults.flights_csv),
            hotels_csv: env_path("EXPENSE_HOTELS_CSV").unwrap_or(defaults.hotels_csv),
            preprocessor_path: env_path("EXPENSE_PREPROCESSOR_PATH")
                .unwrap_or(defaults.preprocessor_path),
            model_path: env_path("EXPENSE_MODEL_PATH").unwrap_or(defaults.model_path),
            enforce_bounds: env::var("EXPENSE_ENFORCE_BOUNDS")
                .ok()
                .and_then(|value| parse_flag(&value))
                .unwrap_or(defaults.enforce_bounds),
            bounds: defaults.bounds,
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
