use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const LOCATION_SENTINEL: &str = "Select a location";
pub const PLACE_SENTINEL: &str = "Select a place";
pub const FLIGHT_CLASS_SENTINEL: &str = "Select a flight type";

pub const ESTIMATE_DISPLAY_PREFIX: &str = "Estimated Total Travel Expense:";

pub const MODEL_INPUT_COLUMNS: [&str; 9] = [
    "hotel_price",
    "flight_price",
    "from_location",
    "days",
    "to_location",
    "flightType",
    "distance",
    "place",
    "total_hotel_price",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlightClass {
    Economy,
    Business,
    #[serde(rename = "First Class")]
    FirstClass,
}

impl FlightClass {
    pub const ALL: [Self; 3] = [Self::Economy, Self::Business, Self::FirstClass];

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "Economy" => Some(Self::Economy),
            "Business" => Some(Self::Business),
            "First Class" => Some(Self::FirstClass),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Economy => "Economy",
            Self::Business => "Business",
            Self::FirstClass => "First Class",
        }
    }

    pub fn code(self) -> u64 {
        match self {
            Self::Economy => 0,
            Self::Business => 1,
            Self::FirstClass => 2,
        }
    }

    pub fn options() -> Vec<String> {
        std::iter::once(FLIGHT_CLASS_SENTINEL)
            .chain(Self::ALL.iter().map(|class| class.label()))
            .map(ToString::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionField {
    HotelNightlyPrice,
    FlightPrice,
    Origin,
    Destination,
    Days,
    FlightClassLabel,
    DistanceKm,
    StayPlace,
}

impl SelectionField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HotelNightlyPrice => "hotelNightlyPrice",
            Self::FlightPrice => "flightPrice",
            Self::Origin => "origin",
            Self::Destination => "destination",
            Self::Days => "days",
            Self::FlightClassLabel => "flightClassLabel",
            Self::DistanceKm => "distanceKm",
            Self::StayPlace => "stayPlace",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::HotelNightlyPrice => "Hotel Price",
            Self::FlightPrice => "Flight Price",
            Self::Origin => "From Location",
            Self::Destination => "To Location",
            Self::Days => "Number of Days",
            Self::FlightClassLabel => "Flight Type",
            Self::DistanceKm => "Distance",
            Self::StayPlace => "Place of Stay",
        }
    }
}

impl fmt::Display for SelectionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceCatalog {
    origins: Vec<String>,
    destinations: Vec<String>,
    stay_places: Vec<String>,
}

impl ReferenceCatalog {
    pub fn new<O, D, P>(origins: O, destinations: D, stay_places: P) -> Self
    where
        O: IntoIterator<Item = String>,
        D: IntoIterator<Item = String>,
        P: IntoIterator<Item = String>,
    {
        Self {
            origins: with_sentinel(LOCATION_SENTINEL, origins),
            destinations: with_sentinel(LOCATION_SENTINEL, destinations),
            stay_places: with_sentinel(PLACE_SENTINEL, stay_places),
        }
    }

    pub fn sentinel_only() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }

    pub fn origins(&self) -> &[String] {
        &self.origins
    }

    pub fn destinations(&self) -> &[String] {
        &self.destinations
    }

    pub fn stay_places(&self) -> &[String] {
        &self.stay_places
    }
}

fn with_sentinel(sentinel: &str, values: impl IntoIterator<Item = String>) -> Vec<String> {
    let distinct = values
        .into_iter()
        .filter(|value| value != sentinel)
        .collect::<BTreeSet<_>>();
    std::iter::once(sentinel.to_string())
        .chain(distinct)
        .collect()
}

fn default_location() -> String {
    LOCATION_SENTINEL.to_string()
}

fn default_place() -> String {
    PLACE_SENTINEL.to_string()
}

fn default_flight_class() -> String {
    FLIGHT_CLASS_SENTINEL.to_string()
}

fn default_days() -> u32 {
    FormBounds::default().days.default
}

fn default_distance() -> u32 {
    FormBounds::default().distance_km.default
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSelection {
    #[serde(default)]
    pub hotel_nightly_price: u32,
    #[serde(default)]
    pub flight_price: u32,
    #[serde(default = "default_location")]
    pub origin: String,
    #[serde(default = "default_location")]
    pub destination: String,
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default = "default_flight_class")]
    pub flight_class_label: String,
    #[serde(default = "default_distance")]
    pub distance_km: u32,
    #[serde(default = "default_place")]
    pub stay_place: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSelection {
    pub hotel_nightly_price: u32,
    pub flight_price: u32,
    pub origin: String,
    pub destination: String,
    pub days: u32,
    pub flight_class_label: String,
    pub distance_km: u32,
    pub stay_place: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue<'a> {
    Number(f64),
    Text(&'a str),
}

impl fmt::Display for FeatureValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) if value.fract() == 0.0 && value.is_finite() => {
                write!(f, "{}", *value as i64)
            }
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInputRow {
    pub hotel_price: u64,
    pub flight_price: u64,
    pub from_location: String,
    pub days: u64,
    pub to_location: String,
    #[serde(rename = "flightType")]
    pub flight_type: u64,
    pub distance: u64,
    pub place: String,
    pub total_hotel_price: u64,
}

impl ModelInputRow {
    pub fn columns(&self) -> [(&'static str, FeatureValue<'_>); 9] {
        [
            ("hotel_price", FeatureValue::Number(self.hotel_price as f64)),
            ("flight_price", FeatureValue::Number(self.flight_price as f64)),
            ("from_location", FeatureValue::Text(&self.from_location)),
            ("days", FeatureValue::Number(self.days as f64)),
            ("to_location", FeatureValue::Text(&self.to_location)),
            ("flightType", FeatureValue::Number(self.flight_type as f64)),
            ("distance", FeatureValue::Number(self.distance as f64)),
            ("place", FeatureValue::Text(&self.place)),
            (
                "total_hotel_price",
                FeatureValue::Number(self.total_hotel_price as f64),
            ),
        ]
    }

    pub fn value(&self, column: &str) -> Option<FeatureValue<'_>> {
        self.columns()
            .into_iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericBounds {
    pub min: u32,
    pub max: u32,
    pub step: u32,
    pub default: u32,
}

impl NumericBounds {
    pub const fn new(min: u32, max: u32, step: u32, default: u32) -> Self {
        Self {
            min,
            max,
            step,
            default,
        }
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormBounds {
    pub hotel_nightly_price: NumericBounds,
    pub flight_price: NumericBounds,
    pub days: NumericBounds,
    pub distance_km: NumericBounds,
}

impl Default for FormBounds {
    fn default() -> Self {
        Self {
            hotel_nightly_price: NumericBounds::new(0, 350, 10, 0),
            flight_price: NumericBounds::new(0, 2000, 50, 0),
            days: NumericBounds::new(1, 5, 1, 1),
            distance_km: NumericBounds::new(100, 1000, 1, 100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    pub origins: Vec<String>,
    pub destinations: Vec<String>,
    pub stay_places: Vec<String>,
    pub flight_classes: Vec<String>,
    pub bounds: FormBounds,
}

impl FormSchema {
    pub fn new(catalog: &ReferenceCatalog, bounds: FormBounds) -> Self {
        Self {
            origins: catalog.origins().to_vec(),
            destinations: catalog.destinations().to_vec(),
            stay_places: catalog.stay_places().to_vec(),
            flight_classes: FlightClass::options(),
            bounds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EstimateResponse {
    Estimate {
        estimate: f64,
        display: String,
    },
    #[serde(rename_all = "camelCase")]
    Incomplete {
        incomplete_fields: BTreeSet<SelectionField>,
        message: String,
    },
    Error {
        message: String,
    },
}

impl EstimateResponse {
    pub fn estimate(value: f64) -> Self {
        Self::Estimate {
            estimate: value,
            display: format!("{ESTIMATE_DISPLAY_PREFIX} {}", format_currency(value)),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("$ {sign}{grouped}.{fraction}")
}
