use thiserror::Error;

use crate::models::{FlightClass, ModelInputRow, TripSelection};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowBuildError {
    #[error("unknown flight class `{0}`")]
    UnknownFlightClass(String),
}

pub fn build_input_row(selection: &TripSelection) -> Result<ModelInputRow, RowBuildError> {
    let flight_class = FlightClass::parse(&selection.flight_class_label)
        .ok_or_else(|| RowBuildError::UnknownFlightClass(selection.flight_class_label.clone()))?;

    let hotel_price = u64::from(selection.hotel_nightly_price);
    let days = u64::from(selection.days);

    Ok(ModelInputRow {
        hotel_price,
        flight_price: u64::from(selection.flight_price),
        from_location: selection.origin.clone(),
        days,
        to_location: selection.destination.clone(),
        flight_type: flight_class.code(),
        distance: u64::from(selection.distance_km),
        place: selection.stay_place.clone(),
        total_hotel_price: hotel_price * days,
    })
}
