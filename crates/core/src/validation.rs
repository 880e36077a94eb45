use std::collections::BTreeSet;

use thiserror::Error;

use crate::models::{
    FormBounds, NumericBounds, RawSelection, SelectionField, TripSelection, LOCATION_SENTINEL,
    PLACE_SENTINEL,
};

pub const INCOMPLETE_SELECTION_MESSAGE: &str =
    "Please select valid From, To, and Place of Stay locations.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("incomplete selection: {} not selected", join_fields(fields))]
    IncompleteSelection { fields: BTreeSet<SelectionField> },
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: SelectionField,
        value: u32,
        min: u32,
        max: u32,
    },
}

impl ValidationError {
    pub fn fields(&self) -> BTreeSet<SelectionField> {
        match self {
            Self::IncompleteSelection { fields } => fields.clone(),
            Self::OutOfRange { field, .. } => BTreeSet::from([*field]),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::IncompleteSelection { .. } => INCOMPLETE_SELECTION_MESSAGE.to_string(),
            Self::OutOfRange {
                field, min, max, ..
            } => format!("{} must be between {min} and {max}.", field.label()),
        }
    }
}

fn join_fields(fields: &BTreeSet<SelectionField>) -> String {
    fields
        .iter()
        .map(|field| field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn validate(raw: RawSelection) -> Result<TripSelection, ValidationError> {
    let mut fields = BTreeSet::new();

    if raw.origin == LOCATION_SENTINEL {
        fields.insert(SelectionField::Origin);
    }
    if raw.destination == LOCATION_SENTINEL {
        fields.insert(SelectionField::Destination);
    }
    if raw.stay_place == PLACE_SENTINEL {
        fields.insert(SelectionField::StayPlace);
    }

    if !fields.is_empty() {
        return Err(ValidationError::IncompleteSelection { fields });
    }

    Ok(TripSelection {
        hotel_nightly_price: raw.hotel_nightly_price,
        flight_price: raw.flight_price,
        origin: raw.origin,
        destination: raw.destination,
        days: raw.days,
        flight_class_label: raw.flight_class_label,
        distance_km: raw.distance_km,
        stay_place: raw.stay_place,
    })
}

impl FormBounds {
    pub fn check(&self, selection: &TripSelection) -> Result<(), ValidationError> {
        check_one(
            SelectionField::HotelNightlyPrice,
            selection.hotel_nightly_price,
            self.hotel_nightly_price,
        )?;
        check_one(
            SelectionField::FlightPrice,
            selection.flight_price,
            self.flight_price,
        )?;
        check_one(SelectionField::Days, selection.days, self.days)?;
        check_one(
            SelectionField::DistanceKm,
            selection.distance_km,
            self.distance_km,
        )
    }
}

fn check_one(field: SelectionField, value: u32, bounds: NumericBounds) -> Result<(), ValidationError> {
    if bounds.contains(value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min: bounds.min,
            max: bounds.max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FLIGHT_CLASS_SENTINEL;

    fn raw() -> RawSelection {
        RawSelection {
            hotel_nightly_price: 100,
            flight_price: 500,
            origin: "Paris".to_string(),
            destination: "Tokyo".to_string(),
            days: 3,
            flight_class_label: "Business".to_string(),
            distance_km: 400,
            stay_place: "Tokyo".to_string(),
        }
    }

    #[test]
    fn accepts_complete_selection() {
        let selection = validate(raw()).unwrap();
        assert_eq!(selection.origin, "Paris");
        assert_eq!(selection.days, 3);
    }

    #[test]
    fn names_the_unset_origin() {
        let mut input = raw();
        input.origin = LOCATION_SENTINEL.to_string();

        let err = validate(input).unwrap_err();
        assert_eq!(
            err,
            ValidationError::IncompleteSelection {
                fields: BTreeSet::from([SelectionField::Origin])
            }
        );
        assert_eq!(err.user_message(), INCOMPLETE_SELECTION_MESSAGE);
    }

    #[test]
    fn collects_every_unset_dropdown() {
        let mut input = raw();
        input.destination = LOCATION_SENTINEL.to_string();
        input.stay_place = PLACE_SENTINEL.to_string();

        let err = validate(input).unwrap_err();
        assert_eq!(
            err.fields(),
            BTreeSet::from([SelectionField::Destination, SelectionField::StayPlace])
        );
        assert_eq!(
            err.to_string(),
            "incomplete selection: destination, stayPlace not selected"
        );
    }

    #[test]
    fn ignores_ranges_and_flight_class() {
        let mut input = raw();
        input.hotel_nightly_price = 9_999;
        input.days = 0;
        input.flight_class_label = FLIGHT_CLASS_SENTINEL.to_string();
        assert!(validate(input).is_ok());
    }

    #[test]
    fn place_sentinel_is_not_a_location_sentinel() {
        let mut input = raw();
        input.origin = PLACE_SENTINEL.to_string();
        assert!(validate(input).is_ok());
    }

    #[test]
    fn bounds_flag_first_out_of_range_field() {
        let bounds = FormBounds::default();
        assert!(bounds.check(&validate(raw()).unwrap()).is_ok());

        let mut input = raw();
        input.days = 6;
        input.distance_km = 50;
        let err = bounds.check(&validate(input).unwrap()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                field: SelectionField::Days,
                value: 6,
                min: 1,
                max: 5
            }
        );
        assert_eq!(err.user_message(), "Number of Days must be between 1 and 5.");
    }
}
