//! Booking selection and appointment records.

use std::fmt;
use std::str::FromStr;

use crate::domain::{AppointmentId, PetId, RecordIdError, ServiceId, SlotId};

/// Form field a selection error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionField {
    /// The pet picker.
    Pet,
    /// The service picker.
    Service,
    /// The slot picker.
    Slot,
}

impl fmt::Display for SelectionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pet => "pet",
            Self::Service => "service",
            Self::Slot => "slot",
        };
        f.write_str(name)
    }
}

/// A required selection field was missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionValidationError {
    /// Field that failed to parse.
    pub field: SelectionField,
    /// Why the raw value was rejected.
    pub reason: RecordIdError,
}

impl fmt::Display for SelectionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            RecordIdError::Empty => write!(f, "a {} must be selected", self.field),
            _ => write!(f, "invalid {} selection: {}", self.field, self.reason),
        }
    }
}

impl std::error::Error for SelectionValidationError {}

/// The three choices that make up a booking.
///
/// ## Invariants
/// - All three ids are present and positive.
///
/// # Examples
/// ```
/// use booking_core::domain::{BookingSelection, SlotId};
///
/// let selection = BookingSelection::try_from_parts("1", "2", "5").unwrap();
/// assert_eq!(selection.slot_id(), SlotId::new(5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingSelection {
    pet_id: PetId,
    service_id: ServiceId,
    slot_id: SlotId,
}

impl BookingSelection {
    /// Build a selection from already typed ids.
    pub fn new(pet_id: PetId, service_id: ServiceId, slot_id: SlotId) -> Self {
        Self {
            pet_id,
            service_id,
            slot_id,
        }
    }

    /// Validate raw form values, reporting the first offending field.
    pub fn try_from_parts(
        pet: &str,
        service: &str,
        slot: &str,
    ) -> Result<Self, SelectionValidationError> {
        Ok(Self {
            pet_id: parse_field(SelectionField::Pet, pet)?,
            service_id: parse_field(SelectionField::Service, service)?,
            slot_id: parse_field(SelectionField::Slot, slot)?,
        })
    }

    /// Pet being booked.
    pub fn pet_id(&self) -> PetId {
        self.pet_id
    }

    /// Service requested.
    pub fn service_id(&self) -> ServiceId {
        self.service_id
    }

    /// Slot to consume.
    pub fn slot_id(&self) -> SlotId {
        self.slot_id
    }
}

fn parse_field<T>(field: SelectionField, raw: &str) -> Result<T, SelectionValidationError>
where
    T: FromStr<Err = RecordIdError>,
{
    raw.parse()
        .map_err(|reason| SelectionValidationError { field, reason })
}

/// Row inserted into the appointments table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewAppointment {
    /// Pet the appointment is for.
    pub pet_id: PetId,
    /// Requested service.
    pub service_id: ServiceId,
    /// Slot the appointment occupies.
    pub slot_id: SlotId,
}

impl From<&BookingSelection> for NewAppointment {
    fn from(value: &BookingSelection) -> Self {
        Self {
            pet_id: value.pet_id,
            service_id: value.service_id,
            slot_id: value.slot_id,
        }
    }
}

/// A stored appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Appointment {
    /// Row id assigned on insert.
    pub id: AppointmentId,
    /// Pet the appointment is for.
    pub pet_id: PetId,
    /// Requested service.
    pub service_id: ServiceId,
    /// Slot the appointment occupies.
    pub slot_id: SlotId,
}

/// How a booking consumes its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingMode {
    /// Insert the appointment, then flip the slot. Two independent writes;
    /// concurrent users can double-book a slot.
    #[default]
    TwoStep,
    /// Flip the slot only where it is still available, then insert the
    /// appointment. A lost race fails with `SlotAlreadyTaken`.
    Conditional,
}

/// Unknown booking mode name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBookingMode(pub String);

impl fmt::Display for UnknownBookingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown booking mode '{}'; expected two_step or conditional",
            self.0
        )
    }
}

impl std::error::Error for UnknownBookingMode {}

impl FromStr for BookingMode {
    type Err = UnknownBookingMode;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "two_step" => Ok(Self::TwoStep),
            "conditional" => Ok(Self::Conditional),
            _ => Err(UnknownBookingMode(raw.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "2", "5", SelectionField::Pet, RecordIdError::Empty)]
    #[case("1", " ", "5", SelectionField::Service, RecordIdError::Empty)]
    #[case("1", "2", "", SelectionField::Slot, RecordIdError::Empty)]
    #[case("rex", "2", "5", SelectionField::Pet, RecordIdError::NotANumber)]
    #[case("1", "2", "0", SelectionField::Slot, RecordIdError::NotPositive)]
    fn rejects_incomplete_selections(
        #[case] pet: &str,
        #[case] service: &str,
        #[case] slot: &str,
        #[case] field: SelectionField,
        #[case] reason: RecordIdError,
    ) {
        let err = BookingSelection::try_from_parts(pet, service, slot)
            .expect_err("incomplete selection must fail");
        assert_eq!(err, SelectionValidationError { field, reason });
    }

    #[rstest]
    fn empty_field_message_names_the_field() {
        let err = BookingSelection::try_from_parts("1", "", "5").expect_err("missing service");
        assert_eq!(err.to_string(), "a service must be selected");
    }

    #[rstest]
    fn selection_converts_to_insert_row() {
        let selection = BookingSelection::try_from_parts("1", "2", "5").expect("valid");
        let row = NewAppointment::from(&selection);
        assert_eq!(row.pet_id, PetId::new(1));
        assert_eq!(row.service_id, ServiceId::new(2));
        assert_eq!(row.slot_id, SlotId::new(5));
    }

    #[rstest]
    #[case("two_step", BookingMode::TwoStep)]
    #[case("Two-Step", BookingMode::TwoStep)]
    #[case(" conditional ", BookingMode::Conditional)]
    fn parses_booking_modes(#[case] raw: &str, #[case] expected: BookingMode) {
        assert_eq!(raw.parse::<BookingMode>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_booking_modes() {
        assert!("atomic".parse::<BookingMode>().is_err());
    }
}
