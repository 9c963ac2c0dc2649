//! Tests for domain error categories and user-facing messages.

use super::*;
use crate::domain::{SelectionField, RecordIdError};
use rstest::rstest;

fn user_id() -> UserId {
    UserId::new("11111111-1111-1111-1111-111111111111").expect("user id")
}

#[rstest]
#[case(IdentityError::SignIn { source: SessionStoreError::rejected("Invalid login credentials") }, ErrorCode::Unauthorized)]
#[case(IdentityError::SignIn { source: SessionStoreError::connection("refused") }, ErrorCode::ServiceUnavailable)]
#[case(IdentityError::Session { source: SessionStoreError::decode("bad json") }, ErrorCode::InternalError)]
#[case(IdentityError::ProfileMissing { user_id: user_id() }, ErrorCode::NotFound)]
#[case(IdentityError::ProfileLookup { user_id: user_id(), source: ProfileRepositoryError::connection("down") }, ErrorCode::ServiceUnavailable)]
fn identity_errors_map_to_codes(#[case] error: IdentityError, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn profile_lookup_message_names_the_user() {
    let error = IdentityError::ProfileLookup {
        user_id: user_id(),
        source: ProfileRepositoryError::query("relation \"pets\" does not exist"),
    };
    assert_eq!(
        error.to_string(),
        "could not load the profile for user 11111111-1111-1111-1111-111111111111: \
         profile lookup failed: relation \"pets\" does not exist"
    );
}

#[rstest]
#[case(BookingError::PetNotOwned { pet_id: PetId::new(3) }, ErrorCode::Forbidden)]
#[case(BookingError::SlotAlreadyTaken { slot_id: SlotId::new(5) }, ErrorCode::Conflict)]
#[case(
    BookingError::AppointmentInsert { claimed_slot: None, source: AppointmentRepositoryError::query("fk violation") },
    ErrorCode::InternalError
)]
#[case(
    BookingError::SlotUpdate { slot_id: SlotId::new(5), appointment_id: None, source: SlotRepositoryError::connection("reset") },
    ErrorCode::ServiceUnavailable
)]
fn booking_errors_map_to_codes(#[case] error: BookingError, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn invalid_selection_is_transparent() {
    let error = BookingError::from(SelectionValidationError {
        field: SelectionField::Slot,
        reason: RecordIdError::Empty,
    });
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(error.to_string(), "a slot must be selected");
}

#[rstest]
fn only_slot_update_after_insert_is_inconsistent() {
    let after_insert = BookingError::SlotUpdate {
        slot_id: SlotId::new(5),
        appointment_id: Some(AppointmentId::new(40)),
        source: SlotRepositoryError::query("permission denied"),
    };
    let before_insert = BookingError::SlotUpdate {
        slot_id: SlotId::new(5),
        appointment_id: None,
        source: SlotRepositoryError::query("permission denied"),
    };
    assert!(after_insert.left_inconsistent());
    assert!(!before_insert.left_inconsistent());
    assert_eq!(
        after_insert.to_string(),
        "could not update slot 5: slot update failed: permission denied"
    );
}

#[rstest]
fn error_codes_serialise_as_snake_case() {
    let encoded = serde_json::to_value(ErrorCode::ServiceUnavailable).expect("encode");
    assert_eq!(encoded, serde_json::json!("service_unavailable"));
}
