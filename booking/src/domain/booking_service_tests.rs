//! Tests for the booking workflow.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    AppointmentRepositoryError, MockAppointmentRepository, MockSlotRepository, ProfileRecord,
    SlotRepositoryError,
};
use crate::domain::{
    AppointmentId, ErrorCode, PetId, Role, ServiceId, SessionUser, SlotId, UserId,
};

const OWNER: &str = "44444444-4444-4444-4444-444444444444";

fn rex() -> Pet {
    Pet {
        id: PetId::new(1),
        owner_id: UserId::new(OWNER).expect("user id"),
        name: "Rex".to_owned(),
        species: None,
    }
}

#[fixture]
fn owner() -> Identity {
    Identity::from_profile(
        SessionUser {
            id: UserId::new(OWNER).expect("user id"),
            email: None,
        },
        ProfileRecord {
            role: Role::Owner,
            display_name: None,
            pets: vec![rex()],
        },
    )
}

#[fixture]
fn selection() -> BookingSelection {
    BookingSelection::try_from_parts("1", "2", "5").expect("selection")
}

fn stored(selection: &NewAppointment) -> Appointment {
    Appointment {
        id: AppointmentId::new(40),
        pet_id: selection.pet_id,
        service_id: selection.service_id,
        slot_id: selection.slot_id,
    }
}

fn workflow(
    appointments: MockAppointmentRepository,
    slots: MockSlotRepository,
    mode: BookingMode,
) -> BookingWorkflow<MockAppointmentRepository, MockSlotRepository> {
    BookingWorkflow::new(Arc::new(appointments), Arc::new(slots), mode)
}

#[rstest]
#[tokio::test]
async fn two_step_inserts_then_flips_the_slot(owner: Identity, selection: BookingSelection) {
    let mut seq = mockall::Sequence::new();
    let mut appointments = MockAppointmentRepository::new();
    appointments
        .expect_insert()
        .withf(|row| {
            row.pet_id == PetId::new(1)
                && row.service_id == ServiceId::new(2)
                && row.slot_id == SlotId::new(5)
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|row| Ok(stored(row)));
    let mut slots = MockSlotRepository::new();
    slots
        .expect_mark_unavailable()
        .withf(|slot_id| *slot_id == SlotId::new(5))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    slots.expect_claim_if_available().times(0);

    let appointment = workflow(appointments, slots, BookingMode::TwoStep)
        .book(&owner, &[], &selection)
        .await
        .expect("booked");
    assert_eq!(appointment.slot_id, SlotId::new(5));
    assert_eq!(appointment.id, AppointmentId::new(40));
}

#[rstest]
#[tokio::test]
async fn failed_insert_leaves_the_slot_untouched(owner: Identity, selection: BookingSelection) {
    let mut appointments = MockAppointmentRepository::new();
    appointments
        .expect_insert()
        .return_once(|_| Err(AppointmentRepositoryError::query("foreign key violation")));
    let mut slots = MockSlotRepository::new();
    slots.expect_mark_unavailable().times(0);

    let err = workflow(appointments, slots, BookingMode::TwoStep)
        .book(&owner, &[], &selection)
        .await
        .expect_err("insert fails");
    assert!(matches!(
        err,
        BookingError::AppointmentInsert {
            claimed_slot: None,
            ..
        }
    ));
    assert!(!err.left_inconsistent());
}

#[rstest]
#[tokio::test]
async fn failed_slot_update_reports_the_orphaned_appointment(
    owner: Identity,
    selection: BookingSelection,
) {
    let mut appointments = MockAppointmentRepository::new();
    appointments
        .expect_insert()
        .times(1)
        .returning(|row| Ok(stored(row)));
    let mut slots = MockSlotRepository::new();
    slots
        .expect_mark_unavailable()
        .return_once(|_| Err(SlotRepositoryError::query("permission denied")));

    let err = workflow(appointments, slots, BookingMode::TwoStep)
        .book(&owner, &[], &selection)
        .await
        .expect_err("update fails");
    assert_eq!(
        err,
        BookingError::SlotUpdate {
            slot_id: SlotId::new(5),
            appointment_id: Some(AppointmentId::new(40)),
            source: SlotRepositoryError::query("permission denied"),
        }
    );
    assert!(err.left_inconsistent());
}

#[rstest]
#[tokio::test]
async fn pets_outside_the_owner_are_rejected(owner: Identity) {
    let selection = BookingSelection::try_from_parts("9", "2", "5").expect("selection");
    let mut appointments = MockAppointmentRepository::new();
    appointments.expect_insert().times(0);
    let mut slots = MockSlotRepository::new();
    slots.expect_mark_unavailable().times(0);
    slots.expect_claim_if_available().times(0);

    let err = workflow(appointments, slots, BookingMode::TwoStep)
        .book(&owner, &[], &selection)
        .await
        .expect_err("not owned");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn supplied_pets_count_for_role_only_identities(selection: BookingSelection) {
    let partial = Identity::role_only(
        SessionUser {
            id: UserId::new(OWNER).expect("user id"),
            email: None,
        },
        Role::Owner,
    );
    let mut appointments = MockAppointmentRepository::new();
    appointments.expect_insert().returning(|row| Ok(stored(row)));
    let mut slots = MockSlotRepository::new();
    slots.expect_mark_unavailable().returning(|_| Ok(()));

    workflow(appointments, slots, BookingMode::TwoStep)
        .book(&partial, &[rex()], &selection)
        .await
        .expect("booked with supplied pets");
}

#[rstest]
#[tokio::test]
async fn supplied_pets_of_another_owner_are_rejected(owner: Identity) {
    let selection = BookingSelection::try_from_parts("8", "2", "5").expect("selection");
    let stranger = Pet {
        id: PetId::new(8),
        owner_id: UserId::random(),
        name: "Milo".to_owned(),
        species: None,
    };

    let err = workflow(
        MockAppointmentRepository::new(),
        MockSlotRepository::new(),
        BookingMode::TwoStep,
    )
    .book(&owner, &[stranger], &selection)
    .await
    .expect_err("not owned");
    assert_eq!(err, BookingError::PetNotOwned { pet_id: PetId::new(8) });
}

#[rstest]
#[tokio::test]
async fn conditional_mode_claims_before_inserting(owner: Identity, selection: BookingSelection) {
    let mut seq = mockall::Sequence::new();
    let mut slots = MockSlotRepository::new();
    slots
        .expect_claim_if_available()
        .withf(|slot_id| *slot_id == SlotId::new(5))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(true));
    slots.expect_mark_unavailable().times(0);
    let mut appointments = MockAppointmentRepository::new();
    appointments
        .expect_insert()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|row| Ok(stored(row)));

    workflow(appointments, slots, BookingMode::Conditional)
        .book(&owner, &[], &selection)
        .await
        .expect("booked");
}

#[rstest]
#[tokio::test]
async fn conditional_mode_reports_a_taken_slot(owner: Identity, selection: BookingSelection) {
    let mut slots = MockSlotRepository::new();
    slots.expect_claim_if_available().return_once(|_| Ok(false));
    let mut appointments = MockAppointmentRepository::new();
    appointments.expect_insert().times(0);

    let err = workflow(appointments, slots, BookingMode::Conditional)
        .book(&owner, &[], &selection)
        .await
        .expect_err("taken");
    assert_eq!(
        err,
        BookingError::SlotAlreadyTaken {
            slot_id: SlotId::new(5)
        }
    );
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn conditional_insert_failure_keeps_the_claim(owner: Identity, selection: BookingSelection) {
    let mut slots = MockSlotRepository::new();
    slots.expect_claim_if_available().return_once(|_| Ok(true));
    slots.expect_mark_unavailable().times(0);
    let mut appointments = MockAppointmentRepository::new();
    appointments
        .expect_insert()
        .return_once(|_| Err(AppointmentRepositoryError::connection("reset")));

    let err = workflow(appointments, slots, BookingMode::Conditional)
        .book(&owner, &[], &selection)
        .await
        .expect_err("insert fails");
    assert!(matches!(
        err,
        BookingError::AppointmentInsert {
            claimed_slot: Some(slot),
            ..
        } if slot == SlotId::new(5)
    ));
}
